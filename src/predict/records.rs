/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use crate::gl::accounts::OpenAccounts;
use crate::gl::entry::{Entry, Transaction, Units};

/// A transaction as a classifier sees it, along with the accounts of the
/// postings that are already known when the record stands for one leg.
#[derive(Clone, Debug)]
pub struct Record<'a> {
	pub txn: &'a Transaction,
	pub context: Vec<&'a str>,
}

impl<'a> Record<'a> {
	pub fn new(txn: &'a Transaction) -> Self {
		Self {
			txn,
			context: vec![],
		}
	}

	pub fn with_context(txn: &'a Transaction, context: Vec<&'a str>) -> Self {
		Self { txn, context }
	}
}

/// A record paired with the label it should predict.
#[derive(Clone, Debug)]
pub struct TrainingExample<'a> {
	pub record: Record<'a>,
	pub label: String,
}

/// Where a predicted account goes on a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
	/// Replaces the placeholder posting at this index
	Placeholder(usize),
	/// Appended after the lone posting of a single-legged transaction
	Appended,
}

pub fn transactions(entries: &[Entry]) -> impl Iterator<Item = &Transaction> {
	entries.iter().filter_map(|e| e.as_transaction())
}

/// Accounts of all postings that are not placeholders, in order.
pub fn known_accounts<'a>(
	txn: &'a Transaction,
	placeholder: &str,
) -> Vec<&'a str> {
	txn.postings()
		.iter()
		.filter(|p| !p.is_placeholder(placeholder))
		.map(|p| p.account().as_str())
		.collect()
}

/// Finds the one leg of a transaction left to fill, if there is exactly
/// one. A transaction needs at least one posting with a written amount to
/// have anything to balance against.
pub fn placeholder_slot(txn: &Transaction, placeholder: &str) -> Option<Slot> {
	let postings = txn.postings();
	if !postings.iter().any(|p| matches!(p.units(), Units::Fixed(_))) {
		return None;
	}

	let placeholders: Vec<usize> = postings
		.iter()
		.enumerate()
		.filter(|(_, p)| p.is_placeholder(placeholder))
		.map(|(i, _)| i)
		.collect();

	match placeholders.as_slice() {
		[i] => Some(Slot::Placeholder(*i)),
		[] if postings.len() == 1 => Some(Slot::Appended),
		_ => None,
	}
}

/// The record a new transaction is classified by: its known legs form
/// the context for the missing one.
pub fn posting_target<'a>(
	txn: &'a Transaction,
	placeholder: &str,
) -> Option<(Record<'a>, Slot)> {
	let slot = placeholder_slot(txn, placeholder)?;
	Some((
		Record::with_context(txn, known_accounts(txn, placeholder)),
		slot,
	))
}

/// Decides which historical transactions are fit to learn from.
#[derive(Debug)]
pub struct TrainingFilter<'a> {
	/// Only learn from transactions touching an account with this prefix
	pub account: Option<&'a str>,
	pub denylist: &'a [String],
	pub open_accounts: &'a OpenAccounts,
	pub placeholder: &'a str,
}

impl TrainingFilter<'_> {
	pub fn admits(&self, txn: &Transaction) -> bool {
		let known = known_accounts(txn, self.placeholder);

		if known
			.iter()
			.any(|a| self.denylist.iter().any(|d| d == a))
		{
			return false;
		}

		if !known.iter().all(|a| self.open_accounts.is_known(a)) {
			return false;
		}

		match self.account {
			Some(prefix) => known.iter().any(|a| a.starts_with(prefix)),
			None => true,
		}
	}

	pub fn apply<'e>(&self, entries: &'e [Entry]) -> Vec<&'e Transaction> {
		transactions(entries).filter(|t| self.admits(t)).collect()
	}
}

/// One example per known posting, labelled with that posting's account,
/// from every transaction that is either complete or has more than one
/// known leg to learn from.
pub fn posting_examples<'a>(
	txns: &[&'a Transaction],
	placeholder: &str,
) -> Vec<TrainingExample<'a>> {
	let mut examples = vec![];

	for &txn in txns {
		let known = known_accounts(txn, placeholder);
		let has_placeholder =
			txn.postings().iter().any(|p| p.is_placeholder(placeholder));
		if has_placeholder && known.len() < 2 {
			continue;
		}

		for (i, account) in known.iter().enumerate() {
			let context = known
				.iter()
				.enumerate()
				.filter(|(j, _)| *j != i)
				.map(|(_, a)| *a)
				.collect();
			examples.push(TrainingExample {
				record: Record::with_context(txn, context),
				label: account.to_string(),
			});
		}
	}

	examples
}

/// One example per transaction that has a payee, labelled with it.
pub fn payee_examples<'a>(
	txns: &[&'a Transaction],
) -> Vec<TrainingExample<'a>> {
	txns.iter()
		.filter_map(|&txn| {
			txn.payee().map(|payee| TrainingExample {
				record: Record::new(txn),
				label: payee.clone(),
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gl::entry::{Posting, PLACEHOLDER};
	use crate::util::amount::Amount;
	use crate::util::date::Date;

	fn txn(payee: Option<&str>, postings: Vec<Posting>) -> Transaction {
		let mut txn = Transaction::new(
			Date::from_str("2024-01-01").unwrap(),
			payee.map(|p| p.to_string()),
			"Something".to_string(),
		);
		for p in postings {
			txn.add_posting(p).unwrap();
		}
		txn
	}

	fn fixed(account: &str, value: &str) -> Posting {
		Posting::fixed(account, Amount::parse(value, "USD").unwrap())
	}

	#[test]
	fn test_slot_explicit_placeholder() {
		let t = txn(
			None,
			vec![fixed("Assets:Checking", "-5"), Posting::auto(PLACEHOLDER)],
		);
		assert_eq!(
			placeholder_slot(&t, PLACEHOLDER),
			Some(Slot::Placeholder(1))
		);
	}

	#[test]
	fn test_slot_single_legged() {
		let t = txn(None, vec![fixed("Assets:Checking", "-5")]);
		assert_eq!(placeholder_slot(&t, PLACEHOLDER), Some(Slot::Appended));
	}

	#[test]
	fn test_slot_ineligible() {
		let complete = txn(
			None,
			vec![fixed("Assets:Checking", "-5"), fixed("Expenses:Food", "5")],
		);
		assert_eq!(placeholder_slot(&complete, PLACEHOLDER), None);

		let two = txn(
			None,
			vec![
				fixed("Assets:Checking", "-5"),
				fixed(PLACEHOLDER, "2"),
				Posting::auto(PLACEHOLDER),
			],
		);
		assert_eq!(placeholder_slot(&two, PLACEHOLDER), None);

		let no_amount = txn(None, vec![Posting::auto(PLACEHOLDER)]);
		assert_eq!(placeholder_slot(&no_amount, PLACEHOLDER), None);
	}

	#[test]
	fn test_posting_examples() {
		let complete = txn(
			None,
			vec![fixed("Assets:Checking", "-5"), fixed("Expenses:Food", "5")],
		);
		let single = txn(None, vec![fixed("Expenses:Rent", "1000")]);
		let incomplete = txn(
			None,
			vec![fixed("Assets:Checking", "-5"), Posting::auto(PLACEHOLDER)],
		);

		let examples =
			posting_examples(&[&complete, &single, &incomplete], PLACEHOLDER);
		let labels: Vec<&str> =
			examples.iter().map(|e| e.label.as_str()).collect();
		assert_eq!(
			labels,
			vec!["Assets:Checking", "Expenses:Food", "Expenses:Rent"]
		);
		assert_eq!(examples[0].record.context, vec!["Expenses:Food"]);
		assert!(examples[2].record.context.is_empty());
	}

	#[test]
	fn test_payee_examples() {
		let with = txn(Some("Shop"), vec![fixed("Expenses:Food", "5")]);
		let without = txn(None, vec![fixed("Expenses:Food", "5")]);
		let examples = payee_examples(&[&with, &without]);
		assert_eq!(examples.len(), 1);
		assert_eq!(examples[0].label, "Shop");
	}

	#[test]
	fn test_training_filter() {
		let date = Date::from_str("2024-01-01").unwrap();
		let entries = vec![
			Entry::Open {
				date,
				account: "Assets:Checking".to_string(),
			},
			Entry::Open {
				date,
				account: "Expenses:Food".to_string(),
			},
			Entry::Transaction(txn(
				None,
				vec![
					fixed("Assets:Checking", "-5"),
					fixed("Expenses:Food", "5"),
				],
			)),
			Entry::Transaction(txn(
				None,
				vec![fixed("Assets:Savings", "-5"), fixed("Expenses:Food", "5")],
			)),
		];
		let open_accounts = OpenAccounts::from_entries(&entries);
		let denylist = vec![];

		let filter = TrainingFilter {
			account: None,
			denylist: &denylist,
			open_accounts: &open_accounts,
			placeholder: PLACEHOLDER,
		};
		assert_eq!(filter.apply(&entries).len(), 1);

		let denylist = vec!["Expenses:Food".to_string()];
		let filter = TrainingFilter {
			denylist: &denylist,
			..filter
		};
		assert!(filter.apply(&entries).is_empty());
	}

	#[test]
	fn test_training_filter_account_prefix() {
		let entries = vec![
			Entry::Transaction(txn(
				None,
				vec![fixed("Assets:Checking", "-5"), fixed("Expenses:Food", "5")],
			)),
			Entry::Transaction(txn(
				None,
				vec![fixed("Assets:Savings", "-5"), fixed("Expenses:Food", "5")],
			)),
		];
		let open_accounts = OpenAccounts::from_entries(&entries);
		let filter = TrainingFilter {
			account: Some("Assets:Sav"),
			denylist: &[],
			open_accounts: &open_accounts,
			placeholder: PLACEHOLDER,
		};
		assert_eq!(filter.apply(&entries).len(), 1);
	}
}

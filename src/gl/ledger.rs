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

use crate::gl::entry::{Entry, MetaValue, Posting, Transaction, Units};
use crate::util::amount::Amount;
use crate::util::date::Date;
use anyhow::{bail, Error};

/// The only valid top-level account names.
pub const VALID_PREFIXES: [&str; 5] =
	["Assets", "Liabilities", "Equity", "Income", "Expenses"];

/// Takes input from the parser and assembles it into entries, in the order
/// they were read. Transactions are built up line by line; directives are
/// complete as soon as they are declared.
#[derive(Debug, Default)]
pub struct Ledger {
	entries: Vec<Entry>,
	/// Transaction currently being assembled, if any
	pending_entry: Option<Transaction>,
}

impl Ledger {
	pub fn new() -> Self {
		Self::default()
	}

	// -----------
	// -- INPUT --
	// -----------

	pub fn declare_account_open(
		&mut self,
		account: String,
		date: Date,
	) -> Result<(), Error> {
		Self::check_account(&account)?;
		self.push_directive(Entry::Open { date, account })
	}

	pub fn declare_account_closure(
		&mut self,
		account: String,
		date: Date,
	) -> Result<(), Error> {
		Self::check_account(&account)?;
		self.push_directive(Entry::Close { date, account })
	}

	pub fn declare_balance(
		&mut self,
		account: String,
		amount: Amount,
		date: Date,
	) -> Result<(), Error> {
		Self::check_account(&account)?;
		self.push_directive(Entry::Balance {
			date,
			account,
			amount,
		})
	}

	/// Any directive this system has no particular use for is kept as-is.
	pub fn declare_other(
		&mut self,
		directive: String,
		date: Date,
	) -> Result<(), Error> {
		self.push_directive(Entry::Other { date, directive })
	}

	/// Starts a new transaction. A description of the form
	/// `Payee | Narration` carries a payee; anything else is all narration.
	pub fn new_entry(&mut self, date: Date, desc: &str) -> Result<(), Error> {
		if self.pending_entry.is_some() {
			self.finish_entry()?;
		}

		let (payee, narration) = match desc.split_once('|') {
			Some((p, n)) => (Some(p.trim().to_string()), n.trim().to_string()),
			None => (None, desc.trim().to_string()),
		};

		self.pending_entry = Some(Transaction::new(date, payee, narration));
		Ok(())
	}

	/// Adds a detail line to the pending transaction. A detail with no
	/// amount is the counterparty to whatever remains unbalanced.
	pub fn add_detail(
		&mut self,
		account: String,
		amount: Option<Amount>,
	) -> Result<(), Error> {
		let pending_entry = match &mut self.pending_entry {
			Some(e) => e,
			None => bail!("Orphaned entry detail"),
		};

		if account.is_empty() {
			bail!("Account is empty")
		}
		Self::check_account(&account)?;

		let units = match amount {
			Some(a) => Units::Fixed(a),
			None => Units::Auto,
		};
		pending_entry.add_posting(Posting::new(&account, units))
	}

	pub fn add_meta(&mut self, key: &str, value: &str) -> Result<(), Error> {
		match &mut self.pending_entry {
			Some(e) => {
				if key.is_empty() {
					bail!("Metadata key is empty")
				}
				e.set_meta(key, MetaValue::parse(value));
				Ok(())
			},
			None => bail!("Orphaned metadata"),
		}
	}

	/// Takes the pending transaction and adds it to the set of entries on
	/// this. No-ops if nothing is pending.
	pub fn finish_entry(&mut self) -> Result<(), Error> {
		match self.pending_entry.take() {
			None => Ok(()),
			Some(entry) => {
				if entry.postings().is_empty() {
					bail!("Empty entry")
				}

				self.entries.push(Entry::Transaction(entry));
				Ok(())
			},
		}
	}

	fn push_directive(&mut self, entry: Entry) -> Result<(), Error> {
		self.finish_entry()?;
		self.entries.push(entry);
		Ok(())
	}

	fn check_account(account: &str) -> Result<(), Error> {
		if !account.contains(':') {
			bail!("Top level accounts cannot be used on their own")
		}

		let has_valid_prefix = VALID_PREFIXES
			.iter()
			.any(|&prefix| account.starts_with(prefix));
		if !has_valid_prefix {
			bail!("Invalid account prefix: {}", account)
		}

		Ok(())
	}

	// ------------
	// -- OUTPUT --
	// ------------

	pub fn entries(&self) -> &Vec<Entry> {
		&self.entries
	}

	pub fn take_entries(self) -> Vec<Entry> {
		self.entries
	}
}

/// Prints entries in ledger format, separated by blank lines.
pub fn print(entries: &[Entry]) {
	for entry in entries {
		println!("{}", entry);
	}
}

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
use crate::error::PredictError;
use crate::gl::accounts::OpenAccounts;
use crate::gl::entry::{Entry, MetaValue, Posting, Transaction, Units};
use crate::import::importer::{Importer, ImporterHook};
use crate::predict::features::{Attribute, FeatureSpec};
use crate::predict::predictor::{
	confidence_meta, EntryPredictor, PredictorOptions,
};
use crate::predict::records::{
	known_accounts, placeholder_slot, posting_examples, posting_target,
	Record, Slot, TrainingExample,
};
use crate::util::amount::Amount;
use anyhow::Error;

pub const SUGGESTED_ACCOUNTS: &str = "__suggested_accounts__";
pub const ACCOUNT_CONFIDENCE: &str = "__account_confidence__";

/// Completes single-legged transactions with the account the history
/// suggests for their missing leg.
#[derive(Clone, Default)]
pub struct PredictPostings {
	options: PredictorOptions,
}

impl PredictPostings {
	pub fn new(options: PredictorOptions) -> Self {
		Self { options }
	}

	/// The units the completed leg takes: whatever balances the others, if
	/// that is a single amount.
	fn balancing_units(others: &[&Posting], original: &Units) -> Units {
		if others.iter().any(|p| *p.units() == Units::Auto) {
			return original.clone();
		}

		let imbalances =
			Amount::imbalances(others.iter().filter_map(|p| p.amount()));
		let mut iter = imbalances.iter();
		match (iter.next(), iter.next()) {
			(Some((currency, value)), None) => {
				Units::Fixed(Amount::new(-*value, currency))
			},
			(None, _) => original.clone(),
			_ => Units::Auto,
		}
	}
}

impl EntryPredictor for PredictPostings {
	fn name(&self) -> &'static str {
		"postings"
	}

	fn options(&self) -> &PredictorOptions {
		&self.options
	}

	fn default_features(&self) -> Vec<FeatureSpec> {
		vec![
			FeatureSpec {
				attribute: Attribute::Narration,
				weight: 0.8,
			},
			FeatureSpec {
				attribute: Attribute::Accounts,
				weight: 0.8,
			},
			FeatureSpec {
				attribute: Attribute::Day,
				weight: 0.1,
			},
		]
	}

	fn check_feature(&self, attribute: &Attribute) -> Result<(), PredictError> {
		match attribute {
			Attribute::Payee => Err(PredictError::invalid_feature(
				"payee",
				"payees are predicted separately",
			)),
			_ => Ok(()),
		}
	}

	fn training_examples<'a>(
		&self,
		txns: &[&'a Transaction],
	) -> Vec<TrainingExample<'a>> {
		posting_examples(txns, &self.options.placeholder_account)
	}

	fn target<'a>(&self, txn: &'a Transaction) -> Option<Record<'a>> {
		posting_target(txn, &self.options.placeholder_account).map(|(r, _)| r)
	}

	fn is_admissible(
		&self,
		label: &str,
		txn: &Transaction,
		open_accounts: &OpenAccounts,
	) -> bool {
		// The missing leg is a counterparty, never a leg already there
		let placeholder = &self.options.placeholder_account;
		if known_accounts(txn, placeholder).contains(&label) {
			return false;
		}
		open_accounts.is_open_on(label, txn.date())
	}

	fn apply_prediction(
		&self,
		txn: &Transaction,
		label: &str,
		confidence: f64,
	) -> Transaction {
		let slot = match placeholder_slot(txn, &self.options.placeholder_account)
		{
			Some(s) => s,
			None => return txn.clone(),
		};

		let postings = txn.postings();
		let (others, original): (Vec<&Posting>, Units) = match slot {
			Slot::Placeholder(i) => (
				postings
					.iter()
					.enumerate()
					.filter(|(j, _)| *j != i)
					.map(|(_, p)| p)
					.collect(),
				postings[i].units().clone(),
			),
			Slot::Appended => (postings.iter().collect(), Units::Auto),
		};

		let predicted =
			Posting::new(label, Self::balancing_units(&others, &original));
		let mut completed = postings.clone();
		match slot {
			Slot::Placeholder(i) => completed[i] = predicted,
			Slot::Appended => completed.push(predicted),
		}
		completed.sort_by(|a, b| a.account().cmp(b.account()));

		txn.with_postings(completed)
			.with_meta(vec![(ACCOUNT_CONFIDENCE, confidence_meta(confidence))])
	}

	fn apply_suggestions(
		&self,
		txn: &Transaction,
		labels: &[String],
	) -> Result<Transaction, Error> {
		let json = serde_json::to_string(labels)?;
		Ok(txn.with_meta(vec![(SUGGESTED_ACCOUNTS, MetaValue::Text(json))]))
	}
}

impl ImporterHook for PredictPostings {
	fn apply(
		&self,
		importer: &dyn Importer,
		path: &str,
		imported: Vec<Entry>,
		existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		self.apply_as_hook(importer, path, imported, existing)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gl::entry::PLACEHOLDER;
	use crate::util::date::Date;
	use rust_decimal::Decimal;

	fn date(day: u8) -> Date {
		Date::from_parts(2024, 1, day).unwrap()
	}

	fn usd(value: &str) -> Amount {
		Amount::parse(value, "USD").unwrap()
	}

	fn txn(narration: &str, day: u8, postings: Vec<Posting>) -> Transaction {
		let mut txn = Transaction::new(date(day), None, narration.to_string());
		for p in postings {
			txn.add_posting(p).unwrap();
		}
		txn
	}

	#[test]
	fn test_apply_prediction_single_legged() {
		let predictor = PredictPostings::default();
		let t = txn(
			"Lunch",
			1,
			vec![Posting::fixed("Liabilities:Card", usd("-12.50"))],
		);

		let completed = predictor.apply_prediction(&t, "Expenses:Food", 0.75);
		let postings = completed.postings();
		assert_eq!(postings.len(), 2);
		assert_eq!(postings[0].account(), "Expenses:Food");
		assert_eq!(postings[0].amount(), Some(&usd("12.50")));
		assert_eq!(postings[1].account(), "Liabilities:Card");
		assert_eq!(
			completed.meta()[ACCOUNT_CONFIDENCE],
			MetaValue::Number(Decimal::new(7500, 4))
		);
	}

	#[test]
	fn test_apply_prediction_replaces_placeholder() {
		let predictor = PredictPostings::default();
		let t = txn(
			"Lunch",
			1,
			vec![
				Posting::fixed("Assets:Checking", usd("-10")),
				Posting::fixed("Expenses:Tips", usd("2")),
				Posting::auto(PLACEHOLDER),
			],
		);

		let completed = predictor.apply_prediction(&t, "Expenses:Food", 1.0);
		let accounts: Vec<&String> =
			completed.postings().iter().map(|p| p.account()).collect();
		assert_eq!(
			accounts,
			vec!["Assets:Checking", "Expenses:Food", "Expenses:Tips"]
		);
		assert_eq!(completed.postings()[1].amount(), Some(&usd("8")));
		assert!(completed.imbalances().is_empty());
	}

	#[test]
	fn test_apply_prediction_multiple_currencies() {
		let predictor = PredictPostings::default();
		let t = txn(
			"Exchange",
			1,
			vec![
				Posting::fixed("Assets:Checking", usd("-10")),
				Posting::fixed(
					"Assets:Euro",
					Amount::parse("9", "EUR").unwrap(),
				),
				Posting::auto(PLACEHOLDER),
			],
		);

		let completed = predictor.apply_prediction(&t, "Expenses:Fees", 1.0);
		assert_eq!(*completed.postings()[2].units(), Units::Auto);
	}

	#[test]
	fn test_existing_leg_not_admissible() {
		let predictor = PredictPostings::default();
		let open_accounts = OpenAccounts::from_entries(&[]);
		let t = txn(
			"Pharmacy",
			1,
			vec![
				Posting::fixed("Assets:Checking", usd("-10")),
				Posting::auto(PLACEHOLDER),
			],
		);

		let checking = "Assets:Checking";
		assert!(!predictor.is_admissible(checking, &t, &open_accounts));
		let health = "Expenses:Health";
		assert!(predictor.is_admissible(health, &t, &open_accounts));
	}

	#[test]
	fn test_payee_feature_rejected() {
		let options = PredictorOptions {
			features: Some(vec![FeatureSpec {
				attribute: Attribute::Payee,
				weight: 1.0,
			}]),
			..Default::default()
		};
		let predictor = PredictPostings::new(options);
		assert!(predictor.features().is_err());
	}

	#[test]
	fn test_reserved_meta_rejected() {
		let options = PredictorOptions {
			features: Some(vec![FeatureSpec {
				attribute: Attribute::Meta("__duplicate__".to_string()),
				weight: 1.0,
			}]),
			..Default::default()
		};
		let predictor = PredictPostings::new(options);
		assert!(predictor.features().is_err());
		assert!(predictor.predict_entries(vec![], &[]).is_err());
	}

	#[test]
	fn test_suggest_accounts() {
		let options = PredictorOptions {
			suggest: true,
			..Default::default()
		};
		let predictor = PredictPostings::new(options);
		let history = vec![Entry::Transaction(txn(
			"Rent",
			1,
			vec![Posting::fixed("Expenses:Rent", usd("1000"))],
		))];
		let imported = vec![Entry::Transaction(txn(
			"Rent",
			1,
			vec![Posting::fixed("Assets:Checking", usd("-1000"))],
		))];

		let result = predictor.predict_entries(imported, &history).unwrap();
		let t = result[0].as_transaction().unwrap();
		assert_eq!(t.postings().len(), 1);
		assert_eq!(
			t.meta()[SUGGESTED_ACCOUNTS],
			MetaValue::Text("[\"Expenses:Rent\"]".to_string())
		);
	}
}

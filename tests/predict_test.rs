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
use anyhow::Error;
use ledr_smart::gl::entry::{Entry, MetaValue};
use ledr_smart::import::importer::{apply_hooks, Importer};
use ledr_smart::parsing::parser::Parser;
use ledr_smart::predict::classifier::ClassifierKind;
use ledr_smart::predict::features::{Attribute, FeatureSpec};
use ledr_smart::predict::payees::{
	PredictPayees, PAYEE_CONFIDENCE, SUGGESTED_PAYEES,
};
use ledr_smart::predict::postings::{PredictPostings, ACCOUNT_CONFIDENCE};
use ledr_smart::predict::predictor::{EntryPredictor, PredictorOptions};

fn parse(input: &str) -> Vec<Entry> {
	Parser::new().parse_str(input).unwrap()
}

/// Ten days of shopping: market trips on odd days, fuel on even days.
fn history(directives: &str) -> Vec<Entry> {
	let mut ledger = directives.to_string();
	for day in 1..=10 {
		let (payee, narration, account) = if day % 2 == 1 {
			("Green Grocer", "Farmers Market", "Expenses:Groceries")
		} else {
			("Fuel Co", "Fuel Station", "Expenses:Transport")
		};
		ledger.push_str(&format!(
			"\n2024-03-{:02} {} | {}\n\tAssets:Checking  -20.00 USD\n\t{}\n",
			day, payee, narration, account
		));
	}
	parse(&ledger)
}

fn market_trip() -> Vec<Entry> {
	parse("2024-03-15 Local Market\n\tAssets:Checking  -25.00 USD\n")
}

fn accounts(entry: &Entry) -> Vec<String> {
	entry
		.as_transaction()
		.unwrap()
		.postings()
		.iter()
		.map(|p| p.account().clone())
		.collect()
}

/// Hands back whatever it was built with.
struct StaticImporter {
	entries: Vec<Entry>,
	account: Option<String>,
}

impl Importer for StaticImporter {
	fn name(&self) -> String {
		"static".to_string()
	}

	fn identify(&self, _path: &str) -> bool {
		true
	}

	fn account(&self, _path: &str) -> Option<String> {
		self.account.clone()
	}

	fn extract(
		&self,
		_path: &str,
		_existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		Ok(self.entries.clone())
	}
}

#[test]
fn test_predicts_counterparty_from_narration() {
	let result = PredictPostings::default()
		.predict_entries(market_trip(), &history(""))
		.unwrap();

	assert_eq!(
		accounts(&result[0]),
		vec!["Assets:Checking", "Expenses:Groceries"]
	);

	let txn = result[0].as_transaction().unwrap();
	assert_eq!(
		txn.postings()[1].amount().unwrap().to_string(),
		"25.00 USD"
	);
	assert!(txn.meta().contains_key(ACCOUNT_CONFIDENCE));
}

#[test]
fn test_linear_svm_predicts_counterparty() {
	let predictor = PredictPostings::new(PredictorOptions {
		classifier: ClassifierKind::LinearSvm,
		..Default::default()
	});
	let result = predictor
		.predict_entries(market_trip(), &history(""))
		.unwrap();

	assert_eq!(
		accounts(&result[0]),
		vec!["Assets:Checking", "Expenses:Groceries"]
	);
	assert!(result[0].as_transaction().unwrap().imbalances().is_empty());
}

#[test]
fn test_completed_leg_is_a_new_account() {
	// Without the accounts feature the import account itself is the
	// most common label in the history
	let predictor = PredictPostings::new(PredictorOptions {
		features: Some(vec![
			FeatureSpec {
				attribute: Attribute::Narration,
				weight: 0.8,
			},
			FeatureSpec {
				attribute: Attribute::Day,
				weight: 0.1,
			},
		]),
		..Default::default()
	});
	let imported =
		parse("2024-03-15 Pharmacy\n\tAssets:Checking  -25.00 USD\n");

	let result = predictor.predict_entries(imported, &history("")).unwrap();
	let legs = accounts(&result[0]);
	assert_eq!(legs.len(), 2);

	let added: Vec<&String> = legs
		.iter()
		.filter(|a| a.as_str() != "Assets:Checking")
		.collect();
	assert_eq!(added.len(), 1);
	assert!(
		["Expenses:Groceries", "Expenses:Transport"]
			.contains(&added[0].as_str())
	);
}

#[test]
fn test_suggested_payees_ranked() {
	let predictor = PredictPayees::new(PredictorOptions {
		suggest: true,
		..Default::default()
	});
	let result = predictor
		.predict_entries(market_trip(), &history(""))
		.unwrap();

	let txn = result[0].as_transaction().unwrap();
	assert_eq!(txn.payee(), None);
	assert_eq!(
		txn.meta()[SUGGESTED_PAYEES],
		MetaValue::Text("[\"Green Grocer\",\"Fuel Co\"]".to_string())
	);
	assert!(!txn.meta().contains_key(PAYEE_CONFIDENCE));
}

#[test]
fn test_prediction_is_idempotent() {
	let predictor = PredictPostings::default();
	let existing = history("");

	let once = predictor.predict_entries(market_trip(), &existing).unwrap();
	let twice = predictor.predict_entries(once.clone(), &existing).unwrap();
	assert_eq!(once, twice);
}

#[test]
fn test_predictors_commute() {
	let existing = history("");
	let postings = PredictPostings::default();
	let payees = PredictPayees::default();

	let postings_first = payees
		.predict_entries(
			postings.predict_entries(market_trip(), &existing).unwrap(),
			&existing,
		)
		.unwrap();
	let payees_first = postings
		.predict_entries(
			payees.predict_entries(market_trip(), &existing).unwrap(),
			&existing,
		)
		.unwrap();

	assert_eq!(postings_first, payees_first);
	let txn = postings_first[0].as_transaction().unwrap();
	assert!(txn.payee().is_some());
	assert_eq!(txn.postings().len(), 2);
}

#[test]
fn test_single_payee_predicted_with_full_confidence() {
	let existing = parse(
		"
2024-01-01 Landlord | Monthly rent
	Assets:Checking  -1000.00 USD
	Expenses:Rent

2024-02-01 Landlord | Monthly rent
	Assets:Checking  -1000.00 USD
	Expenses:Rent
",
	);
	let imported = parse(
		"2024-03-01 Monthly rent\n\tAssets:Checking  -1000.00 USD\n\tExpenses:Rent\n",
	);

	let result = PredictPayees::default()
		.predict_entries(imported, &existing)
		.unwrap();
	let txn = result[0].as_transaction().unwrap();
	assert_eq!(txn.payee().unwrap(), "Landlord");
	assert_eq!(txn.meta()[PAYEE_CONFIDENCE].to_string(), "1.0000");
}

#[test]
fn test_single_account_history_predicts_it() {
	let existing = parse("2024-01-01 Rent\n\tExpenses:Rent  1000.00 USD\n");
	let imported = parse(
		"2024-03-01 Rent\n\tAssets:Checking  -1000.00 USD\n\tEquity:PLACEHOLDER\n",
	);

	let result = PredictPostings::default()
		.predict_entries(imported, &existing)
		.unwrap();
	assert_eq!(accounts(&result[0]), vec!["Assets:Checking", "Expenses:Rent"]);

	let txn = result[0].as_transaction().unwrap();
	assert_eq!(
		txn.postings()[1].amount().unwrap().to_string(),
		"1000.00 USD"
	);
	assert_eq!(txn.meta()[ACCOUNT_CONFIDENCE].to_string(), "1.0000");
}

#[test]
fn test_no_history_passes_through() {
	let result = PredictPostings::default()
		.predict_entries(market_trip(), &[])
		.unwrap();
	assert_eq!(result, market_trip());
}

#[test]
fn test_complete_and_ambiguous_transactions_untouched() {
	let imported = parse(
		"
2024-03-15 Local Market
	Assets:Checking  -25.00 USD
	Expenses:Food

2024-03-16 Local Market
	Assets:Checking  -25.00 USD
	Equity:PLACEHOLDER  10.00 USD
	Equity:PLACEHOLDER
",
	);

	let result = PredictPostings::default()
		.predict_entries(imported.clone(), &history(""))
		.unwrap();
	assert_eq!(result, imported);
}

#[test]
fn test_closed_account_never_predicted() {
	let existing = history(
		"
!2024-01-01 open Assets:Checking
!2024-01-01 open Expenses:Groceries
!2024-01-01 open Expenses:Transport
!2024-03-12 close Expenses:Groceries
",
	);

	let result = PredictPostings::default()
		.predict_entries(market_trip(), &existing)
		.unwrap();
	assert_eq!(
		accounts(&result[0]),
		vec!["Assets:Checking", "Expenses:Transport"]
	);
}

#[test]
fn test_nothing_admissible_leaves_transaction() {
	let existing = history(
		"
!2024-01-01 open Assets:Checking
!2024-01-01 open Expenses:Groceries
!2024-01-01 open Expenses:Transport
!2024-03-12 close Assets:Checking
!2024-03-12 close Expenses:Groceries
!2024-03-12 close Expenses:Transport
",
	);

	let result = PredictPostings::default()
		.predict_entries(market_trip(), &existing)
		.unwrap();
	assert_eq!(result, market_trip());
}

#[test]
fn test_training_data_overrides_existing() {
	let predictor = PredictPostings::new(PredictorOptions {
		training_data: Some(history("")),
		..Default::default()
	});

	let result = predictor.predict_entries(market_trip(), &[]).unwrap();
	assert_eq!(
		accounts(&result[0]),
		vec!["Assets:Checking", "Expenses:Groceries"]
	);
}

#[test]
fn test_wrap_and_hook_agree() {
	let existing = history("");

	let wrapped = PredictPostings::default().wrap(StaticImporter {
		entries: market_trip(),
		account: Some("Assets:Checking".to_string()),
	});
	let hooked = apply_hooks(
		Box::new(StaticImporter {
			entries: market_trip(),
			account: Some("Assets:Checking".to_string()),
		}),
		vec![Box::new(PredictPostings::default())],
	);

	assert_eq!(wrapped.name(), "static");
	let from_wrap = wrapped.extract("statement.csv", &existing).unwrap();
	let from_hook = hooked.extract("statement.csv", &existing).unwrap();
	assert_eq!(from_wrap, from_hook);
	assert_eq!(
		accounts(&from_wrap[0]),
		vec!["Assets:Checking", "Expenses:Groceries"]
	);
}

#[test]
fn test_importer_account_restricts_training() {
	let importer = PredictPostings::default().wrap(StaticImporter {
		entries: market_trip(),
		account: Some("Assets:Savings".to_string()),
	});

	let result = importer.extract("statement.csv", &history("")).unwrap();
	assert_eq!(result, market_trip());
}

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
use crate::gl::entry::{Entry, MetaValue, Transaction};
use crate::import::importer::{Importer, ImporterHook};
use crate::predict::features::{Attribute, FeatureSpec};
use crate::predict::predictor::{
	confidence_meta, EntryPredictor, PredictorOptions,
};
use crate::predict::records::{payee_examples, Record, TrainingExample};
use anyhow::Error;

pub const SUGGESTED_PAYEES: &str = "__suggested_payees__";
pub const PAYEE_CONFIDENCE: &str = "__payee_confidence__";

/// Fills in payees from the payees of similar transactions.
#[derive(Clone, Default)]
pub struct PredictPayees {
	options: PredictorOptions,
}

impl PredictPayees {
	pub fn new(options: PredictorOptions) -> Self {
		Self { options }
	}
}

impl EntryPredictor for PredictPayees {
	fn name(&self) -> &'static str {
		"payees"
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
				attribute: Attribute::Day,
				weight: 0.1,
			},
		]
	}

	fn check_feature(&self, attribute: &Attribute) -> Result<(), PredictError> {
		match attribute {
			Attribute::Accounts => Err(PredictError::invalid_feature(
				"accounts",
				"postings are predicted separately",
			)),
			_ => Ok(()),
		}
	}

	fn training_examples<'a>(
		&self,
		txns: &[&'a Transaction],
	) -> Vec<TrainingExample<'a>> {
		payee_examples(txns)
	}

	fn target<'a>(&self, txn: &'a Transaction) -> Option<Record<'a>> {
		if txn.payee().is_some() && !self.options.overwrite {
			return None;
		}
		Some(Record::new(txn))
	}

	fn apply_prediction(
		&self,
		txn: &Transaction,
		label: &str,
		confidence: f64,
	) -> Transaction {
		txn.with_payee(label)
			.with_meta(vec![(PAYEE_CONFIDENCE, confidence_meta(confidence))])
	}

	fn apply_suggestions(
		&self,
		txn: &Transaction,
		labels: &[String],
	) -> Result<Transaction, Error> {
		let json = serde_json::to_string(labels)?;
		Ok(txn.with_meta(vec![(SUGGESTED_PAYEES, MetaValue::Text(json))]))
	}
}

impl ImporterHook for PredictPayees {
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

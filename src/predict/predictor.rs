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
use crate::config::config_file::{Predict, Target};
use crate::error::PredictError;
use crate::gl::accounts::OpenAccounts;
use crate::gl::entry::{Entry, MetaValue, Transaction, PLACEHOLDER};
use crate::import::importer::{ImportBatch, Importer};
use crate::import::wrapper::PredictingImporter;
use crate::predict::classifier::ClassifierKind;
use crate::predict::features::{
	default_tokenizer, Attribute, FeatureSpec, Tokenizer,
};
use crate::predict::pipeline::{Model, PipelineBuilder};
use crate::predict::records::{
	transactions, Record, TrainingExample, TrainingFilter,
};
use anyhow::Error;
use tracing::{debug, info, warn};

/// How a predictor is trained and what it does with its predictions.
#[derive(Clone)]
pub struct PredictorOptions {
	/// Rewrite transactions with the best prediction
	pub predict: bool,
	/// Replace a value that is already there
	pub overwrite: bool,
	/// Attach a ranked list of candidates as metadata instead of rewriting
	pub suggest: bool,
	/// Learn from these entries rather than the ones an import is given
	pub training_data: Option<Vec<Entry>>,
	/// Only learn from transactions touching an account with this prefix
	pub account: Option<String>,
	/// Never learn from transactions touching these accounts
	pub denylist_accounts: Vec<String>,
	pub string_tokenizer: Option<Tokenizer>,
	pub placeholder_account: String,
	/// Overrides the predictor's own feature set
	pub features: Option<Vec<FeatureSpec>>,
	pub classifier: ClassifierKind,
}

impl Default for PredictorOptions {
	fn default() -> Self {
		Self {
			predict: true,
			overwrite: false,
			suggest: false,
			training_data: None,
			account: None,
			denylist_accounts: vec![],
			string_tokenizer: None,
			placeholder_account: PLACEHOLDER.to_string(),
			features: None,
			classifier: ClassifierKind::default(),
		}
	}
}

impl PredictorOptions {
	pub fn from_config(
		predict: &Predict,
		target: Option<&Target>,
	) -> Result<Self, Error> {
		let mut options = Self {
			account: predict.account.clone(),
			denylist_accounts: predict
				.denylist_accounts
				.clone()
				.unwrap_or_default(),
			..Default::default()
		};

		if let Some(placeholder) = &predict.placeholder_account {
			options.placeholder_account = placeholder.clone();
		}

		if let Some(classifier) = &predict.classifier {
			options.classifier = ClassifierKind::from_str(classifier)?;
		}

		if let Some(target) = target {
			options.predict = target.predict.unwrap_or(options.predict);
			options.suggest = target.suggest.unwrap_or(options.suggest);
			options.overwrite = target.overwrite.unwrap_or(options.overwrite);
			if let Some(table) = &target.features {
				options.features = Some(FeatureSpec::from_table(table)?);
			}
		}

		Ok(options)
	}
}

/// Rounds a confidence for storage in metadata.
pub fn confidence_meta(confidence: f64) -> MetaValue {
	MetaValue::parse(&format!("{:.4}", confidence))
}

/// The shared machinery of a predictor: learn a label from history, then
/// fill it in on the transactions an import produced. Implementors decide
/// what the label is, which transactions want one, and how it is written.
pub trait EntryPredictor {
	/// Name used in logs
	fn name(&self) -> &'static str;

	fn options(&self) -> &PredictorOptions;

	fn default_features(&self) -> Vec<FeatureSpec>;

	/// Rejects attributes this predictor must not read.
	fn check_feature(&self, attribute: &Attribute) -> Result<(), PredictError>;

	fn training_examples<'a>(
		&self,
		txns: &[&'a Transaction],
	) -> Vec<TrainingExample<'a>>;

	/// The record to classify, if the transaction wants a prediction.
	fn target<'a>(&self, txn: &'a Transaction) -> Option<Record<'a>>;

	fn apply_prediction(
		&self,
		txn: &Transaction,
		label: &str,
		confidence: f64,
	) -> Transaction;

	fn apply_suggestions(
		&self,
		txn: &Transaction,
		labels: &[String],
	) -> Result<Transaction, Error>;

	/// Whether a label may be written onto the given transaction.
	fn is_admissible(
		&self,
		_label: &str,
		_txn: &Transaction,
		_open_accounts: &OpenAccounts,
	) -> bool {
		true
	}

	/// The configured features, checked.
	fn features(&self) -> Result<Vec<FeatureSpec>, PredictError> {
		let features = self
			.options()
			.features
			.clone()
			.unwrap_or_else(|| self.default_features());

		for spec in &features {
			if let Attribute::Meta(key) = &spec.attribute {
				if key.starts_with("__") {
					return Err(PredictError::invalid_feature(
						&spec.attribute.to_string(),
						"reserved for annotations",
					));
				}
			}
			self.check_feature(&spec.attribute)?;
		}

		Ok(features)
	}

	fn pipeline(&self) -> Result<PipelineBuilder, PredictError> {
		let tokenizer = self
			.options()
			.string_tokenizer
			.clone()
			.unwrap_or_else(default_tokenizer);
		Ok(PipelineBuilder::new(
			self.features()?,
			tokenizer,
			self.options().classifier,
		))
	}

	/// Fits a model on the transactions of the history the filter admits.
	/// None means there was nothing to learn from.
	fn train(
		&self,
		pipeline: &PipelineBuilder,
		history: &[Entry],
		filter: &TrainingFilter,
	) -> Result<Option<Model>, Error> {
		let txns = filter.apply(history);
		let total = transactions(history).count();

		if txns.is_empty() {
			if total > 0 {
				warn!(
					"{}: cannot train, none of the training data matches the accounts",
					self.name()
				);
			} else {
				warn!("{}: cannot train, no training data found", self.name());
			}
			return Ok(None);
		}
		debug!(
			"{}: loaded {} training transactions, filtered from {}",
			self.name(),
			txns.len(),
			total
		);

		let examples = self.training_examples(&txns);
		let model = pipeline.fit(&examples)?;
		match &model {
			Some(model) => debug!(
				"{}: trained on {} possible targets",
				self.name(),
				model.labels().len()
			),
			None => {
				warn!("{}: cannot train, there are no targets", self.name())
			},
		}

		Ok(model)
	}

	/// Applies the model to every transaction that wants a prediction.
	/// Everything else is passed through in place.
	fn process_entries(
		&self,
		imported: Vec<Entry>,
		model: &Model,
		open_accounts: &OpenAccounts,
	) -> Result<Vec<Entry>, Error> {
		let options = self.options();
		if !options.predict && !options.suggest {
			return Ok(imported);
		}

		let mut changed = 0;
		let mut entries = Vec::with_capacity(imported.len());

		for entry in imported {
			let txn = match &entry {
				Entry::Transaction(t) => t,
				_ => {
					entries.push(entry);
					continue;
				},
			};

			let record = match self.target(txn) {
				Some(r) => r,
				None => {
					entries.push(entry);
					continue;
				},
			};

			let ranked: Vec<(String, f64)> = model
				.ranked(&record)
				.into_iter()
				.filter(|(label, _)| self.is_admissible(label, txn, open_accounts))
				.collect();

			let updated = if ranked.is_empty() {
				debug!("{}: no admissible label for {}", self.name(), txn.date());
				None
			} else if options.suggest {
				let labels: Vec<String> =
					ranked.iter().map(|(l, _)| l.clone()).collect();
				Some(self.apply_suggestions(txn, &labels)?)
			} else {
				let (label, confidence) = &ranked[0];
				Some(self.apply_prediction(txn, label, *confidence))
			};

			match updated {
				Some(t) => {
					changed += 1;
					entries.push(Entry::Transaction(t));
				},
				None => entries.push(entry),
			}
		}

		debug!("{}: added predictions to {} transactions", self.name(), changed);
		Ok(entries)
	}

	/// Predicts for each imported batch in turn, retraining per batch on
	/// the history restricted to that batch's account.
	fn hook(
		&self,
		batches: Vec<ImportBatch>,
		existing: &[Entry],
	) -> Result<Vec<ImportBatch>, Error> {
		let options = self.options();
		let history = options.training_data.as_deref().unwrap_or(existing);
		let open_accounts = OpenAccounts::from_entries(history);
		let pipeline = self.pipeline()?;

		let mut result = Vec::with_capacity(batches.len());
		for batch in batches {
			let account = batch.account.as_deref().or(options.account.as_deref());
			let filter = TrainingFilter {
				account,
				denylist: &options.denylist_accounts,
				open_accounts: &open_accounts,
				placeholder: &options.placeholder_account,
			};

			let entries = match self.train(&pipeline, history, &filter)? {
				Some(model) => {
					info!("{}: predicting for {}", self.name(), batch.path);
					self.process_entries(batch.entries, &model, &open_accounts)?
				},
				None => batch.entries,
			};

			result.push(ImportBatch { entries, ..batch });
		}

		Ok(result)
	}

	/// Runs as an import hook: one batch, filtered to the account the
	/// importer reports for the file.
	fn apply_as_hook(
		&self,
		importer: &dyn Importer,
		path: &str,
		imported: Vec<Entry>,
		existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		let batch = ImportBatch {
			path: path.to_string(),
			entries: imported,
			account: importer.account(path),
		};

		let mut result = self.hook(vec![batch], existing)?;
		Ok(result.pop().map(|b| b.entries).unwrap_or_default())
	}

	/// Predicts for a single set of imported entries.
	fn predict_entries(
		&self,
		imported: Vec<Entry>,
		existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		let batch = ImportBatch {
			path: String::new(),
			entries: imported,
			account: None,
		};

		let mut result = self.hook(vec![batch], existing)?;
		Ok(result.pop().map(|b| b.entries).unwrap_or_default())
	}

	/// Wraps an importer so that its output passes through this predictor.
	fn wrap<I: Importer>(self, importer: I) -> PredictingImporter<I, Self>
	where
		Self: Sized,
	{
		PredictingImporter::new(importer, self)
	}
}

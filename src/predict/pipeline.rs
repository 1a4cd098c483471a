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
use crate::predict::classifier::{Classifier, ClassifierKind, SparseVector};
use crate::predict::features::{
	FeatureKind, FeatureSpec, FeatureValue, Tokenizer,
};
use crate::predict::records::{Record, TrainingExample};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Longest word n-gram taken from text features.
const MAX_NGRAM: usize = 3;

/// All word n-grams of 1 to MAX_NGRAM tokens, in order of length.
fn ngrams(tokens: &[String]) -> Vec<String> {
	(1..=MAX_NGRAM)
		.flat_map(|n| tokens.windows(n).map(|w| w.join(" ")))
		.collect()
}

/// Turns the values of one feature into a block of columns. Columns are
/// assigned at fit time in sorted order; anything unseen then is dropped.
#[derive(Debug)]
enum Vectorizer {
	Text(BTreeMap<String, usize>),
	Categorical(BTreeMap<String, usize>),
	Numeric,
}

impl Vectorizer {
	fn fit(
		kind: FeatureKind,
		values: &[FeatureValue],
		tokenizer: &Tokenizer,
	) -> Self {
		let mut terms: BTreeSet<String> = BTreeSet::new();
		for value in values {
			match value {
				FeatureValue::Text(text) => terms.extend(ngrams(&tokenizer(text))),
				FeatureValue::Categories(c) => terms.extend(c.iter().cloned()),
				FeatureValue::Number(_) => {},
			}
		}

		let columns = terms
			.into_iter()
			.enumerate()
			.map(|(i, term)| (term, i))
			.collect();

		match kind {
			FeatureKind::Text => Vectorizer::Text(columns),
			FeatureKind::Categorical => Vectorizer::Categorical(columns),
			FeatureKind::Numeric => Vectorizer::Numeric,
		}
	}

	fn width(&self) -> usize {
		match self {
			Vectorizer::Text(columns) | Vectorizer::Categorical(columns) => {
				columns.len()
			},
			Vectorizer::Numeric => 1,
		}
	}

	fn transform(
		&self,
		value: &FeatureValue,
		tokenizer: &Tokenizer,
		offset: usize,
		weight: f64,
	) -> SparseVector {
		let mut counts: BTreeMap<usize, f64> = BTreeMap::new();

		match (self, value) {
			(Vectorizer::Text(columns), FeatureValue::Text(text)) => {
				for gram in ngrams(&tokenizer(text)) {
					if let Some(&column) = columns.get(&gram) {
						*counts.entry(column).or_default() += 1.0;
					}
				}
			},
			(Vectorizer::Categorical(columns), FeatureValue::Categories(c)) => {
				for category in c {
					if let Some(&column) = columns.get(category) {
						counts.insert(column, 1.0);
					}
				}
			},
			(Vectorizer::Numeric, FeatureValue::Number(n)) => {
				counts.insert(0, *n);
			},
			_ => {},
		}

		counts
			.into_iter()
			.filter(|(_, v)| *v != 0.0)
			.map(|(column, v)| (offset + column, v * weight))
			.collect()
	}
}

/// Assembles feature extraction, vectorization and a classifier into
/// something that can be trained on examples.
#[derive(Clone)]
pub struct PipelineBuilder {
	features: Vec<FeatureSpec>,
	tokenizer: Tokenizer,
	classifier: ClassifierKind,
}

impl PipelineBuilder {
	pub fn new(
		features: Vec<FeatureSpec>,
		tokenizer: Tokenizer,
		classifier: ClassifierKind,
	) -> Self {
		Self {
			features,
			tokenizer,
			classifier,
		}
	}

	/// Trains a model on the given examples. Returns None when there is
	/// nothing to learn from, and a constant model when every example
	/// carries the same label.
	pub fn fit(
		&self,
		examples: &[TrainingExample],
	) -> Result<Option<Model>, PredictError> {
		if examples.is_empty() {
			return Ok(None);
		}

		let labels: Vec<String> = examples
			.iter()
			.map(|e| e.label.clone())
			.collect::<BTreeSet<String>>()
			.into_iter()
			.collect();

		if labels.len() == 1 {
			debug!("only one target possible: {}", labels[0]);
			return Ok(Some(Model::Constant(labels[0].clone())));
		}

		let mut vectorizers = vec![];
		for spec in &self.features {
			let values: Vec<FeatureValue> = examples
				.iter()
				.map(|e| spec.attribute.extract(&e.record))
				.collect();
			vectorizers.push(Vectorizer::fit(
				spec.attribute.kind(),
				&values,
				&self.tokenizer,
			));
		}

		let mut pipeline = FittedPipeline {
			features: self.features.clone(),
			tokenizer: self.tokenizer.clone(),
			offsets: vec![],
			vectorizers,
			classifier: self.classifier.build(),
			labels,
		};

		let mut width = 0;
		for vectorizer in &pipeline.vectorizers {
			pipeline.offsets.push(width);
			width += vectorizer.width();
		}

		let vectors: Vec<SparseVector> = examples
			.iter()
			.map(|e| pipeline.vectorize(&e.record))
			.collect();
		let targets: Vec<usize> = examples
			.iter()
			.map(|e| pipeline.label_index(&e.label))
			.collect::<Result<_, _>>()?;

		pipeline.classifier.fit(
			&vectors,
			&targets,
			width,
			pipeline.labels.len(),
		)?;
		debug!(
			"trained on {} examples, {} labels, {} columns",
			examples.len(),
			pipeline.labels.len(),
			width
		);

		Ok(Some(Model::Fitted(pipeline)))
	}
}

/// A trained pipeline, ready to score records.
pub struct FittedPipeline {
	features: Vec<FeatureSpec>,
	tokenizer: Tokenizer,
	vectorizers: Vec<Vectorizer>,
	offsets: Vec<usize>,
	classifier: Box<dyn Classifier>,
	/// Sorted; a class index is a position in here
	labels: Vec<String>,
}

impl FittedPipeline {
	fn vectorize(&self, record: &Record) -> SparseVector {
		let mut vector = vec![];
		for ((spec, vectorizer), &offset) in self
			.features
			.iter()
			.zip(&self.vectorizers)
			.zip(&self.offsets)
		{
			let value = spec.attribute.extract(record);
			vector.extend(vectorizer.transform(
				&value,
				&self.tokenizer,
				offset,
				spec.weight,
			));
		}
		vector
	}

	fn label_index(&self, label: &str) -> Result<usize, PredictError> {
		self.labels
			.binary_search_by(|l| l.as_str().cmp(label))
			.map_err(|_| {
				PredictError::Classifier(format!("unknown label {}", label))
			})
	}
}

/// What training produced for one prediction target.
pub enum Model {
	/// Every example had this label
	Constant(String),
	Fitted(FittedPipeline),
}

impl Model {
	/// Every label the model knows, best first, with its confidence. Equal
	/// confidences keep alphabetical order.
	pub fn ranked(&self, record: &Record) -> Vec<(String, f64)> {
		match self {
			Model::Constant(label) => vec![(label.clone(), 1.0)],
			Model::Fitted(pipeline) => {
				let vector = pipeline.vectorize(record);
				let confidence = pipeline.classifier.predict_confidence(&vector);

				let mut ranked: Vec<(String, f64)> = pipeline
					.labels
					.iter()
					.cloned()
					.zip(confidence)
					.collect();
				ranked.sort_by(|a, b| {
					b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
				});
				ranked
			},
		}
	}

	pub fn labels(&self) -> Vec<&String> {
		match self {
			Model::Constant(label) => vec![label],
			Model::Fitted(pipeline) => pipeline.labels.iter().collect(),
		}
	}
}

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
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Column index -> value, for the columns that are not zero.
pub type SparseVector = Vec<(usize, f64)>;

/// A multi-class classifier over sparse vectors. Classes are numbered
/// 0..n_classes by the caller.
pub trait Classifier {
	fn fit(
		&mut self,
		vectors: &[SparseVector],
		labels: &[usize],
		n_features: usize,
		n_classes: usize,
	) -> Result<(), PredictError>;

	/// One score per class; higher is more likely.
	fn decision_function(&self, vector: &SparseVector) -> Vec<f64>;

	/// One confidence per class, summing to 1. Scores are normalized with a
	/// softmax, which for log-likelihood scores is the posterior.
	fn predict_confidence(&self, vector: &SparseVector) -> Vec<f64> {
		softmax(&self.decision_function(vector))
	}
}

fn softmax(scores: &[f64]) -> Vec<f64> {
	let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
	let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
	let sum: f64 = exp.iter().sum();
	exp.iter().map(|e| e / sum).collect()
}

fn check_shape(
	vectors: &[SparseVector],
	labels: &[usize],
	n_features: usize,
	n_classes: usize,
) -> Result<(), PredictError> {
	if vectors.len() != labels.len() {
		return Err(PredictError::Classifier(format!(
			"{} vectors but {} labels",
			vectors.len(),
			labels.len()
		)));
	}

	if n_classes < 2 {
		return Err(PredictError::Classifier(
			"at least two classes are required".to_string(),
		));
	}

	if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
		return Err(PredictError::Classifier(format!(
			"label {} out of range",
			label
		)));
	}

	let out_of_range = vectors
		.iter()
		.flatten()
		.any(|&(column, _)| column >= n_features);
	if out_of_range {
		return Err(PredictError::Classifier(
			"feature index out of range".to_string(),
		));
	}

	Ok(())
}

/// Which classifier a predictor trains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClassifierKind {
	#[default]
	NaiveBayes,
	LinearSvm,
}

impl ClassifierKind {
	pub fn from_str(s: &str) -> Result<Self, PredictError> {
		match s {
			"naive_bayes" => Ok(ClassifierKind::NaiveBayes),
			"linear_svm" => Ok(ClassifierKind::LinearSvm),
			_ => Err(PredictError::UnknownClassifier(s.to_string())),
		}
	}

	pub fn build(&self) -> Box<dyn Classifier> {
		match self {
			ClassifierKind::NaiveBayes => Box::new(NaiveBayes::new(1.0)),
			ClassifierKind::LinearSvm => Box::new(LinearSvm::new()),
		}
	}
}

/// Multinomial naive Bayes with additive smoothing.
#[derive(Debug)]
pub struct NaiveBayes {
	alpha: f64,
	class_log_prior: Vec<f64>,
	/// class -> column -> log probability
	feature_log_prob: Vec<Vec<f64>>,
}

impl NaiveBayes {
	pub fn new(alpha: f64) -> Self {
		Self {
			alpha,
			class_log_prior: vec![],
			feature_log_prob: vec![],
		}
	}
}

impl Classifier for NaiveBayes {
	fn fit(
		&mut self,
		vectors: &[SparseVector],
		labels: &[usize],
		n_features: usize,
		n_classes: usize,
	) -> Result<(), PredictError> {
		check_shape(vectors, labels, n_features, n_classes)?;

		let mut class_count = vec![0.0; n_classes];
		let mut feature_count = vec![vec![0.0; n_features]; n_classes];

		for (vector, &label) in vectors.iter().zip(labels) {
			class_count[label] += 1.0;
			for &(column, value) in vector {
				if value < 0.0 {
					return Err(PredictError::Classifier(
						"naive bayes requires non-negative features".to_string(),
					));
				}
				feature_count[label][column] += value;
			}
		}

		let total = vectors.len() as f64;
		self.class_log_prior =
			class_count.iter().map(|c| (c / total).ln()).collect();

		let smoothing = self.alpha * n_features as f64;
		self.feature_log_prob = feature_count
			.iter()
			.map(|counts| {
				let class_total: f64 = counts.iter().sum();
				counts
					.iter()
					.map(|c| ((c + self.alpha) / (class_total + smoothing)).ln())
					.collect()
			})
			.collect();

		Ok(())
	}

	fn decision_function(&self, vector: &SparseVector) -> Vec<f64> {
		self.class_log_prior
			.iter()
			.zip(&self.feature_log_prob)
			.map(|(prior, log_prob)| {
				prior
					+ vector
						.iter()
						.map(|&(column, value)| value * log_prob[column])
						.sum::<f64>()
			})
			.collect()
	}
}

/// Below this the scaled weights are folded back in, before precision is
/// lost.
const MIN_SCALE: f64 = 1e-9;

/// One-vs-rest linear SVM trained by stochastic sub-gradient descent on the
/// hinge loss (Pegasos). Visiting order comes from a fixed seed, so a given
/// training set always yields the same model.
#[derive(Debug)]
pub struct LinearSvm {
	lambda: f64,
	epochs: usize,
	seed: u64,
	/// class -> weights, with the bias in the last column
	weights: Vec<Vec<f64>>,
}

impl Default for LinearSvm {
	fn default() -> Self {
		Self::new()
	}
}

impl LinearSvm {
	pub fn new() -> Self {
		Self {
			lambda: 0.01,
			epochs: 50,
			seed: 42,
			weights: vec![],
		}
	}

	fn score(weights: &[f64], vector: &SparseVector) -> f64 {
		let bias = weights[weights.len() - 1];
		bias + vector
			.iter()
			.map(|&(column, value)| value * weights[column])
			.sum::<f64>()
	}

	fn fit_binary(
		&self,
		vectors: &[SparseVector],
		targets: &[f64],
		n_features: usize,
	) -> Vec<f64> {
		// The weights are scale * v, so that shrinking them every step
		// only touches scale and an update only touches nonzero columns
		let mut v = vec![0.0; n_features + 1];
		let mut scale = 1.0;
		let mut order: Vec<usize> = (0..vectors.len()).collect();
		let mut rng = StdRng::seed_from_u64(self.seed);
		let mut t = 0.0;

		for _ in 0..self.epochs {
			order.shuffle(&mut rng);
			for &i in &order {
				t += 1.0;
				let eta = 1.0 / (self.lambda * t);
				let y = targets[i];
				let margin = y * scale * Self::score(&v, &vectors[i]);

				let decay = 1.0 - eta * self.lambda;
				if decay <= 0.0 {
					v.iter_mut().for_each(|w| *w = 0.0);
					scale = 1.0;
				} else {
					scale *= decay;
				}

				if margin < 1.0 {
					let step = eta * y / scale;
					for &(column, value) in &vectors[i] {
						v[column] += step * value;
					}
					v[n_features] += step;
				}

				if scale < MIN_SCALE {
					v.iter_mut().for_each(|w| *w *= scale);
					scale = 1.0;
				}
			}
		}

		v.iter_mut().for_each(|w| *w *= scale);
		v
	}
}

impl Classifier for LinearSvm {
	fn fit(
		&mut self,
		vectors: &[SparseVector],
		labels: &[usize],
		n_features: usize,
		n_classes: usize,
	) -> Result<(), PredictError> {
		check_shape(vectors, labels, n_features, n_classes)?;

		self.weights = (0..n_classes)
			.map(|class| {
				let targets: Vec<f64> = labels
					.iter()
					.map(|&l| if l == class { 1.0 } else { -1.0 })
					.collect();
				self.fit_binary(vectors, &targets, n_features)
			})
			.collect();

		Ok(())
	}

	fn decision_function(&self, vector: &SparseVector) -> Vec<f64> {
		self.weights
			.iter()
			.map(|weights| Self::score(weights, vector))
			.collect()
	}
}

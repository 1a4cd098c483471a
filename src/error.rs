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
use thiserror::Error;

/// Defects in how prediction was set up, as opposed to gaps in the data it
/// was given. These always reach the caller.
#[derive(Error, Debug, PartialEq)]
pub enum PredictError {
	#[error("Invalid feature {attribute}: {reason}")]
	InvalidFeature { attribute: String, reason: String },

	#[error("Unknown classifier: {0}")]
	UnknownClassifier(String),

	#[error("Classifier error: {0}")]
	Classifier(String),
}

impl PredictError {
	pub fn invalid_feature(attribute: &str, reason: &str) -> Self {
		PredictError::InvalidFeature {
			attribute: attribute.to_string(),
			reason: reason.to_string(),
		}
	}
}

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
use crate::predict::records::Record;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Splits text into the ordered tokens a text feature is built from.
pub type Tokenizer = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Lowercases and keeps runs of two or more word characters.
pub fn default_tokenizer() -> Tokenizer {
	let word = Regex::new(r"\b\w\w+\b").unwrap();
	Arc::new(move |text: &str| {
		let lower = text.to_lowercase();
		word.find_iter(&lower)
			.map(|m| m.as_str().to_string())
			.collect()
	})
}

/// How an attribute's values are turned into vector columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureKind {
	/// Bag of word n-grams
	Text,
	/// One column per distinct value
	Categorical,
	/// A single column holding the value itself
	Numeric,
}

/// A value read off a transaction for one attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureValue {
	Text(String),
	Categories(Vec<String>),
	Number(f64),
}

/// Something about a transaction a classifier can learn from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Attribute {
	Narration,
	Payee,
	/// Accounts of the other known postings on the same transaction
	Accounts,
	Weekday,
	Day,
	Month,
	/// A metadata field, by key
	Meta(String),
}

impl Attribute {
	pub fn from_str(s: &str) -> Result<Self, PredictError> {
		match s {
			"narration" => Ok(Attribute::Narration),
			"payee" => Ok(Attribute::Payee),
			"accounts" => Ok(Attribute::Accounts),
			"date.weekday" => Ok(Attribute::Weekday),
			"date.day" => Ok(Attribute::Day),
			"date.month" => Ok(Attribute::Month),
			_ => match s.strip_prefix("meta.") {
				Some(key) if !key.is_empty() => {
					Ok(Attribute::Meta(key.to_string()))
				},
				_ => Err(PredictError::invalid_feature(s, "unknown attribute")),
			},
		}
	}

	pub fn kind(&self) -> FeatureKind {
		match self {
			Attribute::Narration | Attribute::Payee | Attribute::Meta(_) => {
				FeatureKind::Text
			},
			Attribute::Accounts | Attribute::Weekday => {
				FeatureKind::Categorical
			},
			Attribute::Day | Attribute::Month => FeatureKind::Numeric,
		}
	}

	/// Reads this attribute from a record. Anything missing reads as empty.
	pub fn extract(&self, record: &Record) -> FeatureValue {
		let txn = record.txn;
		match self {
			Attribute::Narration => FeatureValue::Text(txn.narration().clone()),
			Attribute::Payee => {
				FeatureValue::Text(txn.payee().cloned().unwrap_or_default())
			},
			Attribute::Accounts => FeatureValue::Categories(
				record.context.iter().map(|a| a.to_string()).collect(),
			),
			Attribute::Weekday => FeatureValue::Categories(vec![txn
				.date()
				.weekday()
				.to_string()]),
			Attribute::Day => FeatureValue::Number(txn.date().day() as f64),
			Attribute::Month => FeatureValue::Number(txn.date().month() as f64),
			Attribute::Meta(key) => FeatureValue::Text(
				txn.meta()
					.get(key)
					.map(|v| v.to_string())
					.unwrap_or_default(),
			),
		}
	}
}

impl fmt::Display for Attribute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Attribute::Narration => write!(f, "narration"),
			Attribute::Payee => write!(f, "payee"),
			Attribute::Accounts => write!(f, "accounts"),
			Attribute::Weekday => write!(f, "date.weekday"),
			Attribute::Day => write!(f, "date.day"),
			Attribute::Month => write!(f, "date.month"),
			Attribute::Meta(key) => write!(f, "meta.{}", key),
		}
	}
}

/// An attribute and how much its columns count against the others.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSpec {
	pub attribute: Attribute,
	pub weight: f64,
}

impl FeatureSpec {
	pub fn new(attribute: Attribute, weight: f64) -> Result<Self, PredictError> {
		if !weight.is_finite() || weight < 0.0 {
			return Err(PredictError::invalid_feature(
				&attribute.to_string(),
				"weight must be a non-negative number",
			));
		}

		Ok(Self { attribute, weight })
	}

	/// Builds feature specs from an attribute name -> weight table.
	pub fn from_table(
		table: &BTreeMap<String, f64>,
	) -> Result<Vec<Self>, PredictError> {
		table
			.iter()
			.map(|(name, &weight)| Self::new(Attribute::from_str(name)?, weight))
			.collect()
	}
}

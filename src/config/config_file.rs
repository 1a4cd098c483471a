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
use anyhow::{anyhow, Error};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
	pub predict: Option<Predict>,
	pub hooks: Option<Hooks>,
}

impl Config {
	pub fn from_toml(content: &str) -> Result<Self, Error> {
		toml::from_str(content)
			.map_err(|e| anyhow!("failed to parse config: {}", e))
	}
}

/// Settings shared by both predictors.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Predict {
	/// If set, only learn from transactions touching an account with this
	/// prefix, usually the account being imported into.
	pub account: Option<String>,
	pub placeholder_account: Option<String>,
	/// `naive_bayes` or `linear_svm`
	pub classifier: Option<String>,
	pub denylist_accounts: Option<Vec<String>>,

	pub postings: Option<Target>,
	pub payees: Option<Target>,
}

/// Settings for one prediction target.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Target {
	pub enabled: Option<bool>,
	pub predict: Option<bool>,
	pub suggest: Option<bool>,
	pub overwrite: Option<bool>,

	/// attribute -> weight, e.g. `narration = 0.8`
	pub features: Option<BTreeMap<String, f64>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Hooks {
	pub detect_duplicates: Option<bool>,
	pub window_days: Option<i64>,
	pub trim_old_entries: Option<bool>,
	pub only_trim_duplicates: Option<bool>,
}

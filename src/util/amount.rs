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
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A decimal value with a currency.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Amount {
	pub currency: String,
	pub value: Decimal,
}

impl Amount {
	pub fn new(value: Decimal, currency: &str) -> Self {
		Self {
			value,
			currency: currency.to_string(),
		}
	}

	/// Parses a value as written in a ledger, ignoring thousands separators.
	pub fn parse(value: &str, currency: &str) -> Result<Self, Error> {
		let cleaned = value.replace(',', "");
		let value = Decimal::from_str(&cleaned)
			.map_err(|e| anyhow!("Invalid value {}: {}", value, e))?;
		Ok(Self::new(value, currency))
	}

	/// Sums amounts per currency, dropping currencies that net to zero.
	pub fn imbalances<'a>(
		amounts: impl IntoIterator<Item = &'a Amount>,
	) -> BTreeMap<String, Decimal> {
		let mut balances: BTreeMap<String, Decimal> = BTreeMap::new();
		for amount in amounts {
			*balances.entry(amount.currency.clone()).or_default() +=
				amount.value;
		}

		balances.retain(|_, value| !value.is_zero());
		balances
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.value, self.currency)
	}
}

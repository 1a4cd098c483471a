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
use crate::util::amount::Amount;
use crate::util::date::Date;
use anyhow::{bail, Error};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The account importers use for a counterparty they could not identify.
pub const PLACEHOLDER: &str = "Equity:PLACEHOLDER";

/// One directive of a ledger, in the order it appeared. Only transactions
/// are ever inspected in depth; everything else is carried along so that
/// the output of an import can be written back out as it came in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
	Transaction(Transaction),
	Open {
		date: Date,
		account: String,
	},
	Close {
		date: Date,
		account: String,
	},
	Balance {
		date: Date,
		account: String,
		amount: Amount,
	},
	/// Any other directive, kept verbatim (minus its date)
	Other {
		date: Date,
		directive: String,
	},
}

impl Entry {
	pub fn date(&self) -> &Date {
		match self {
			Entry::Transaction(t) => t.date(),
			Entry::Open { date, .. }
			| Entry::Close { date, .. }
			| Entry::Balance { date, .. }
			| Entry::Other { date, .. } => date,
		}
	}

	pub fn as_transaction(&self) -> Option<&Transaction> {
		match self {
			Entry::Transaction(t) => Some(t),
			_ => None,
		}
	}
}

/// Metadata attached to a transaction with `; key: value` lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetaValue {
	Text(String),
	Number(Decimal),
	Bool(bool),
}

impl MetaValue {
	pub fn parse(raw: &str) -> Self {
		let raw = raw.trim();
		match raw {
			"true" => return MetaValue::Bool(true),
			"false" => return MetaValue::Bool(false),
			_ => {},
		}

		// Only numbers that print back exactly as written; `00420` or
		// `1e3` stay text so the entry reprints unchanged
		match Decimal::from_str(raw) {
			Ok(n) if n.to_string() == raw => MetaValue::Number(n),
			_ => MetaValue::Text(raw.to_string()),
		}
	}

	pub fn is_true(&self) -> bool {
		matches!(self, MetaValue::Bool(true))
	}
}

impl fmt::Display for MetaValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MetaValue::Text(s) => write!(f, "{}", s),
			MetaValue::Number(n) => write!(f, "{}", n),
			MetaValue::Bool(b) => write!(f, "{}", b),
		}
	}
}

/// The units of a posting. An `Auto` posting has no written amount and
/// absorbs whatever the rest of the transaction leaves unbalanced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Units {
	Fixed(Amount),
	Auto,
}

/// A specific line item in a Transaction, indicating a credit or debit and
/// the associated account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Posting {
	account: String,
	units: Units,
}

impl Posting {
	pub fn new(account: &str, units: Units) -> Self {
		Self {
			account: account.to_string(),
			units,
		}
	}

	pub fn fixed(account: &str, amount: Amount) -> Self {
		Self::new(account, Units::Fixed(amount))
	}

	pub fn auto(account: &str) -> Self {
		Self::new(account, Units::Auto)
	}

	pub fn account(&self) -> &String {
		&self.account
	}

	pub fn units(&self) -> &Units {
		&self.units
	}

	pub fn amount(&self) -> Option<&Amount> {
		match &self.units {
			Units::Fixed(a) => Some(a),
			Units::Auto => None,
		}
	}

	/// A placeholder stands in for a leg nobody has categorized yet.
	pub fn is_placeholder(&self, placeholder: &str) -> bool {
		self.account.is_empty() || self.account == placeholder
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
	date: Date,
	payee: Option<String>,
	narration: String,
	postings: Vec<Posting>,
	meta: BTreeMap<String, MetaValue>,
}

impl Transaction {
	pub fn new(date: Date, payee: Option<String>, narration: String) -> Self {
		Self {
			date,
			payee: payee.filter(|p| !p.is_empty()),
			narration,
			postings: vec![],
			meta: BTreeMap::new(),
		}
	}

	pub fn add_posting(&mut self, posting: Posting) -> Result<(), Error> {
		if posting.account.is_empty() {
			bail!("Account is empty")
		}

		if posting.units == Units::Auto
			&& self.postings.iter().any(|p| p.units == Units::Auto)
		{
			bail!("Only one line per entry may omit amount and currency")
		}

		self.postings.push(posting);
		Ok(())
	}

	pub fn set_meta(&mut self, key: &str, value: MetaValue) {
		self.meta.insert(key.to_string(), value);
	}

	pub fn date(&self) -> &Date {
		&self.date
	}

	pub fn payee(&self) -> Option<&String> {
		self.payee.as_ref()
	}

	pub fn narration(&self) -> &String {
		&self.narration
	}

	pub fn postings(&self) -> &Vec<Posting> {
		&self.postings
	}

	pub fn meta(&self) -> &BTreeMap<String, MetaValue> {
		&self.meta
	}

	/// Returns a copy of this transaction with the payee replaced.
	pub fn with_payee(&self, payee: &str) -> Self {
		Self {
			payee: Some(payee.to_string()),
			..self.clone()
		}
	}

	/// Returns a copy of this transaction with the postings replaced.
	pub fn with_postings(&self, postings: Vec<Posting>) -> Self {
		Self {
			postings,
			..self.clone()
		}
	}

	/// Returns a copy of this transaction with the given metadata added.
	pub fn with_meta(&self, entries: Vec<(&str, MetaValue)>) -> Self {
		let mut meta = self.meta.clone();
		for (key, value) in entries {
			meta.insert(key.to_string(), value);
		}

		Self {
			meta,
			..self.clone()
		}
	}

	/// Net of all postings with a written amount, per currency, omitting
	/// currencies that balance.
	pub fn imbalances(&self) -> BTreeMap<String, Decimal> {
		Amount::imbalances(self.postings.iter().filter_map(|p| p.amount()))
	}
}

impl fmt::Display for Transaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// Render the header line with date, payee and narration
		match &self.payee {
			Some(payee) => {
				writeln!(f, "{} {} | {}", self.date, payee, self.narration)?
			},
			None => writeln!(f, "{} {}", self.date, self.narration)?,
		}

		for (key, value) in &self.meta {
			writeln!(f, "\t; {}: {}", key, value)?;
		}

		// Calculate the maximum width of the account strings
		let account_width = self
			.postings
			.iter()
			.map(|p| p.account.len())
			.max()
			.unwrap_or(0);

		let max_value_width = self
			.postings
			.iter()
			.filter_map(|p| p.amount())
			.map(|a| a.value.to_string().len())
			.max()
			.unwrap_or(0);

		// Format the posting lines with proper alignment
		for posting in &self.postings {
			match &posting.units {
				Units::Fixed(amount) => writeln!(
					f,
					"\t{:<account_width$}  {:>value_width$} {}",
					posting.account,
					amount.value.to_string(),
					amount.currency,
					account_width = account_width,
					value_width = max_value_width
				)?,
				Units::Auto => writeln!(f, "\t{}", posting.account)?,
			}
		}

		Ok(())
	}
}

impl fmt::Display for Entry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Entry::Transaction(t) => write!(f, "{}", t),
			Entry::Open { date, account } => {
				writeln!(f, "!{} open {}", date, account)
			},
			Entry::Close { date, account } => {
				writeln!(f, "!{} close {}", date, account)
			},
			Entry::Balance {
				date,
				account,
				amount,
			} => writeln!(f, "!{} balance {} {}", date, account, amount),
			Entry::Other { date, directive } => {
				writeln!(f, "!{} {}", date, directive)
			},
		}
	}
}

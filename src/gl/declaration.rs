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
use crate::util::date::Date;
use anyhow::{bail, Error};
use std::collections::BTreeMap;

/// The open and close history of one account, as declared in a ledger.
#[derive(Debug, Default)]
pub struct Declaration {
	events: BTreeMap<Date, bool>, // calendar date -> whether account is open
}

impl Declaration {
	pub fn new() -> Self {
		Self {
			events: BTreeMap::new(),
		}
	}

	pub fn open_account(&mut self, date: Date) -> Result<(), Error> {
		self.declare(date, true)
	}

	pub fn close_account(&mut self, date: Date) -> Result<(), Error> {
		self.declare(date, false)
	}

	fn declare(&mut self, date: Date, open: bool) -> Result<(), Error> {
		if self.events.contains_key(&date) {
			bail!("Cannot make multiple declarations for the same account on the same date")
		}

		self.events.insert(date, open);
		Ok(())
	}

	/// Returns true if the most recent event on or prior to the given date is
	/// set to open, else false. Defaults to false.
	pub fn is_open_on(&self, date: &Date) -> bool {
		if let Some((_, &status)) = self.events.range(..=date).next_back() {
			return status;
		}
		false
	}

	/// Whether the account was opened at any point.
	pub fn ever_opened(&self) -> bool {
		self.events.values().any(|&open| open)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(s: &str) -> Date {
		Date::from_str(s).unwrap()
	}

	#[test]
	fn test_open_and_close() {
		let mut declaration = Declaration::new();
		declaration.open_account(date("2024-01-01")).unwrap();
		declaration.close_account(date("2024-06-30")).unwrap();

		assert!(!declaration.is_open_on(&date("2023-12-31")));
		assert!(declaration.is_open_on(&date("2024-01-01")));
		assert!(declaration.is_open_on(&date("2024-06-29")));
		assert!(!declaration.is_open_on(&date("2024-06-30")));
		assert!(declaration.ever_opened());
	}

	#[test]
	fn test_reopen() {
		let mut declaration = Declaration::new();
		declaration.open_account(date("2024-01-01")).unwrap();
		declaration.close_account(date("2024-02-01")).unwrap();
		declaration.open_account(date("2024-03-01")).unwrap();

		assert!(!declaration.is_open_on(&date("2024-02-15")));
		assert!(declaration.is_open_on(&date("2024-03-15")));
	}

	#[test]
	fn test_same_date_rejected() {
		let mut declaration = Declaration::new();
		declaration.open_account(date("2024-01-01")).unwrap();
		assert!(declaration.close_account(date("2024-01-01")).is_err());
	}

	#[test]
	fn test_close_only() {
		let mut declaration = Declaration::new();
		declaration.close_account(date("2024-01-01")).unwrap();
		assert!(!declaration.ever_opened());
	}
}

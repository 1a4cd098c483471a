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
use crate::gl::declaration::Declaration;
use crate::gl::entry::Entry;
use crate::util::date::Date;
use std::collections::BTreeMap;
use tracing::warn;

/// The accounts a ledger has declared open or closed, and when.
///
/// A ledger that never opens an account is treated leniently: every
/// account is considered open on every date. Once any account is opened,
/// an account is only open between its own open and close directives.
#[derive(Debug, Default)]
pub struct OpenAccounts {
	declared: BTreeMap<String, Declaration>,
	has_opens: bool,
}

impl OpenAccounts {
	pub fn from_entries(entries: &[Entry]) -> Self {
		let mut accounts = Self::default();

		for entry in entries {
			let (account, date, open) = match entry {
				Entry::Open { account, date } => (account, date, true),
				Entry::Close { account, date } => (account, date, false),
				_ => continue,
			};

			let declaration =
				accounts.declared.entry(account.clone()).or_default();
			let result = if open {
				declaration.open_account(*date)
			} else {
				declaration.close_account(*date)
			};

			if let Err(e) = result {
				warn!("{}: {} on {}", e, account, date);
				continue;
			}

			accounts.has_opens |= open;
		}

		accounts
	}

	/// True if no account has ever been opened.
	pub fn is_unrestricted(&self) -> bool {
		!self.has_opens
	}

	/// Whether the account may be posted to on the given date.
	pub fn is_open_on(&self, account: &str, date: &Date) -> bool {
		match self.declared.get(account) {
			Some(declaration) => declaration.is_open_on(date),
			None => self.is_unrestricted(),
		}
	}

	/// Whether the account was opened at any point in the ledger's history.
	pub fn is_known(&self, account: &str) -> bool {
		if self.is_unrestricted() {
			return true;
		}

		self.declared
			.get(account)
			.is_some_and(|declaration| declaration.ever_opened())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(s: &str) -> Date {
		Date::from_str(s).unwrap()
	}

	fn open(account: &str, d: &str) -> Entry {
		Entry::Open {
			date: date(d),
			account: account.to_string(),
		}
	}

	fn close(account: &str, d: &str) -> Entry {
		Entry::Close {
			date: date(d),
			account: account.to_string(),
		}
	}

	#[test]
	fn test_no_declarations_is_unrestricted() {
		let accounts = OpenAccounts::from_entries(&[]);
		assert!(accounts.is_unrestricted());
		assert!(accounts.is_open_on("Expenses:Food", &date("2024-01-01")));
		assert!(accounts.is_known("Expenses:Food"));
	}

	#[test]
	fn test_open_and_closed_accounts() {
		let accounts = OpenAccounts::from_entries(&[
			open("Expenses:Food", "2024-01-01"),
			open("Expenses:Old", "2024-01-01"),
			close("Expenses:Old", "2024-03-01"),
		]);

		let d = date("2024-04-01");
		assert!(accounts.is_open_on("Expenses:Food", &d));
		assert!(!accounts.is_open_on("Expenses:Old", &d));
		assert!(!accounts.is_open_on("Expenses:Never", &d));

		assert!(accounts.is_known("Expenses:Old"));
		assert!(!accounts.is_known("Expenses:Never"));
	}

	#[test]
	fn test_close_without_opens() {
		let accounts =
			OpenAccounts::from_entries(&[close("Expenses:Old", "2024-03-01")]);

		assert!(accounts.is_unrestricted());
		assert!(!accounts.is_open_on("Expenses:Old", &date("2024-04-01")));
		assert!(accounts.is_open_on("Expenses:Food", &date("2024-04-01")));
	}

	#[test]
	fn test_conflicting_declaration_skipped() {
		let accounts = OpenAccounts::from_entries(&[
			open("Expenses:Food", "2024-01-01"),
			close("Expenses:Food", "2024-01-01"),
		]);
		assert!(accounts.is_open_on("Expenses:Food", &date("2024-01-02")));
	}
}

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
use crate::gl::entry::Entry;
use crate::import::detector::DUPLICATE;
use crate::import::importer::{Importer, ImporterHook};
use crate::util::date::Date;
use anyhow::Error;
use tracing::info;

/// Drops imported transactions dated before the ledger's last balance
/// assertion, which the ledger should already account for. By default only
/// those already marked as duplicates are dropped.
#[derive(Debug, Clone)]
pub struct OldEntryTrimmer {
	pub only_trim_duplicates: bool,
}

impl Default for OldEntryTrimmer {
	fn default() -> Self {
		Self {
			only_trim_duplicates: true,
		}
	}
}

impl OldEntryTrimmer {
	pub fn new(only_trim_duplicates: bool) -> Self {
		Self {
			only_trim_duplicates,
		}
	}

	fn should_keep(&self, entry: &Entry, last_balance: &Date) -> bool {
		let txn = match entry {
			Entry::Transaction(t) => t,
			_ => return true,
		};

		if txn.date() >= last_balance {
			return true;
		}

		if txn.meta().get(DUPLICATE).is_some_and(|v| v.is_true()) {
			return false;
		}

		self.only_trim_duplicates
	}
}

impl ImporterHook for OldEntryTrimmer {
	fn apply(
		&self,
		_importer: &dyn Importer,
		path: &str,
		imported: Vec<Entry>,
		existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		let last_balance = existing
			.iter()
			.filter_map(|e| match e {
				Entry::Balance { date, .. } => Some(*date),
				_ => None,
			})
			.max()
			.unwrap_or_else(Date::min);

		let before = imported.len();
		let kept: Vec<Entry> = imported
			.into_iter()
			.filter(|e| self.should_keep(e, &last_balance))
			.collect();

		if kept.len() < before {
			info!(
				"{}: trimmed {} entries before {}",
				path,
				before - kept.len(),
				last_balance
			);
		}
		Ok(kept)
	}
}

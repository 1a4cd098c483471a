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
use crate::gl::entry::{Entry, MetaValue, Transaction};
use crate::import::importer::{Importer, ImporterHook};
use crate::predict::records::transactions;
use anyhow::Error;
use tracing::info;

pub const DUPLICATE: &str = "__duplicate__";

/// Marks imported transactions that look like ones already in the ledger.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
	/// Days either side of an imported transaction to look for a match
	pub window_days: i64,
}

impl Default for DuplicateDetector {
	fn default() -> Self {
		Self { window_days: 2 }
	}
}

impl DuplicateDetector {
	pub fn new(window_days: i64) -> Self {
		Self { window_days }
	}

	/// Two transactions are similar if they are close in time and share a
	/// posting with the same account and amount.
	pub fn is_similar(
		&self,
		imported: &Transaction,
		existing: &Transaction,
	) -> bool {
		let within_window = imported
			.date()
			.days_until(existing.date())
			.is_ok_and(|days| days.abs() <= self.window_days);
		if !within_window {
			return false;
		}

		imported.postings().iter().any(|p| {
			p.amount().is_some()
				&& existing.postings().iter().any(|e| {
					e.account() == p.account() && e.amount() == p.amount()
				})
		})
	}
}

impl ImporterHook for DuplicateDetector {
	fn apply(
		&self,
		_importer: &dyn Importer,
		path: &str,
		imported: Vec<Entry>,
		existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		let mut duplicates = 0;

		let marked = imported
			.into_iter()
			.map(|entry| match entry {
				Entry::Transaction(txn)
					if transactions(existing).any(|e| self.is_similar(&txn, e)) =>
				{
					duplicates += 1;
					Entry::Transaction(
						txn.with_meta(vec![(DUPLICATE, MetaValue::Bool(true))]),
					)
				},
				other => other,
			})
			.collect();

		if duplicates > 0 {
			info!("{}: marked {} duplicate transactions", path, duplicates);
		}
		Ok(marked)
	}
}

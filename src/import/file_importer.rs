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
use crate::gl::ledger::Ledger;
use crate::import::importer::Importer;
use crate::parsing::parser::Parser;
use anyhow::Error;
use std::path::Path;
use tracing::debug;

/// File extensions read as ledger text
const EXTENSIONS: [&str; 3] = ["txt", "ledger", "ledr"];

/// Imports entries written in ledger format, such as the output of a
/// converter script that leaves counterparties as placeholders.
#[derive(Debug, Clone, Default)]
pub struct LedgerFileImporter {
	account: Option<String>,
}

impl LedgerFileImporter {
	pub fn new(account: Option<String>) -> Self {
		Self { account }
	}
}

impl Importer for LedgerFileImporter {
	fn name(&self) -> String {
		"ledger-file".to_string()
	}

	fn identify(&self, path: &str) -> bool {
		Path::new(path)
			.extension()
			.and_then(|e| e.to_str())
			.is_some_and(|e| EXTENSIONS.contains(&e))
	}

	fn account(&self, _path: &str) -> Option<String> {
		self.account.clone()
	}

	fn extract(
		&self,
		path: &str,
		_existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		let mut ledger = Ledger::new();
		Parser::new().parse(path, &mut ledger)?;

		let entries = ledger.take_entries();
		debug!("extracted {} entries from {}", entries.len(), path);
		Ok(entries)
	}
}

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
use anyhow::Error;
use tracing::debug;

/// Turns a source file (a bank statement, an export) into entries.
pub trait Importer {
	fn name(&self) -> String;

	/// Whether this importer can read the file at path.
	fn identify(&self, path: &str) -> bool;

	/// The account the file's transactions belong to, if known.
	fn account(&self, path: &str) -> Option<String>;

	fn extract(&self, path: &str, existing: &[Entry])
		-> Result<Vec<Entry>, Error>;
}

/// Entries one importer produced from one file.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportBatch {
	pub path: String,
	pub entries: Vec<Entry>,
	pub account: Option<String>,
}

/// Runs after an importer's extract, and may rewrite what it produced.
pub trait ImporterHook {
	fn apply(
		&self,
		importer: &dyn Importer,
		path: &str,
		imported: Vec<Entry>,
		existing: &[Entry],
	) -> Result<Vec<Entry>, Error>;
}

/// An importer whose output passes through a list of hooks, in order.
pub struct HookedImporter {
	importer: Box<dyn Importer>,
	hooks: Vec<Box<dyn ImporterHook>>,
}

pub fn apply_hooks(
	importer: Box<dyn Importer>,
	hooks: Vec<Box<dyn ImporterHook>>,
) -> HookedImporter {
	HookedImporter { importer, hooks }
}

impl Importer for HookedImporter {
	fn name(&self) -> String {
		self.importer.name()
	}

	fn identify(&self, path: &str) -> bool {
		self.importer.identify(path)
	}

	fn account(&self, path: &str) -> Option<String> {
		self.importer.account(path)
	}

	fn extract(
		&self,
		path: &str,
		existing: &[Entry],
	) -> Result<Vec<Entry>, Error> {
		debug!("calling the extract method of {}", self.importer.name());
		let mut imported = self.importer.extract(path, existing)?;

		for hook in &self.hooks {
			imported =
				hook.apply(self.importer.as_ref(), path, imported, existing)?;
		}

		Ok(imported)
	}
}

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
use crate::import::importer::Importer;
use crate::predict::predictor::EntryPredictor;
use anyhow::Error;

/// An importer whose extracted entries go through a predictor before they
/// are handed back. Everything else is the wrapped importer's.
pub struct PredictingImporter<I, P> {
	importer: I,
	predictor: P,
}

impl<I: Importer, P: EntryPredictor> PredictingImporter<I, P> {
	pub fn new(importer: I, predictor: P) -> Self {
		Self {
			importer,
			predictor,
		}
	}
}

impl<I: Importer, P: EntryPredictor> Importer for PredictingImporter<I, P> {
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
		let imported = self.importer.extract(path, existing)?;
		self.predictor
			.apply_as_hook(&self.importer, path, imported, existing)
	}
}

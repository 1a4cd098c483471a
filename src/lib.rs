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
//! Machine learning predictions for plain text accounting imports.
//!
//! Imported transactions that are missing a leg, or a payee, are completed
//! from what the ledger's history says similar transactions looked like.

pub mod config;
pub mod error;
pub mod gl;
pub mod import;
pub mod parsing;
pub mod predict;
pub mod util;

pub use crate::gl::entry::{Entry, Posting, Transaction};
pub use crate::import::importer::{
	apply_hooks, ImportBatch, Importer, ImporterHook,
};
pub use crate::predict::payees::PredictPayees;
pub use crate::predict::postings::PredictPostings;
pub use crate::predict::predictor::{EntryPredictor, PredictorOptions};

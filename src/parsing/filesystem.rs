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
use crate::config::config_file::Config;
use anyhow::{anyhow, bail, Error};
use dirs::home_dir;
use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Filesystem {
	/// Set of file paths that have been inspected.
	/// Used to avoid circular includes.
	included_files: HashSet<String>,
}

impl Default for Filesystem {
	fn default() -> Self {
		Self::new()
	}
}

impl Filesystem {
	pub fn new() -> Self {
		Self {
			included_files: HashSet::new(),
		}
	}

	pub fn open(&self, file_path: &str) -> Result<File, Error> {
		let path = Path::new(file_path);
		File::open(path).map_err(|e| anyhow!("{}: {}", file_path, e))
	}

	/// Records that a file is being read. The same file reached twice,
	/// under any spelling of its path, is a circular include.
	pub fn declare_file(&mut self, file_path: &str) -> Result<(), Error> {
		let key = fs::canonicalize(file_path)
			.map(|p| p.display().to_string())
			.unwrap_or_else(|_| file_path.to_string());

		if !self.included_files.insert(key) {
			bail!("Circular file includes: {}", file_path)
		}
		Ok(())
	}

	/// Where an include statement points. Relative paths are taken from the
	/// directory of the file that holds the statement.
	pub fn resolve(origin: Option<&str>, include: &str) -> String {
		let base = origin.and_then(|o| Path::new(o).parent());
		match base {
			Some(dir) if Path::new(include).is_relative() => {
				dir.join(include).display().to_string()
			},
			_ => include.to_string(),
		}
	}

	/// Fetches the config from the given path, or default path if none.
	/// The default file is created empty the first time it is looked for.
	pub fn get_config(
		&self,
		custom_config_path: Option<&String>,
	) -> Result<Config, Error> {
		let config_path = match &custom_config_path {
			None => match home_dir() {
				Some(home) => home.join(".config/ledr-smart/config.toml"),
				None => bail!("Unable to determine home directory"),
			},
			Some(p) => PathBuf::from(p),
		};

		// create empty config file if it doesn't exist
		if !config_path.exists() && custom_config_path.is_none() {
			if let Some(parent) = config_path.parent() {
				fs::create_dir_all(parent)?;
			}
			File::create(config_path.clone())?;
		}

		debug!("reading config from {}", config_path.display());
		let content = fs::read_to_string(&config_path).map_err(|e| {
			anyhow!("failed to read config {}: {}", config_path.display(), e)
		})?;

		Config::from_toml(&content)
	}
}

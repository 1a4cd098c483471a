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
use crate::parsing::filesystem::Filesystem;
use crate::util::amount::Amount;
use crate::util::date::Date;
use anyhow::{anyhow, bail, Error};
use std::io;
use std::io::BufRead;
use tracing::debug;

pub struct Parser {
	fs: Filesystem,
}

impl Default for Parser {
	fn default() -> Self {
		Self::new()
	}
}

impl Parser {
	pub fn new() -> Self {
		Self {
			fs: Filesystem::new(),
		}
	}

	/// Opens and parses the file at file_path into the passed Ledger. Entries
	/// land in the ledger in the order they appear, with included files
	/// spliced in where their include statement sits.
	pub fn parse(
		&mut self,
		file_path: &str,
		ledger: &mut Ledger,
	) -> Result<(), Error> {
		self.fs.declare_file(file_path)?;
		let file = self.fs.open(file_path)?;
		debug!("parsing {}", file_path);

		self.read(io::BufReader::new(file), ledger, Some(file_path))
			.map_err(|e| anyhow!("{}: {}", file_path, e))
	}

	/// Parses ledger text that does not live in a file.
	pub fn parse_str(&mut self, input: &str) -> Result<Vec<Entry>, Error> {
		let mut ledger = Ledger::new();
		self.read(input.as_bytes(), &mut ledger, None)?;
		Ok(ledger.take_entries())
	}

	fn read(
		&mut self,
		reader: impl BufRead,
		ledger: &mut Ledger,
		origin: Option<&str>,
	) -> Result<(), Error> {
		for (i, line) in reader.lines().enumerate() {
			let line_no = i + 1;

			// Chop comments out
			let l = line?
				.split('#')
				.next()
				.unwrap_or_default()
				.trim()
				.to_string();

			// If a line is blank, this entry is over (or we are not in one)
			if l.is_empty() {
				ledger
					.finish_entry()
					.map_err(|e| anyhow!("{} (line {})", e, line_no))?;
				continue;
			}

			// Handle includes, which recursively parse when seen
			if l.starts_with("include") {
				let include: Vec<&str> = l.split_whitespace().collect();
				if include.len() != 2 {
					bail!("Invalid include (line {})", line_no)
				}

				ledger
					.finish_entry()
					.map_err(|e| anyhow!("{} (line {})", e, line_no))?;
				let included = Filesystem::resolve(origin, include[1]);
				self.parse(&included, ledger)?;
				continue;
			}

			if let Some(directive) = l.strip_prefix('!') {
				self.parse_directive(directive, ledger)
					.map_err(|e| anyhow!("{} (line {})", e, line_no))?;
				continue;
			}

			// Metadata lines look like `; key: value`
			if let Some(meta) = l.strip_prefix(';') {
				let (key, value) = meta
					.split_once(':')
					.ok_or_else(|| anyhow!("Invalid metadata (line {})", line_no))?;
				ledger
					.add_meta(key.trim(), value)
					.map_err(|e| anyhow!("{} (line {})", e, line_no))?;
				continue;
			}

			// Handle entry declaration lines with a date and description
			if let Some((date_str, desc)) = l.split_once(' ') {
				if let Ok(date) = Date::from_str(date_str.trim()) {
					ledger
						.new_entry(date, desc)
						.map_err(|e| anyhow!("{} (line {})", e, line_no))?;
					continue;
				}
			}

			// Make sure the line is not a date by itself
			if Date::from_str(&l).is_ok() {
				bail!("Orphaned date (line {}): {}", line_no, l);
			}

			let parts: Vec<&str> = l.split_whitespace().collect();
			let amount = match parts.len() {
				1 => None,
				3 => Some(
					Amount::parse(parts[1], parts[2])
						.map_err(|e| anyhow!("{} (line {})", e, line_no))?,
				),
				_ => bail!("Invalid format (line {})", line_no),
			};

			ledger
				.add_detail(parts[0].to_string(), amount)
				.map_err(|e| anyhow!("{} (line {})", e, line_no))?;
		}

		// Make sure to finish the last entry if the file ends without an empty line
		ledger
			.finish_entry()
			.map_err(|e| anyhow!("{} (line eof)", e))
	}

	fn parse_directive(
		&self,
		directive: &str,
		ledger: &mut Ledger,
	) -> Result<(), Error> {
		let (date_str, rest) = match directive.split_once(char::is_whitespace) {
			Some((d, r)) if !r.trim().is_empty() => (d, r.trim()),
			_ => bail!("Invalid directive: {}", directive),
		};
		let date = Date::from_str(date_str)?;

		let parts: Vec<&str> = rest.split_whitespace().collect();
		match parts[0] {
			"open" if parts.len() == 2 => {
				ledger.declare_account_open(parts[1].to_string(), date)
			},
			"close" if parts.len() == 2 => {
				ledger.declare_account_closure(parts[1].to_string(), date)
			},
			"balance" if parts.len() == 4 => {
				let amount = Amount::parse(parts[2], parts[3])?;
				ledger.declare_balance(parts[1].to_string(), amount, date)
			},
			"open" | "close" | "balance" => {
				bail!("Invalid directive: {}", directive)
			},
			_ => ledger.declare_other(rest.to_string(), date),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gl::entry::Units;

	const LEDGER: &str = "
# opening
!2024-01-01 open Assets:Checking
!2024-01-01 currency USD

2024-01-05 Farmer Fresh | Buying groceries
	; category: food
	Assets:Checking  -1,010.00 USD
	Expenses:Food

2024-01-06 Coffee
	Assets:Checking  -3.50 USD  # morning
	Expenses:Coffee   3.50 USD
!2024-02-01 balance Assets:Checking 100.00 USD
";

	#[test]
	fn test_parse_entries_in_order() {
		let entries = Parser::new().parse_str(LEDGER).unwrap();
		assert_eq!(entries.len(), 5);

		assert!(matches!(entries[0], Entry::Open { .. }));
		match &entries[1] {
			Entry::Other { directive, .. } => {
				assert_eq!(directive, "currency USD")
			},
			_ => panic!("expected other directive"),
		}

		let txn = entries[2].as_transaction().unwrap();
		assert_eq!(txn.payee().unwrap(), "Farmer Fresh");
		assert_eq!(txn.meta()["category"].to_string(), "food");
		assert_eq!(
			txn.postings()[0].amount().unwrap().to_string(),
			"-1010.00 USD"
		);
		assert_eq!(*txn.postings()[1].units(), Units::Auto);

		let coffee = entries[3].as_transaction().unwrap();
		assert_eq!(coffee.postings().len(), 2);
		assert!(coffee.payee().is_none());

		assert!(matches!(entries[4], Entry::Balance { .. }));
	}

	#[test]
	fn test_metadata_reprints_unchanged() {
		let input = "2024-01-05 Transfer
	; code: 1e3
	; flagged: true
	; ref: 00420
	; total: 12.50
	Assets:Checking  -12.50 USD
	Assets:Savings
";
		let entries = Parser::new().parse_str(input).unwrap();
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].to_string(), input);
	}

	#[test]
	fn test_orphaned_date() {
		assert!(Parser::new().parse_str("2024-01-01\n").is_err());
	}

	#[test]
	fn test_invalid_detail() {
		let input = "2024-01-01 Coffee\n\tExpenses:Coffee 3.50\n";
		let err = Parser::new().parse_str(input).unwrap_err();
		assert!(err.to_string().contains("line 2"));
	}

	#[test]
	fn test_invalid_directive() {
		assert!(Parser::new().parse_str("!2024-01-01 open\n").is_err());
		assert!(Parser::new()
			.parse_str("!2024-01-01 balance Assets:Cash 10\n")
			.is_err());
		assert!(Parser::new().parse_str("!2024-01-01\n").is_err());
	}

	#[test]
	fn test_invalid_metadata() {
		let input = "2024-01-01 Coffee\n\t; nothing here\n\tExpenses:Coffee\n";
		assert!(Parser::new().parse_str(input).is_err());
	}

	#[test]
	fn test_two_auto_details() {
		let input = "2024-01-01 Coffee\n\tExpenses:Coffee\n\tAssets:Cash\n";
		assert!(Parser::new().parse_str(input).is_err());
	}

	#[test]
	fn test_includes_relative_to_file() {
		let dir = std::env::temp_dir()
			.join(format!("ledr-smart-include-{}", std::process::id()));
		std::fs::create_dir_all(dir.join("books")).unwrap();
		std::fs::write(
			dir.join("main.txt"),
			"!2024-01-01 open Assets:Checking\ninclude books/jan.txt\n",
		)
		.unwrap();
		std::fs::write(
			dir.join("books/jan.txt"),
			"2024-01-02 Coffee\n\tAssets:Checking  -3 USD\n\tExpenses:Coffee\n",
		)
		.unwrap();

		let mut ledger = Ledger::new();
		let main = dir.join("main.txt").display().to_string();
		Parser::new().parse(&main, &mut ledger).unwrap();
		assert_eq!(ledger.entries().len(), 2);
		assert!(ledger.entries()[1].as_transaction().is_some());

		std::fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn test_circular_include() {
		let dir = std::env::temp_dir()
			.join(format!("ledr-smart-circular-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		std::fs::write(dir.join("a.txt"), "include b.txt\n").unwrap();
		std::fs::write(dir.join("b.txt"), "include ./a.txt\n").unwrap();

		let a = dir.join("a.txt").display().to_string();
		let err = Parser::new().parse(&a, &mut Ledger::new()).unwrap_err();
		assert!(err.to_string().contains("Circular"));

		std::fs::remove_dir_all(&dir).unwrap();
	}
}

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

use anyhow::{anyhow, bail, Error};
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::fmt;

/// A calendar date as it appears in a ledger. Kept as plain parts so that
/// ordering and printing never depend on a timezone.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Date {
	year: u32,
	month: u8,
	day: u8,
}

impl Date {
	/// Constructor to parse a string in the "YYYY-mm-dd" format
	pub fn from_str(date_str: &str) -> Result<Date, Error> {
		let parts: Vec<&str> = date_str.split('-').collect();
		if parts.len() != 3 {
			bail!("Date format must be YYYY-MM-DD");
		}

		let year = parts[0].parse::<u32>()?;
		let month = parts[1].parse::<u8>()?;
		let day = parts[2].parse::<u8>()?;

		Date::from_parts(year, month, day)
	}

	pub fn from_parts(year: u32, month: u8, day: u8) -> Result<Date, Error> {
		if !Date::is_valid_date(year, month, day) {
			bail!("Invalid date");
		}

		Ok(Date { year, month, day })
	}

	pub fn min() -> Date {
		Date {
			year: 1,
			month: 1,
			day: 1,
		}
	}

	pub fn day(&self) -> u8 {
		self.day
	}

	pub fn month(&self) -> u8 {
		self.month
	}

	/// Day of the week, with Monday as 0 and Sunday as 6.
	pub fn weekday(&self) -> u8 {
		self.to_naive()
			.map(|d| d.weekday().num_days_from_monday() as u8)
			.unwrap_or_default()
	}

	/// Signed number of calendar days from self to other.
	pub fn days_until(&self, other: &Date) -> Result<i64, Error> {
		let (from, to) = (self.to_naive()?, other.to_naive()?);
		Ok(to.signed_duration_since(from).num_days())
	}

	fn to_naive(self) -> Result<NaiveDate, Error> {
		NaiveDate::from_ymd_opt(
			self.year as i32,
			self.month as u32,
			self.day as u32,
		)
		.ok_or_else(|| anyhow!("Date {} out of range", self))
	}

	fn is_leap_year(year: u32) -> bool {
		(year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
	}

	fn days_in_month(year: u32, month: u8) -> u8 {
		match month {
			1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
			4 | 6 | 9 | 11 => 30,
			2 => {
				if Date::is_leap_year(year) {
					29
				} else {
					28
				}
			},
			_ => 0, // Invalid month
		}
	}

	fn is_valid_date(year: u32, month: u8, day: u8) -> bool {
		if !(1..=12).contains(&month) {
			return false;
		}
		if day < 1 || day > Date::days_in_month(year, month) {
			return false;
		}
		true
	}
}

impl PartialOrd for Date {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Date {
	fn cmp(&self, other: &Self) -> Ordering {
		(self.year, self.month, self.day).cmp(&(
			other.year,
			other.month,
			other.day,
		))
	}
}

impl fmt::Display for Date {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
	}
}

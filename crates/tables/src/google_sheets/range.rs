use std::{error::Error as StdError, fmt::Display, str::FromStr};

use google_sheets4::api::GridRange;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref A1_RE: Regex = Regex::new(
        r"^(?<name>[^!]+)!(?<c_start>[A-Z]+)(?<r_start>[1-9]\d*)?(:(?<c_end>[A-Z]+)(?<r_end>[1-9]\d*)?)?$"
    )
    .expect("A1 notation regex is valid");
}

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidRange(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidRange(s) => write!(f, "invalid range: {}", s),
        }
    }
}

impl StdError for Error {}

/// A rectangular range in A1 notation, stored zero-based and end-exclusive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetRange {
    pub sheet_name: String,
    pub c_start: usize,
    pub r_start: usize,
    pub c_end: usize,
    pub r_end: Option<usize>,
}

impl SheetRange {
    pub fn with_rows(&self, r_start: usize, r_end: usize) -> Self {
        Self {
            r_start,
            r_end: Some(r_end),
            ..self.clone()
        }
    }

    pub fn with_inf_end(&self) -> Self {
        Self {
            r_end: None,
            ..self.clone()
        }
    }

    pub fn width(&self) -> usize {
        self.c_end - self.c_start
    }

    pub fn as_grid_range(&self, sheet_id: i32) -> GridRange {
        GridRange {
            sheet_id: Some(sheet_id),
            start_column_index: Some(self.c_start as i32),
            end_column_index: Some(self.c_end as i32),
            start_row_index: Some(self.r_start as i32),
            end_row_index: self.r_end.map(|r| r as i32),
        }
    }
}

/// Zero-based column index to letters: 0 is `A`, 26 is `AA`.
fn column_name(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

/// Letters to a one-based column number: `A` is 1, `AA` is 27.
fn column_number(letters: &str) -> usize {
    letters
        .bytes()
        .fold(0, |acc, b| acc * 26 + (b - b'A') as usize + 1)
}

impl Display for SheetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}!{}{}:{}",
            self.sheet_name,
            column_name(self.c_start),
            self.r_start + 1,
            column_name(self.c_end - 1),
        )?;
        match self.r_end {
            Some(r_end) => write!(f, "{}", r_end),
            None => Ok(()),
        }
    }
}

impl FromStr for SheetRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidRange(s.to_owned());
        let captures = A1_RE.captures(s).ok_or_else(invalid)?;

        let row = |name: &str| -> Result<Option<usize>, Error> {
            captures
                .name(name)
                .map(|m| m.as_str().parse::<usize>().map_err(|_| invalid()))
                .transpose()
        };

        let sheet_name = captures["name"].to_owned();
        let c_start = column_number(&captures["c_start"]) - 1;
        let r_start = row("r_start")?.unwrap_or(1) - 1;

        let (c_end, r_end) = match captures.name("c_end") {
            // A column end without a row end leaves the range open downwards
            Some(c_end) => (column_number(c_end.as_str()), row("r_end")?),
            // A single cell
            None => (c_start + 1, Some(r_start + 1)),
        };

        if c_start >= c_end || r_end.is_some_and(|r_end| r_end <= r_start) {
            return Err(invalid());
        }

        Ok(Self {
            sheet_name,
            c_start,
            r_start,
            c_end,
            r_end,
        })
    }
}

impl Serialize for SheetRange {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SheetRange {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_range_from_a1() {
        let range = SheetRange::from_str("Orders!A2:P").unwrap();

        assert_eq!(range.sheet_name, "Orders");
        assert_eq!((range.c_start, range.c_end), (0, 16));
        assert_eq!((range.r_start, range.r_end), (1, None));
        assert_eq!(range.width(), 16);
    }

    #[test]
    fn bounded_range_from_a1() {
        let range = SheetRange::from_str("Dashboard!B2:J2").unwrap();

        assert_eq!((range.c_start, range.c_end), (1, 10));
        assert_eq!((range.r_start, range.r_end), (1, Some(2)));
    }

    #[test]
    fn single_cell_from_a1() {
        let range = SheetRange::from_str("Meta!B3").unwrap();

        assert_eq!((range.c_start, range.c_end), (1, 2));
        assert_eq!((range.r_start, range.r_end), (2, Some(3)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(SheetRange::from_str("Orders").is_err());
        assert!(SheetRange::from_str("Orders!C2:A").is_err());
        assert!(SheetRange::from_str("Orders!A5:B3").is_err());
    }

    #[test]
    fn wide_columns_round_trip() {
        let range = SheetRange::from_str("History!Z1:AB").unwrap();

        assert_eq!((range.c_start, range.c_end), (25, 28));
        assert_eq!(range.to_string(), "History!Z1:AB");
        assert_eq!(range.with_rows(4, 9).to_string(), "History!Z5:AB9");
    }
}

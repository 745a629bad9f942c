// src/target.rs
//! Target enumeration.
//!
//! A [`Target`] is one page to retrieve: a logical key, the URL it resolves
//! to, and the artifact filename derived from the key. The filename is a pure
//! function of the key and [`TargetKey::from_filename`] inverts it, so the
//! fetcher and whatever later parses the artifacts agree on naming without
//! an index file.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::config::consts::ARTIFACT_EXT;
use crate::config::{CalendarContext, TargetRange};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=9999).contains(&year) {
            return Err(Error::InvalidRange(format!("year {year} outside 1..=9999")));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidRange(format!("month {month} outside 1..=12")));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 { self.year }
    pub fn month(self) -> u32 { self.month }

    fn succ(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM`.
impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::InvalidRange(format!("malformed month {s:?}, expected YYYY-MM"));
        let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(bad());
        }
        let year = y.parse().map_err(|_| bad())?;
        let month = m.parse().map_err(|_| bad())?;
        YearMonth::new(year, month)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetKey {
    Month(YearMonth),
    Day(NaiveDate),
}

impl TargetKey {
    /// `YYYY-MM.html` or `YYYY-MM-DD.html`
    pub fn filename(&self) -> String {
        format!("{self}.{ARTIFACT_EXT}")
    }

    pub fn from_filename(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(ARTIFACT_EXT)?.strip_suffix('.')?;
        match stem.len() {
            7 => stem.parse().ok().map(TargetKey::Month),
            10 => parse_date(stem).ok().map(TargetKey::Day),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKey::Month(ym) => write!(f, "{ym}"),
            TargetKey::Day(d) => write!(f, "{:04}-{:02}-{:02}", d.year(), d.month(), d.day()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub key: TargetKey,
    pub url: String,
    pub filename: String,
}

impl Target {
    fn new(key: TargetKey, url: String) -> Self {
        let filename = key.filename();
        Self { key, url, filename }
    }
}

/// Build the ordered target list for `range` under `context`. Pure; no I/O.
///
/// Month spans come out in chronological order. Explicit dates keep the
/// caller's order and are not deduplicated.
pub fn enumerate(range: &TargetRange, context: &CalendarContext) -> Result<Vec<Target>> {
    match range {
        TargetRange::Years { start, end } => {
            let start = YearMonth::new(*start, 1)?;
            let end = YearMonth::new(*end, 12)?;
            months(start, end, context)
        }
        TargetRange::Months { start, end } => months(*start, *end, context),
        TargetRange::Dates(dates) => {
            let base = context.day_url().ok_or(Error::NoDayPages(*context))?;
            dates
                .iter()
                .map(|s| {
                    let d = parse_date(s)?;
                    let url = format!("{base}?date={:02}/{:02}/{:04}", d.day(), d.month(), d.year());
                    Ok(Target::new(TargetKey::Day(d), url))
                })
                .collect()
        }
    }
}

fn months(start: YearMonth, end: YearMonth, context: &CalendarContext) -> Result<Vec<Target>> {
    if end < start {
        return Err(Error::InvalidRange(format!("{end} precedes {start}")));
    }
    let base = context.month_url();
    let mut out = Vec::new();
    let mut ym = start;
    loop {
        let url = format!("{base}?date=01/{:02}/{:04}", ym.month, ym.year);
        out.push(Target::new(TargetKey::Month(ym), url));
        if ym == end {
            break;
        }
        ym = ym.succ();
    }
    Ok(out)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    let bad = || Error::InvalidRange(format!("malformed date {s:?}, expected YYYY-MM-DD"));
    if s.len() != 10 {
        return Err(bad());
    }
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| bad())?;
    if d.year() < 1 {
        return Err(bad());
    }
    Ok(d)
}

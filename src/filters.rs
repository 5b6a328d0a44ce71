//! Filter selection types: city, month and day-of-week.

use chrono::Weekday;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Returned when user input is not a member of a filter enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterError {
    kind: &'static str,
    input: String,
}

impl fmt::Display for ParseFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.input)
    }
}

impl std::error::Error for ParseFilterError {}

impl ParseFilterError {
    fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }
}

/// A city with a bikeshare dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    /// Name of the CSV file holding this city's trips.
    pub fn file_name(self) -> &'static str {
        match self {
            City::Chicago => "chicago.csv",
            City::NewYorkCity => "new_york_city.csv",
            City::Washington => "washington.csv",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            City::Chicago => "chicago",
            City::NewYorkCity => "new york city",
            City::Washington => "washington",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ParseFilterError::new("city", s))
    }
}

const MONTH_NAMES: [&str; 6] = ["january", "february", "march", "april", "may", "june"];

/// Month restriction. Only the first six months are covered by the datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    /// Month number, 1 = January.
    Month(u32),
}

impl MonthFilter {
    pub fn matches(self, month: u32) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(m) => m == month,
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all"),
            MonthFilter::Month(m) => f.write_str(month_name(*m).unwrap_or("unknown")),
        }
    }
}

impl Serialize for MonthFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for MonthFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(MonthFilter::All);
        }
        MONTH_NAMES
            .iter()
            .position(|m| *m == s)
            .map(|idx| MonthFilter::Month(idx as u32 + 1))
            .ok_or_else(|| ParseFilterError::new("month", s))
    }
}

/// Capitalised English month name for a month number (1-12).
pub fn month_name(month: u32) -> Option<&'static str> {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Day-of-week restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayFilter {
    All,
    Day(Weekday),
}

impl DayFilter {
    pub fn matches(self, day: Weekday) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Day(d) => d == day,
        }
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::All => f.write_str("all"),
            DayFilter::Day(d) => f.write_str(day_name(*d)),
        }
    }
}

impl Serialize for DayFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for DayFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(DayFilter::All);
        }
        // chrono also accepts "mon", "tue", ...; only full names are valid here
        match s.parse::<Weekday>() {
            Ok(day) if day_name(day).eq_ignore_ascii_case(s) => Ok(DayFilter::Day(day)),
            _ => Err(ParseFilterError::new("day", s)),
        }
    }
}

/// Title-cased day name, e.g. `"Friday"`.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// The `(city, month, day)` triple chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub city: City,
    pub month: MonthFilter,
    pub day: DayFilter,
}

impl FilterSelection {
    pub fn new(city: City, month: MonthFilter, day: DayFilter) -> Self {
        Self { city, month, day }
    }
}

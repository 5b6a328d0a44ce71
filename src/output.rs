//! Output formatting for statistics reports.
//!
//! Supports the plain console layout and pretty-printed JSON.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

use crate::stats::{DurationStats, StationStats, TimeStats, UserStats, ValueCount};

pub const SEPARATOR_WIDTH: usize = 40;

/// How statistics reports are written to the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A statistics block that can be rendered as console text.
pub trait Report: Serialize {
    /// Printed before the report, e.g. "Calculating Trip Duration...".
    const HEADING: &'static str;

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()>;
}

pub fn write_separator(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
}

/// Writes `report` framed by its heading, the time it took and a separator.
pub fn print_report<R: Report>(
    out: &mut dyn Write,
    report: &R,
    elapsed: Duration,
    format: OutputFormat,
) -> Result<()> {
    debug!(heading = R::HEADING, elapsed_ms = elapsed.as_millis() as u64, "Report computed");

    writeln!(out, "\n{}\n", R::HEADING)?;
    match format {
        OutputFormat::Text => report.write_text(out)?,
        OutputFormat::Json => print_json(out, report)?,
    }
    writeln!(out, "\nThis took {} seconds.", elapsed.as_secs_f64())?;
    write_separator(out)?;
    Ok(())
}

/// Writes any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

struct OrNa<T>(Option<T>);

impl<T: Display> Display for OrNa<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("n/a"),
        }
    }
}

fn write_counts(out: &mut dyn Write, counts: &[ValueCount]) -> std::io::Result<()> {
    if counts.is_empty() {
        return writeln!(out, "  n/a");
    }
    for c in counts {
        writeln!(out, "  {}: {}", c.value, c.count)?;
    }
    Ok(())
}

impl Report for TimeStats {
    const HEADING: &'static str = "Calculating The Most Frequent Times of Travel...";

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "Most Common Month: {}", OrNa(self.most_common_month))?;
        writeln!(
            out,
            "Most Common Day of the Week: {}",
            OrNa(self.most_common_day.as_deref())
        )?;
        writeln!(out, "Most Frequent Start Hour: {}", OrNa(self.most_common_hour))
    }
}

impl Report for StationStats {
    const HEADING: &'static str = "Calculating The Most Popular Stations and Trip...";

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            out,
            "Most Common Start Station: {}",
            OrNa(self.most_common_start_station.as_deref())
        )?;
        writeln!(
            out,
            "Most Common End Station: {}",
            OrNa(self.most_common_end_station.as_deref())
        )?;
        writeln!(
            out,
            "Most Frequent Combination of Start Station and End Station: {}",
            OrNa(self.most_common_trip.as_deref())
        )
    }
}

impl Report for DurationStats {
    const HEADING: &'static str = "Calculating Trip Duration...";

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "Total Travel Time: {}", self.total_travel_time)?;
        writeln!(out, "Mean Travel Time: {}", OrNa(self.mean_travel_time))
    }
}

impl Report for UserStats {
    const HEADING: &'static str = "Calculating User Stats...";

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "Counts of user types:")?;
        write_counts(out, &self.user_types)?;

        if let Some(gender) = &self.gender {
            writeln!(out, "\nCounts of gender:")?;
            write_counts(out, gender)?;
        }

        if let Some(years) = &self.birth_year {
            writeln!(out, "\nEarliest year of birth: {}", OrNa(years.earliest))?;
            writeln!(out, "Most recent year of birth: {}", OrNa(years.most_recent))?;
            writeln!(out, "Most common year of birth: {}", OrNa(years.most_common))?;
        }
        Ok(())
    }
}

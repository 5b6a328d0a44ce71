//! The interactive explore/restart loop.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::loader::{TripTable, load_data};
use crate::output::{OutputFormat, Report, print_json, print_report};
use crate::pager::{RawPager, print_rows};
use crate::prompt::{confirm, get_filters};
use crate::stats::{station_stats, time_stats, trip_duration_stats, user_stats};

const RAW_DATA_QUESTION: &str = "Would you like to view individual trip data? Type yes or no.";
const RESTART_QUESTION: &str = "Would you like to restart? Enter yes or no.";

/// Runtime settings for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding `chicago.csv`, `new_york_city.csv` and `washington.csv`.
    pub data_dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            format: OutputFormat::Text,
        }
    }
}

fn timed_report<R: Report>(
    out: &mut dyn Write,
    table: &TripTable,
    format: OutputFormat,
    compute: fn(&TripTable) -> R,
) -> Result<()> {
    let started = Instant::now();
    let report = compute(table);
    print_report(out, &report, started.elapsed(), format)
}

/// Prints the four statistics reports in order.
pub fn print_statistics(out: &mut dyn Write, table: &TripTable, format: OutputFormat) -> Result<()> {
    timed_report(out, table, format, time_stats)?;
    timed_report(out, table, format, station_stats)?;
    timed_report(out, table, format, trip_duration_stats)?;
    timed_report(out, table, format, user_stats)?;
    Ok(())
}

/// Offers raw rows five at a time until the user declines or rows run out.
pub fn page_raw_data<R: BufRead>(input: &mut R, out: &mut dyn Write, table: &TripTable) -> Result<()> {
    let mut pager = RawPager::new();

    while confirm(input, out, RAW_DATA_QUESTION)? {
        let rows = pager.next_page(table);
        print_rows(out, table, rows)?;

        if pager.is_exhausted(table) {
            writeln!(out, "\nNo more raw data to display.")?;
            break;
        }
    }
    Ok(())
}

/// Runs sessions until the user declines to restart or input ends.
pub fn run<R: BufRead>(input: &mut R, out: &mut dyn Write, config: &SessionConfig) -> Result<()> {
    let mut iteration = 0u32;

    loop {
        iteration += 1;
        let Some(selection) = get_filters(input, out)? else {
            info!("Input closed, ending session");
            return Ok(());
        };
        info!(iteration, city = %selection.city, month = %selection.month, day = %selection.day, "Filters selected");

        let table = load_data(&config.data_dir, &selection)?;
        if config.format == OutputFormat::Json {
            print_json(out, &selection)?;
        }

        print_statistics(out, &table, config.format)?;
        page_raw_data(input, out, &table)?;

        if !confirm(input, out, RESTART_QUESTION)? {
            info!(iteration, "Session finished");
            return Ok(());
        }
    }
}

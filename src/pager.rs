//! Raw trip-data paging, five rows at a time.

use std::io::Write;

use crate::filters::day_name;
use crate::loader::{TripRow, TripTable};

pub const PAGE_SIZE: usize = 5;

/// Tracks the offset of the next page of raw rows.
#[derive(Debug, Default, Clone)]
pub struct RawPager {
    offset: usize,
}

impl RawPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns up to [`PAGE_SIZE`] rows from the current offset and advances it.
    pub fn next_page<'a>(&mut self, table: &'a TripTable) -> &'a [TripRow] {
        let start = self.offset.min(table.len());
        let end = (start + PAGE_SIZE).min(table.len());
        self.offset += PAGE_SIZE;
        &table.rows[start..end]
    }

    /// `true` once every row has been handed out.
    pub fn is_exhausted(&self, table: &TripTable) -> bool {
        self.offset >= table.len()
    }
}

/// Prints each row as `header: value` lines. The first column (the row id)
/// is skipped and the derived month, day-of-week and hour are appended.
pub fn print_rows(out: &mut dyn Write, table: &TripTable, rows: &[TripRow]) -> std::io::Result<()> {
    for row in rows {
        for (header, value) in table.headers.iter().zip(row.fields.iter()).skip(1) {
            writeln!(out, "{header}: {value}")?;
        }
        writeln!(out, "month: {}", row.record.month)?;
        writeln!(out, "day_of_week: {}", day_name(row.record.day_of_week))?;
        writeln!(out, "hour: {}", row.record.hour)?;
        writeln!(out)?;
    }
    Ok(())
}

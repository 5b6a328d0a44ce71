//! CSV loading and filtering of bikeshare trip logs.
//!
//! Each city file is read into a [`TripTable`]: typed [`TripRecord`]s with
//! derived month, day-of-week and start hour, alongside the raw CSV fields
//! used by the raw-data pager.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use csv::StringRecord;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::filters::FilterSelection;

pub const START_TIME: &str = "Start Time";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const REQUIRED_COLUMNS: [&str; 5] = [
    START_TIME,
    START_STATION,
    END_STATION,
    TRIP_DURATION,
    USER_TYPE,
];

const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One row as it appears in the city CSV files.
#[derive(Debug, Deserialize)]
struct CsvTrip {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "User Type")]
    user_type: Option<String>,
    #[serde(rename = "Gender")]
    gender: Option<String>,
    #[serde(rename = "Birth Year")]
    birth_year: Option<f64>,
}

/// A single trip with its derived time columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    pub start_station: String,
    pub end_station: String,
    /// Seconds.
    pub trip_duration: f64,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,

    // derived at load time
    pub month: u32,
    pub day_of_week: Weekday,
    pub hour: u32,
}

impl TripRecord {
    fn from_csv(trip: CsvTrip) -> Result<Self> {
        let start_time = NaiveDateTime::parse_from_str(&trip.start_time, START_TIME_FORMAT)
            .with_context(|| format!("invalid start time {:?}", trip.start_time))?;

        Ok(TripRecord {
            month: start_time.month(),
            day_of_week: start_time.weekday(),
            hour: start_time.hour(),
            start_time,
            start_station: trip.start_station,
            end_station: trip.end_station,
            trip_duration: trip.trip_duration,
            user_type: trip.user_type,
            gender: trip.gender,
            birth_year: trip
                .birth_year
                .filter(|y| y.is_finite())
                .map(|y| y.round() as i32),
        })
    }

    /// `"<start> => <end>"` key used for the popular trip statistic.
    pub fn route(&self) -> String {
        format!("{} => {}", self.start_station, self.end_station)
    }
}

/// Optional demographic columns present in a loaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub has_gender: bool,
    pub has_birth_year: bool,
}

impl TableSchema {
    fn from_headers(headers: &StringRecord) -> Self {
        TableSchema {
            has_gender: headers.iter().any(|h| h == GENDER),
            has_birth_year: headers.iter().any(|h| h == BIRTH_YEAR),
        }
    }
}

/// A typed record together with the CSV fields it was parsed from.
#[derive(Debug, Clone)]
pub struct TripRow {
    pub record: TripRecord,
    pub fields: StringRecord,
}

/// In-memory table of trips for one city.
#[derive(Debug, Clone)]
pub struct TripTable {
    pub headers: StringRecord,
    pub schema: TableSchema,
    pub rows: Vec<TripRow>,
}

impl TripTable {
    /// Parses a whole CSV document. Fails on the first malformed row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers().context("reading CSV header")?.clone();

        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                bail!("missing required column {column:?}");
            }
        }

        let schema = TableSchema::from_headers(&headers);
        debug!(?schema, "CSV header parsed");

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            // header is line 1
            let line = idx + 2;
            let fields = result.with_context(|| format!("reading CSV line {line}"))?;
            let trip: CsvTrip = fields
                .deserialize(Some(&headers))
                .with_context(|| format!("parsing CSV line {line}"))?;
            let record =
                TripRecord::from_csv(trip).with_context(|| format!("parsing CSV line {line}"))?;
            rows.push(TripRow { record, fields });
        }

        Ok(TripTable {
            headers,
            schema,
            rows,
        })
    }

    /// Keeps only the rows matching the month and day of `selection`.
    pub fn filter(mut self, selection: &FilterSelection) -> Self {
        self.rows.retain(|row| {
            selection.month.matches(row.record.month)
                && selection.day.matches(row.record.day_of_week)
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &TripRecord> {
        self.rows.iter().map(|row| &row.record)
    }
}

/// Loads `<data_dir>/<city file>` and applies the month and day filters.
#[tracing::instrument(skip(data_dir), fields(data_dir = %data_dir.display(), city = %selection.city))]
pub fn load_data(data_dir: &Path, selection: &FilterSelection) -> Result<TripTable> {
    let path = data_dir.join(selection.city.file_name());
    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;

    let table = TripTable::from_reader(file).with_context(|| format!("loading {}", path.display()))?;
    let total = table.len();

    let table = table.filter(selection);
    info!(
        total,
        matched = table.len(),
        month = %selection.month,
        day = %selection.day,
        "Trip data loaded"
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{City, DayFilter, MonthFilter};

    const CHICAGO: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year
1,2017-03-03 08:15:00,2017-03-03 08:25:00,600,Clark St,State St,Subscriber,Male,1985.0
2,2017-03-04 09:00:00,2017-03-04 09:10:00,600,Clark St,State St,Customer,,
3,2017-03-10 17:45:30,2017-03-10 18:00:00,870,Lake St,Clark St,Subscriber,Female,1990.0
4,2017-06-23 17:05:00,2017-06-23 17:20:00,900,Lake St,State St,Subscriber,Female,1979.0
";

    const WASHINGTON: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type
1,2017-01-01 00:07:57,2017-01-01 00:20:53,775.0,Eckington Pl,Lincoln Park,Subscriber
2,2017-01-02 10:07:57.123,2017-01-02 10:20:53,120.5,Lincoln Park,Eckington Pl,Customer
";

    fn selection(month: MonthFilter, day: DayFilter) -> FilterSelection {
        FilterSelection::new(City::Chicago, month, day)
    }

    #[test]
    fn test_from_reader_derives_time_columns() {
        let table = TripTable::from_reader(CHICAGO.as_bytes()).unwrap();

        assert_eq!(table.len(), 4);
        let first = &table.rows[0].record;
        assert_eq!(first.month, 3);
        assert_eq!(first.day_of_week, Weekday::Fri);
        assert_eq!(first.hour, 8);
        assert_eq!(first.birth_year, Some(1985));
        assert_eq!(first.route(), "Clark St => State St");
    }

    #[test]
    fn test_empty_optional_cells_are_absent() {
        let table = TripTable::from_reader(CHICAGO.as_bytes()).unwrap();
        let second = &table.rows[1].record;

        assert_eq!(second.gender, None);
        assert_eq!(second.birth_year, None);
    }

    #[test]
    fn test_non_finite_birth_year_is_absent() {
        let csv = "\
Start Time,Start Station,End Station,Trip Duration,User Type,Birth Year
2017-01-01 00:00:00,A,B,10,Subscriber,nan
2017-01-01 01:00:00,A,B,10,Subscriber,inf
2017-01-01 02:00:00,A,B,10,Subscriber,1970.0
";
        let table = TripTable::from_reader(csv.as_bytes()).unwrap();
        let years: Vec<_> = table.records().map(|r| r.birth_year).collect();

        assert_eq!(years, vec![None, None, Some(1970)]);
    }

    #[test]
    fn test_schema_with_demographics() {
        let table = TripTable::from_reader(CHICAGO.as_bytes()).unwrap();
        assert!(table.schema.has_gender);
        assert!(table.schema.has_birth_year);
    }

    #[test]
    fn test_schema_without_demographics() {
        let table = TripTable::from_reader(WASHINGTON.as_bytes()).unwrap();

        assert_eq!(table.schema, TableSchema::default());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].record.trip_duration, 120.5);
        assert_eq!(table.rows[1].record.hour, 10);
    }

    #[test]
    fn test_filter_month_and_day() {
        let table = TripTable::from_reader(CHICAGO.as_bytes()).unwrap();
        let filtered = table.filter(&selection(
            MonthFilter::Month(3),
            DayFilter::Day(Weekday::Fri),
        ));

        assert_eq!(filtered.len(), 2);
        assert!(
            filtered
                .records()
                .all(|r| r.month == 3 && r.day_of_week == Weekday::Fri)
        );
    }

    #[test]
    fn test_filter_all_keeps_everything() {
        let table = TripTable::from_reader(CHICAGO.as_bytes()).unwrap();
        let filtered = table.filter(&selection(MonthFilter::All, DayFilter::All));
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_filter_day_only() {
        let table = TripTable::from_reader(CHICAGO.as_bytes()).unwrap();
        let filtered = table.filter(&selection(MonthFilter::All, DayFilter::Day(Weekday::Fri)));
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Start Time,End Station,Trip Duration,User Type\n";
        let err = TripTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Start Station"));
    }

    #[test]
    fn test_invalid_start_time_reports_line() {
        let csv = "\
Start Time,Start Station,End Station,Trip Duration,User Type
yesterday,A,B,10,Subscriber
";
        let err = TripTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_invalid_duration_is_an_error() {
        let csv = "\
Start Time,Start Station,End Station,Trip Duration,User Type
2017-01-01 00:00:00,A,B,long,Subscriber
";
        assert!(TripTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_data_missing_file() {
        let dir = std::env::temp_dir().join("bikeshare_explorer_missing_dir");
        let sel = FilterSelection::new(City::Washington, MonthFilter::All, DayFilter::All);

        let err = load_data(&dir, &sel).unwrap_err();
        assert!(err.to_string().contains("washington.csv"));
    }
}

//! Descriptive statistics over a filtered [`TripTable`].
//!
//! The four reporters are independent and only read the table.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use crate::filters::day_name;
use crate::loader::TripTable;

/// Most frequent times of travel.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct TimeStats {
    pub most_common_month: Option<u32>,
    pub most_common_day: Option<String>,
    pub most_common_hour: Option<u32>,
}

/// Most popular stations and trip.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct StationStats {
    pub most_common_start_station: Option<String>,
    pub most_common_end_station: Option<String>,
    pub most_common_trip: Option<String>,
}

/// Total and average trip duration, in seconds.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct DurationStats {
    pub total_travel_time: f64,
    pub mean_travel_time: Option<f64>,
}

/// Occurrences of one value in a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: Option<i32>,
    pub most_recent: Option<i32>,
    pub most_common: Option<i32>,
}

/// User demographics. `gender` and `birth_year` are `None` when the
/// loaded file has no such column.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub user_types: Vec<ValueCount>,
    pub gender: Option<Vec<ValueCount>>,
    pub birth_year: Option<BirthYearStats>,
}

/// Counts occurrences, most frequent first. Equal counts keep the order in
/// which the values first appeared.
pub fn value_counts<T, I>(values: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();

    for value in values {
        match index.get(&value) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }

    // stable: ties stay in first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Most frequent value; ties go to the earliest occurrence.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    value_counts(values).into_iter().next().map(|(value, _)| value)
}

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn to_value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<ValueCount> {
    value_counts(values)
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect()
}

pub fn time_stats(table: &TripTable) -> TimeStats {
    TimeStats {
        most_common_month: mode(table.records().map(|r| r.month)),
        most_common_day: mode(table.records().map(|r| r.day_of_week))
            .map(|d| day_name(d).to_string()),
        most_common_hour: mode(table.records().map(|r| r.hour)),
    }
}

pub fn station_stats(table: &TripTable) -> StationStats {
    StationStats {
        most_common_start_station: mode(table.records().map(|r| r.start_station.as_str()))
            .map(str::to_string),
        most_common_end_station: mode(table.records().map(|r| r.end_station.as_str()))
            .map(str::to_string),
        most_common_trip: mode(table.records().map(|r| r.route())),
    }
}

pub fn trip_duration_stats(table: &TripTable) -> DurationStats {
    let durations: Vec<f64> = table.records().map(|r| r.trip_duration).collect();

    DurationStats {
        total_travel_time: durations.iter().sum(),
        mean_travel_time: mean(&durations),
    }
}

/// Absent cells are skipped. Gender and birth year are only reported when
/// the table's schema carries those columns.
pub fn user_stats(table: &TripTable) -> UserStats {
    let user_types = to_value_counts(table.records().filter_map(|r| r.user_type.as_deref()));

    let gender = table
        .schema
        .has_gender
        .then(|| to_value_counts(table.records().filter_map(|r| r.gender.as_deref())));

    let birth_year = table.schema.has_birth_year.then(|| {
        let years: Vec<i32> = table.records().filter_map(|r| r.birth_year).collect();
        BirthYearStats {
            earliest: years.iter().min().copied(),
            most_recent: years.iter().max().copied(),
            most_common: mode(years.iter().copied()),
        }
    });

    UserStats {
        user_types,
        gender,
        birth_year,
    }
}

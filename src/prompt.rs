//! Validated console prompts.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::debug;

use crate::filters::{City, DayFilter, FilterSelection, MonthFilter};
use crate::output::write_separator;

const CITY_QUESTION: &str = "Please, enter the city name (chicago, new york city, washington)";
const MONTH_QUESTION: &str = "Which month? (all, january, february, ... , june)";
const DAY_QUESTION: &str = "Which day? (all, monday, tuesday, ... sunday)";

/// Reads one line. `None` at end of input.
fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_lowercase()))
}

/// Asks `question` until the lower-cased answer parses as `T`.
///
/// Returns `Ok(None)` if input ends before a valid answer is given.
pub fn prompt_choice<T, R>(input: &mut R, out: &mut dyn Write, question: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    R: BufRead,
{
    loop {
        writeln!(out, "{question}")?;
        out.flush()?;

        let Some(answer) = read_answer(input)? else {
            return Ok(None);
        };
        match answer.parse::<T>() {
            Ok(choice) => return Ok(Some(choice)),
            Err(e) => debug!(error = %e, "Rejected prompt answer"),
        }
    }
}

/// Asks for city, month and day. `None` if input ends first.
pub fn get_filters<R: BufRead>(input: &mut R, out: &mut dyn Write) -> Result<Option<FilterSelection>> {
    writeln!(out, "Hello! Let's explore some US bikeshare data!")?;

    let Some(city) = prompt_choice::<City, _>(input, out, CITY_QUESTION)? else {
        return Ok(None);
    };
    let Some(month) = prompt_choice::<MonthFilter, _>(input, out, MONTH_QUESTION)? else {
        return Ok(None);
    };
    let Some(day) = prompt_choice::<DayFilter, _>(input, out, DAY_QUESTION)? else {
        return Ok(None);
    };

    write_separator(out)?;
    Ok(Some(FilterSelection::new(city, month, day)))
}

/// Yes/no question. Only "yes" (any case) is affirmative; end of input is "no".
pub fn confirm<R: BufRead>(input: &mut R, out: &mut dyn Write, question: &str) -> Result<bool> {
    writeln!(out, "\n{question}")?;
    out.flush()?;
    Ok(read_answer(input)?.is_some_and(|a| a == "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use std::io::Cursor;

    fn run_filters(script: &str) -> (Option<FilterSelection>, String) {
        let mut input = Cursor::new(script.as_bytes());
        let mut out = Vec::new();
        let selection = get_filters(&mut input, &mut out).unwrap();
        (selection, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_get_filters_valid_input() {
        let (selection, out) = run_filters("Chicago\nMARCH\nfriday\n");

        assert_eq!(
            selection,
            Some(FilterSelection::new(
                City::Chicago,
                MonthFilter::Month(3),
                DayFilter::Day(Weekday::Fri)
            ))
        );
        assert!(out.starts_with("Hello! Let's explore some US bikeshare data!"));
        assert!(out.ends_with(&format!("{}\n", "-".repeat(40))));
    }

    #[test]
    fn test_invalid_city_reprompts() {
        let (selection, out) = run_filters("boston\nwashington\nall\nall\n");

        assert_eq!(selection.unwrap().city, City::Washington);
        assert_eq!(out.matches(CITY_QUESTION).count(), 2);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let (selection, _) = run_filters("  new york city \nall\n Sunday\n");
        let selection = selection.unwrap();

        assert_eq!(selection.city, City::NewYorkCity);
        assert_eq!(selection.day, DayFilter::Day(Weekday::Sun));
    }

    #[test]
    fn test_end_of_input_ends_prompting() {
        let (selection, out) = run_filters("chicago\njuly\n");

        assert_eq!(selection, None);
        assert_eq!(out.matches(MONTH_QUESTION).count(), 2);
    }

    #[test]
    fn test_confirm() {
        let mut out = Vec::new();
        assert!(confirm(&mut Cursor::new("YES\n"), &mut out, "Again?").unwrap());
        assert!(!confirm(&mut Cursor::new("y\n"), &mut out, "Again?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut out, "Again?").unwrap());
    }
}

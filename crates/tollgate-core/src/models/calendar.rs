//! Calendar rule model
//!
//! A calendar rule scopes a rate plan or a scheduled action in time. It is
//! made of optional sets of years, months, month days and week days plus an
//! optional time-of-day window. Empty sets match anything and the time-of-day
//! window is half-open: `[start_time, end_time)`, a missing end meaning the
//! end of the day.

use crate::error::AppError;
use crate::AppResult;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Keyword accepted by the parsers for "every value of this field"
pub const ALL: &str = "*all";

/// Separator used by list fields in their string form
pub const LIST_SEP: char = ';';

/// How far `next_occurrence` scans before giving up (about eight years)
const LOOKAHEAD_DAYS: u64 = 366 * 8;

/// Recurrence rule matched against instants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<i32>,

    /// Months, 1 = January
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub months: Vec<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub month_days: Vec<u32>,

    /// ISO week days, 1 = Monday .. 7 = Sunday
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub week_days: Vec<u32>,

    /// Start of the daily window (inclusive), midnight when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,

    /// End of the daily window (exclusive), end of day when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
}

impl CalendarRule {
    /// Rule matching every instant
    pub fn always() -> Self {
        Self::default()
    }

    /// Build a rule from its textual form
    ///
    /// List fields are `;` separated. `*all` leaves the year list empty and
    /// expands months, month days and week days to their full range. Times are
    /// `HH:MM:SS`; an empty string leaves the bound open.
    pub fn from_strings(
        years: &str,
        months: &str,
        month_days: &str,
        week_days: &str,
        start_time: &str,
        end_time: &str,
    ) -> AppResult<Self> {
        Ok(Self {
            years: parse_years(years)?,
            months: parse_list(months, 1, 12, "month")?,
            month_days: parse_list(month_days, 1, 31, "month day")?,
            week_days: parse_week_days(week_days)?,
            start_time: parse_time(start_time)?,
            end_time: parse_time(end_time)?,
        })
    }

    /// True when no date component is restricted
    pub fn has_no_date_components(&self) -> bool {
        self.years.is_empty()
            && self.months.is_empty()
            && self.month_days.is_empty()
            && self.week_days.is_empty()
    }

    /// True when the rule matches every instant
    pub fn is_always(&self) -> bool {
        self.has_no_date_components() && self.start_time.is_none() && self.end_time.is_none()
    }

    /// Date part of the match: every populated set holds the date's field
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        (self.years.is_empty() || self.years.contains(&date.year()))
            && (self.months.is_empty() || self.months.contains(&date.month()))
            && (self.month_days.is_empty() || self.month_days.contains(&date.day()))
            && (self.week_days.is_empty()
                || self
                    .week_days
                    .contains(&date.weekday().number_from_monday()))
    }

    /// Time-of-day part of the match, half-open
    pub fn matches_time(&self, time: NaiveTime) -> bool {
        if let Some(start) = self.start_time {
            if time < start {
                return false;
            }
        }
        match self.end_time {
            Some(end) => time < end,
            None => true,
        }
    }

    /// Returns true if the instant falls inside the rule
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.matches_date(instant.date_naive()) && self.matches_time(instant.time())
    }

    /// Containment test for the exclusive end of an interval
    ///
    /// The end of a span is not part of it, so this checks the last instant
    /// strictly before `end`.
    pub fn contains_end(&self, end: DateTime<Utc>) -> bool {
        self.contains(end - Duration::nanoseconds(1))
    }

    /// Where the daily window closes on the day of `instant`
    pub fn right_margin(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = instant.date_naive();
        match self.end_time {
            Some(end) => date.and_time(end).and_utc(),
            None => next_midnight(date),
        }
    }

    /// Where the daily window opens on the day the interval ending at `end` is in
    pub fn left_margin(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        let date = (end - Duration::nanoseconds(1)).date_naive();
        date.and_time(self.start_time.unwrap_or(NaiveTime::MIN))
            .and_utc()
    }

    /// First instant strictly after `after` at which the rule starts a window
    ///
    /// Candidates are the matching dates at the start time (midnight when
    /// unset). Returns `None` when nothing matches within the lookahead or
    /// every configured year is already past.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = self.start_time.unwrap_or(NaiveTime::MIN);
        let last_year = self.years.iter().max().copied();
        let mut date = after.date_naive();

        for _ in 0..LOOKAHEAD_DAYS {
            if last_year.is_some_and(|y| date.year() > y) {
                return None;
            }
            if self.matches_date(date) {
                let candidate = date.and_time(start).and_utc();
                if candidate > after {
                    return Some(candidate);
                }
            }
            date = date.checked_add_days(Days::new(1))?;
        }
        None
    }
}

fn next_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn split_list(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(LIST_SEP)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// Parse a `;` separated list of years; `*all` means any year
pub fn parse_years(input: &str) -> AppResult<Vec<i32>> {
    let input = input.trim();
    if input == ALL {
        return Ok(Vec::new());
    }
    split_list(input)
        .map(|item| {
            item.parse::<i32>()
                .map_err(|_| AppError::InvalidInput(format!("invalid year '{}'", item)))
        })
        .collect()
}

fn parse_list(input: &str, min: u32, max: u32, what: &str) -> AppResult<Vec<u32>> {
    let input = input.trim();
    if input == ALL {
        return Ok((min..=max).collect());
    }
    split_list(input)
        .map(|item| match item.parse::<u32>() {
            Ok(v) if (min..=max).contains(&v) => Ok(v),
            _ => Err(AppError::InvalidInput(format!("invalid {} '{}'", what, item))),
        })
        .collect()
}

/// Parse week days; `0` and `7` both denote Sunday
pub fn parse_week_days(input: &str) -> AppResult<Vec<u32>> {
    let mut days = parse_list(input, 0, 7, "week day")?
        .into_iter()
        .map(|d| if d == 0 { 7 } else { d })
        .collect::<Vec<_>>();
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

/// Parse an `HH:MM:SS` time of day; empty means an open bound
pub fn parse_time(input: &str) -> AppResult<Option<NaiveTime>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .map(Some)
        .map_err(|_| AppError::InvalidInput(format!("invalid time of day '{}'", input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn time(s: &str) -> Option<NaiveTime> {
        parse_time(s).unwrap()
    }

    fn workdays() -> CalendarRule {
        CalendarRule {
            week_days: vec![1, 2, 3, 4, 5],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_rule_matches_everything() {
        let rule = CalendarRule::always();
        assert!(rule.contains(at(2012, 2, 5, 0, 0, 0)));
        assert!(rule.contains(at(1999, 12, 31, 23, 59, 59)));
        assert!(rule.is_always());
        assert!(!workdays().is_always());
    }

    #[test]
    fn test_week_days() {
        let rule = workdays();
        // 2012-02-03 is a Friday, 2012-02-05 a Sunday
        assert!(rule.contains(at(2012, 2, 3, 23, 45, 0)));
        assert!(!rule.contains(at(2012, 2, 5, 17, 45, 0)));
    }

    #[test]
    fn test_sunday_is_seven() {
        let rule = CalendarRule {
            week_days: parse_week_days("0").unwrap(),
            ..Default::default()
        };
        assert_eq!(rule.week_days, vec![7]);
        assert!(rule.contains(at(2012, 2, 5, 17, 45, 0)));
    }

    #[test]
    fn test_months_month_days_and_years() {
        let rule = CalendarRule {
            years: vec![2012],
            months: vec![12],
            month_days: vec![1],
            ..Default::default()
        };
        assert!(rule.contains(at(2012, 12, 1, 8, 0, 0)));
        assert!(!rule.contains(at(2013, 12, 1, 8, 0, 0)));
        assert!(!rule.contains(at(2012, 11, 1, 8, 0, 0)));
        assert!(!rule.contains(at(2012, 12, 2, 8, 0, 0)));
    }

    #[test]
    fn test_time_window_is_half_open() {
        let rule = CalendarRule {
            start_time: time("09:00:00"),
            end_time: time("18:00:00"),
            ..Default::default()
        };
        assert!(!rule.contains(at(2012, 2, 3, 8, 59, 59)));
        assert!(rule.contains(at(2012, 2, 3, 9, 0, 0)));
        assert!(rule.contains(at(2012, 2, 3, 17, 59, 59)));
        assert!(!rule.contains(at(2012, 2, 3, 18, 0, 0)));
        // an interval ending exactly at the close is still inside
        assert!(rule.contains_end(at(2012, 2, 3, 18, 0, 0)));
    }

    #[test]
    fn test_right_margin_without_end_is_next_midnight() {
        let rule = workdays();
        assert_eq!(
            rule.right_margin(at(2012, 2, 3, 23, 45, 0)),
            at(2012, 2, 4, 0, 0, 0)
        );
    }

    #[test]
    fn test_right_margin_with_end_time() {
        let rule = CalendarRule {
            end_time: time("17:59:00"),
            ..workdays()
        };
        assert_eq!(
            rule.right_margin(at(2012, 2, 3, 17, 30, 0)),
            at(2012, 2, 3, 17, 59, 0)
        );
    }

    #[test]
    fn test_left_margins() {
        let rule = workdays();
        assert_eq!(
            rule.left_margin(at(2012, 2, 6, 0, 10, 0)),
            at(2012, 2, 6, 0, 0, 0)
        );

        let rule = CalendarRule {
            months: vec![12],
            month_days: vec![1],
            start_time: time("09:00:00"),
            ..Default::default()
        };
        assert_eq!(
            rule.left_margin(at(2012, 12, 1, 9, 20, 0)),
            at(2012, 12, 1, 9, 0, 0)
        );
    }

    #[test]
    fn test_next_occurrence_monthly() {
        let rule = CalendarRule::from_strings("*all", "*all", "1", "", "00:00:00", "").unwrap();
        assert_eq!(
            rule.next_occurrence(at(2013, 7, 15, 10, 0, 0)),
            Some(at(2013, 8, 1, 0, 0, 0))
        );
        // strictly after
        assert_eq!(
            rule.next_occurrence(at(2013, 8, 1, 0, 0, 0)),
            Some(at(2013, 9, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_next_occurrence_same_day_later_start() {
        let rule = CalendarRule {
            start_time: time("14:30:00"),
            ..Default::default()
        };
        assert_eq!(
            rule.next_occurrence(at(2013, 7, 15, 10, 0, 0)),
            Some(at(2013, 7, 15, 14, 30, 0))
        );
    }

    #[test]
    fn test_next_occurrence_past_years() {
        let rule = CalendarRule {
            years: vec![2010],
            ..Default::default()
        };
        assert_eq!(rule.next_occurrence(at(2013, 7, 15, 10, 0, 0)), None);
    }

    #[test]
    fn test_parse_all_keyword() {
        let rule = CalendarRule::from_strings("*all", "*all", "*all", "*all", "", "").unwrap();
        assert!(rule.years.is_empty());
        assert_eq!(rule.months.len(), 12);
        assert_eq!(rule.month_days.len(), 31);
        assert_eq!(rule.week_days, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(!rule.has_no_date_components());

        let one_time = CalendarRule::from_strings("", "", "", "", "", "").unwrap();
        assert!(one_time.has_no_date_components());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_time("25:00:00").is_err());
        assert!(parse_time("noon").is_err());
        assert!(parse_list("13", 1, 12, "month").is_err());
        assert!(parse_week_days("8").is_err());
        assert!(parse_years("20x3").is_err());
        assert_eq!(parse_years("2012;2013").unwrap(), vec![2012, 2013]);
    }
}

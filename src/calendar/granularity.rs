use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar unit used to chop a date range into periods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Day, Granularity::Month, Granularity::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    /// Capitalised name, as used in export file names.
    pub fn name(&self) -> &'static str {
        match self {
            Granularity::Day => "Day",
            Granularity::Month => "Month",
            Granularity::Year => "Year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "days" | "d" => Ok(Granularity::Day),
            "month" | "months" | "m" => Ok(Granularity::Month),
            "year" | "years" | "y" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity `{other}` (use day, month or year)")),
        }
    }
}

/// A granularity combined with a positive multiplier, e.g. "3 months".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Period {
    pub granularity: Granularity,
    count: u32,
}

impl Period {
    /// Builds a period, clamping `count` to at least 1.
    pub fn new(granularity: Granularity, count: u32) -> Self {
        Self {
            granularity,
            count: count.max(1),
        }
    }

    pub fn days(count: u32) -> Self {
        Self::new(Granularity::Day, count)
    }

    pub fn months(count: u32) -> Self {
        Self::new(Granularity::Month, count)
    }

    pub fn years(count: u32) -> Self {
        Self::new(Granularity::Year, count)
    }

    pub fn count(&self) -> u32 {
        // deserialized periods skip the constructor
        self.count.max(1)
    }

    pub fn label(&self) -> String {
        match (self.count(), self.granularity) {
            (1, Granularity::Day) => "Daily".into(),
            (1, Granularity::Month) => "Monthly".into(),
            (1, Granularity::Year) => "Yearly".into(),
            (n, unit) => format!("Every {} {}s", n, unit),
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::months(1)
    }
}

/// Moves `date` forward by `steps` units, saturating at the end of the calendar.
pub(crate) fn advance(date: NaiveDate, granularity: Granularity, steps: u32) -> NaiveDate {
    let shifted = match granularity {
        Granularity::Day => date.checked_add_days(Days::new(u64::from(steps))),
        Granularity::Month => date.checked_add_months(Months::new(steps)),
        Granularity::Year => steps
            .checked_mul(12)
            .and_then(|months| date.checked_add_months(Months::new(months))),
    };
    shifted.unwrap_or(NaiveDate::MAX)
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub(crate) fn first_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

pub(crate) fn last_of_month(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    date.with_day(day).unwrap_or(date)
}

pub(crate) fn last_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date)
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(first_next) => (first_next - Duration::days(1)).day(),
        None => 31,
    }
}

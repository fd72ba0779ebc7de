use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::granularity::{
    advance, first_of_month, first_of_year, last_of_month, last_of_year, Granularity, Period,
};
use crate::errors::CalendarError;

/// Display layout for span boundaries.
pub const SPAN_DATE_FORMAT: &str = "%d/%m/%Y";

/// Inclusive range of whole days, `begin <= end`.
///
/// Both ends cover the entire day, so a record dated on `end` lies inside the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Timespan {
    begin: NaiveDate,
    end: NaiveDate,
}

impl Timespan {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Result<Self, CalendarError> {
        if begin > end {
            return Err(CalendarError::InvertedSpan { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Smallest span covering every date yielded, `None` when there are none.
    pub fn covering(dates: impl IntoIterator<Item = NaiveDate>) -> Option<Self> {
        let mut dates = dates.into_iter();
        let first = dates.next()?;
        let (begin, end) = dates.fold((first, first), |(lo, hi), date| {
            (lo.min(date), hi.max(date))
        });
        Some(Self { begin, end })
    }

    pub fn begin(&self) -> NaiveDate {
        self.begin
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.begin).num_days() + 1
    }

    /// First day after this span, `None` at the end of the calendar.
    pub fn successor(&self) -> Option<NaiveDate> {
        self.end.checked_add_days(Days::new(1))
    }

    /// Renders both ends with `fmt`, joined by `separator`.
    pub fn span_str(&self, fmt: &str, separator: &str) -> String {
        format!(
            "{}{}{}",
            self.begin.format(fmt),
            separator,
            self.end.format(fmt)
        )
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.span_str(SPAN_DATE_FORMAT, "-"))
    }
}

/// The calendar-aligned span that starts at or before `date` and covers `period.count()` units.
///
/// Days start on `date` itself, months on the 1st and years on January 1st; the end is
/// the last day of the final unit.
pub fn aligned_span(date: NaiveDate, period: Period) -> Timespan {
    let extra = period.count() - 1;
    let (begin, end) = match period.granularity {
        Granularity::Day => (date, advance(date, Granularity::Day, extra)),
        Granularity::Month => {
            let begin = first_of_month(date);
            (begin, last_of_month(advance(begin, Granularity::Month, extra)))
        }
        Granularity::Year => {
            let begin = first_of_year(date);
            (begin, last_of_year(advance(begin, Granularity::Year, extra)))
        }
    };
    Timespan { begin, end }
}

//! Per-period reports: movement totals, balance snapshots and category sums.

pub mod export;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    calendar::{sectioned, Period, Section, Timespan},
    category::{categorize, CategorizationResult, CategoryTree},
    domain::{total, Record},
    errors::CalendarError,
};

pub use export::{default_export_name, export_csv, write_csv, FIXED_COLUMNS};

/// Balance snapshot taken from the first account-marked record of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Aggregates for one section of the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub timespan: Timespan,
    pub movements: Decimal,
    pub status: Option<Status>,
    pub categorization: CategorizationResult,
}

impl Report {
    pub fn from_section(section: &Section<'_>, tree: &CategoryTree) -> Self {
        let (movements, snapshots): (Vec<&Record>, Vec<&Record>) = section
            .records
            .iter()
            .copied()
            .partition(|record| record.is_movement());
        let status = snapshots.first().map(|record| Status {
            date: record.date(),
            amount: record.amount(),
        });
        Self {
            timespan: section.timespan,
            movements: total(movements.iter().copied()),
            status,
            categorization: categorize(&movements, tree),
        }
    }

    pub fn status_amount(&self) -> Option<Decimal> {
        self.status.map(|status| status.amount)
    }

    /// Column headers for this report: fixed columns then category paths.
    pub fn columns(&self) -> Vec<String> {
        FIXED_COLUMNS
            .iter()
            .map(|column| column.to_string())
            .chain(self.categorization.names().map(str::to_string))
            .collect()
    }

    /// CSV cells matching `columns`. A missing status is blank, a missing category `0`.
    pub fn to_row(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| match column.as_str() {
                "timespan" => self.timespan.to_string(),
                "movements" => self.movements.to_string(),
                "status" => self
                    .status_amount()
                    .map(|amount| amount.to_string())
                    .unwrap_or_default(),
                category => self
                    .categorization
                    .get(category)
                    .unwrap_or(Decimal::ZERO)
                    .to_string(),
            })
            .collect()
    }
}

/// One report per calendar section of `period`, in chronological order.
///
/// Empty input yields no reports.
pub fn build_reports(
    records: &[Record],
    tree: &CategoryTree,
    period: Period,
) -> Result<Vec<Report>, CalendarError> {
    let sections = sectioned(records, period)?;
    Ok(sections
        .iter()
        .map(|section| Report::from_section(section, tree))
        .collect())
}

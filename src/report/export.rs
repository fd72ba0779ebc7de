use std::{io, path::Path};

use chrono::NaiveDate;
use tracing::info;

use super::Report;
use crate::{calendar::Period, errors::Result};

/// Columns written before the category sums.
pub const FIXED_COLUMNS: [&str; 3] = ["timespan", "movements", "status"];

/// Writes `reports` as CSV, the header taken from the first report.
///
/// Returns the number of rows written; nothing is written for an empty slice.
pub fn write_csv<W: io::Write>(reports: &[Report], writer: W, delimiter: u8) -> Result<usize> {
    let Some(first) = reports.first() else {
        return Ok(0);
    };
    let columns = first.columns();
    let mut csv = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    csv.write_record(&columns)?;
    for report in reports {
        csv.write_record(report.to_row(&columns))?;
    }
    csv.flush()?;
    Ok(reports.len())
}

/// Exports `reports` to `path`; an empty slice leaves the filesystem untouched.
pub fn export_csv(reports: &[Report], path: &Path, delimiter: u8) -> Result<usize> {
    if reports.is_empty() {
        return Ok(0);
    }
    let file = std::fs::File::create(path)?;
    let rows = write_csv(reports, file, delimiter)?;
    info!(path = %path.display(), rows, "exported reports");
    Ok(rows)
}

/// Suggested export file name, e.g. `categorical_analysis-05_02_2024-Month-1.csv`.
pub fn default_export_name(period: Period, today: NaiveDate) -> String {
    format!(
        "categorical_analysis-{}-{}-{}.csv",
        today.format("%d_%m_%Y"),
        period.granularity.name(),
        period.count()
    )
}

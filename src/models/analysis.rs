use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use super::CategorySet;
use crate::{
    calendar::{Granularity, Period},
    errors::Result,
    import::Import,
    report::{build_reports, default_export_name, export_csv, Report},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    import_revision: u64,
    category_revision: u64,
    period: Period,
}

/// Cached reports for an import and category set at a chosen period.
#[derive(Debug, Default)]
pub struct Analysis {
    period: Period,
    reports: Vec<Report>,
    key: Option<CacheKey>,
}

impl Analysis {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Changes the period; `count` is clamped to 1 and the cache dropped.
    pub fn set_period(&mut self, granularity: Granularity, count: u32) {
        self.period = Period::new(granularity, count);
        self.key = None;
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// The import has a window set.
    pub fn can_analyse(import: &Import) -> bool {
        import.is_valid()
    }

    /// Rebuilds the reports when the import, the used categories or the period changed
    /// since the last build. Returns whether a rebuild happened.
    pub fn refresh(&mut self, import: &Import, categories: &CategorySet) -> Result<bool> {
        let key = CacheKey {
            import_revision: import.revision(),
            category_revision: categories.revision(),
            period: self.period,
        };
        if self.key == Some(key) {
            return Ok(false);
        }
        self.reports = build_reports(import.records(), categories.tree(), self.period)?;
        self.key = Some(key);
        debug!(reports = self.reports.len(), period = %self.period.label(), "rebuilt analysis");
        Ok(true)
    }

    pub fn export_name(&self, today: NaiveDate) -> String {
        default_export_name(self.period, today)
    }

    pub fn export_csv(&self, path: &Path, delimiter: u8) -> Result<usize> {
        export_csv(&self.reports, path, delimiter)
    }
}

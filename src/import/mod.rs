//! Imports: a saved date window over a set of bank statement files, and the records
//! read from them.

pub mod manifest;
pub mod statement;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{error, info};

use crate::{
    calendar::Timespan,
    domain::Record,
    errors::{CalendarError, ImportError},
    storage::{FileSlot, FormatRegistry},
    utils::fs as fsx,
};

pub use manifest::{ImportManifest, IMPORT_FORMAT_ID, IMPORT_FORMAT_VERSION, MANIFEST_DATE_FORMAT};
pub use statement::{read_statement, read_statement_from, STATEMENT_DELIMITER};

/// Default file name of an import that was never saved.
pub const UNSAVED_IMPORT: &str = "unsaved.json";

/// An import session: the manifest slot plus the records currently loaded from it.
#[derive(Debug)]
pub struct Import {
    slot: FileSlot<ImportManifest>,
    records: Vec<Record>,
    revision: u64,
    delimiter: u8,
}

impl Default for Import {
    fn default() -> Self {
        Self::new(UNSAVED_IMPORT)
    }
}

impl Import {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            slot: FileSlot::new(path, Some(IMPORT_FORMAT_ID), ImportManifest::default()),
            records: Vec::new(),
            revision: 0,
            delimiter: STATEMENT_DELIMITER,
        }
    }

    /// Uses `delimiter` instead of `;` when reading statements.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Opens an import envelope and reads its statements.
    pub fn open(registry: &FormatRegistry, path: impl Into<PathBuf>) -> Result<Self, ImportError> {
        Self::open_with(registry, path, STATEMENT_DELIMITER)
    }

    pub fn open_with(
        registry: &FormatRegistry,
        path: impl Into<PathBuf>,
        delimiter: u8,
    ) -> Result<Self, ImportError> {
        let slot = FileSlot::try_open(registry, path, Some(IMPORT_FORMAT_ID))?;
        let mut import = Self {
            slot,
            records: Vec::new(),
            revision: 0,
            delimiter,
        };
        import.reload()?;
        Ok(import)
    }

    pub fn path(&self) -> &Path {
        self.slot.path()
    }

    pub fn manifest(&self) -> &ImportManifest {
        self.slot.content()
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.manifest().files
    }

    /// Records of the last successful reload, restricted to the manifest's window.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Bumped every time the records are reloaded.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.slot.is_dirty()
    }

    /// Both ends of the window are set.
    pub fn is_valid(&self) -> bool {
        self.manifest().is_valid()
    }

    pub fn timespan(&self) -> Result<Option<Timespan>, CalendarError> {
        self.manifest().timespan()
    }

    pub fn save(&mut self, registry: &FormatRegistry) -> Result<(), ImportError> {
        if !self.is_valid() {
            return Err(ImportError::TimespanNotSet);
        }
        Ok(self.slot.try_save(registry)?)
    }

    pub fn save_as(&mut self, registry: &FormatRegistry, path: &Path) -> Result<(), ImportError> {
        if !self.is_valid() {
            return Err(ImportError::TimespanNotSet);
        }
        Ok(self.slot.try_save_as(registry, Some(path), None)?)
    }

    /// Re-reads every source, keeping records inside the window when one is set.
    ///
    /// On failure the previously loaded records are kept.
    pub fn reload(&mut self) -> Result<usize, ImportError> {
        let mut records = self.read_sources()?;
        if let (Some(begin), Some(end)) = (self.manifest().begin, self.manifest().end) {
            records.retain(|record| begin <= record.date() && record.date() <= end);
        }
        info!(
            import = %self.path().display(),
            sources = self.sources().len(),
            records = records.len(),
            "loaded entries"
        );
        self.records = records;
        self.revision += 1;
        Ok(self.records.len())
    }

    /// Adds a statement file; returns false when it is already listed.
    pub fn add_source(&mut self, path: &Path) -> bool {
        let path = fsx::absolute(path);
        if self.sources().contains(&path) {
            return false;
        }
        self.slot.content_mut().files.push(path);
        true
    }

    /// Removes a statement file; returns false when it was not listed.
    pub fn remove_source(&mut self, path: &Path) -> bool {
        let absolute = fsx::absolute(path);
        let Some(index) = self
            .sources()
            .iter()
            .position(|file| file == path || *file == absolute)
        else {
            return false;
        };
        self.slot.content_mut().files.remove(index);
        true
    }

    /// Replaces the window. An inverted window is refused and leaves the import untouched.
    pub fn set_timespan(
        &mut self,
        begin: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), CalendarError> {
        if let (Some(begin), Some(end)) = (begin, end) {
            Timespan::new(begin, end)?;
        }
        let manifest = self.slot.content_mut();
        manifest.begin = begin;
        manifest.end = end;
        Ok(())
    }

    /// Sets the window to the first and last dates found in the sources, ignoring the
    /// current window. Leaves it untouched when the sources hold no records.
    pub fn select_dates_from_contents(&mut self) -> Result<Option<Timespan>, ImportError> {
        let records = self.read_sources()?;
        let Some(span) = Timespan::covering(records.iter().map(Record::date)) else {
            return Ok(None);
        };
        self.set_timespan(Some(span.begin()), Some(span.end()))?;
        Ok(Some(span))
    }

    fn read_sources(&self) -> Result<Vec<Record>, ImportError> {
        let mut records = Vec::new();
        for source in self.sources() {
            match read_statement(source, self.delimiter) {
                Ok(mut read) => records.append(&mut read),
                Err(err) => {
                    error!(import = %self.path().display(), source = %source.display(), error = %err, "failed to read statement");
                    return Err(err);
                }
            }
        }
        Ok(records)
    }
}

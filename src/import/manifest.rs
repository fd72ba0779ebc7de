//! Content of an import envelope: the date window and the statement files it draws from.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    calendar::Timespan,
    errors::{CalendarError, ImportError},
    storage::{Format, Vid},
    utils::fs as fsx,
};

pub const IMPORT_FORMAT_ID: &str = "bankviz-import";
pub const IMPORT_FORMAT_VERSION: Vid = Vid::new(0, 1, 0);

/// Date layout inside the envelope.
pub const MANIFEST_DATE_FORMAT: &str = "%Y/%m/%d";

/// Date window plus statement sources. Source paths are kept resolved (absolute).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportManifest {
    pub begin: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawManifest {
    begin: String,
    end: String,
    #[serde(default)]
    files: Vec<PathBuf>,
}

impl ImportManifest {
    pub fn is_valid(&self) -> bool {
        self.begin.is_some() && self.end.is_some()
    }

    /// The window, `None` while either end is unset.
    pub fn timespan(&self) -> Result<Option<Timespan>, CalendarError> {
        match (self.begin, self.end) {
            (Some(begin), Some(end)) => Timespan::new(begin, end).map(Some),
            _ => Ok(None),
        }
    }

    /// Decodes envelope content, resolving `files` against the envelope's directory.
    pub fn from_value(raw: Value, source: &Path) -> Result<Self, String> {
        let raw: RawManifest = serde_json::from_value(raw).map_err(|err| err.to_string())?;
        let begin = parse_manifest_date(&raw.begin)?;
        let end = parse_manifest_date(&raw.end)?;
        Timespan::new(begin, end).map_err(|err| err.to_string())?;
        let base = source.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            begin: Some(begin),
            end: Some(end),
            files: raw
                .files
                .into_iter()
                .map(|file| if file.is_absolute() { file } else { base.join(file) })
                .collect(),
        })
    }

    /// Encodes for `destination`, storing files relative to its directory when they live under it.
    pub fn to_value(&self, destination: &Path) -> Result<Value, ImportError> {
        let (Some(begin), Some(end)) = (self.begin, self.end) else {
            return Err(ImportError::TimespanNotSet);
        };
        Timespan::new(begin, end)?;
        let base = fsx::absolute(destination.parent().unwrap_or_else(|| Path::new("")));
        let raw = RawManifest {
            begin: begin.format(MANIFEST_DATE_FORMAT).to_string(),
            end: end.format(MANIFEST_DATE_FORMAT).to_string(),
            files: self
                .files
                .iter()
                .map(|file| fsx::relative_to(&fsx::absolute(file), &base))
                .collect(),
        };
        serde_json::to_value(raw).map_err(|err| ImportError::Persistence(err.into()))
    }

    /// The `bankviz-import` envelope format.
    pub fn format() -> Format {
        Format::new(
            IMPORT_FORMAT_ID,
            IMPORT_FORMAT_VERSION,
            |raw, _, source| ImportManifest::from_value(raw, source),
            |manifest: &ImportManifest, destination| manifest.to_value(destination),
        )
    }
}

fn parse_manifest_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), MANIFEST_DATE_FORMAT)
        .map_err(|_| format!("invalid date `{raw}` (expected YYYY/MM/DD)"))
}

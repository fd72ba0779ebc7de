use std::{io, path::PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::storage::Vid;

/// Contract violations raised by the period calendar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("inverted timespan: {begin} is after {end}")]
    InvertedSpan { begin: NaiveDate, end: NaiveDate },
    #[error("record dated {0} falls outside every section")]
    Unbucketed(NaiveDate),
}

/// Failures turning a raw statement row into a [`crate::domain::Record`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid date `{0}` (expected DD/MM/YYYY)")]
    InvalidDate(String),
    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
}

/// Structural problems in a category blueprint tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category name cannot be empty (under `{0}`)")]
    EmptyName(String),
    #[error("category name `{0}` cannot contain `.`")]
    DottedName(String),
    #[error("duplicate category `{0}`")]
    Duplicate(String),
    #[error("category `{0}` shadows the synthetic `.other` bucket")]
    ReservedName(String),
}

/// Errors raised while compiling a custom predicate expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unexpected token `{found}`, expected {expected}")]
    UnexpectedToken { found: String, expected: String },
    #[error("unexpected end of expression, expected {0}")]
    UnexpectedEnd(String),
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("invalid literal `{literal}` for field `{field}`")]
    InvalidLiteral { field: String, literal: String },
    #[error("operator `{op}` is not supported on field `{field}`")]
    UnsupportedOperator { field: String, op: String },
    #[error("invalid regex `{pattern}`: {reason}")]
    InvalidRegex { pattern: String, reason: String },
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

/// Errors surfaced by the versioned persistence protocol.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown format `{0}`")]
    UnknownFormat(String),
    #[error("protocol mismatch: {found} != {expected}")]
    ProtocolMismatch { found: String, expected: String },
    #[error(
        "load upgrade impossible, incompatible version {stored}, current is {current} (will only upgrade when major version match)"
    )]
    IncompatibleVersion { stored: Vid, current: Vid },
    #[error("malformed version `{0}`")]
    MalformedVersion(String),
    #[error("format `{0}` does not hold the requested content type")]
    ContentType(String),
    #[error("failed to parse `{format}` content: {reason}")]
    Parse { format: String, reason: String },
    #[error("failed to serialize `{format}` content: {reason}")]
    Serialize { format: String, reason: String },
    #[error("file slot has no format assigned")]
    NoFormat,
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while reading bank statements into an import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read `{path}`: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid row {line} in `{path}`: {source}")]
    Record {
        path: PathBuf,
        line: u64,
        #[source]
        source: RecordError,
    },
    #[error("import timespan not set")]
    TimespanNotSet,
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors raised by the settings manager.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Unified error type for the crate.
#[derive(Debug, Error)]
pub enum BankvizError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("CSV export error: {0}")]
    Export(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BankvizError>;

//! Reading and writing `{format, version, content}` envelopes.

use std::{any::Any, fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::{
    format::{Format, FormatRegistry},
    version::Vid,
};
use crate::{errors::PersistenceError, utils::fs as fsx};

/// On-disk wrapper around format-specific content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub format: String,
    pub version: String,
    pub content: Value,
}

/// Content decoded from an envelope, with the format and version it was stored under.
#[derive(Debug)]
pub struct Loaded<T> {
    pub content: T,
    pub format: Format,
    pub version: Vid,
}

impl<T> Loaded<T> {
    /// True when the file predates the registered format version and should be re-saved.
    pub fn upgrade_pending(&self) -> bool {
        self.version < self.format.version()
    }
}

/// Header of an envelope, without decoding its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub format: String,
    pub stored: Vid,
    pub registered: Option<Vid>,
}

impl EnvelopeInfo {
    pub fn loadable(&self) -> bool {
        self.registered
            .is_some_and(|registered| registered.valid_upgrade(&self.stored))
    }

    pub fn upgrade_pending(&self) -> bool {
        self.registered
            .is_some_and(|registered| self.loadable() && self.stored < registered)
    }
}

pub fn read_envelope(path: &Path) -> Result<Envelope, PersistenceError> {
    let data = fs::read_to_string(path).map_err(|err| PersistenceError::io(path, err))?;
    Ok(serde_json::from_str(&data)?)
}

impl FormatRegistry {
    /// Serializes `content` with the registered format `format_id` and writes it to `path`.
    pub fn try_save<T: Any>(
        &self,
        path: &Path,
        format_id: &str,
        content: &T,
    ) -> Result<(), PersistenceError> {
        let format = self.get(format_id)?;
        let envelope = Envelope {
            format: format.id().to_string(),
            version: format.version().to_string(),
            content: format.serialize(content, path)?,
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        fsx::write_atomic(path, &json).map_err(|err| PersistenceError::io(path, err))?;
        info!(
            target: "bankviz::storage",
            path = %path.display(),
            format = format.id(),
            version = %format.version(),
            "saved"
        );
        Ok(())
    }

    /// Session-safe [`FormatRegistry::try_save`]: failures are logged and reported as `false`.
    pub fn save<T: Any>(&self, path: &Path, format_id: &str, content: &T) -> bool {
        match self.try_save(path, format_id, content) {
            Ok(()) => true,
            Err(err) => {
                error!(target: "bankviz::storage", path = %path.display(), error = %err, "failed to save");
                false
            }
        }
    }

    /// Reads the envelope at `path` and resolves its format, applying the protocol and
    /// version gates before any content is decoded.
    fn open_envelope(
        &self,
        path: &Path,
        expected: Option<&str>,
    ) -> Result<(Envelope, &Format, Vid), PersistenceError> {
        let envelope = read_envelope(path)?;
        let stored: Vid = envelope.version.parse()?;
        let format = self.get(&envelope.format)?;
        if let Some(expected) = expected {
            if expected != format.id() {
                return Err(PersistenceError::ProtocolMismatch {
                    found: format.id().to_string(),
                    expected: expected.to_string(),
                });
            }
        }
        if !format.version().valid_upgrade(&stored) {
            return Err(PersistenceError::IncompatibleVersion {
                stored,
                current: format.version(),
            });
        }
        Ok((envelope, format, stored))
    }

    /// Loads content of whatever type the envelope's format decodes to.
    pub fn try_load_any(
        &self,
        path: &Path,
        expected: Option<&str>,
    ) -> Result<Loaded<Box<dyn Any>>, PersistenceError> {
        let (envelope, format, stored) = self.open_envelope(path, expected)?;
        let content = format.parse_any(envelope.content, stored, &fsx::absolute(path))?;
        debug!(target: "bankviz::storage", path = %path.display(), format = format.id(), %stored, "loaded");
        Ok(Loaded {
            content,
            format: format.clone(),
            version: stored,
        })
    }

    /// Loads typed content; fails when the resolved format does not decode into `T`.
    pub fn try_load<T: Any>(
        &self,
        path: &Path,
        expected: Option<&str>,
    ) -> Result<Loaded<T>, PersistenceError> {
        let (envelope, format, stored) = self.open_envelope(path, expected)?;
        let content = format.parse::<T>(envelope.content, stored, &fsx::absolute(path))?;
        debug!(target: "bankviz::storage", path = %path.display(), format = format.id(), %stored, "loaded");
        Ok(Loaded {
            content,
            format: format.clone(),
            version: stored,
        })
    }

    /// Session-safe [`FormatRegistry::try_load`]: failures are logged and yield `None`.
    pub fn load<T: Any>(&self, path: &Path, expected: Option<&str>) -> Option<Loaded<T>> {
        match self.try_load(path, expected) {
            Ok(loaded) => Some(loaded),
            Err(err) => {
                error!(target: "bankviz::storage", path = %path.display(), error = %err, "failed to load");
                None
            }
        }
    }

    /// Reads an envelope header and reports how it relates to the registered format.
    pub fn inspect(&self, path: &Path) -> Result<EnvelopeInfo, PersistenceError> {
        let envelope = read_envelope(path)?;
        let stored = envelope.version.parse()?;
        let registered = self.get(&envelope.format).ok().map(Format::version);
        Ok(EnvelopeInfo {
            format: envelope.format,
            stored,
            registered,
        })
    }
}

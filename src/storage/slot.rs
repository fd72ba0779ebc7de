use std::{
    any::Any,
    path::{Path, PathBuf},
};

use tracing::error;

use super::{format::FormatRegistry, protocol::Loaded};
use crate::errors::PersistenceError;

/// In-memory content bound to a file path and format, tracking unsaved changes.
///
/// A new slot starts dirty; a successful save clears it; a load leaves it dirty only
/// when the file was written by an older version of its format.
#[derive(Debug, Clone)]
pub struct FileSlot<T> {
    path: PathBuf,
    format_id: Option<String>,
    content: T,
    dirty: bool,
}

impl<T: Any> FileSlot<T> {
    pub fn new(path: impl Into<PathBuf>, format_id: Option<&str>, content: T) -> Self {
        Self {
            path: path.into(),
            format_id: format_id.map(str::to_string),
            content,
            dirty: true,
        }
    }

    /// Opens `path` into a new slot.
    pub fn try_open(
        registry: &FormatRegistry,
        path: impl Into<PathBuf>,
        format_id: Option<&str>,
    ) -> Result<Self, PersistenceError> {
        let path = path.into();
        let loaded = registry.try_load::<T>(&path, format_id)?;
        Ok(Self::from_loaded(path, loaded))
    }

    /// Opens `path` into a new slot, `None` (logged) when it cannot be loaded.
    pub fn from_file(
        registry: &FormatRegistry,
        path: impl Into<PathBuf>,
        format_id: Option<&str>,
    ) -> Option<Self> {
        let path = path.into();
        match Self::try_open(registry, path.clone(), format_id) {
            Ok(slot) => Some(slot),
            Err(err) => {
                error!(target: "bankviz::storage", path = %path.display(), error = %err, "failed to open");
                None
            }
        }
    }

    fn from_loaded(path: PathBuf, loaded: Loaded<T>) -> Self {
        let dirty = loaded.upgrade_pending();
        Self {
            path,
            format_id: Some(loaded.format.id().to_string()),
            content: loaded.content,
            dirty,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_id(&self) -> Option<&str> {
        self.format_id.as_deref()
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    /// Mutable access; the slot is marked dirty.
    pub fn content_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.content
    }

    pub fn set_content(&mut self, content: T) {
        self.content = content;
        self.dirty = true;
    }

    pub fn into_content(self) -> T {
        self.content
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Writes the content to the slot's path with its format.
    pub fn try_save(&mut self, registry: &FormatRegistry) -> Result<(), PersistenceError> {
        let format_id = self.format_id.as_deref().ok_or(PersistenceError::NoFormat)?;
        registry.try_save(&self.path, format_id, &self.content)?;
        self.dirty = false;
        Ok(())
    }

    /// Saves under a new path and/or format; both are kept only if the write succeeds.
    pub fn try_save_as(
        &mut self,
        registry: &FormatRegistry,
        path: Option<&Path>,
        format_id: Option<&str>,
    ) -> Result<(), PersistenceError> {
        let target = path.unwrap_or(&self.path).to_path_buf();
        let format_id = format_id
            .or(self.format_id.as_deref())
            .ok_or(PersistenceError::NoFormat)?
            .to_string();
        registry.try_save(&target, &format_id, &self.content)?;
        self.path = target;
        self.format_id = Some(format_id);
        self.dirty = false;
        Ok(())
    }

    /// Session-safe save: logs failures and leaves the slot dirty.
    pub fn save(&mut self, registry: &FormatRegistry) -> bool {
        match self.try_save(registry) {
            Ok(()) => true,
            Err(err) => {
                error!(target: "bankviz::storage", path = %self.path.display(), error = %err, "failed to save slot");
                false
            }
        }
    }

    /// Replaces the content with what is stored at the slot's path.
    pub fn try_load(&mut self, registry: &FormatRegistry) -> Result<&T, PersistenceError> {
        let path = self.path.clone();
        let format_id = self.format_id.clone();
        self.try_load_from(registry, &path, format_id.as_deref())
    }

    /// Loads from another path and/or format; on failure the slot is left untouched.
    pub fn try_load_from(
        &mut self,
        registry: &FormatRegistry,
        path: &Path,
        format_id: Option<&str>,
    ) -> Result<&T, PersistenceError> {
        let loaded = registry.try_load::<T>(path, format_id)?;
        *self = Self::from_loaded(path.to_path_buf(), loaded);
        Ok(&self.content)
    }

    /// Session-safe load: logs failures and returns `None`, keeping the previous content.
    pub fn load(&mut self, registry: &FormatRegistry) -> Option<&T> {
        let path = self.path.clone();
        match self.try_load(registry) {
            Ok(content) => Some(content),
            Err(err) => {
                error!(target: "bankviz::storage", path = %path.display(), error = %err, "failed to load slot");
                None
            }
        }
    }
}

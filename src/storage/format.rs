use std::{
    any::{type_name, Any, TypeId},
    collections::BTreeMap,
    fmt,
    path::Path,
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::version::Vid;
use crate::errors::PersistenceError;

type ParseFn =
    dyn Fn(Value, Vid, &Path) -> Result<Box<dyn Any>, PersistenceError> + Send + Sync + 'static;
type SerializeFn = dyn Fn(&dyn Any, &Path) -> Result<Value, PersistenceError> + Send + Sync + 'static;

/// A named, versioned content codec.
///
/// The parser receives the raw envelope content, the version it was stored with and
/// the absolute source path; the serializer receives the content and the destination.
#[derive(Clone)]
pub struct Format {
    id: String,
    version: Vid,
    content_type: TypeId,
    content_name: &'static str,
    parser: Arc<ParseFn>,
    serializer: Arc<SerializeFn>,
}

impl Format {
    pub fn new<T, E1, E2, P, S>(id: impl Into<String>, version: Vid, parse: P, serialize: S) -> Self
    where
        T: Any,
        E1: fmt::Display,
        E2: fmt::Display,
        P: Fn(Value, Vid, &Path) -> Result<T, E1> + Send + Sync + 'static,
        S: Fn(&T, &Path) -> Result<Value, E2> + Send + Sync + 'static,
    {
        let id = id.into();
        let parse_id = id.clone();
        let serialize_id = id.clone();
        Self {
            id,
            version,
            content_type: TypeId::of::<T>(),
            content_name: type_name::<T>(),
            parser: Arc::new(move |raw: Value, stored: Vid, source: &Path| {
                parse(raw, stored, source)
                    .map(|content| Box::new(content) as Box<dyn Any>)
                    .map_err(|err| PersistenceError::Parse {
                        format: parse_id.clone(),
                        reason: err.to_string(),
                    })
            }),
            serializer: Arc::new(move |content: &dyn Any, destination: &Path| {
                let content = content
                    .downcast_ref::<T>()
                    .ok_or_else(|| PersistenceError::ContentType(serialize_id.clone()))?;
                serialize(content, destination).map_err(|err| PersistenceError::Serialize {
                    format: serialize_id.clone(),
                    reason: err.to_string(),
                })
            }),
        }
    }

    /// Format whose content maps directly onto `T`'s serde representation.
    pub fn serde<T>(id: impl Into<String>, version: Vid) -> Self
    where
        T: Serialize + DeserializeOwned + Any,
    {
        Self::new(
            id,
            version,
            |raw, _, _| serde_json::from_value::<T>(raw),
            |content: &T, _| serde_json::to_value(content),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Vid {
        self.version
    }

    /// Whether this format decodes into `T`.
    pub fn holds<T: Any>(&self) -> bool {
        self.content_type == TypeId::of::<T>()
    }

    pub fn parse_any(
        &self,
        raw: Value,
        stored: Vid,
        source: &Path,
    ) -> Result<Box<dyn Any>, PersistenceError> {
        (self.parser)(raw, stored, source)
    }

    pub fn parse<T: Any>(&self, raw: Value, stored: Vid, source: &Path) -> Result<T, PersistenceError> {
        if !self.holds::<T>() {
            return Err(PersistenceError::ContentType(self.id.clone()));
        }
        self.parse_any(raw, stored, source)?
            .downcast::<T>()
            .map(|content| *content)
            .map_err(|_| PersistenceError::ContentType(self.id.clone()))
    }

    pub fn serialize<T: Any>(&self, content: &T, destination: &Path) -> Result<Value, PersistenceError> {
        (self.serializer)(content, destination)
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("content", &self.content_name)
            .finish()
    }
}

/// Formats known to a session, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, Format>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `format`, returning the one it replaced.
    pub fn register(&mut self, format: Format) -> Option<Format> {
        self.formats.insert(format.id.clone(), format)
    }

    pub fn with(mut self, format: Format) -> Self {
        self.register(format);
        self
    }

    pub fn get(&self, id: &str) -> Result<&Format, PersistenceError> {
        self.formats
            .get(id)
            .ok_or_else(|| PersistenceError::UnknownFormat(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.formats.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_parse_checks_content_type() {
        let format = Format::serde::<Vec<String>>("names", Vid::new(1, 0, 0));
        assert!(format.holds::<Vec<String>>());
        let names: Vec<String> = format
            .parse(json!(["a", "b"]), Vid::new(1, 0, 0), Path::new("/tmp/names.json"))
            .expect("parse");
        assert_eq!(names, vec!["a", "b"]);
        assert!(matches!(
            format.parse::<u32>(json!(1), Vid::new(1, 0, 0), Path::new("x")),
            Err(PersistenceError::ContentType(_))
        ));
        assert!(matches!(
            format.serialize(&7u8, Path::new("x")),
            Err(PersistenceError::ContentType(_))
        ));
    }

    #[test]
    fn parse_failures_name_the_format() {
        let format = Format::serde::<Vec<String>>("names", Vid::new(1, 0, 0));
        let err = format
            .parse::<Vec<String>>(json!({"not": "a list"}), Vid::new(1, 0, 0), Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Parse { ref format, .. } if format == "names"));
    }

    #[test]
    fn registry_replaces_by_id() {
        let mut registry = FormatRegistry::new();
        assert!(registry
            .register(Format::serde::<u32>("counter", Vid::new(0, 1, 0)))
            .is_none());
        let replaced = registry.register(Format::serde::<u32>("counter", Vid::new(0, 2, 0)));
        assert_eq!(replaced.map(|f| f.version()), Some(Vid::new(0, 1, 0)));
        assert_eq!(registry.get("counter").unwrap().version(), Vid::new(0, 2, 0));
        assert!(matches!(
            registry.get("missing"),
            Err(PersistenceError::UnknownFormat(_))
        ));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["counter"]);
    }
}

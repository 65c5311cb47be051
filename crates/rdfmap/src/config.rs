//! Mapper settings loaded from JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emitter::RdfFormat;
use crate::error::ConfigError;

/// Settings applied by [`ObjectMapper::with_config`](crate::ObjectMapper::with_config).
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Prefix to namespace IRI, written as Turtle prefixes.
    pub namespaces: BTreeMap<String, String>,
    /// Serialization used by `write_to`.
    pub format: RdfFormat,
    /// Reject data in which a subject is nested below itself.
    pub detect_cycles: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            namespaces: BTreeMap::new(),
            format: RdfFormat::default(),
            detect_cycles: true,
        }
    }
}

impl MapperConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

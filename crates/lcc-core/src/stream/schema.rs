//! Schema loaders.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse schema {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies a stream's JSON schema.
pub trait SchemaLoader {
    fn json_schema(&self) -> Result<Value, SchemaError>;
}

/// Reads the schema from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct JsonFileSchemaLoader {
    path: PathBuf,
}

impl JsonFileSchemaLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SchemaLoader for JsonFileSchemaLoader {
    fn json_schema(&self) -> Result<Value, SchemaError> {
        let data = std::fs::read_to_string(&self.path).map_err(|source| SchemaError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| SchemaError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// A fixed schema; defaults to an open object schema.
#[derive(Debug, Clone)]
pub struct InlineSchemaLoader(pub Value);

impl Default for InlineSchemaLoader {
    fn default() -> Self {
        Self(json!({"type": "object"}))
    }
}

impl SchemaLoader for InlineSchemaLoader {
    fn json_schema(&self) -> Result<Value, SchemaError> {
        Ok(self.0.clone())
    }
}

//! Record sources: where verification fetches record documents by id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::SourceError;

/// Read access to the document store holding skill records.
///
/// Documents are returned raw; shape validation happens in the verifier.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn get_record(&self, id: &str) -> Result<Option<Value>, SourceError>;
}

/// In-memory record source for tests.
#[derive(Default)]
pub struct MemoryRecordSource {
    records: RwLock<HashMap<String, Value>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, doc: Value) -> Result<(), SourceError> {
        self.records
            .write()
            .map_err(|_| SourceError::LockPoisoned("record source"))?
            .insert(id.into(), doc);
        Ok(())
    }
}

impl FromIterator<(String, Value)> for MemoryRecordSource {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            records: RwLock::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn get_record(&self, id: &str) -> Result<Option<Value>, SourceError> {
        let records = self
            .records
            .read()
            .map_err(|_| SourceError::LockPoisoned("record source"))?;
        Ok(records.get(id).cloned())
    }
}

/// Records exported to a JSON file: one object mapping ids to documents.
///
/// The file is read once, at open.
pub struct JsonFileRecordSource {
    path: PathBuf,
    records: HashMap<String, Value>,
}

impl JsonFileRecordSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&raw)?;
        let Value::Object(map) = value else {
            return Err(SourceError::NotAnObject);
        };
        let records: HashMap<String, Value> = map.into_iter().collect();
        debug!(path = %path.display(), records = records.len(), "record file loaded");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.records.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl RecordSource for JsonFileRecordSource {
    async fn get_record(&self, id: &str) -> Result<Option<Value>, SourceError> {
        Ok(self.records.get(id).cloned())
    }
}

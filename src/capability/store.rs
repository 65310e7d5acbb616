//! JSON-file-backed record of every known robot endpoint. The file is the
//! durable source of truth for which endpoints exist; the robot itself is
//! the source of truth for which argument values are currently legal, and
//! discovery reconciles the two.
//!
//! A companion capability server may read and write the same file, so every
//! persist goes through write-then-rename. Concurrent multi-process writers
//! are not otherwise coordinated.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use super::types::{CapabilityRecord, EndpointKind};
use crate::error::{ClientError, ClientResult};

/// Header block of the capability file: a template mirroring the reply
/// shape, kept for external tooling that hand-edits the file. Hand-edited
/// files may omit header keys; only `endpoints` gates validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreHeader {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Status")]
    pub status: HashMap<String, String>,
    #[serde(rename = "LastID")]
    pub last_id: i64,
    #[serde(rename = "ErrorCode")]
    pub error_code: i64,
    #[serde(rename = "ErrorMessage")]
    pub error_message: String,
    #[serde(rename = "Result")]
    pub result: Value,
}

impl Default for StoreHeader {
    fn default() -> Self {
        Self {
            time: String::new(),
            status: HashMap::from([("Status".to_string(), "Idle".to_string())]),
            last_id: 0,
            error_code: 0,
            error_message: "NA".to_string(),
            result: Value::Null,
        }
    }
}

impl StoreHeader {
    fn skeleton() -> Self {
        Self {
            time: Utc::now().to_rfc3339(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    header: StoreHeader,
    endpoints: Vec<CapabilityRecord>,
}

/// In-memory view of the capability file: an ordered record list plus a
/// derived `api -> index` map rebuilt after every structural change.
pub struct CapabilityStore {
    path: PathBuf,
    header: StoreHeader,
    records: Vec<CapabilityRecord>,
    index: HashMap<String, usize>,
}

impl CapabilityStore {
    /// Load the capability file at `path` into memory.
    pub fn open(path: &Path) -> ClientResult<Self> {
        let mut store = Self {
            path: path.to_path_buf(),
            header: StoreHeader::default(),
            records: Vec::new(),
            index: HashMap::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Write a fresh skeleton document (header block + empty endpoint list)
    /// only if no file exists at `path`. Never overwrites.
    pub fn create_if_absent(path: &Path) -> ClientResult<()> {
        if path.exists() {
            return Ok(());
        }
        let document = StoreDocument {
            header: StoreHeader::skeleton(),
            endpoints: Vec::new(),
        };
        write_atomic(path, &document)?;
        info!("created capability file at {}", path.display());
        Ok(())
    }

    /// Fully replace in-memory state from the file. Fails with
    /// [`ClientError::StoreCorrupt`] when the content is not valid JSON or
    /// lacks the `endpoints` key; the previous in-memory state is kept in
    /// that case. The index is rebuilt as the final step.
    pub fn reload(&mut self) -> ClientResult<()> {
        let contents = std::fs::read_to_string(&self.path)?;
        let document: StoreDocument = serde_json::from_str(&contents)
            .map_err(|e| ClientError::StoreCorrupt(e.to_string()))?;
        self.header = document.header;
        self.records = document.endpoints;
        self.rebuild_index();
        Ok(())
    }

    /// Cached payload for `api`. `None` is a normal outcome: a fresh
    /// deployment's file legitimately may not list every endpoint yet.
    pub fn lookup(&self, api: &str) -> Option<&Value> {
        self.index.get(api).map(|&i| &self.records[i].payload)
    }

    pub fn record(&self, api: &str) -> Option<&CapabilityRecord> {
        self.index.get(api).map(|&i| &self.records[i])
    }

    /// Append a new endpoint record and persist the whole document back to
    /// disk. A no-op with a logged notice when `api` is already known; the
    /// existing record is kept, never overwritten.
    pub fn add(
        &mut self,
        api: &str,
        payload: Value,
        args: Option<Value>,
        comment: Option<String>,
    ) -> ClientResult<()> {
        if self.index.contains_key(api) {
            info!("endpoint {} already known, keeping existing entry", api);
            return Ok(());
        }
        self.records.push(CapabilityRecord {
            api: api.to_string(),
            args,
            payload,
            comment,
            kind: EndpointKind::from_path(api),
        });
        self.persist()?;
        self.reload()
    }

    pub fn endpoints(&self) -> &[CapabilityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> ClientResult<()> {
        let document = StoreDocument {
            header: self.header.clone(),
            endpoints: self.records.clone(),
        };
        write_atomic(&self.path, &document)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.api.clone(), i))
            .collect();
    }
}

/// Overwrite-whole-file via a sibling temp file and an atomic rename, so a
/// concurrent reader never observes a half-written document.
fn write_atomic(path: &Path, document: &StoreDocument) -> ClientResult<()> {
    let contents = serde_json::to_string_pretty(document)
        .map_err(|e| ClientError::StoreCorrupt(e.to_string()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory)?;
    file.write_all(contents.as_bytes())?;
    file.persist(path).map_err(|e| ClientError::Io(e.error))?;
    Ok(())
}

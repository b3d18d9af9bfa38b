//! Capture Container Encoding
//!
//! A capture is a flat map from hierarchical dataset paths
//! (`"IntraPulse/DATA"`) to n-dimensional numeric datasets. It is stored
//! either as JSON or as a postcard-encoded binary blob behind a magic
//! header.

use crate::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Magic bytes at the start of a binary capture
const BINARY_MAGIC: &[u8; 6] = b"SEICAP";

/// Binary capture layout version
const BINARY_VERSION: u8 = 1;

/// Read-only access to the datasets of a decoded capture
pub trait CaptureContainer {
    /// Look up a dataset by path
    fn dataset(&self, path: &str) -> Option<&Dataset>;
}

/// Numeric payload of a dataset, stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetValues {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl DatasetValues {
    fn len(&self) -> usize {
        match self {
            DatasetValues::Int(v) => v.len(),
            DatasetValues::Float(v) => v.len(),
        }
    }
}

/// An n-dimensional dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub shape: Vec<usize>,
    pub values: DatasetValues,
}

impl Dataset {
    /// Build a 2-D float dataset from rows of equal length
    pub fn float_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        Self {
            shape: vec![rows.len(), cols],
            values: DatasetValues::Float(rows.iter().flatten().copied().collect()),
        }
    }

    /// Build a 1x1 integer dataset
    pub fn int_scalar(value: i64) -> Self {
        Self {
            shape: vec![1, 1],
            values: DatasetValues::Int(vec![value]),
        }
    }

    /// Number of elements the declared shape describes, `None` on overflow
    pub fn element_count(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Whether the declared shape matches the number of stored values
    pub fn is_consistent(&self) -> bool {
        self.element_count() == Some(self.values.len())
    }

    /// First row of a 2-D dataset, as floats
    pub fn first_row(&self) -> Option<Vec<f64>> {
        if self.shape.len() != 2 || self.shape[0] == 0 || !self.is_consistent() {
            return None;
        }
        let cols = self.shape[1];
        if cols > self.values.len() {
            return None;
        }
        let row = match &self.values {
            DatasetValues::Int(v) => v[..cols].iter().map(|&x| x as f64).collect(),
            DatasetValues::Float(v) => v[..cols].to_vec(),
        };
        Some(row)
    }

    /// First scalar entry of an integer dataset
    pub fn first_int(&self) -> Option<i64> {
        if !self.is_consistent() {
            return None;
        }
        match &self.values {
            DatasetValues::Int(v) => v.first().copied(),
            DatasetValues::Float(_) => None,
        }
    }
}

/// On-disk encoding of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    Json,
    Binary,
}

impl ContainerFormat {
    /// Pick the encoding from a file extension (`.json` is JSON, anything else binary)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ContainerFormat::Json,
            _ => ContainerFormat::Binary,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::Json => "json",
            ContainerFormat::Binary => "binary",
        }
    }
}

/// A decoded capture file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureFile {
    pub datasets: BTreeMap<String, Dataset>,
}

impl CaptureContainer for CaptureFile {
    fn dataset(&self, path: &str) -> Option<&Dataset> {
        self.datasets.get(path)
    }
}

impl CaptureFile {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dataset
    pub fn insert(&mut self, path: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(path.into(), dataset);
    }

    /// Remove a dataset
    pub fn remove(&mut self, path: &str) -> Option<Dataset> {
        self.datasets.remove(path)
    }

    /// Decode a capture from bytes
    pub fn decode(bytes: &[u8], format: ContainerFormat) -> Result<Self, LoadError> {
        match format {
            ContainerFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| LoadError::MalformedContainer(e.to_string())),
            ContainerFormat::Binary => {
                let header_len = BINARY_MAGIC.len() + 1;
                if bytes.len() < header_len || &bytes[..BINARY_MAGIC.len()] != BINARY_MAGIC {
                    return Err(LoadError::MalformedContainer(
                        "missing capture header".to_string(),
                    ));
                }
                let version = bytes[BINARY_MAGIC.len()];
                if version != BINARY_VERSION {
                    return Err(LoadError::MalformedContainer(format!(
                        "unsupported capture version {}",
                        version
                    )));
                }
                postcard::from_bytes(&bytes[header_len..])
                    .map_err(|e| LoadError::MalformedContainer(e.to_string()))
            }
        }
    }

    /// Encode a capture to bytes
    pub fn encode(&self, format: ContainerFormat) -> Result<Vec<u8>, LoadError> {
        match format {
            ContainerFormat::Json => serde_json::to_vec_pretty(self)
                .map_err(|e| LoadError::MalformedContainer(e.to_string())),
            ContainerFormat::Binary => {
                let body = postcard::to_allocvec(self)
                    .map_err(|e| LoadError::MalformedContainer(e.to_string()))?;
                let mut bytes = Vec::with_capacity(BINARY_MAGIC.len() + 1 + body.len());
                bytes.extend_from_slice(BINARY_MAGIC);
                bytes.push(BINARY_VERSION);
                bytes.extend_from_slice(&body);
                Ok(bytes)
            }
        }
    }

    /// Read a capture from disk, choosing the encoding by extension
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::FileNotFound(path.display().to_string()));
        }
        let bytes = fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::decode(&bytes, ContainerFormat::from_path(path))
    }

    /// Write a capture to disk, choosing the encoding by extension
    pub fn write(&self, path: &Path) -> Result<(), LoadError> {
        let bytes = self.encode(ContainerFormat::from_path(path))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        debug!("Wrote capture to {}", path.display());
        Ok(())
    }
}

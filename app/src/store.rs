//! File-backed record store.

use std::fs;
use std::path::{Path, PathBuf};
use xr_config::{InboundRecord, InboundStore};
use xr_types::StoreError;

/// Records held as a JSON array in the store's camelCase shape.
///
/// The file is re-read on every snapshot, so edits are picked up by the next
/// compile without reopening the store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InboundStore for JsonFileStore {
    fn inbounds(&self) -> Result<Vec<InboundRecord>, StoreError> {
        let data = fs::read(&self.path)
            .map_err(|e| StoreError::unavailable(format!("{}: {e}", self.path.display())))?;
        serde_json::from_slice(&data)
            .map_err(|e| StoreError::decode(format!("{}: {e}", self.path.display())))
    }
}

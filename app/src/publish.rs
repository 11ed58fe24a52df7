//! Publishing compiled documents to the engine.
//!
//! Restarting the engine after a publish is the external controller's job;
//! a publisher only makes the new document visible in one step.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use xr_config::ConfigDocument;

/// Destination for documents that differ from the applied one.
pub trait Publisher: Send + Sync {
    fn publish(&self, document: &ConfigDocument) -> Result<()>;
}

impl<T: Publisher + ?Sized> Publisher for std::sync::Arc<T> {
    fn publish(&self, document: &ConfigDocument) -> Result<()> {
        (**self).publish(document)
    }
}

/// Writes the document to a file the engine reads at startup.
#[derive(Debug, Clone)]
pub struct FilePublisher {
    path: PathBuf,
}

impl FilePublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previously published document, if the file exists and decodes.
    pub fn load_current(&self) -> Result<Option<ConfigDocument>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => ConfigDocument::from_json_str(&text)
                .map(Some)
                .with_context(|| format!("decode {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }
}

impl Publisher for FilePublisher {
    fn publish(&self, document: &ConfigDocument) -> Result<()> {
        let text = document.to_json_string().context("encode document")?;
        write_atomic(&self.path, text.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))
    }
}

/// Write to a sibling temp file, fsync, then rename over `path`.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("config");
    let tmp = dir.join(format!(".{name}.{}.tmp", std::process::id()));

    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    f.write_all(data)?;
    f.sync_all()?;
    drop(f);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        e
    })
}

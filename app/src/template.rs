//! Passthrough template loading.
//!
//! JSON templates keep every section byte-for-byte. YAML (`.yaml`/`.yml`) is
//! accepted for hand-written templates; its sections are re-encoded as JSON.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use xr_config::Passthrough;

pub fn load_passthrough(path: &Path) -> Result<Passthrough> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read template {}", path.display()))?;
    if is_yaml(path) {
        let value: Value = serde_yaml::from_str(&text)
            .with_context(|| format!("parse template {} as yaml", path.display()))?;
        anyhow::ensure!(
            value.is_object(),
            "template {} must be a mapping",
            path.display()
        );
        return Ok(Passthrough::from_value(&value));
    }
    Passthrough::from_json_str(&text)
        .with_context(|| format!("parse template {} as json", path.display()))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

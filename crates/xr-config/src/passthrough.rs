//! Passthrough sections of the engine document.
//!
//! The compiler does not interpret these; it only needs `outbounds` (to append
//! synthesized outbounds) and `routing.rules` (to append synthesized rules).
//! Section text is held as stored so a malformed section can be reported and
//! dropped on its own.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Top-level section of the engine document other than `inbounds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Log,
    Routing,
    Dns,
    Outbounds,
    Transport,
    Policy,
    Api,
    Stats,
    Reverse,
    FakeDns,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::Log,
        Section::Routing,
        Section::Dns,
        Section::Outbounds,
        Section::Transport,
        Section::Policy,
        Section::Api,
        Section::Stats,
        Section::Reverse,
        Section::FakeDns,
    ];

    /// Sections copied through without any merging.
    pub const VERBATIM: [Section; 8] = [
        Section::Log,
        Section::Dns,
        Section::Transport,
        Section::Policy,
        Section::Api,
        Section::Stats,
        Section::Reverse,
        Section::FakeDns,
    ];

    /// Key of the section in the engine document.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Section::Log => "log",
            Section::Routing => "routing",
            Section::Dns => "dns",
            Section::Outbounds => "outbounds",
            Section::Transport => "transport",
            Section::Policy => "policy",
            Section::Api => "api",
            Section::Stats => "stats",
            Section::Reverse => "reverse",
            Section::FakeDns => "fakeDns",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Externally supplied sections, as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passthrough {
    sections: BTreeMap<Section, String>,
}

impl Passthrough {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Passthrough::set`].
    #[must_use]
    pub fn with(mut self, section: Section, text: impl Into<String>) -> Self {
        self.set(section, text);
        self
    }

    pub fn set(&mut self, section: Section, text: impl Into<String>) {
        self.sections.insert(section, text.into());
    }

    #[must_use]
    pub fn get(&self, section: Section) -> Option<&str> {
        self.sections.get(&section).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> {
        self.sections.iter().map(|(s, t)| (*s, t.as_str()))
    }

    /// Split a whole engine template into sections, keeping each section's
    /// bytes. Keys that are not passthrough sections (`inbounds`, comments,
    /// vendor extensions) are ignored.
    ///
    /// # Errors
    /// The template itself must be a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let top: BTreeMap<String, Box<RawValue>> = serde_json::from_str(text)?;
        let mut out = Self::new();
        for (key, raw) in top {
            match Section::from_key(&key) {
                Some(section) => out.set(section, raw.get()),
                None => tracing::debug!(key = %key, "template key is not a passthrough section"),
            }
        }
        Ok(out)
    }

    /// Same as [`Passthrough::from_json_str`] for an already decoded template
    /// (for example one read from YAML). Sections are re-encoded compactly.
    #[must_use]
    pub fn from_value(template: &Value) -> Self {
        let mut out = Self::new();
        if let Some(obj) = template.as_object() {
            for (key, value) in obj {
                if let Some(section) = Section::from_key(key) {
                    out.set(section, value.to_string());
                }
            }
        }
        out
    }
}

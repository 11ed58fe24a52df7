//! Opaque JSON fragments.
//!
//! Fragments hold configuration in the engine's own schema. They are validated
//! on read, decoded into a [`Value`] tree only when the compiler must modify
//! them, and otherwise re-emitted byte-for-byte. Unknown fields therefore
//! survive a compile pass untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;

/// Validated raw JSON text. Equality is byte equality.
#[derive(Clone)]
pub struct Fragment(Box<RawValue>);

impl Fragment {
    /// Parse stored fragment text.
    ///
    /// Blank text and a literal `null` mean "absent" and yield `Ok(None)`.
    ///
    /// # Errors
    /// Returns the JSON syntax error when the text is not a single JSON value.
    pub fn parse(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let raw = RawValue::from_string(trimmed.to_owned())?;
        if raw.get() == "null" {
            return Ok(None);
        }
        Ok(Some(Self(raw)))
    }

    /// Encode a serializable value as a fragment.
    ///
    /// # Errors
    /// Propagates the serializer error (non-string map keys and the like).
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::value::to_raw_value(value).map(Self)
    }

    /// Decode into an untyped tree.
    ///
    /// # Errors
    /// Only fails if the fragment was built from invalid text, which
    /// [`Fragment::parse`] rules out.
    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(self.0.get())
    }

    /// Raw JSON text exactly as it will be emitted.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// True when the fragment text is a JSON object.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.0.get().starts_with('{')
    }

    pub(crate) fn from_raw(raw: Box<RawValue>) -> Self {
        Self(raw)
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.0.get() == other.0.get()
    }
}

impl Eq for Fragment {}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fragment({})", self.0.get())
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.get())
    }
}

impl Serialize for Fragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Only supported from `serde_json::from_str`/`from_slice`; `from_value` cannot
/// produce raw text.
impl<'de> Deserialize<'de> for Fragment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(Self)
    }
}

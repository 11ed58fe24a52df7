//! Typed errors for the inbound compiler.
//!
//! # Strategic Purpose
//! Every failure of resolve/compile is a returned value so the caller can
//! choose retry, alert or hold-last-known-good. `anyhow` is NOT allowed in
//! library crates; only the types here.

use crate::IssueCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected secondary-forward sub-record.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Forwarding enabled without choosing socks/http.
    #[error("protocol required when forwarding enabled")]
    MissingProtocol,
    /// Forwarding enabled with an empty upstream address.
    #[error("forward address must not be empty")]
    EmptyAddress,
    /// Upstream port outside 1-65535.
    #[error("forward port {port} out of range 1-65535")]
    PortOutOfRange { port: i64 },
}

impl ValidationError {
    /// Name of the offending forward field.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingProtocol => "protocol",
            Self::EmptyAddress => "address",
            Self::PortOutOfRange { .. } => "port",
        }
    }

    #[must_use]
    pub fn code(&self) -> IssueCode {
        match self {
            Self::MissingProtocol | Self::EmptyAddress => IssueCode::MissingRequired,
            Self::PortOutOfRange { .. } => IssueCode::RangeExceeded,
        }
    }
}

/// Failure reading the record snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreError {
    #[error("record store unavailable: {message}")]
    Unavailable { message: String },
    #[error("record decode failed: {message}")]
    Decode { message: String },
}

impl StoreError {
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> IssueCode {
        match self {
            Self::Unavailable { .. } => IssueCode::StoreUnavailable,
            Self::Decode { .. } => IssueCode::TypeMismatch,
        }
    }
}

/// A compile pass was aborted. The previously applied document stays authoritative.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A listener's forwarding spec failed validation.
    #[error("inbound {tag} (id {id}): {source}")]
    Forward {
        id: i64,
        tag: String,
        source: ValidationError,
    },
    /// A listener-owned fragment (settings/streamSettings/sniffing) is not valid JSON.
    #[error("inbound {tag}: malformed {field}: {message}")]
    Fragment {
        tag: String,
        field: String,
        message: String,
    },
    /// Settings must be a JSON object to carry the forward back-reference.
    #[error("inbound {tag}: settings is not a JSON object, cannot attach forward reference")]
    SettingsNotObject { tag: String },
    /// A synthesized artifact could not be encoded.
    #[error("failed to encode {context}: {message}")]
    Encode { context: String, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CompileError {
    #[must_use]
    pub fn code(&self) -> IssueCode {
        match self {
            Self::Forward { source, .. } => source.code(),
            Self::Fragment { .. } | Self::Encode { .. } => IssueCode::FragmentInvalid,
            Self::SettingsNotObject { .. } => IssueCode::TypeMismatch,
            Self::Store(e) => e.code(),
        }
    }
}

/// Non-fatal: a passthrough section could not be decoded and was omitted.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("passthrough section `{section}` dropped: {message}")]
pub struct PassthroughWarning {
    pub section: String,
    pub message: String,
}

impl PassthroughWarning {
    pub fn new(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            message: message.into(),
        }
    }

    #[inline]
    pub fn code(&self) -> IssueCode {
        IssueCode::PassthroughDropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn validation_error_names_field() {
        assert_eq!(ValidationError::MissingProtocol.field(), "protocol");
        assert_eq!(ValidationError::EmptyAddress.field(), "address");
        let e = ValidationError::PortOutOfRange { port: 70000 };
        assert_eq!(e.field(), "port");
        assert_eq!(e.code(), IssueCode::RangeExceeded);
        assert_eq!(e.to_string(), "forward port 70000 out of range 1-65535");
    }

    #[test]
    fn compile_error_keeps_validation_source() {
        let e = CompileError::Forward {
            id: 7,
            tag: "inbound-443".into(),
            source: ValidationError::MissingProtocol,
        };
        assert_eq!(
            e.to_string(),
            "inbound inbound-443 (id 7): protocol required when forwarding enabled"
        );
        assert!(e.source().is_some());
        assert_eq!(e.code(), IssueCode::MissingRequired);
    }

    #[test]
    fn store_error_converts_into_compile_error() {
        let e: CompileError = StoreError::unavailable("locked").into();
        assert_eq!(e.code(), IssueCode::StoreUnavailable);
        assert_eq!(e.to_string(), "record store unavailable: locked");
    }
}

//! xr-types: cross-crate stable contracts (error types, issue codes).
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod errors;

pub use errors::{CompileError, PassthroughWarning, StoreError, ValidationError};

/// Stable issue codes used by forward validation / compile reports / CLI.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    // ----- CLI / General -----
    CliInvalidArg,
    CliIoFail,
    // ----- Validation -----
    MissingRequired,
    TypeMismatch,
    RangeExceeded,
    // ----- Compile -----
    FragmentInvalid,
    PassthroughDropped,
    StoreUnavailable,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        use IssueCode::*;
        match self {
            CliInvalidArg => "CliInvalidArg",
            CliIoFail => "CliIoFail",
            MissingRequired => "MissingRequired",
            TypeMismatch => "TypeMismatch",
            RangeExceeded => "RangeExceeded",
            FragmentInvalid => "FragmentInvalid",
            PassthroughDropped => "PassthroughDropped",
            StoreUnavailable => "StoreUnavailable",
        }
    }
}

impl Display for IssueCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

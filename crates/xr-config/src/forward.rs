//! Secondary-forward resolution: validate and normalize one listener's
//! forwarding sub-record.
//!
//! Rules, applied in order:
//! 1. disabled -> protocol `none`, address/port/credentials cleared (never fails)
//! 2. enabled without protocol -> [`ValidationError::MissingProtocol`]
//! 3. enabled -> non-empty address (surrounding whitespace dropped) and port in 1-65535
//!
//! Resolution is a fixed point: resolving a resolved spec returns it unchanged.

use crate::model::SecondaryForwardSpec;
use xr_types::ValidationError;

/// Highest valid upstream port.
pub const MAX_PORT: i64 = 65_535;

/// Validate and normalize a forwarding spec.
///
/// # Errors
/// Returns the first violated rule for an enabled spec.
pub fn resolve(spec: &SecondaryForwardSpec) -> Result<SecondaryForwardSpec, ValidationError> {
    if !spec.enabled {
        return Ok(SecondaryForwardSpec::default());
    }
    if spec.protocol.is_none() {
        return Err(ValidationError::MissingProtocol);
    }
    let address = spec.address.trim();
    if address.is_empty() {
        return Err(ValidationError::EmptyAddress);
    }
    if !(1..=MAX_PORT).contains(&spec.port) {
        return Err(ValidationError::PortOutOfRange { port: spec.port });
    }
    Ok(SecondaryForwardSpec {
        enabled: true,
        protocol: spec.protocol,
        address: address.to_owned(),
        port: spec.port,
        username: non_empty(spec.username.as_deref()),
        password: non_empty(spec.password.as_deref()),
    })
}

/// Validation only, for create/update paths that persist the raw record.
///
/// # Errors
/// Same as [`resolve`].
pub fn validate(spec: &SecondaryForwardSpec) -> Result<(), ValidationError> {
    resolve(spec).map(|_| ())
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.filter(|s| !s.is_empty()).map(str::to_owned)
}

//! Stored listener records.
//!
//! Field names follow the record store (camelCase). Fragment-valued fields are
//! kept as the stored text; the assembler validates them when compiling.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Upstream protocol of a secondary forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardProtocol {
    /// No forwarding. The store also writes `""` for this.
    #[default]
    #[serde(alias = "")]
    None,
    /// SOCKS upstream.
    Socks,
    /// HTTP CONNECT upstream.
    Http,
}

impl ForwardProtocol {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Socks => "socks",
            Self::Http => "http",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for ForwardProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forwarding sub-record embedded in every [`InboundRecord`].
///
/// `port` is wide on purpose: the store hands over whatever the operator
/// typed, and range checking belongs to [`crate::forward::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecondaryForwardSpec {
    #[serde(rename = "secondaryForwardEnable", default)]
    pub enabled: bool,
    #[serde(rename = "secondaryForwardProtocol", default)]
    pub protocol: ForwardProtocol,
    #[serde(rename = "secondaryForwardAddress", default)]
    pub address: String,
    #[serde(rename = "secondaryForwardPort", default)]
    pub port: i64,
    #[serde(
        rename = "secondaryForwardUsername",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,
    #[serde(
        rename = "secondaryForwardPassword",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,
}

impl SecondaryForwardSpec {
    /// Enabled forward to `protocol://address:port` without credentials.
    pub fn to(protocol: ForwardProtocol, address: impl Into<String>, port: i64) -> Self {
        Self {
            enabled: true,
            protocol,
            address: address.into(),
            port,
            username: None,
            password: None,
        }
    }

    /// Attach a username/password pair.
    #[must_use]
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Enabled, with a protocol, an address and a positive port.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.protocol.is_none() && !self.address.is_empty() && self.port > 0
    }

    /// `address:port` of an active forward.
    #[must_use]
    pub fn server(&self) -> Option<String> {
        self.is_active()
            .then(|| format!("{}:{}", self.address, self.port))
    }

    /// Either credential is present and non-empty.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.username) || set(&self.password)
    }
}

/// One listener as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRecord {
    pub id: i64,
    // management part: never compiled into the listener entry
    #[serde(default)]
    pub up: i64,
    #[serde(default)]
    pub down: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub remark: String,
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default)]
    pub expiry_time: i64,

    // config part
    #[serde(default)]
    pub listen: String,
    pub port: u16,
    pub protocol: String,
    #[serde(default)]
    pub settings: String,
    #[serde(default)]
    pub stream_settings: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub sniffing: String,

    #[serde(flatten)]
    pub forward: SecondaryForwardSpec,
}

fn default_enable() -> bool {
    true
}

impl InboundRecord {
    /// Enabled record on `port` with the store-derived tag and no fragments.
    pub fn new(id: i64, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            id,
            up: 0,
            down: 0,
            total: 0,
            remark: String::new(),
            enable: true,
            expiry_time: 0,
            listen: String::new(),
            port,
            protocol: protocol.into(),
            settings: String::new(),
            stream_settings: String::new(),
            tag: inbound_tag(port),
            sniffing: String::new(),
            forward: SecondaryForwardSpec::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: impl Into<String>) -> Self {
        self.settings = settings.into();
        self
    }

    #[must_use]
    pub fn with_forward(mut self, forward: SecondaryForwardSpec) -> Self {
        self.forward = forward;
        self
    }

    /// Stored tag, or the port-derived one when the store left it blank.
    #[must_use]
    pub fn listener_tag(&self) -> Cow<'_, str> {
        if self.tag.is_empty() {
            Cow::Owned(inbound_tag(self.port))
        } else {
            Cow::Borrowed(&self.tag)
        }
    }
}

/// Tag the management layer assigns to the listener on `port`.
#[must_use]
pub fn inbound_tag(port: u16) -> String {
    format!("inbound-{port}")
}

/// Whether the record currently chains to an upstream proxy.
#[must_use]
pub fn has_secondary_forward(record: &InboundRecord) -> bool {
    record.forward.is_active()
}

/// Records with an active secondary forward, in stored order.
pub fn forwarding_records(records: &[InboundRecord]) -> Vec<&InboundRecord> {
    records.iter().filter(|r| has_secondary_forward(r)).collect()
}

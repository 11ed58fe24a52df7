//! Routing rules binding a listener tag to its forward outbound.

use serde::{Deserialize, Serialize};

/// Rule type understood by the engine's router.
pub const FIELD_RULE: &str = "field";

/// Listener tag -> forward outbound tag.
///
/// The compiled document carries one link per forwarding listener; the
/// routing rule and the settings back-reference are both derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForwardLink {
    pub inbound_tag: String,
    pub outbound_tag: String,
}

impl ForwardLink {
    pub fn new(inbound_tag: impl Into<String>, outbound_tag: impl Into<String>) -> Self {
        Self {
            inbound_tag: inbound_tag.into(),
            outbound_tag: outbound_tag.into(),
        }
    }
}

/// A field-match routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "inboundTag")]
    pub inbound_tag: Vec<String>,
    #[serde(rename = "outboundTag")]
    pub outbound_tag: String,
}

/// Exactly one rule sending all traffic of `inbound_tag` to `outbound_tag`.
#[must_use]
pub fn synthesize(inbound_tag: &str, outbound_tag: &str) -> RoutingRule {
    RoutingRule {
        kind: FIELD_RULE.to_owned(),
        inbound_tag: vec![inbound_tag.to_owned()],
        outbound_tag: outbound_tag.to_owned(),
    }
}

impl From<&ForwardLink> for RoutingRule {
    fn from(link: &ForwardLink) -> Self {
        synthesize(&link.inbound_tag, &link.outbound_tag)
    }
}

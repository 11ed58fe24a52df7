//! The compiled engine document.

use crate::fragment::Fragment;
use crate::json_norm;
use crate::passthrough::Section;
use crate::rule::ForwardLink;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One compiled listener. Only protocol-config fields; forwarding and
/// management fields of the record never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    pub port: u16,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Fragment>,
    #[serde(
        rename = "streamSettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stream_settings: Option<Fragment>,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sniffing: Option<Fragment>,
}

/// Complete configuration document consumed by the proxy engine.
///
/// Empty sections are omitted on output. `links` is derived data and is not
/// part of the wire form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbounds: Vec<InboundEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbounds: Vec<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<Fragment>,
    #[serde(rename = "fakeDns", default, skip_serializing_if = "Option::is_none")]
    pub fake_dns: Option<Fragment>,
    #[serde(skip)]
    pub links: Vec<ForwardLink>,
}

impl ConfigDocument {
    /// Load a previously published document.
    ///
    /// # Errors
    /// Returns the JSON error when the text is not a document object.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Self = serde_json::from_str(text)?;
        doc.links = doc.recover_links();
        Ok(doc)
    }

    /// Pretty-printed wire form. Fragments keep their own formatting.
    ///
    /// # Errors
    /// Only fails on serializer errors, which the fragment types rule out.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Opaque section other than `outbounds` (which is a list here).
    #[must_use]
    pub fn section(&self, section: Section) -> Option<&Fragment> {
        match section {
            Section::Log => self.log.as_ref(),
            Section::Routing => self.routing.as_ref(),
            Section::Dns => self.dns.as_ref(),
            Section::Outbounds => None,
            Section::Transport => self.transport.as_ref(),
            Section::Policy => self.policy.as_ref(),
            Section::Api => self.api.as_ref(),
            Section::Stats => self.stats.as_ref(),
            Section::Reverse => self.reverse.as_ref(),
            Section::FakeDns => self.fake_dns.as_ref(),
        }
    }

    pub(crate) fn set_section(&mut self, section: Section, value: Option<Fragment>) {
        let slot = match section {
            Section::Log => &mut self.log,
            Section::Routing => &mut self.routing,
            Section::Dns => &mut self.dns,
            Section::Outbounds => return,
            Section::Transport => &mut self.transport,
            Section::Policy => &mut self.policy,
            Section::Api => &mut self.api,
            Section::Stats => &mut self.stats,
            Section::Reverse => &mut self.reverse,
            Section::FakeDns => &mut self.fake_dns,
        };
        *slot = value;
    }

    /// Listener tag -> forward outbound tag relations of this document.
    #[must_use]
    pub fn links(&self) -> &[ForwardLink] {
        &self.links
    }

    /// Routing rules as decoded values, in document order.
    #[must_use]
    pub fn routing_rules(&self) -> Vec<Value> {
        self.routing
            .as_ref()
            .and_then(|r| r.decode().ok())
            .and_then(|mut v| v.get_mut("rules").map(Value::take))
            .and_then(|rules| match rules {
                Value::Array(rules) => Some(rules),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Outbound tags in document order; untagged outbounds are skipped.
    #[must_use]
    pub fn outbound_tags(&self) -> Vec<String> {
        self.outbounds
            .iter()
            .filter_map(|ob| ob.decode().ok())
            .filter_map(|v| v.get("tag").and_then(Value::as_str).map(str::to_owned))
            .collect()
    }

    /// SHA256-8 of the canonical wire form. Whitespace and key order inside
    /// fragments do not affect it, unlike [`crate::diff::equals`].
    ///
    /// # Errors
    /// Only fails on serializer errors.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        Ok(json_norm::fingerprint(&serde_json::to_value(self)?))
    }

    #[must_use]
    pub fn inbound(&self, tag: &str) -> Option<&InboundEntry> {
        self.inbounds.iter().find(|ib| ib.tag == tag)
    }

    /// Rebuild links from the settings back-references of a loaded document.
    fn recover_links(&self) -> Vec<ForwardLink> {
        self.inbounds
            .iter()
            .filter_map(|ib| {
                let settings = ib.settings.as_ref()?.decode().ok()?;
                let target = settings
                    .pointer("/proxySettings/tag")
                    .and_then(Value::as_str)?;
                Some(ForwardLink::new(ib.tag.clone(), target))
            })
            .collect()
    }
}

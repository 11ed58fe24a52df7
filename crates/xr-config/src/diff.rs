//! Document comparison for restart gating.
//!
//! [`equals`] is the gate: the engine is republished and restarted only when
//! it returns false. [`diff`] explains a difference for logs and the CLI.

use crate::document::{ConfigDocument, InboundEntry};
use crate::json_norm::canonical_string;
use crate::passthrough::Section;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Structural, order-sensitive equality of two documents.
///
/// Listener entries are compared field by field; outbounds and every opaque
/// section by bytes. Forward settings are not compared on their own: they are
/// already folded into listener settings, outbounds and routing rules.
#[must_use]
pub fn equals(a: &ConfigDocument, b: &ConfigDocument) -> bool {
    if a.inbounds.len() != b.inbounds.len() {
        return false;
    }
    if !a
        .inbounds
        .iter()
        .zip(&b.inbounds)
        .all(|(x, y)| inbound_equals(x, y))
    {
        return false;
    }
    if a.outbounds != b.outbounds {
        return false;
    }
    Section::ALL
        .iter()
        .all(|s| a.section(*s) == b.section(*s))
}

fn inbound_equals(a: &InboundEntry, b: &InboundEntry) -> bool {
    a.listen == b.listen
        && a.port == b.port
        && a.protocol == b.protocol
        && a.settings == b.settings
        && a.stream_settings == b.stream_settings
        && a.tag == b.tag
        && a.sniffing == b.sniffing
}

/// Changes in a keyed collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Change {
    /// Keys only present in the new document.
    pub added: Vec<String>,
    /// Keys only present in the old document.
    pub removed: Vec<String>,
    /// Keys present in both with different content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<String>,
}

impl Change {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Explanation of why two documents differ.
///
/// Empty exactly when [`equals`] holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Diff {
    /// Listeners keyed by tag.
    pub inbounds: Change,
    /// Same listener set, different order.
    #[serde(default)]
    pub inbounds_reordered: bool,
    /// Outbounds keyed by tag (`#<index>` when untagged).
    pub outbounds: Change,
    /// Same outbound set, different sequence (order or repeated entries).
    #[serde(default)]
    pub outbounds_reordered: bool,
    /// Routing rules keyed by content, counted with multiplicity.
    pub rules: Change,
    /// Opaque sections that differ. `routing` is listed when it differs
    /// beyond its added or removed rules, formatting included.
    pub sections: Vec<String>,
}

impl Diff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inbounds.is_empty()
            && !self.inbounds_reordered
            && self.outbounds.is_empty()
            && !self.outbounds_reordered
            && self.rules.is_empty()
            && self.sections.is_empty()
    }
}

/// Explain the differences between `old` and `new`.
#[must_use]
pub fn diff(old: &ConfigDocument, new: &ConfigDocument) -> Diff {
    let old_tags: Vec<&str> = old.inbounds.iter().map(|ib| ib.tag.as_str()).collect();
    let new_tags: Vec<&str> = new.inbounds.iter().map(|ib| ib.tag.as_str()).collect();
    let inbounds = diff_inbounds(&old.inbounds, &new.inbounds);
    let inbounds_reordered = (inbounds.added.is_empty()
        && inbounds.removed.is_empty()
        && old_tags != new_tags)
        || (inbounds.is_empty() && !inbound_lists_equal(&old.inbounds, &new.inbounds));

    let outbounds = diff_outbounds(old, new);
    let outbounds_reordered = outbounds.is_empty() && old.outbounds != new.outbounds;

    let rules = diff_rules(&old.routing_rules(), &new.routing_rules());
    let sections = diff_sections(old, new, &rules);

    Diff {
        inbounds,
        inbounds_reordered,
        outbounds,
        outbounds_reordered,
        rules,
        sections,
    }
}

fn inbound_lists_equal(a: &[InboundEntry], b: &[InboundEntry]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| inbound_equals(x, y))
}

fn diff_inbounds(old: &[InboundEntry], new: &[InboundEntry]) -> Change {
    let old_map: HashMap<&str, &InboundEntry> = old.iter().map(|ib| (ib.tag.as_str(), ib)).collect();
    let new_map: HashMap<&str, &InboundEntry> = new.iter().map(|ib| (ib.tag.as_str(), ib)).collect();

    let added = new
        .iter()
        .filter(|ib| !old_map.contains_key(ib.tag.as_str()))
        .map(|ib| ib.tag.clone())
        .collect();
    let removed = old
        .iter()
        .filter(|ib| !new_map.contains_key(ib.tag.as_str()))
        .map(|ib| ib.tag.clone())
        .collect();
    let changed = new
        .iter()
        .filter(|ib| {
            old_map
                .get(ib.tag.as_str())
                .is_some_and(|prev| !inbound_equals(prev, ib))
        })
        .map(|ib| ib.tag.clone())
        .collect();

    Change {
        added,
        removed,
        changed,
    }
}

/// Outbound key: its `tag`, else its position.
fn outbound_keys(doc: &ConfigDocument) -> Vec<(String, String)> {
    doc.outbounds
        .iter()
        .enumerate()
        .map(|(i, ob)| {
            let key = ob
                .decode()
                .ok()
                .and_then(|v| v.get("tag").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| format!("#{i}"));
            (key, ob.as_str().to_owned())
        })
        .collect()
}

fn diff_outbounds(old: &ConfigDocument, new: &ConfigDocument) -> Change {
    let old_keys = outbound_keys(old);
    let new_keys = outbound_keys(new);
    let old_map: HashMap<&str, &str> = old_keys.iter().map(|(k, t)| (k.as_str(), t.as_str())).collect();
    let new_map: HashMap<&str, &str> = new_keys.iter().map(|(k, t)| (k.as_str(), t.as_str())).collect();

    Change {
        added: new_keys
            .iter()
            .filter(|(k, _)| !old_map.contains_key(k.as_str()))
            .map(|(k, _)| k.clone())
            .collect(),
        removed: old_keys
            .iter()
            .filter(|(k, _)| !new_map.contains_key(k.as_str()))
            .map(|(k, _)| k.clone())
            .collect(),
        changed: new_keys
            .iter()
            .filter(|(k, text)| old_map.get(k.as_str()).is_some_and(|prev| prev != text))
            .map(|(k, _)| k.clone())
            .collect(),
    }
}

/// Rules are identified by content, not index, so a shifted rule is not
/// reported as a change. A rule present twice counts twice.
fn diff_rules(old: &[Value], new: &[Value]) -> Change {
    let mut positions: HashMap<String, (Vec<usize>, Vec<usize>)> = HashMap::new();
    for (i, rule) in old.iter().enumerate() {
        positions.entry(canonical_string(rule)).or_default().0.push(i);
    }
    for (i, rule) in new.iter().enumerate() {
        positions.entry(canonical_string(rule)).or_default().1.push(i);
    }

    let mut added = Vec::new();
    let mut removed = Vec::new();
    for (old_at, new_at) in positions.values() {
        if new_at.len() > old_at.len() {
            added.extend_from_slice(&new_at[old_at.len()..]);
        } else {
            removed.extend_from_slice(&old_at[new_at.len()..]);
        }
    }
    added.sort_unstable();
    removed.sort_unstable();

    Change {
        added: added.into_iter().map(|i| format!("rule-{i}")).collect(),
        removed: removed.into_iter().map(|i| format!("rule-{i}")).collect(),
        changed: Vec::new(),
    }
}

fn diff_sections(old: &ConfigDocument, new: &ConfigDocument, rules: &Change) -> Vec<String> {
    let mut out = BTreeSet::new();
    for section in Section::VERBATIM {
        if old.section(section) != new.section(section) {
            out.insert(section.key().to_owned());
        }
    }
    // rule changes explain a byte difference only when they exist
    let routing_unexplained = old.routing != new.routing && rules.is_empty();
    if routing_unexplained || routing_without_rules(old) != routing_without_rules(new) {
        out.insert(Section::Routing.key().to_owned());
    }
    out.into_iter().collect()
}

fn routing_without_rules(doc: &ConfigDocument) -> Option<Value> {
    let mut v = doc.routing.as_ref()?.decode().ok()?;
    if let Some(obj) = v.as_object_mut() {
        obj.remove("rules");
    }
    Some(v)
}

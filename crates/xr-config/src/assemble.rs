//! Document assembly.
//!
//! One pass over a record snapshot:
//! 1. per enabled record: resolve forward -> synthesize outbound + link -> listener entry
//! 2. outbounds = passthrough outbounds ++ synthesized (listener order)
//! 3. routing.rules = passthrough rules ++ synthesized (listener order)
//! 4. remaining sections copied verbatim
//!
//! Any forward validation failure aborts the whole pass: a document is never
//! partially valid. A malformed passthrough section only drops that section.

use crate::document::{ConfigDocument, InboundEntry};
use crate::forward;
use crate::fragment::Fragment;
use crate::model::InboundRecord;
use crate::outbound;
use crate::passthrough::{Passthrough, Section};
use crate::rule::{ForwardLink, RoutingRule};
use crate::store::InboundStore;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use xr_types::{CompileError, PassthroughWarning};

/// Result of a successful pass.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub document: ConfigDocument,
    /// Passthrough sections that were dropped.
    pub warnings: Vec<PassthroughWarning>,
}

/// Read a snapshot from `store` and compile it.
///
/// # Errors
/// Store failures and every [`compile_records`] error.
pub fn compile<S>(store: &S, passthrough: &Passthrough) -> Result<Compiled, CompileError>
where
    S: InboundStore + ?Sized,
{
    let records = store.inbounds()?;
    compile_records(&records, passthrough)
}

/// Compile a record snapshot into one document.
///
/// # Errors
/// - [`CompileError::Forward`] for the first record whose forward fails validation
/// - [`CompileError::Fragment`] for a listener fragment that is not valid JSON
/// - [`CompileError::SettingsNotObject`] when a forward reference cannot be attached
pub fn compile_records(
    records: &[InboundRecord],
    passthrough: &Passthrough,
) -> Result<Compiled, CompileError> {
    let mut inbounds = Vec::with_capacity(records.len());
    let mut synthesized = Vec::new();
    let mut links = Vec::new();

    for record in records {
        if !record.enable {
            debug!(id = record.id, port = record.port, "skip disabled inbound");
            continue;
        }
        let tag = record.listener_tag().into_owned();
        let spec = forward::resolve(&record.forward).map_err(|source| CompileError::Forward {
            id: record.id,
            tag: tag.clone(),
            source,
        })?;
        let mut entry = listener_entry(record, &tag)?;
        if let Some(ob) = outbound::synthesize(&spec, record.port) {
            entry.settings = Some(outbound::annotate_settings(
                entry.settings.as_ref(),
                &ob.tag,
                &tag,
            )?);
            debug!(inbound = %tag, outbound = %ob.tag, upstream = %ob.address, "forward synthesized");
            synthesized.push(Fragment::encode(&ob).map_err(|e| CompileError::Encode {
                context: format!("outbound {}", ob.tag),
                message: e.to_string(),
            })?);
            links.push(ForwardLink::new(tag, ob.tag));
        }
        inbounds.push(entry);
    }

    let mut warnings = Vec::new();
    let mut document = ConfigDocument::default();
    for section in Section::VERBATIM {
        document.set_section(section, parse_section(passthrough, section, &mut warnings));
    }

    let mut outbounds = existing_outbounds(passthrough, &mut warnings);
    outbounds.extend(synthesized);
    document.outbounds = outbounds;

    let rules: Vec<RoutingRule> = links.iter().map(RoutingRule::from).collect();
    document.routing = merged_routing(passthrough, &rules, &mut warnings)?;

    document.inbounds = inbounds;
    document.links = links;

    for w in &warnings {
        warn!(section = %w.section, error = %w.message, "passthrough section dropped");
    }
    info!(
        inbounds = document.inbounds.len(),
        outbounds = document.outbounds.len(),
        forwards = document.links.len(),
        warnings = warnings.len(),
        "config compiled"
    );
    Ok(Compiled { document, warnings })
}

/// Listener entry without forward annotation.
fn listener_entry(record: &InboundRecord, tag: &str) -> Result<InboundEntry, CompileError> {
    let fragment = |field: &str, text: &str| {
        Fragment::parse(text).map_err(|e| CompileError::Fragment {
            tag: tag.to_owned(),
            field: field.to_owned(),
            message: e.to_string(),
        })
    };
    Ok(InboundEntry {
        listen: (!record.listen.is_empty()).then(|| record.listen.clone()),
        port: record.port,
        protocol: record.protocol.clone(),
        settings: fragment("settings", &record.settings)?,
        stream_settings: fragment("streamSettings", &record.stream_settings)?,
        tag: tag.to_owned(),
        sniffing: fragment("sniffing", &record.sniffing)?,
    })
}

fn parse_section(
    passthrough: &Passthrough,
    section: Section,
    warnings: &mut Vec<PassthroughWarning>,
) -> Option<Fragment> {
    let text = passthrough.get(section)?;
    match Fragment::parse(text) {
        Ok(frag) => frag,
        Err(e) => {
            warnings.push(PassthroughWarning::new(section.key(), e.to_string()));
            None
        }
    }
}

/// Passthrough outbounds, each element kept byte-for-byte.
fn existing_outbounds(
    passthrough: &Passthrough,
    warnings: &mut Vec<PassthroughWarning>,
) -> Vec<Fragment> {
    let Some(frag) = parse_section(passthrough, Section::Outbounds, warnings) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Box<RawValue>>>(frag.as_str()) {
        Ok(items) => items
            .into_iter()
            .filter(|raw| raw.get() != "null")
            .map(Fragment::from_raw)
            .collect(),
        Err(e) => {
            warnings.push(PassthroughWarning::new(
                Section::Outbounds.key(),
                format!("expected an array: {e}"),
            ));
            Vec::new()
        }
    }
}

/// Routing section with synthesized rules appended after the existing ones.
///
/// Without synthesized rules the section is copied verbatim.
fn merged_routing(
    passthrough: &Passthrough,
    rules: &[RoutingRule],
    warnings: &mut Vec<PassthroughWarning>,
) -> Result<Option<Fragment>, CompileError> {
    let existing = parse_section(passthrough, Section::Routing, warnings);
    if rules.is_empty() {
        return Ok(existing);
    }

    let mut routing = match existing.as_ref().map(Fragment::decode).transpose() {
        Ok(Some(Value::Object(map))) => map,
        Ok(None) => Map::new(),
        Ok(Some(_)) => {
            warnings.push(PassthroughWarning::new(
                Section::Routing.key(),
                "expected an object",
            ));
            Map::new()
        }
        Err(e) => {
            warnings.push(PassthroughWarning::new(Section::Routing.key(), e.to_string()));
            Map::new()
        }
    };

    let mut merged = match routing.remove("rules") {
        Some(Value::Array(existing_rules)) => existing_rules,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            warnings.push(PassthroughWarning::new(
                "routing.rules",
                "expected an array; manual rules dropped",
            ));
            Vec::new()
        }
    };
    for rule in rules {
        merged.push(serde_json::to_value(rule).map_err(|e| CompileError::Encode {
            context: "routing rule".into(),
            message: e.to_string(),
        })?);
    }
    routing.insert("rules".into(), Value::Array(merged));

    Fragment::encode(&routing)
        .map(Some)
        .map_err(|e| CompileError::Encode {
            context: "routing".into(),
            message: e.to_string(),
        })
}

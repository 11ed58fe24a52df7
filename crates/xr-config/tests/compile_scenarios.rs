//! End-to-end compile scenarios over record snapshots.

use serde_json::{json, Value};
use xr_config::{
    compile, compile_records, diff, inbound_tag, CompileError, ConfigDocument, ForwardLink,
    ForwardProtocol, InboundRecord, InboundStore, Passthrough, SecondaryForwardSpec, Section,
    StoreError, ValidationError,
};

fn template() -> Passthrough {
    Passthrough::new()
        .with(Section::Log, r#"{"loglevel": "warning"}"#)
        .with(Section::Api, r#"{"services":["HandlerService","StatsService"],"tag":"api"}"#)
        .with(Section::Stats, "{}")
        .with(
            Section::Outbounds,
            r#"[{"protocol":"freedom","settings":{},"tag":"direct"},{"protocol":"blackhole","settings":{},"tag":"blocked"}]"#,
        )
        .with(
            Section::Routing,
            r#"{"rules":[{"type":"field","inboundTag":["api"],"outboundTag":"api"}]}"#,
        )
}

fn decode(doc: &ConfigDocument) -> Value {
    serde_json::from_str(&doc.to_json_string().unwrap()).unwrap()
}

fn scenario_b_record() -> InboundRecord {
    InboundRecord::new(2, 1080, "vmess")
        .with_settings(r#"{"clients":[{"id":"b831381d-6324-4d53-ad4f-8cda48b30811","alterId":0}]}"#)
        .with_forward(
            SecondaryForwardSpec::to(ForwardProtocol::Socks, "10.0.0.5", 1081).with_auth("u", "p"),
        )
}

#[test]
fn scenario_a_disabled_forward_synthesizes_nothing() {
    let record = InboundRecord::new(1, 443, "vless").with_settings(r#"{"clients":[]}"#);
    let out = compile_records(&[record], &template()).unwrap();
    let doc = out.document;

    assert!(doc.links().is_empty());
    assert_eq!(doc.outbound_tags(), vec!["direct", "blocked"]);
    assert_eq!(doc.routing_rules().len(), 1);

    let v = decode(&doc);
    let entry = v["inbounds"][0].as_object().unwrap();
    let mut keys: Vec<&str> = entry.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["port", "protocol", "settings", "tag"]);
    assert!(entry["settings"].get("proxySettings").is_none());
}

#[test]
fn scenario_b_socks_forward_with_credentials() {
    let out = compile_records(&[scenario_b_record()], &template()).unwrap();
    let doc = out.document;
    assert!(out.warnings.is_empty());

    assert_eq!(
        doc.links(),
        &[ForwardLink::new("inbound-1080", "socks-forward-1080")]
    );

    let v = decode(&doc);
    let outbounds = v["outbounds"].as_array().unwrap();
    assert_eq!(outbounds.len(), 3);
    assert_eq!(outbounds[0]["tag"], "direct");
    assert_eq!(
        outbounds[2],
        json!({
            "protocol": "socks",
            "settings": {"servers": [{
                "address": "10.0.0.5",
                "port": 1081,
                "users": [{"user": "u", "pass": "p"}]
            }]},
            "tag": "socks-forward-1080"
        })
    );

    let rules = v["routing"]["rules"].as_array().unwrap();
    assert_eq!(rules[0]["outboundTag"], "api");
    assert_eq!(
        rules[1],
        json!({"type": "field", "inboundTag": ["inbound-1080"], "outboundTag": "socks-forward-1080"})
    );

    let entry = &v["inbounds"][0];
    assert_eq!(entry["settings"]["proxySettings"]["tag"], "socks-forward-1080");
    assert_eq!(entry["settings"]["clients"][0]["alterId"], 0);
    for forbidden in ["secondaryForwardEnable", "secondaryForwardAddress", "enable", "up", "remark"] {
        assert!(entry.get(forbidden).is_none(), "{forbidden} leaked");
    }
}

#[test]
fn scenario_c_missing_protocol_aborts_and_keeps_applied() {
    let applied = compile_records(&[scenario_b_record()], &template())
        .unwrap()
        .document;
    let applied_text = applied.to_json_string().unwrap();

    let bad = InboundRecord::new(3, 2080, "trojan").with_forward(SecondaryForwardSpec {
        enabled: true,
        protocol: ForwardProtocol::None,
        address: "10.0.0.6".into(),
        port: 1081,
        ..Default::default()
    });
    let err = compile_records(&[scenario_b_record(), bad], &template()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Forward {
            id: 3,
            source: ValidationError::MissingProtocol,
            ..
        }
    ));
    assert_eq!(applied.to_json_string().unwrap(), applied_text);
}

#[test]
fn scenario_d_port_out_of_range() {
    let record = InboundRecord::new(4, 8443, "vless").with_forward(SecondaryForwardSpec::to(
        ForwardProtocol::Http,
        "proxy.example",
        70_000,
    ));
    let err = compile_records(&[record], &template()).unwrap_err();
    match err {
        CompileError::Forward { source, .. } => {
            assert_eq!(source, ValidationError::PortOutOfRange { port: 70_000 });
            assert_eq!(source.field(), "port");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_protocol_on_many_listeners_gets_unique_tags() {
    let records: Vec<InboundRecord> = [1080u16, 1090, 2000]
        .iter()
        .enumerate()
        .map(|(i, port)| {
            InboundRecord::new(i as i64, *port, "vmess").with_forward(SecondaryForwardSpec::to(
                ForwardProtocol::Socks,
                "10.0.0.5",
                1081,
            ))
        })
        .collect();
    let doc = compile_records(&records, &Passthrough::new()).unwrap().document;
    let tags = doc.outbound_tags();
    assert_eq!(
        tags,
        vec!["socks-forward-1080", "socks-forward-1090", "socks-forward-2000"]
    );
    let rule_targets: Vec<Value> = doc
        .routing_rules()
        .iter()
        .map(|r| r["outboundTag"].clone())
        .collect();
    assert_eq!(rule_targets, vec![json!("socks-forward-1080"), json!("socks-forward-1090"), json!("socks-forward-2000")]);
}

#[test]
fn passthrough_sections_are_byte_identical() {
    let log = r#"{"access": "/var/log/xray/access.log",   "loglevel": "warning", "x-extra": [1, {"deep": null}]}"#;
    let pt = template().with(Section::Log, log).with(Section::FakeDns, r#"[{"ipPool":"198.18.0.0/15","poolSize":65535}]"#);
    let doc = compile_records(&[InboundRecord::new(1, 443, "vless")], &pt)
        .unwrap()
        .document;
    assert_eq!(doc.log.as_ref().unwrap().as_str(), log);
    let text = doc.to_json_string().unwrap();
    assert!(text.contains(log));
    assert!(text.contains("\"fakeDns\""));
}

#[test]
fn malformed_passthrough_is_dropped_not_fatal() {
    let pt = template()
        .with(Section::Dns, r#"{"servers": ["1.1.1.1",]}"#)
        .with(Section::Policy, "{");
    let out = compile_records(&[scenario_b_record()], &pt).unwrap();
    let sections: Vec<&str> = out.warnings.iter().map(|w| w.section.as_str()).collect();
    assert_eq!(sections, vec!["dns", "policy"]);
    let v = decode(&out.document);
    assert!(v.get("dns").is_none());
    assert!(v.get("policy").is_none());
    assert!(v.get("log").is_some());
}

#[test]
fn empty_sections_are_omitted() {
    let doc = compile_records(&[], &Passthrough::new()).unwrap().document;
    assert_eq!(doc.to_json_string().unwrap(), "{}");
}

#[test]
fn listen_address_is_emitted_as_string() {
    let mut record = InboundRecord::new(1, 443, "vless");
    record.listen = "0.0.0.0".into();
    let doc = compile_records(&[record], &Passthrough::new()).unwrap().document;
    assert_eq!(decode(&doc)["inbounds"][0]["listen"], "0.0.0.0");
}

#[test]
fn compiled_document_reloads_equal() {
    let doc = compile_records(&[scenario_b_record()], &template())
        .unwrap()
        .document;
    let reloaded = ConfigDocument::from_json_str(&doc.to_json_string().unwrap()).unwrap();
    assert!(diff::equals(&doc, &reloaded));
    assert_eq!(reloaded.links(), doc.links());
}

struct FailingStore;

impl InboundStore for FailingStore {
    fn inbounds(&self) -> Result<Vec<InboundRecord>, StoreError> {
        Err(StoreError::unavailable("database is locked"))
    }
}

#[test]
fn compile_reads_store_snapshot() {
    let records = vec![scenario_b_record()];
    let out = compile(&records, &template()).unwrap();
    assert_eq!(out.document.inbounds[0].tag, inbound_tag(1080));

    let err = compile(&FailingStore, &template()).unwrap_err();
    assert!(matches!(err, CompileError::Store(_)));
}

//! Restart-gate properties of the document comparator.

use proptest::prelude::*;
use xr_config::diff::{diff, equals};
use xr_config::{compile_records, ForwardProtocol, InboundRecord, Passthrough, SecondaryForwardSpec, Section};

fn template() -> Passthrough {
    Passthrough::new()
        .with(Section::Log, r#"{"loglevel":"warning"}"#)
        .with(Section::Outbounds, r#"[{"protocol":"freedom","tag":"direct"}]"#)
}

fn records() -> Vec<InboundRecord> {
    vec![
        InboundRecord::new(1, 443, "vless").with_settings(r#"{"clients":[],"decryption":"none"}"#),
        InboundRecord::new(2, 1080, "vmess").with_forward(
            SecondaryForwardSpec::to(ForwardProtocol::Socks, "10.0.0.5", 1081).with_auth("u", "p"),
        ),
        InboundRecord::new(3, 8080, "http"),
    ]
}

fn compiled(records: &[InboundRecord]) -> xr_config::ConfigDocument {
    compile_records(records, &template()).unwrap().document
}

#[test]
fn identical_snapshots_compare_equal() {
    let a = compiled(&records());
    let b = compiled(&records());
    assert!(equals(&a, &a));
    assert!(equals(&a, &b));
    assert!(diff(&a, &b).is_empty());
}

#[test]
fn forwarding_only_change_is_detected() {
    let base = compiled(&records());
    let mut changed = records();
    changed[1].forward.password = Some("rotated".into());
    let other = compiled(&changed);
    assert!(!equals(&base, &other));
    let d = diff(&base, &other);
    assert_eq!(d.outbounds.changed, vec!["socks-forward-1080"]);
}

#[test]
fn enabling_forward_changes_settings_outbounds_and_rules() {
    let base = compiled(&records());
    let mut changed = records();
    changed[2].forward = SecondaryForwardSpec::to(ForwardProtocol::Http, "upstream", 3128);
    let other = compiled(&changed);
    let d = diff(&base, &other);
    assert_eq!(d.inbounds.changed, vec!["inbound-8080"]);
    assert_eq!(d.outbounds.added, vec!["http-forward-8080"]);
    assert_eq!(d.rules.added.len(), 1);
}

#[test]
fn reordering_listeners_is_a_change() {
    let base = compiled(&records());
    let mut reordered = records();
    reordered.swap(0, 2);
    assert!(!equals(&base, &compiled(&reordered)));
}

#[test]
fn passthrough_change_is_detected() {
    let a = compiled(&records());
    let b = compile_records(&records(), &template().with(Section::Log, r#"{"loglevel":"debug"}"#))
        .unwrap()
        .document;
    assert!(!equals(&a, &b));
    assert_eq!(diff(&a, &b).sections, vec!["log"]);
}

#[derive(Debug, Clone)]
enum Mutation {
    Listen,
    Port,
    Protocol,
    Settings,
    StreamSettings,
    Tag,
    Sniffing,
    ForwardEnable,
    ForwardAddress,
    ForwardPort,
    ForwardProtocol,
}

fn arb_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        Just(Mutation::Listen),
        Just(Mutation::Port),
        Just(Mutation::Protocol),
        Just(Mutation::Settings),
        Just(Mutation::StreamSettings),
        Just(Mutation::Tag),
        Just(Mutation::Sniffing),
        Just(Mutation::ForwardEnable),
        Just(Mutation::ForwardAddress),
        Just(Mutation::ForwardPort),
        Just(Mutation::ForwardProtocol),
    ]
}

fn apply(record: &mut InboundRecord, m: &Mutation) {
    match m {
        Mutation::Listen => record.listen = "127.0.0.2".into(),
        Mutation::Port => record.port = 60_001,
        Mutation::Protocol => record.protocol = "shadowsocks".into(),
        Mutation::Settings => record.settings = r#"{"changed":true}"#.into(),
        Mutation::StreamSettings => record.stream_settings = r#"{"network":"ws"}"#.into(),
        Mutation::Tag => record.tag = "inbound-renamed".into(),
        Mutation::Sniffing => record.sniffing = r#"{"enabled":true}"#.into(),
        Mutation::ForwardEnable => {
            record.forward = if record.forward.enabled {
                SecondaryForwardSpec::default()
            } else {
                SecondaryForwardSpec::to(ForwardProtocol::Socks, "192.0.2.1", 1080)
            }
        }
        Mutation::ForwardAddress => {
            record.forward = SecondaryForwardSpec::to(ForwardProtocol::Socks, "192.0.2.99", 1080)
        }
        Mutation::ForwardPort => {
            record.forward = SecondaryForwardSpec::to(ForwardProtocol::Socks, "10.0.0.5", 9999)
        }
        Mutation::ForwardProtocol => {
            record.forward = SecondaryForwardSpec::to(ForwardProtocol::Http, "10.0.0.5", 1081)
                .with_auth("u", "p")
        }
    }
}

proptest! {
    #[test]
    fn any_single_field_change_breaks_equality(idx in 0usize..3, m in arb_mutation()) {
        let base = compiled(&records());
        let mut changed = records();
        apply(&mut changed[idx], &m);
        let other = compiled(&changed);
        prop_assert!(!equals(&base, &other), "mutation {:?} on record {} went unnoticed", m, idx);
    }
}

const ROUTING: [&str; 6] = [
    r#"{"rules":[{"type":"field","inboundTag":["api"],"outboundTag":"api"}]}"#,
    r#"{ "rules": [ {"type": "field", "inboundTag": ["api"], "outboundTag": "api"} ] }"#,
    r#"{"rules":[{"type":"field","inboundTag":["api"],"outboundTag":"api"},{"type":"field","inboundTag":["api"],"outboundTag":"api"}]}"#,
    r#"{"domainStrategy":"AsIs","rules":[{"type":"field","inboundTag":["api"],"outboundTag":"api"}]}"#,
    r#"{"rules":[{"type":"field","outboundTag":"blocked"},{"type":"field","inboundTag":["api"],"outboundTag":"api"}]}"#,
    r#"{"rules":[]}"#,
];

const OUTBOUNDS: [&str; 4] = [
    r#"[{"protocol":"freedom","tag":"direct"},{"protocol":"blackhole","tag":"blocked"}]"#,
    r#"[{"protocol":"blackhole","tag":"blocked"},{"protocol":"freedom","tag":"direct"}]"#,
    r#"[{"protocol":"freedom","tag":"direct"},{"protocol":"freedom","tag":"direct"}]"#,
    r#"[{"protocol":"freedom","tag":"direct"}]"#,
];

#[derive(Debug, Clone)]
struct Side {
    order: Vec<usize>,
    mutation: Option<(usize, Mutation)>,
    routing: usize,
    outbounds: usize,
}

fn arb_side() -> impl Strategy<Value = Side> {
    (
        proptest::sample::subsequence(vec![0usize, 1, 2], 0..=3).prop_shuffle(),
        proptest::option::of((0usize..3, arb_mutation())),
        0..ROUTING.len(),
        0..OUTBOUNDS.len(),
    )
        .prop_map(|(order, mutation, routing, outbounds)| Side {
            order,
            mutation,
            routing,
            outbounds,
        })
}

fn build(side: &Side) -> xr_config::ConfigDocument {
    let base = records();
    let mut recs: Vec<InboundRecord> = side.order.iter().map(|i| base[*i].clone()).collect();
    if let Some((idx, m)) = &side.mutation {
        if let Some(r) = recs.get_mut(*idx) {
            apply(r, m);
        }
    }
    let template = Passthrough::new()
        .with(Section::Log, r#"{"loglevel":"warning"}"#)
        .with(Section::Routing, ROUTING[side.routing])
        .with(Section::Outbounds, OUTBOUNDS[side.outbounds]);
    compile_records(&recs, &template).unwrap().document
}

proptest! {
    #[test]
    fn diff_is_empty_exactly_when_equal(a in arb_side(), b in arb_side(), same in any::<bool>()) {
        let da = build(&a);
        let db = if same { build(&a) } else { build(&b) };
        let d = diff(&da, &db);
        prop_assert_eq!(equals(&da, &db), d.is_empty(), "diff {:?}", d);
    }
}

//! A disabled forward leaves no trace in the compiled document, whatever
//! else the sub-record holds.

use proptest::prelude::*;
use serde_json::Value;
use xr_config::{compile_records, ForwardProtocol, InboundRecord, Passthrough, SecondaryForwardSpec, Section};

fn arb_disabled() -> impl Strategy<Value = SecondaryForwardSpec> {
    (
        prop_oneof![
            Just(ForwardProtocol::None),
            Just(ForwardProtocol::Socks),
            Just(ForwardProtocol::Http),
        ],
        "[a-z0-9. ]{0,16}",
        any::<i64>(),
        proptest::option::of("[a-z]{0,6}"),
        proptest::option::of("[a-z]{0,6}"),
    )
        .prop_map(|(protocol, address, port, username, password)| SecondaryForwardSpec {
            enabled: false,
            protocol,
            address,
            port,
            username,
            password,
        })
}

proptest! {
    #[test]
    fn disabled_forward_is_never_referenced(
        forward in arb_disabled(),
        settings in prop_oneof![Just(""), Just(r#"{"clients":[]}"#)],
    ) {
        let record = InboundRecord::new(1, 1080, "vmess")
            .with_settings(settings)
            .with_forward(forward);
        let template = Passthrough::new()
            .with(Section::Outbounds, r#"[{"protocol":"freedom","tag":"direct"}]"#)
            .with(Section::Routing, r#"{"rules":[]}"#);
        let doc = compile_records(&[record], &template).unwrap().document;

        prop_assert!(doc.links().is_empty());
        prop_assert_eq!(doc.outbound_tags(), vec!["direct".to_string()]);
        prop_assert!(doc.routing_rules().is_empty());
        prop_assert_eq!(doc.routing.as_ref().map(|r| r.as_str()), Some(r#"{"rules":[]}"#));

        let entry = doc.inbound("inbound-1080").unwrap();
        if let Some(s) = &entry.settings {
            let v: Value = s.decode().unwrap();
            prop_assert!(v.get("proxySettings").is_none());
        }
    }
}

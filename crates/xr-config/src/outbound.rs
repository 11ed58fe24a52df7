//! Synthesized forward outbounds.
//!
//! A resolved forward on listener port `P` becomes one outbound tagged
//! `<protocol>-forward-<P>`. Listener ports are unique, so the tags are too,
//! even when several listeners forward over the same protocol.

use crate::fragment::Fragment;
use crate::model::{ForwardProtocol, SecondaryForwardSpec};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use xr_types::CompileError;

/// Settings key the engine reads to join a listener to its forward outbound.
pub const PROXY_SETTINGS_KEY: &str = "proxySettings";

/// Upstream credential pair, emitted as `users[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

/// Outbound chaining one listener to its upstream proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundDescriptor {
    /// `Socks` or `Http`; never `None`.
    pub protocol: ForwardProtocol,
    pub tag: String,
    pub address: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
}

/// Tag of the forward outbound for the listener on `listener_port`.
#[must_use]
pub fn forward_tag(protocol: ForwardProtocol, listener_port: u16) -> String {
    format!("{}-forward-{}", protocol.as_str(), listener_port)
}

/// Derive the outbound for a resolved spec. `None` when nothing is forwarded.
///
/// The input must come out of [`crate::forward::resolve`]; an out-of-range
/// upstream port yields `None` rather than a truncated port.
#[must_use]
pub fn synthesize(spec: &SecondaryForwardSpec, listener_port: u16) -> Option<OutboundDescriptor> {
    if !spec.enabled || spec.protocol.is_none() {
        return None;
    }
    let port = u16::try_from(spec.port).ok()?;
    let credentials = match (spec.username.as_deref(), spec.password.as_deref()) {
        (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some(Credentials {
            user: user.to_owned(),
            pass: pass.to_owned(),
        }),
        _ => None,
    };
    Some(OutboundDescriptor {
        protocol: spec.protocol,
        tag: forward_tag(spec.protocol, listener_port),
        address: spec.address.clone(),
        port,
        credentials,
    })
}

#[derive(Serialize)]
struct WireOutbound<'a> {
    protocol: &'static str,
    settings: WireSettings<'a>,
    tag: &'a str,
}

#[derive(Serialize)]
struct WireSettings<'a> {
    servers: [WireServer<'a>; 1],
}

#[derive(Serialize)]
struct WireServer<'a> {
    address: &'a str,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<[&'a Credentials; 1]>,
}

impl Serialize for OutboundDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireOutbound {
            protocol: self.protocol.as_str(),
            settings: WireSettings {
                servers: [WireServer {
                    address: &self.address,
                    port: self.port,
                    users: self.credentials.as_ref().map(|c| [c]),
                }],
            },
            tag: &self.tag,
        }
        .serialize(serializer)
    }
}

/// Attach the `proxySettings.tag` back-reference to a listener's settings.
///
/// Absent settings start from `{}`; every other key is preserved.
///
/// # Errors
/// [`CompileError::SettingsNotObject`] when the settings are not an object.
pub fn annotate_settings(
    settings: Option<&Fragment>,
    outbound_tag: &str,
    listener_tag: &str,
) -> Result<Fragment, CompileError> {
    let mut map = match settings.map(Fragment::decode).transpose() {
        Ok(None) => Map::new(),
        Ok(Some(Value::Object(map))) => map,
        Ok(Some(_)) => {
            return Err(CompileError::SettingsNotObject {
                tag: listener_tag.to_owned(),
            })
        }
        Err(e) => {
            return Err(CompileError::Fragment {
                tag: listener_tag.to_owned(),
                field: "settings".into(),
                message: e.to_string(),
            })
        }
    };
    map.insert(PROXY_SETTINGS_KEY.into(), json!({ "tag": outbound_tag }));
    Fragment::encode(&map).map_err(|e| CompileError::Encode {
        context: format!("settings of {listener_tag}"),
        message: e.to_string(),
    })
}

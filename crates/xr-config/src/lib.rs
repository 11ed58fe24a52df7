//! Inbound configuration compiler.
//!
//! # Workflow
//! `InboundStore snapshot` -> `resolve forward` -> `synthesize outbound + rule`
//! -> `assemble document` -> `compare with applied document`
//!
//! - [`forward`]: validates and normalizes each listener's secondary forward.
//! - [`outbound`] / [`rule`]: derive the forward outbound (`<protocol>-forward-<port>`)
//!   and the field rule binding the listener tag to it.
//! - [`assemble`]: builds one [`ConfigDocument`] from records plus passthrough
//!   sections. A bad forward aborts the pass; a bad passthrough section is dropped.
//! - [`diff`]: restart gate ([`diff::equals`]) and change explanation.
//!
//! Everything here is synchronous and pure over the snapshot it is given.

pub mod assemble;
pub mod diff;
pub mod document;
pub mod forward;
pub mod fragment;
pub mod json_norm;
pub mod model;
pub mod outbound;
pub mod passthrough;
pub mod rule;
pub mod store;

pub use assemble::{compile, compile_records, Compiled};
pub use document::{ConfigDocument, InboundEntry};
pub use fragment::Fragment;
pub use model::{
    forwarding_records, has_secondary_forward, inbound_tag, ForwardProtocol, InboundRecord,
    SecondaryForwardSpec,
};
pub use outbound::OutboundDescriptor;
pub use passthrough::{Passthrough, Section};
pub use rule::{ForwardLink, RoutingRule};
pub use store::InboundStore;
pub use xr_types::{CompileError, PassthroughWarning, StoreError, ValidationError};

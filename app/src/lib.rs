//! xr application crate.
//!
//! The binary (`src/main.rs`) only parses arguments and dispatches; everything
//! reachable from a subcommand lives here so integration tests can drive it.

pub mod cli;
pub mod logging;
pub mod publish;
pub mod reload;
pub mod store;
pub mod template;

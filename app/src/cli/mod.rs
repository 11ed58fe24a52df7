pub mod check;
pub mod compile;
pub mod diff;
pub mod watch;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use xr_config::{compile as compile_store, Compiled, Passthrough};
use xr_types::CompileError;

use crate::store::JsonFileStore;
use crate::template::load_passthrough;

/// Exit code when a document was compiled (or nothing changed).
pub const EXIT_OK: i32 = 0;
/// Exit code for `diff` when the applied document is out of date.
pub const EXIT_CHANGED: i32 = 1;
/// Exit code for rejected input.
pub const EXIT_INVALID: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "xr")]
#[command(about = "Compile stored inbounds into the proxy engine config", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile records and a template into an engine document
    Compile(compile::CompileArgs),
    /// Validate the forwarding settings of every record
    Check(check::CheckArgs),
    /// Compare a fresh compile with the applied document
    Diff(diff::DiffArgs),
    /// Recompile and publish whenever the records change
    Watch(watch::WatchArgs),
}

/// Record and template inputs shared by compiling subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct Inputs {
    /// Records file (JSON array of inbound records)
    #[arg(short = 'i', long = "inbounds", env = "XR_INBOUNDS")]
    pub inbounds: PathBuf,
    /// Passthrough template (JSON, or YAML by extension)
    #[arg(short = 't', long = "template", env = "XR_TEMPLATE")]
    pub template: PathBuf,
}

impl Inputs {
    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.inbounds)
    }

    pub fn passthrough(&self) -> Result<Passthrough> {
        load_passthrough(&self.template)
    }

    /// Compile once. `Ok(Err(_))` is rejected input rather than an I/O failure.
    pub fn compile(&self) -> Result<std::result::Result<Compiled, CompileError>> {
        let passthrough = self
            .passthrough()
            .with_context(|| format!("load template {}", self.template.display()))?;
        Ok(compile_store(&self.store(), &passthrough))
    }
}

/// Print a compile error the way every subcommand reports it.
pub(crate) fn report_compile_error(err: &CompileError) {
    tracing::error!(code = %err.code(), error = %err, "compile failed");
    eprintln!("[ERROR][{}] {}", err.code(), err);
}

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::{report_compile_error, Inputs, EXIT_INVALID, EXIT_OK};
use crate::publish::write_atomic;

#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub inputs: Inputs,
    /// Write the document here instead of stdout
    #[arg(short = 'o', long = "out", env = "XR_OUT")]
    pub out: Option<PathBuf>,
}

/// Returns the exit code: 0 compiled, 2 rejected.
pub fn run(args: CompileArgs) -> Result<i32> {
    let compiled = match args.inputs.compile()? {
        Ok(c) => c,
        Err(e) => {
            report_compile_error(&e);
            return Ok(EXIT_INVALID);
        }
    };
    for w in &compiled.warnings {
        eprintln!("[WARN][{}] {}", w.code(), w);
    }
    let text = compiled
        .document
        .to_json_string()
        .context("encode document")?;

    if let Ok(fp) = compiled.document.fingerprint() {
        tracing::info!(fingerprint = %fp, "document compiled");
    }

    match &args.out {
        Some(path) => {
            write_atomic(path, text.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
            tracing::info!(path = %path.display(), "document written");
        }
        None => println!("{text}"),
    }
    Ok(EXIT_OK)
}

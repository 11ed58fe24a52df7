use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use xr_config::diff::{diff, equals};
use xr_config::ConfigDocument;

use super::{report_compile_error, Inputs, EXIT_CHANGED, EXIT_INVALID, EXIT_OK};

#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub inputs: Inputs,
    /// Applied document to compare against
    #[arg(short = 'c', long = "current", env = "XR_OUT")]
    pub current: PathBuf,
    /// Output format: text | json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

/// Returns the exit code: 0 equal, 1 changed, 2 rejected.
pub fn run(args: DiffArgs) -> Result<i32> {
    let text = fs::read_to_string(&args.current)
        .with_context(|| format!("read {}", args.current.display()))?;
    let current = ConfigDocument::from_json_str(&text)
        .with_context(|| format!("decode {}", args.current.display()))?;

    let compiled = match args.inputs.compile()? {
        Ok(c) => c,
        Err(e) => {
            report_compile_error(&e);
            return Ok(EXIT_INVALID);
        }
    };
    let same = equals(&current, &compiled.document);
    let d = diff(&current, &compiled.document);

    if args.format == "json" {
        let out = serde_json::json!({ "equal": same, "diff": d });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if same {
        println!("no changes");
    } else {
        print_change("inbound", &d.inbounds);
        if d.inbounds_reordered {
            println!("~ inbounds reordered");
        }
        print_change("outbound", &d.outbounds);
        if d.outbounds_reordered {
            println!("~ outbounds reordered");
        }
        print_change("rule", &d.rules);
        for s in &d.sections {
            println!("~ section {s}");
        }
    }
    Ok(if same { EXIT_OK } else { EXIT_CHANGED })
}

fn print_change(what: &str, change: &xr_config::diff::Change) {
    for k in &change.added {
        println!("+ {what} {k}");
    }
    for k in &change.removed {
        println!("- {what} {k}");
    }
    for k in &change.changed {
        println!("~ {what} {k}");
    }
}

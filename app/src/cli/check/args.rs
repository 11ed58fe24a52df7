use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Records file (JSON array of inbound records)
    #[arg(short = 'i', long = "inbounds", env = "XR_INBOUNDS")]
    pub inbounds: PathBuf,
    /// Output format: text | json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

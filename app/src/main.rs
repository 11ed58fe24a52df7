//! xr entrypoint
//! - logging init (XR_LOG_LEVEL / XR_LOG_FORMAT)
//! - subcommand dispatch; subcommands return their exit code

use app::cli::{self, Commands};
use app::logging;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::init_logging()?;

    let code = match args.command {
        Commands::Compile(a) => cli::compile::run(a)?,
        Commands::Check(a) => cli::check::run(a)?,
        Commands::Diff(a) => cli::diff::run(a)?,
        Commands::Watch(a) => cli::watch::run(a).await?,
    };
    logging::flush_logs();
    std::process::exit(code);
}

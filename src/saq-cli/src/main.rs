//! Non-interactive query runner.
//!
//! ```bash
//! saq "person[.salary == 100].count()"
//! saq --profile "person.lowest(.salary).name"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use common_config::{default_providers_path, SaqConfig};
use saq::Shell;

/// Run one query against the configured providers.
#[derive(Parser, Debug)]
#[command(name = "saq")]
#[command(about = "Query semantic objects across providers")]
#[command(version)]
struct Args {
    /// The query to run.
    query: String,

    /// Providers file (defaults to ~/.saq/providers.txt, created on first
    /// run).
    #[arg(long)]
    providers_file: Option<PathBuf>,

    /// Print the per-operator timing breakdown and fast-path notes.
    #[arg(long)]
    profile: bool,

    /// How long to wait for the first fetch from every provider.
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = SaqConfig::default();
    config.query.profile = args.profile;
    let providers_path = args.providers_file.unwrap_or_else(default_providers_path);

    let shell = match Shell::connect(&config, &providers_path).await {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if !shell
        .wait_for_initial_data(Duration::from_secs(args.wait_secs))
        .await
    {
        eprintln!("warning: not all providers answered within {}s", args.wait_secs);
    }

    let code = match shell.query(&args.query) {
        Ok(outcome) => {
            print!("{}", saq::query::render(&outcome.value));
            println!();
            if let Some(profile) = outcome.profile {
                eprintln!("{profile}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    };

    shell.shutdown().await;
    code
}

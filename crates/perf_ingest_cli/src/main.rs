//! perf-ingest CLI: upload Criterion results from CI, configured by env or positional args.

use clap::{Args, Parser, Subcommand};
use perf_ingest::{run, ConfigError, DeliveryPolicy, RunConfig, RunOptions, UploadConfig};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    execute(cli, &mut std::io::stdout().lock())
}

/// Resolve configuration and run. Only the `--dry-run` payload is written to `out`.
fn execute(cli: Cli, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    let (config, common) = match cli.command {
        Command::Env(args) => (RunConfig::from_env(), args.common),
        Command::Args(args) => (RunConfig::from_args(&args.values), args.common),
    };
    let config = match config.and_then(|c| apply_overrides(c, &common)) {
        Ok(c) => c,
        Err(e) if common.soft_fail => {
            warn!(error = %e, "configuration incomplete, skipping upload");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    run_upload(config, &common, out)
}

#[derive(Parser)]
#[command(name = "perf-ingest")]
#[command(author = "gorusys <goru.connector@outlook.com>")]
#[command(about = "Upload Criterion benchmark estimates to the perf ingestion endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read GITHUB_SHA, GITHUB_REF, API_KEY and OS_SPEC from the environment.
    Env(EnvArgs),
    /// Take <commit_hash> <git_branch> <token> as positional arguments.
    Args(PositionalArgs),
}

#[derive(Parser)]
struct EnvArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser)]
struct PositionalArgs {
    /// <commit_hash> <git_branch> <token>
    #[arg(value_name = "VALUES", num_args = 0..)]
    values: Vec<String>,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    #[arg(long)]
    criterion_dir: Option<PathBuf>,
    /// Override the ingestion URL.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,
    /// Fail on transport errors and non-2xx responses instead of only logging them.
    #[arg(long)]
    strict: bool,
    /// Print the payload instead of sending it.
    #[arg(long)]
    dry_run: bool,
    /// Exit 0 without uploading when configuration is incomplete.
    #[arg(long)]
    soft_fail: bool,
}

fn apply_overrides(mut config: RunConfig, common: &CommonArgs) -> Result<RunConfig, ConfigError> {
    if let Some(endpoint) = &common.endpoint {
        config = config.with_endpoint(endpoint)?;
    }
    if let Some(dir) = &common.criterion_dir {
        config = config.with_criterion_dir(dir);
    }
    Ok(config)
}

fn run_upload(
    config: RunConfig,
    common: &CommonArgs,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = RunOptions {
        upload: UploadConfig {
            timeout: Duration::from_secs(common.timeout_secs),
            policy: if common.strict {
                DeliveryPolicy::Strict
            } else {
                DeliveryPolicy::BestEffort
            },
        },
        dry_run: common.dry_run,
    };
    info!(?config, dry_run = options.dry_run, "starting");
    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(async { run(&config, &options).await })?;
    if options.dry_run {
        writeln!(out, "{}", serde_json::to_string_pretty(&summary.descriptor)?)?;
        return Ok(());
    }
    info!(
        benches = summary.bench_count(),
        status = ?summary.status,
        accepted = summary.accepted,
        "upload complete"
    );
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use sfx_batch::{batch, cli::CliArgs, client::ElevenLabsSfxClient, config::RunConfig};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_level = if args.debug { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder().with_env_filter(env).init();
    if args.debug {
        debug!("debug logging enabled");
    } else if args.verbose {
        info!("verbose logging enabled");
    }

    // ─── 2) load .env so the key lookup below can see it ─────────────
    match dotenvy::dotenv() {
        Ok(path) => debug!(".env file loaded from {}", path.display()),
        Err(_) => debug!("no .env file found"),
    }

    info!(
        "sfx-batch started; processing CSV: {}",
        args.csv_file.display()
    );

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    // ─── 3) snapshot config + resolve credentials ────────────────────
    let cfg = RunConfig::from_args(args)?;

    // ─── 4) construct the generation client ──────────────────────────
    let client = ElevenLabsSfxClient::new(cfg.api_key.clone(), cfg.max_retries)
        .context("initializing the ElevenLabs sound-generation client")?;

    // ─── 5) drive the batch ──────────────────────────────────────────
    batch::run(&cfg, &client)?;
    info!("sfx-batch processing finished");
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use gpuwatch_cli::config::{self, WatchConfig};
use gpuwatch_cli::report::{self, SENTINEL_EXIT_CODE};
use gpuwatch_cli::watch::{self, WatchOptions};
use gpuwatch_hardware::NvmlProvider;

/// Run a command while sampling GPU telemetry at a fixed interval
#[derive(Parser)]
#[command(name = "gpuwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose mode (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// GPU index to sample
    #[arg(short, long)]
    device: Option<u32>,

    /// Sampling interval, in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Delay (in seconds) before the sampling starts
    #[arg(long)]
    delay: Option<u64>,

    /// Write the run outcome as JSON to this path
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command to execute, plus its arguments
    #[arg(required = true, trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; logs go to stderr so the child's stdout passes
    // through untouched.
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            SENTINEL_EXIT_CODE
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let file_config = match &cli.config {
        Some(path) => config::load(path)?,
        None => WatchConfig::default(),
    };

    let opts = WatchOptions {
        device_index: cli.device.unwrap_or(file_config.device),
        interval: Duration::from_millis(cli.interval_ms.unwrap_or(file_config.interval_ms)),
        delay: Duration::from_secs(cli.delay.unwrap_or(file_config.delay_secs)),
    };

    let command = cli
        .command
        .first()
        .cloned()
        .context("no command to execute")?;
    let args = cli.command[1..].to_vec();
    let command_line = cli.command.join(" ");

    let provider = NvmlProvider::new().context("GPU telemetry unavailable")?;
    let device_label = provider
        .device_name(opts.device_index)
        .map(|name| format!("GPU {} ({})", opts.device_index, name))
        .unwrap_or_else(|_| format!("GPU {}", opts.device_index));

    let outcome = watch::run(Arc::new(provider), &command, &args, &opts).await?;

    eprintln!("{}", report::render(&command_line, &device_label, &outcome));

    if let Some(path) = &cli.export {
        report::export_json(path, &command_line, &outcome)?;
    }

    Ok(report::exit_code(&outcome.process))
}

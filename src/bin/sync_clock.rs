use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use serialport::SerialPort;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use triton_lib::{CancelToken, LinkConfig, Session, Timestamp};
use triton_rs::cli::parse_timestamp;
use triton_rs::logging::setup_logging;

/// Set the Triton-Lite real-time clock from this computer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long)]
    port: String,
    #[arg(short, long, default_value_t = triton_lib::constants::DEFAULT_BAUD_RATE)]
    baud: u32,
    /// Clock value to send instead of the local time (YYYY-MM-DD HH:MM:SS).
    #[arg(long, value_parser = parse_timestamp)]
    time: Option<Timestamp>,
    /// Seconds to wait for the confirmation line
    #[arg(long, default_value_t = 10)]
    reply_timeout_secs: u64,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    let config = LinkConfig::new(&cli.port)
        .with_baud_rate(cli.baud)
        .with_ack_timeout(Duration::from_secs(cli.reply_timeout_secs));
    let timestamp = cli.time.unwrap_or_else(Timestamp::now);

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let mut sync = tokio::task::spawn_blocking(move || {
        let mut session: Session<Box<dyn SerialPort>> = Session::new(config);
        session.open_serial()?;
        let reply = session.sync_clock(&timestamp, &worker_cancel);
        session.close();
        reply
    });

    let reply = tokio::select! {
        res = &mut sync => res.context("Clock sync task failed")?,
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, cancelling...");
            cancel.cancel();
            sync.await.context("Clock sync task failed")?
        }
    }
    .context("Clock sync failed")?;

    info!(%timestamp, %reply, "Device clock set");
    Ok(())
}

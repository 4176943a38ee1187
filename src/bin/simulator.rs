use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

use triton_lib::responder::Responder;
use triton_lib::{CancelToken, DecodeOptions, Delimiting, LinkConfig};
use triton_rs::cli::VariantArg;
use triton_rs::logging::setup_logging;

/// Pretend to be a Triton-Lite: check every frame that arrives on a serial
/// port and answer with the checksum verdict.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial device to listen on (one end of a virtual pair works too)
    #[arg(short, long)]
    port: String,
    #[arg(short, long, default_value_t = triton_lib::constants::DEFAULT_BAUD_RATE)]
    baud: u32,
    /// Reject frames of the other variant
    #[arg(long, value_enum)]
    expect: Option<VariantArg>,
    /// Require '$' ... ';' around every frame
    #[arg(long, conflicts_with = "bare")]
    delimited: bool,
    /// Reject frames wrapped in '$' ... ';'
    #[arg(long)]
    bare: bool,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

impl Cli {
    fn decode_options(&self) -> DecodeOptions {
        let delimiting = match (self.delimited, self.bare) {
            (true, _) => Delimiting::Delimited,
            (_, true) => Delimiting::Bare,
            _ => Delimiting::Auto,
        };
        let options = DecodeOptions::new().delimiting(delimiting);
        match self.expect {
            Some(variant) => options.expect(variant.into()),
            None => options,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    let config = LinkConfig::new(&cli.port).with_baud_rate(cli.baud);
    let mut port = config
        .serial_builder()
        .open()
        .with_context(|| format!("Failed to open {}", cli.port))?;
    info!(port = %cli.port, baud = cli.baud, "Listening for frames. Press Ctrl+C to stop.");

    let mut responder = Responder::new(cli.decode_options());
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let mut serving = tokio::task::spawn_blocking(move || responder.serve(&mut port, &worker_cancel));

    let stats = tokio::select! {
        res = &mut serving => res.context("Responder task failed")??,
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down...");
            cancel.cancel();
            serving.await.context("Responder task failed")??
        }
    };

    info!(accepted = stats.accepted, rejected = stats.rejected, "Simulator stopped");
    Ok(())
}

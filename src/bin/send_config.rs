use anyhow::{Context, Result, bail};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use serialport::SerialPort;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info};

use triton_lib::form::{FormAction, FormField, ValidatedFormState, reduce};
use triton_lib::{CancelToken, LinkError, ParameterSet, Session, Timestamp, Variant};
use triton_rs::cli::{LinkArgs, ParamArgs, parse_timestamp};
use triton_rs::logging::setup_logging;

/// Send one configuration frame to a Triton-Lite and wait for its acknowledgment.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,
    #[command(flatten)]
    params: ParamArgs,
    /// Prompt for each parameter instead of taking them from flags.
    #[arg(short, long)]
    interactive: bool,
    /// Clock value to send instead of the local time (YYYY-MM-DD HH:MM:SS).
    #[arg(long, value_parser = parse_timestamp)]
    time: Option<Timestamp>,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    let config = cli.link.to_config();
    let variant = config.variant;
    let timestamp = cli.time.unwrap_or_else(Timestamp::now);
    let params = if cli.interactive {
        prompt_parameters(timestamp, variant)?
    } else {
        cli.params.to_parameters(timestamp, variant)
    };
    info!(%timestamp, %variant, "Parameters ready");

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let mut exchange = tokio::task::spawn_blocking(move || {
        let mut session: Session<Box<dyn SerialPort>> = Session::new(config);
        session.open_serial()?;
        session.send(&params, variant)?;
        session.await_ack(&worker_cancel)
    });

    let result: Result<_, LinkError> = tokio::select! {
        res = &mut exchange => res.context("Exchange task failed")?,
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, cancelling...");
            cancel.cancel();
            exchange.await.context("Exchange task failed")?
        }
    };

    match result {
        Ok(ack) => {
            info!(frame = %ack.frame, "Checksum valid. Connection closed.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Exchange failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Ask for each field on stdin until it holds an integer.
fn prompt_parameters(timestamp: Timestamp, variant: Variant) -> Result<ParameterSet> {
    let stdin = io::stdin();
    let mut state = ValidatedFormState::default();

    let fields = FormField::ALL
        .into_iter()
        .filter(|f| variant.has_dive_settings() || !matches!(f, FormField::DiveCount | FormField::PressThreshold));

    for field in fields {
        loop {
            print!("Enter {} (0-{}): ", field.label(), field.max());
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                bail!("Input closed before all parameters were entered");
            }
            let text = line.trim();

            let next = reduce(
                &state,
                FormAction::Edit {
                    field,
                    text: text.to_string(),
                },
            );
            let entry = next.field(field);
            if entry.invalid || text.is_empty() {
                println!("Error: Invalid input. Please enter an integer.");
                continue;
            }
            if entry.text != text {
                println!("Value out of range, using {}.", entry.value);
            }
            state = next;
            break;
        }
    }

    Ok(state.to_parameters(timestamp, variant)?)
}

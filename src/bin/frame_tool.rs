use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{debug, info};

use triton_lib::{DecodeOptions, Delimiting, Timestamp, decode_with, encode_with};
use triton_rs::cli::{ParamArgs, VariantArg, parse_timestamp};
use triton_rs::logging::setup_logging;

/// Build or inspect configuration frames without a device attached.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the hex frame for a parameter set
    Encode {
        #[command(flatten)]
        params: ParamArgs,
        #[arg(long, value_enum, default_value_t = VariantArg::A)]
        variant: VariantArg,
        /// Clock value (YYYY-MM-DD HH:MM:SS); defaults to now
        #[arg(long, value_parser = parse_timestamp)]
        time: Option<Timestamp>,
        /// Wrap the output in '$' ... ';'
        #[arg(long)]
        delimited: bool,
    },
    /// Validate a hex frame and show what it carries
    Decode {
        input: String,
        #[arg(long, value_enum)]
        expect: Option<VariantArg>,
        /// Require '$' ... ';'
        #[arg(long, conflicts_with = "bare")]
        delimited: bool,
        /// Reject '$' ... ';'
        #[arg(long)]
        bare: bool,
        /// Print the decoded frame as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(None, &cli.verbose)?;

    match cli.command {
        Command::Encode {
            params,
            variant,
            time,
            delimited,
        } => {
            let variant = variant.into();
            let timestamp = time.unwrap_or_else(Timestamp::now);
            let params = params.to_parameters(timestamp, variant);
            let delimiting = if delimited { Delimiting::Delimited } else { Delimiting::Bare };
            debug!(%variant, "Encoding\n{}", params);
            let text = encode_with(&params, variant, delimiting).context("Failed to encode frame")?;
            println!("{text}");
        }
        Command::Decode {
            input,
            expect,
            delimited,
            bare,
            json,
        } => {
            let delimiting = match (delimited, bare) {
                (true, _) => Delimiting::Delimited,
                (_, true) => Delimiting::Bare,
                _ => Delimiting::Auto,
            };
            let mut options = DecodeOptions::new().delimiting(delimiting);
            if let Some(variant) = expect {
                options = options.expect(variant.into());
            }
            let frame = decode_with(&input, &options).with_context(|| format!("Invalid frame: {input}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&frame)?);
            } else {
                info!("{} (checksum {:#04x})", frame.variant, frame.checksum);
                println!("{}", frame.params);
            }
        }
    }
    Ok(())
}

//! Switch or disable the drone's processing mode.

use clap::{Parser, Subcommand};
use skywatch_cli::args::BackendArgs;
use skywatch_core::ProcessingMode;
use skywatch_sdk::{ModeController, SkywatchClient};

/// Send processing-mode commands to the Skywatch backend
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(flatten)]
    backend: BackendArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn a mode on: detection or facerecognition
    Switch { mode: ProcessingMode },
    /// Turn every mode off
    Off,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    skywatch_cli::init_tracing("skywatch_sdk=info", false)?;

    let config = args.backend.into_config();
    let client = SkywatchClient::from_config(&config)?;
    let controller = ModeController::new(client, config.mode_policy);

    let state = match args.command {
        Command::Switch { mode } => {
            println!("Switching {} to {}...", config.drone_id, mode.label());
            controller.switch_mode(mode).await?
        }
        Command::Off => {
            println!("Turning off all modes for {}...", config.drone_id);
            controller.turn_off_all_modes().await?
        }
    };

    println!("Active mode: {}", state.active().label());
    Ok(())
}

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use novacan_client::{
    common::{open_socketcan, NodeId},
    Controller, DebouncedSwitch, HeadlightConfig, IdleSwitch, SysfsPin, TokioDelay,
};

#[derive(Parser, Debug)]
#[command(about = "Drive a SuperNova M99 CANopen headlight over socketcan")]
struct Args {
    /// The socketcan device, e.g. can0
    socket: String,
    /// TOML configuration file. Built in defaults are used without one.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Override the configured node ID
    #[arg(long, short, value_parser = maybe_hex::<u8>)]
    node_id: Option<u8>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Send the default state, then run the switch control loop
    Run {
        /// sysfs GPIO value file for the switch. Without it the bus is only monitored.
        #[arg(long, short)]
        switch: Option<PathBuf>,
    },
    /// Send every identification, NMT and lighting command in turn
    Probe,
    /// Send one command by name, e.g. hbon or nmtstartall
    Send { name: String },
    /// Trace received frames and bus state changes
    Dump,
}

fn load_config(args: &Args) -> Result<HeadlightConfig, String> {
    let mut config = match &args.config {
        Some(path) => HeadlightConfig::load_from_file(path).map_err(|e| e.to_string())?,
        None => HeadlightConfig::default(),
    };
    if let Some(id) = args.node_id {
        config.node_id = NodeId::new(id).map_err(|e| e.to_string())?;
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (tx, rx, bus) = match open_socketcan(&args.socket, &config.transport) {
        Ok(channel) => channel,
        Err(e) => {
            log::error!("Failed to open {}: {e}", args.socket);
            return ExitCode::FAILURE;
        }
    };
    let mut controller = Controller::new(&config, tx, rx, bus, TokioDelay);

    match args.command {
        Command::Run { switch: Some(path) } => {
            log::info!("Reading switch from {}", path.display());
            let mut switch = DebouncedSwitch::new(SysfsPin::new(path), config.debounce());
            controller.run(&mut switch).await;
        }
        Command::Run { switch: None } => {
            log::warn!("No switch configured, monitoring only");
            controller.run(&mut IdleSwitch).await;
        }
        Command::Probe => {
            let sequence = controller.catalog().probe_sequence();
            let sent = controller
                .probe(&sequence, config.probe_interval())
                .await;
            log::info!("Probe complete, {sent} of {} sent", sequence.len());
            if sent < sequence.len() {
                return ExitCode::FAILURE;
            }
        }
        Command::Send { name } => {
            let Some(telegram) = controller.catalog().by_name(&name) else {
                log::error!("Unknown command {name}");
                return ExitCode::FAILURE;
            };
            if let Err(e) = controller.send(&telegram).await {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
            // Give the device a chance to answer
            controller.listen_once().await;
        }
        Command::Dump => controller.listen().await,
    }
    ExitCode::SUCCESS
}

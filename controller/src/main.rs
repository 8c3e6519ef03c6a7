mod config;
mod hardware;
mod server;
mod servo;
mod shutdown;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use config::{ControllerConfig, DEFAULT_CONFIG_PATH};
use hardware::{DetachedBus, check_connection, open_bus};
use server::Server;
use servo::ServoManager;
use shutdown::Shutdown;

/// Drives four servos from `angle1,angle2,angle3,angle4` UDP datagrams
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the current servo positions and exit
    #[arg(long)]
    status: bool,
    /// Print the status as JSON
    #[arg(long, requires = "status")]
    json: bool,
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Address to listen on, overrides the config file
    #[arg(long)]
    bind: Option<String>,
    /// UDP port to listen on, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,
}

fn show_status(config: &ControllerConfig, json: bool) -> Result<()> {
    // only proves the hardware is reachable; no pin is claimed or driven
    check_connection(config.backend).context("Failed to initialize servo controller")?;
    let manager = ServoManager::new(DetachedBus, config.pins, config.pulse()?, config.initial_angle);

    let report = status::query(&manager);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Current servo positions:");
        for line in status::status_lines(&report) {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn run_server(config: &ControllerConfig) -> Result<()> {
    println!("{}", "=".repeat(60));
    println!("RASPBERRY PI SERVO CONTROLLER");
    println!("{}", "=".repeat(60));

    let bus = open_bus(&config.pins, config.backend).context("Failed to initialize servo controller")?;
    let mut manager = ServoManager::new(bus, config.pins, config.pulse()?, config.initial_angle);

    let socket = server::bind(&config.bind_address, config.port)
        .with_context(|| format!("Failed to bind {}:{}", config.bind_address, config.port))?;
    let shutdown = Shutdown::on_signals().context("Failed to install signal handlers")?;

    if config.home_on_start {
        let outcomes = manager.home();
        for line in status::outcome_lines(&manager.pins(), &outcomes) {
            println!("{}", line);
        }
    }

    println!("✓ UDP Server listening on {}:{}", config.bind_address, config.port);
    println!();
    println!("Command format: 'angle1,angle2,angle3,angle4'");
    println!("Example: '90,45, ,180' - moves servo 1 to 90°, servo 2 to 45°, keeps servo 3 current, servo 4 to 180°");
    println!("Use spaces or empty values to keep current servo position");
    println!("Valid angles: 0-180 degrees");
    println!();
    println!("Press Ctrl+C to stop");
    println!("{}", "-".repeat(60));

    let mut server = Server::new(socket, manager);
    server.run(&shutdown);

    println!("\nServer stopped by user");
    server.into_manager().release();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = ControllerConfig::load_or_default(&args.config)
        .with_context(|| format!("Error loading {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate().context("Invalid configuration")?;

    if args.save_config {
        config.save(&args.config)?;
        info!("Saved {}", args.config.display());
        return Ok(());
    }

    if args.status {
        show_status(&config, args.json)
    } else {
        run_server(&config)
    }
}

mod config;
mod input;
mod sender;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use config::RemoteConfig;
use sender::Sender;

const DEFAULT_CONFIG_PATH: &str = "remote.json";

/// Sends servo commands to the Raspberry Pi servo controller
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Prompt for commands until 'quit' (the default without COMMAND)
    #[arg(short, long)]
    interactive: bool,
    /// Controller address, overrides the config file
    #[arg(long)]
    host: Option<String>,
    /// Controller UDP port, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Write the effective target to the config file and exit
    #[arg(long)]
    save_config: bool,
    /// Command such as '90,45, ,180'; a blank field keeps that servo
    #[arg(allow_hyphen_values = true)]
    command: Vec<String>,
}

fn load_config(path: &Path) -> Result<RemoteConfig> {
    match RemoteConfig::load(path) {
        Ok(config) => {
            info!("Loaded {}", path.display());
            Ok(config)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(RemoteConfig::default()),
        Err(e) => Err(e).with_context(|| format!("Error loading {}", path.display())),
    }
}

fn interactive_mode(sender: &Sender) -> Result<()> {
    println!("Servo Controller Client - Interactive Mode");
    println!("Type 'quit' or 'exit' to stop");
    println!("Target: {}", sender.target());
    println!("Command format: 'angle1,angle2,angle3,angle4'");
    println!("Example: '90,45, ,180' - moves servo 1 to 90°, servo 2 to 45°, keeps servo 3 current, servo 4 to 180°");
    println!("Use spaces or empty values to keep current servo position");
    println!("Valid angles: 0-180 degrees");
    println!("{}", "-".repeat(40));

    let stdin = io::stdin();
    input::interactive(stdin.lock(), io::stdout(), |command| sender.send(command))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(host) = args.host {
        config.target_host = host;
    }
    if let Some(port) = args.port {
        config.target_port = port;
    }

    if args.save_config {
        config
            .save(&args.config)
            .with_context(|| format!("Error saving {}", args.config.display()))?;
        println!("Saved {}", args.config.display());
        return Ok(());
    }

    let sender = Sender::new(&config.target_host, config.target_port)
        .context("Failed to open UDP socket")?;

    if args.interactive || args.command.is_empty() {
        return interactive_mode(&sender);
    }

    let line = input::join_words(&args.command);
    let command = match input::prepare(&line) {
        Ok(command) => command,
        Err(e) => bail!("Invalid command '{}': {}", line, e),
    };

    sender
        .send(&command)
        .with_context(|| format!("Error sending command to {}", sender.target()))?;
    println!("Sent command: '{}' to {}", command, sender.target());
    Ok(())
}

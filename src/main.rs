//! sbc-rates CLI entry point.

use sbc_rates::settings::SettingsStore;
use sbc_rates::{BluetoothAddress, DeviceRateStore};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sbc-rates")]
#[command(about = "Inspect and edit per-device SBC bitrates")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the bitrate stored for a device (0 when unset)
    Get { address: BluetoothAddress },
    /// Store a bitrate for a device
    Set {
        address: BluetoothAddress,
        #[arg(allow_negative_numbers = true)]
        rate: i32,
    },
    /// Print every stored device and bitrate
    List,
    /// Clear all stored bitrates
    Reset,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = if let Some(config_path) = cli.config {
        sbc_rates::config::Config::load_from_path(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        sbc_rates::config::Config::load()
            .with_context(|| "failed to load configuration from environment")?
    };

    tracing::debug!(data_dir = %config.data_dir.display(), key = %config.settings_key, "configuration loaded");

    let settings = Arc::new(
        SettingsStore::new(&config.settings_path())
            .with_context(|| "failed to open settings store")?,
    );
    let store = DeviceRateStore::new(settings, config.settings_key.clone());
    store.init();

    match cli.command {
        Command::Get { address } => {
            println!("{}", store.get_rate(&address)?);
        }
        Command::Set { address, rate } => {
            if !store.set_rate(&address, rate)? {
                tracing::info!(device = %address, rate, "bitrate already set, nothing written");
            }
        }
        Command::List => {
            for (address, rate) in store.snapshot()?.iter() {
                println!("{address}\t{rate}");
            }
        }
        Command::Reset => {
            store.factory_reset()?;
        }
    }

    store.close();
    Ok(())
}

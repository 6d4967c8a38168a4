use crate::commands::{configure, discover, dump, start, stats};
use crate::config::Config;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mbbs")]
#[command(about = "Bridge a Meshtastic radio over Bluetooth LE to a Telegram chat")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Commands {
    /// Run the command. The config is only loaded and validated by the
    /// commands that use it, so a broken file can still be repaired.
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::config_file_path);

        match self {
            Commands::Start => {
                start::handle_start_command(Config::load_custom(&path)?).await?;
            }
            Commands::Discover(args) => {
                discover::handle_discover_command(Config::load_custom(&path)?, &args).await?;
            }
            Commands::Dump(args) => {
                dump::handle_dump_command(&args)?;
            }
            Commands::Stats => {
                stats::handle_stats_command(Config::load_custom(&path)?)?;
            }
            Commands::Config(args) => {
                configure::handle_config_command(&path, args.command)?;
            }
        }
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the bridge and forward mesh traffic until Ctrl-C
    Start,

    /// Scan for Bluetooth LE radios
    Discover(DiscoverArgs),

    /// Dump and pretty-print a CBOR packet archive
    Dump(DumpArgs),

    /// Show traffic counters and known nodes
    Stats,

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    #[arg(
        short,
        long,
        value_name = "SECS",
        help = "Scan duration (defaults to device.scan_timeout_secs)"
    )]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    #[arg(help = "Path to the CBOR file")]
    pub file: PathBuf,

    #[arg(long, help = "Print packets as pretty JSON")]
    pub json: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommands>,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset configuration to defaults
    Reset,

    /// Set one value, e.g. `mbbs config set telegram.chat_id -100123`
    Set {
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

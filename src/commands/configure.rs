use crate::cli::ConfigCommands;
use crate::config::{self, Config, ENV_BLE_DEVICE, ENV_BOT_TOKEN, ENV_CHAT_ID};
use crate::utils::interactive::prompt_yes_no;
use crate::utils::output::OutputStyle;
use crate::utils::print_success;
use anyhow::{Context, Result};
use std::path::Path;

pub fn handle_config_command(path: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) => handle_show_command(&Config::load_custom(path)?, path),
        Some(ConfigCommands::Path) => {
            println!("{}", path.display());
            Ok(())
        }
        Some(ConfigCommands::Reset) => handle_reset_command(path),
        Some(ConfigCommands::Set { key, value }) => handle_set_command(path, &key, &value),
        None => handle_config_help(path),
    }
}

fn presence(value: bool) -> String {
    if value { "✓ set".to_string() } else { "✗ not set".to_string() }
}

fn handle_show_command(config: &Config, path: &Path) -> Result<()> {
    OutputStyle::print_header("⚙️  mbbs Configuration");
    println!("File: {}", OutputStyle::muted(&path.display().to_string()));
    println!("(values below include environment overrides)");

    println!("Telegram:");
    OutputStyle::print_field_colored(
        "Bot token",
        &presence(config.telegram.bot_token.is_some()),
        OutputStyle::info,
    );
    let chat = config
        .telegram
        .chat_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| presence(false));
    OutputStyle::print_field_colored("Chat id", &chat, OutputStyle::info);
    OutputStyle::print_field_colored("API URL", &config.telegram.api_url, OutputStyle::muted);

    println!("Device:");
    let device = config
        .device
        .ble_name
        .clone()
        .unwrap_or_else(|| presence(false));
    OutputStyle::print_field_colored("BLE name", &device, OutputStyle::node);
    OutputStyle::print_field_colored(
        "Scan timeout",
        &format!("{}s", config.device.scan_timeout_secs),
        OutputStyle::info,
    );

    println!("Storage:");
    OutputStyle::print_field_colored(
        "State file",
        &config.state_file_path().display().to_string(),
        OutputStyle::muted,
    );
    OutputStyle::print_field_colored(
        "Archive packets",
        &config.storage.archive.to_string(),
        OutputStyle::info,
    );

    println!("Service:");
    OutputStyle::print_field_colored(
        "Idle check",
        &format!("{}s", config.service.idle_check_secs),
        OutputStyle::info,
    );
    OutputStyle::print_field_colored(
        "Idle limit",
        &format!("{}s", config.service.idle_limit_secs),
        OutputStyle::info,
    );
    OutputStyle::print_field_colored(
        "Retry delay",
        &format!("{}s", config.service.retry_delay_secs),
        OutputStyle::info,
    );

    Ok(())
}

fn handle_config_help(path: &Path) -> Result<()> {
    OutputStyle::print_header("⚙️  Configuration Management");
    println!("Available configuration commands:");
    println!("  mbbs config show               - Show current configuration");
    println!("  mbbs config path               - Print the configuration file location");
    println!("  mbbs config reset              - Reset configuration to defaults");
    println!("  mbbs config set <KEY> <VALUE>  - Change one value, e.g. device.ble_name");
    println!();
    println!("Environment overrides: {}, {}, {}", ENV_BOT_TOKEN, ENV_CHAT_ID, ENV_BLE_DEVICE);
    println!("Configuration file location: {}", path.display());
    Ok(())
}

fn handle_reset_command(path: &Path) -> Result<()> {
    let question = "Are you sure you want to reset configuration to defaults? \
                    This will overwrite your current settings.";
    if prompt_yes_no(question)? {
        Config::default().save_to(path)?;
        print_success("Configuration reset to defaults!");
    } else {
        println!("Reset cancelled.");
    }
    Ok(())
}

fn handle_set_command(path: &Path, key: &str, value: &str) -> Result<()> {
    if !path.exists() {
        Config::default().save_to(path)?;
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let edited = config::set_value(&content, key, value)?;
    std::fs::write(path, edited).with_context(|| format!("Failed to write {}", path.display()))?;

    print_success(&format!("{} updated", key));
    Ok(())
}

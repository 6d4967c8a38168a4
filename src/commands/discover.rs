use crate::cli::DiscoverArgs;
use crate::config::{Config, ENV_BLE_DEVICE};
use crate::utils::error::AppError;
use crate::utils::output::OutputStyle;
use crate::utils::print_warning;
use anyhow::{Result, bail};
use std::time::Duration;
use tracing::info;

pub async fn handle_discover_command(config: Config, args: &DiscoverArgs) -> Result<()> {
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.scan_timeout());
    if timeout.is_zero() {
        bail!("Scan timeout must be greater than zero");
    }

    info!("Scanning BLE devices for {}s...", timeout.as_secs());
    let devices = meshtastic::utils::stream::available_ble_devices(timeout)
        .await
        .map_err(|e| AppError::Radio(format!("BLE scan failed: {}", e)))?;

    if devices.is_empty() {
        print_warning("No BLE devices found. Is Bluetooth on and the radio in pairing range?");
        return Ok(());
    }

    OutputStyle::print_header("📡 Bluetooth LE devices");
    for device in &devices {
        info!(
            "Found BLE device: name={:?} mac={}",
            device.name, device.mac_address
        );
        let name = device.name.as_deref().unwrap_or("<unnamed>");
        println!(
            "  {}  {}",
            OutputStyle::node(&format!("{:<24}", name)),
            OutputStyle::muted(&device.mac_address.to_string())
        );
    }
    println!();
    println!(
        "Set device.ble_name (or {}) to the radio's name to bridge it.",
        ENV_BLE_DEVICE
    );

    Ok(())
}

//! One radio session: connect, forward what we hear, give up when the link goes quiet

use crate::config::{Config, ServiceConfig};
use crate::core::archive::PacketArchive;
use crate::core::packet::{MeshPayload, ReceivedPacket};
use crate::core::storage::Storage;
use crate::notify::Notifier;
use crate::utils::error::{AppError, AppResult};
use crate::utils::format::format_node_id;
use meshtastic::api::StreamApi;
use meshtastic::protobufs::{FromRadio, MeshPacket};
use meshtastic::utils::stream::BleId;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub fn format_text_message(from: &str, msg: &str, to: &str) -> String {
    format!("💬 {} : {} ({})", from, msg, to)
}

fn radio_error(context: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Radio(format!("{}: {}", context, err))
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub struct Bridge<'a> {
    notifier: &'a dyn Notifier,
    storage: &'a mut Storage,
    state_path: PathBuf,
    archive: Option<PacketArchive>,
    service: ServiceConfig,
    cancel: CancellationToken,
}

impl<'a> Bridge<'a> {
    pub fn new(
        config: &Config,
        notifier: &'a dyn Notifier,
        storage: &'a mut Storage,
        cancel: CancellationToken,
    ) -> Self {
        let archive = config
            .storage
            .archive
            .then(|| PacketArchive::new(&config.storage.data_dir));

        Self {
            notifier,
            storage,
            state_path: config.state_file_path(),
            archive,
            service: config.service.clone(),
            cancel,
        }
    }

    /// Run one session against the named BLE device
    pub async fn run(&mut self, device: &str, scan_timeout: Duration) -> AppResult<()> {
        info!("Opening BLE to meshtastic device {}...", device);
        if let Err(e) = self
            .notifier
            .send_message(&format!("Start get events from {}", device))
            .await
        {
            warn!("Could not announce session start: {}", e);
        }

        let ble_id = BleId::from_name(device);
        let ble_stream = meshtastic::utils::stream::build_ble_stream(&ble_id, scan_timeout)
            .await
            .map_err(|e| radio_error("Failed to open BLE stream", e))?;

        let stream_api = StreamApi::new();
        let (mut packets, stream_api) = stream_api.connect(ble_stream).await;

        let config_id = meshtastic::utils::generate_rand_id();
        let stream_api = stream_api
            .configure(config_id)
            .await
            .map_err(|e| radio_error("Failed to configure radio", e))?;
        info!("Radio configured, listening for packets");

        let result = self.pump(&mut packets).await;

        if let Err(e) = stream_api.disconnect().await {
            warn!("Failed to disconnect cleanly: {}", e);
        }
        result
    }

    /// Drain `packets` until cancelled, idle for too long, or something fails
    pub async fn pump(&mut self, packets: &mut UnboundedReceiver<FromRadio>) -> AppResult<()> {
        let cancel = self.cancel.clone();
        let check_secs = self.service.idle_check_secs;
        let limit_secs = self.service.idle_limit_secs;
        let mut idle_secs = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                received = packets.recv() => {
                    debug!("Got message.");
                    idle_secs = 0;
                    self.process(ReceivedPacket::from(received)).await?;
                }
                _ = tokio::time::sleep(Duration::from_secs(check_secs)) => {
                    idle_secs += check_secs;
                    info!("Nothing happened in {}s, but still alive", idle_secs);
                    if idle_secs >= limit_secs {
                        warn!("Idle for {}s, resetting the radio link", idle_secs);
                        return Err(AppError::Radio(format!(
                            "Idle for more than {}s, resetting",
                            limit_secs
                        )));
                    }
                }
            }
        }
    }

    pub async fn process(&mut self, packet: ReceivedPacket) -> AppResult<()> {
        match packet {
            ReceivedPacket::ConnectionClosed => {
                Err(AppError::Radio("Radio connection closed".to_string()))
            }
            ReceivedPacket::MyInfo(info) => {
                info!("Attached to node {}", format_node_id(info.my_node_num));
                Ok(())
            }
            // from the radio's node database, not the air
            ReceivedPacket::NodeInfo { num, user } => {
                debug!("Known node {} is {}", format_node_id(num), user.long_name);
                self.storage.remember_user(num, user);
                self.persist()
            }
            ReceivedPacket::Mesh { packet, payload } => self.process_mesh(packet, payload).await,
            ReceivedPacket::Other => Ok(()),
        }
    }

    async fn process_mesh(&mut self, packet: MeshPacket, payload: MeshPayload) -> AppResult<()> {
        if let Some(archive) = &self.archive {
            archive.append(&packet)?;
        }
        self.storage
            .insert_stat(packet.from, payload.port().as_str_name(), unix_now());

        match payload {
            MeshPayload::Text(msg) => {
                let from = self.storage.display_name_of(packet.from);
                let to = self.storage.display_name_of(packet.to);
                info!("Text from {} to {}", from, to);
                self.notifier
                    .send_message(&format_text_message(&from, &msg, &to))
                    .await?;
            }
            MeshPayload::NodeInfo(user) => {
                info!(
                    "Node {} announced itself as {}",
                    format_node_id(packet.from),
                    user.long_name
                );
                self.storage.remember_user(packet.from, user);
            }
            MeshPayload::Routing(_) => {
                debug!("Routing packet from {}", format_node_id(packet.from))
            }
            MeshPayload::Other(port) => {
                debug!("{} packet from {}", port.as_str_name(), format_node_id(packet.from))
            }
        }

        self.persist()
    }

    fn persist(&self) -> AppResult<()> {
        self.storage.save(&self.state_path)
    }
}

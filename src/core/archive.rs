//! Append-only daily archive of every decoded packet, as a CBOR value stream

use crate::utils::error::{AppError, AppResult};
use crate::utils::format::format_date;
use chrono::{Local, NaiveDate};
use meshtastic::protobufs::MeshPacket;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn archive_file_name(date: NaiveDate) -> String {
    format!("network.{}.cbor", format_date(date))
}

#[derive(Debug, Clone)]
pub struct PacketArchive {
    dir: PathBuf,
}

impl PacketArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(archive_file_name(date))
    }

    /// Append to today's file (local time)
    pub fn append(&self, packet: &MeshPacket) -> AppResult<PathBuf> {
        self.append_on(Local::now().date_naive(), packet)
    }

    pub fn append_on(&self, date: NaiveDate, packet: &MeshPacket) -> AppResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(date);
        let file = File::options().create(true).append(true).open(&path)?;

        let mut writer = BufWriter::new(file);
        serde_cbor::to_writer(&mut writer, packet)
            .map_err(|e| AppError::Storage(format!("Failed to archive packet: {}", e)))?;
        writer.flush()?;
        Ok(path)
    }
}

/// Read every packet from an archive file
pub fn read_packets(path: &Path) -> AppResult<Vec<MeshPacket>> {
    let file = File::open(path)
        .map_err(|e| AppError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    serde_cbor::Deserializer::from_reader(BufReader::new(file))
        .into_iter::<MeshPacket>()
        .enumerate()
        .map(|(index, packet)| {
            packet.map_err(|e| {
                AppError::Storage(format!(
                    "Corrupt record #{} in {}: {}",
                    index,
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}

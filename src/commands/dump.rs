use crate::cli::DumpArgs;
use crate::core::archive::read_packets;
use crate::utils::pagination::print_or_page;
use anyhow::{Context, Result};
use meshtastic::protobufs::MeshPacket;
use std::fmt::Write;

pub fn handle_dump_command(args: &DumpArgs) -> Result<()> {
    let packets = read_packets(&args.file)?;
    let rendered = render_packets(&packets, args.json)?;
    print_or_page(&rendered)?;
    eprintln!("{} packet(s) in {}", packets.len(), args.file.display());
    Ok(())
}

/// One packet per entry, `Debug` formatted or as pretty JSON
pub fn render_packets(packets: &[MeshPacket], json: bool) -> Result<String> {
    let mut out = String::new();
    for packet in packets {
        if json {
            let text = serde_json::to_string_pretty(packet)
                .context("Failed to encode packet as JSON")?;
            writeln!(out, "{}", text)?;
        } else {
            writeln!(out, "{:?}", packet)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_one_line_per_packet() {
        let packets = vec![
            MeshPacket { from: 1, to: 2, ..Default::default() },
            MeshPacket { from: 3, to: 4, ..Default::default() },
        ];

        let debug = render_packets(&packets, false).unwrap();
        assert_eq!(debug.lines().count(), 2);
        assert!(debug.contains("from: 3"));

        let json = render_packets(&packets, true).unwrap();
        assert!(json.lines().count() > 2);
        assert!(json.contains('{'));
    }

    #[test]
    fn test_render_empty_archive() {
        assert_eq!(render_packets(&[], false).unwrap(), "");
    }
}

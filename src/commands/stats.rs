use crate::config::Config;
use crate::core::storage::{StatEntry, Storage};
use crate::utils::format::{format_node_id, format_unix_local};
use crate::utils::output::OutputStyle;
use anyhow::{Context, Result};
use meshtastic::protobufs::User;

pub fn handle_stats_command(config: Config) -> Result<()> {
    let path = config.state_file_path();
    let storage = Storage::load(&path)
        .with_context(|| format!("Failed to load state from {}", path.display()))?;

    if storage.stats.is_empty() && storage.users.is_empty() {
        println!("{}", OutputStyle::muted("No traffic recorded yet"));
        return Ok(());
    }

    OutputStyle::print_header("📊 Traffic");
    for (key, entry) in &storage.stats {
        println!("{}", stat_line(key, entry));
    }

    println!();
    OutputStyle::print_header("👥 Known nodes");
    let mut nodes: Vec<(&u32, &User)> = storage.users.iter().collect();
    nodes.sort_by_key(|(num, _)| **num);
    for (num, user) in nodes {
        println!("{}", node_line(*num, user));
    }
    println!("{}", OutputStyle::separator());
    println!(
        "{} node(s), {} counter(s)",
        OutputStyle::info(&storage.users.len().to_string()),
        OutputStyle::info(&storage.stats.len().to_string())
    );

    Ok(())
}

pub fn stat_line(key: &str, entry: &StatEntry) -> String {
    format!("{:>10}: {} [{}]", key, entry.count, format_unix_local(entry.last_seen))
}

pub fn node_line(num: u32, user: &User) -> String {
    format!("{}  {:<5} {}", format_node_id(num), user.short_name, user.long_name)
}

//! The `focuscoach roster` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Color, Table};

use focuscoach_providers::load_config_from;
use focuscoach_report::roster::{build_roster, last_seen, RosterStatus};
use focuscoach_store::MemoryStore;

pub async fn execute(config_path: Option<PathBuf>, format: String) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = MemoryStore::open(&config.store_path)?;
    let now = Utc::now();
    let roster = build_roster(&store.profiles().await, now);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&roster)?),
        "table" => {
            if roster.is_empty() {
                println!("No students yet.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec![
                "Name", "Email", "Focus", "Mastery", "Streak", "Last active", "Status",
            ]);
            for entry in &roster {
                let color = match entry.status {
                    RosterStatus::AtRisk => Color::Red,
                    RosterStatus::Inactive => Color::Yellow,
                    RosterStatus::Unknown => Color::Grey,
                    RosterStatus::OnTrack => Color::Green,
                };
                table.add_row(vec![
                    Cell::new(&entry.name),
                    Cell::new(entry.email.as_deref().unwrap_or("-")),
                    Cell::new(&entry.focus),
                    Cell::new(entry.mastery),
                    Cell::new(entry.streak),
                    Cell::new(last_seen(entry.last_active, now)),
                    Cell::new(entry.status).fg(color),
                ]);
            }
            println!("{table}");
            let at_risk = roster
                .iter()
                .filter(|e| e.status == RosterStatus::AtRisk)
                .count();
            println!("{} student(s), {at_risk} at risk.", roster.len());
        }
        other => anyhow::bail!("unknown format: {other} (expected table or json)"),
    }
    Ok(())
}

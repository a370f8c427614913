// System status display — shows DB stats and row counts.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    if !Path::new(db_display_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `callscan init` to set up the database.");
        return Ok(());
    }

    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    let (projects, conversations, keyword_sets) = db.stats().await?;
    println!("Projects: {projects}");
    println!("Conversations: {conversations}");
    if keyword_sets == 0 {
        println!("Keyword sets: none loaded");
        println!("  Run `callscan load-keywords` to load one");
    } else {
        println!("Keyword sets: {keyword_sets}");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

//! Collection statistics.
//!
//! `vp stats` prints how many records the collection holds and how they
//! split across content types. Records without a content type count as
//! `unknown`.

use anyhow::Result;

use voiceprint_core::models::CollectionStats;

use crate::config::Config;
use crate::index::open_index_without_embedder;

/// Run the stats command: read the collection and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let index = open_index_without_embedder(config).await?;
    let stats = index.stats().await?;

    println!("Voiceprint — Index Stats");
    println!("========================");
    println!();
    println!("  Collection:  {}", index.name());
    println!("  Backend:     {}", config.index.backend);
    if config.index.backend == "sqlite" {
        let db_size = std::fs::metadata(&config.index.path)
            .map(|m| m.len())
            .unwrap_or(0);
        println!("  Database:    {}", config.index.path.display());
        println!("  Size:        {}", format_bytes(db_size));
    }
    println!();
    print!("{}", render_counts(&stats));
    println!();
    Ok(())
}

/// Render the total and the per-content-type table.
pub fn render_counts(stats: &CollectionStats) -> String {
    let mut out = format!("  Records:     {}\n", stats.total_count);
    if stats.counts_by_content_type.is_empty() {
        return out;
    }

    out.push('\n');
    out.push_str("  By content type:\n");
    out.push_str(&format!("  {:<16} {:>8} {:>7}\n", "TYPE", "RECORDS", "SHARE"));
    out.push_str(&format!("  {}\n", "-".repeat(33)));

    let mut rows: Vec<(&String, &usize)> = stats.counts_by_content_type.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (content_type, count) in rows {
        let share = (*count * 100) / stats.total_count.max(1);
        out.push_str(&format!("  {:<16} {:>8} {:>6}%\n", content_type, count, share));
    }
    out
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

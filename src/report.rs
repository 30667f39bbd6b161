use colored::Colorize;
use std::path::Path;

use crate::stats::{CountEntry, RunSummary};
use crate::utils::format_number;

pub fn print_summary(summary: &RunSummary, top: usize, accepted_path: &Path, rejected_path: &Path) {
    if summary.interrupted {
        println!(
            "{}",
            format!(
                "Interrupted after {} of {} links",
                format_number(summary.processed),
                format_number(summary.total_links)
            )
            .red()
        );
    }

    println!(
        "{}\n",
        format!("Done in {:.1}s", summary.elapsed_ms as f64 / 1000.0).cyan()
    );
    println!(
        "{}",
        format!("Whitelisted (before dedup): {}", format_number(summary.accepted)).green()
    );
    println!(
        "{}",
        format!("Whitelisted (unique): {}", format_number(summary.unique_accepted)).green()
    );
    println!(
        "{}",
        format!("Rejected: {}", format_number(summary.rejected)).red()
    );
    println!("Match rate: {}%\n", summary.match_rate());

    if !summary.files.is_empty() {
        println!("{}", "Processed files:".cyan());
        for file in &summary.files {
            let line = match &file.error {
                Some(e) => format!("  {:<35}: failed ({})", file.label, e),
                None => format!(
                    "  {:<35}: {} links, {} matched ({}%)",
                    file.label,
                    format_number(file.links),
                    format_number(file.accepted),
                    file.match_rate()
                ),
            };
            println!("{}", line.dimmed());
        }
        println!();
    }

    if summary.no_hostname > 0 {
        println!(
            "{}\n",
            format!("No SNI/host at all: {}", format_number(summary.no_hostname)).yellow()
        );
    }

    if !summary.sources.is_empty() {
        println!("{}", "SNI taken from:".cyan());
        for entry in &summary.sources {
            println!("{}", format!("  {:<15}: {}", entry.key, entry.count).dimmed());
        }
        println!();
    }

    print_top("Top matched (whitelisted):", summary.top_matched(top), |s| s.green().to_string());
    print_top("Top rejected SNI:", summary.top_rejected(top), |s| s.red().to_string());

    println!(
        "{}",
        format!(
            "{} -> {} unique links",
            accepted_path.display(),
            format_number(summary.unique_accepted)
        )
        .green()
    );
    println!(
        "{}",
        format!(
            "{} -> {} links",
            rejected_path.display(),
            format_number(summary.rejected)
        )
        .red()
    );
}

fn print_top(title: &str, entries: &[CountEntry], paint: impl Fn(&str) -> String) {
    if entries.is_empty() {
        return;
    }

    println!("{}", title.cyan());
    for entry in entries {
        println!("{}", paint(&format!("  {:<45} {}", entry.key, entry.count)));
    }
    println!();
}

pub fn print_summary_json(summary: &RunSummary) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

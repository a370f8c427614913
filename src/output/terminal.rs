// Colored terminal output for match reports and keyword sets.
//
// This module handles all terminal-specific formatting: colors, tables,
// summaries. The main.rs display paths delegate here.

use colored::Colorize;

use crate::engine::report::{ContainmentRecord, KeywordSet, MatchReport};
use crate::engine::SpeakerRole;

/// Display a fuzzy match report grouped by category.
pub fn display_match_report(report: &MatchReport, conversation_id: &str) {
    if report.categories.is_empty() {
        println!("No keyword categories to report. Load keywords first.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Keyword Matches for {} ({} total) ===",
            conversation_id,
            report.total_matches()
        )
        .bold()
    );
    println!();

    for category in &report.categories {
        println!("  {}", category.category.bold());

        for result in &category.keywords {
            let agent = &result.count_by_speaker.agent;
            let customer = &result.count_by_speaker.customer;
            let total = result.total_count();

            let count_str = format!("agent {:>2}  customer {:>2}", agent.count, customer.count);
            let colored_counts = if total > 0 {
                count_str.bright_green()
            } else {
                count_str.dimmed()
            };
            println!("    {:<28} {}", result.keyword, colored_counts);

            for evidence in agent.evidence.iter().chain(&customer.evidence) {
                let preview = super::truncate_chars(&evidence.text, 100);
                println!(
                    "      {} \"{}\"",
                    format!("[{}]", evidence.speaker).dimmed(),
                    preview.dimmed()
                );
            }
        }
        println!();
    }

    // Summary
    let matched_keywords = report
        .categories
        .iter()
        .flat_map(|c| &c.keywords)
        .filter(|k| k.total_count() > 0)
        .count();
    let total_keywords: usize = report.categories.iter().map(|c| c.keywords.len()).sum();
    println!(
        "  {} of {} keywords matched at least once",
        matched_keywords, total_keywords
    );
}

/// Display containment-mode records as a flat table.
pub fn display_containment_records(records: &[ContainmentRecord]) {
    if records.is_empty() {
        println!("No containment hits.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Containment Hits ({} records) ===", records.len()).bold()
    );
    println!();
    println!(
        "  {:<20} {:<24} {:<10}  Matched text",
        "Category".dimmed(),
        "Keyword".dimmed(),
        "Speaker".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for record in records {
        let role = colorize_role(record.speaker);
        let preview = super::truncate_chars(&record.matched_text, 60);
        println!(
            "  {:<20} {:<24} {:<10}  {}",
            super::truncate_chars(&record.category, 18),
            super::truncate_chars(&record.keyword, 22),
            role,
            preview.dimmed()
        );
    }

    // Per-role summary
    let agent = records
        .iter()
        .filter(|r| r.speaker == SpeakerRole::Agent)
        .count();
    let customer = records
        .iter()
        .filter(|r| r.speaker == SpeakerRole::Customer)
        .count();
    let unknown = records
        .iter()
        .filter(|r| r.speaker == SpeakerRole::Unknown)
        .count();
    println!();
    println!("  Agent: {agent}  Customer: {customer}  Unknown: {unknown}");
}

/// Display a keyword set grouped by category.
pub fn display_keyword_set(set: &KeywordSet) {
    if set.is_empty() {
        println!("No keywords loaded for this project and builder.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Keywords ({} categories, {} keywords) ===",
            set.category_count(),
            set.keyword_count()
        )
        .bold()
    );
    println!();

    for category in &set.categories {
        println!("  {}", category.name.bold());
        println!("      {}", category.keywords.join(", ").dimmed());
    }
}

fn colorize_role(role: SpeakerRole) -> colored::ColoredString {
    match role {
        SpeakerRole::Agent => role.as_str().bright_green(),
        SpeakerRole::Customer => role.as_str().bright_blue(),
        SpeakerRole::Unknown => role.as_str().yellow(),
    }
}

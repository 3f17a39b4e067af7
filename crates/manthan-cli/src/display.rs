//! Plain-text report rendering for analysis runs.
//!
//! Renders the analytics snapshot as a grouped, human-readable card with
//! aligned labels, plus optional cluster and clause listings.

use manthan_core::types::{AnalyticsSnapshot, Draft};
use manthan_engine::pipeline::{BatchOutcome, ClusterSummary};

const MAX_REPRESENTATIVE_LEN: usize = 90;

/// Print the full analysis report for one batch run.
pub fn print_report(title: &str, snapshot: &AnalyticsSnapshot, batch: &BatchOutcome) {
    println!("=== {title} ===");
    println!();

    println!("Ingestion");
    println!("  {:<26} {}", "received", snapshot.total_received);
    println!("  {:<26} {}", "processed", snapshot.processed);
    println!("  {:<26} {}", "failed", snapshot.failed);
    println!("  {:<26} {}", "batch rows", batch.outcomes.len());
    println!();

    print_distribution("Sentiment", &snapshot.sentiment_distribution);
    print_distribution("Stance", &snapshot.stance_distribution);
    print_distribution("Language", &snapshot.language_distribution);
    print_distribution("Classification Method", &snapshot.method_distribution);

    println!("Quality");
    println!("  {:<26} {:.3}", "mean confidence", snapshot.mean_confidence);
    println!("  {:<26} {}", "needs review", snapshot.needs_review);
    println!();

    if !snapshot.top_clauses.is_empty() {
        println!("Most Discussed Clauses");
        for (reference, mentions) in &snapshot.top_clauses {
            println!("  {:<26} {}", reference, mentions);
        }
        println!();
    }

    println!("Duplicates");
    println!("  {:<26} {}", "clusters", snapshot.cluster_count);
    println!();
}

fn print_distribution(header: &str, counts: &std::collections::BTreeMap<String, u64>) {
    if counts.is_empty() {
        return;
    }
    println!("{header}");
    for (key, count) in counts {
        println!("  {:<26} {}", key, count);
    }
    println!();
}

/// List duplicate clusters that actually merged something, largest first,
/// each with its representative's masked text.
pub fn print_clusters(summaries: &[ClusterSummary]) {
    let merged: Vec<&ClusterSummary> = summaries.iter().filter(|s| s.size > 1).collect();

    if merged.is_empty() {
        println!("No duplicate clusters with more than one member.");
        return;
    }

    println!("Duplicate Clusters");
    for summary in merged {
        println!("  cluster {} ({} members)", summary.cluster_id, summary.size);
        let text: String = summary
            .representative_text
            .chars()
            .take(MAX_REPRESENTATIVE_LEN)
            .collect();
        let ellipsis = if summary.representative_text.chars().count() > MAX_REPRESENTATIVE_LEN {
            "..."
        } else {
            ""
        };
        println!("    \"{text}{ellipsis}\"");
    }
}

/// List the clauses a parsed draft exposes as linking targets.
pub fn print_clauses(draft: &Draft) {
    println!("=== {} ===", draft.title);
    println!("{} clauses", draft.clauses.len());
    println!();
    for clause in &draft.clauses {
        let preview: String = clause.text.chars().take(70).collect();
        let ellipsis = if clause.text.chars().count() > 70 { "..." } else { "" };
        println!("  {:<10} {}{}", clause.reference, preview, ellipsis);
    }
}

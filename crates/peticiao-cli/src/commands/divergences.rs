use crate::cli::SourceArgs;
use crate::support::{block_on, fetcher_or_exit, or_exit, print_json};
use peticiao_reports::Reports;
use serde_json::json;

pub fn run(source: &SourceArgs, json: bool) {
    let reports = Reports::new(fetcher_or_exit(source));
    let (stats, groups) = or_exit(block_on(async {
        tokio::try_join!(reports.verification_stats(), reports.divergence_groups())
    }));

    if json {
        print_json(&json!({ "stats": stats, "groups": groups }));
        return;
    }

    println!("peticiao divergences");
    println!("  total: {}", stats.total);
    println!("  verified: {}", stats.verified);
    println!("  unverified: {}", stats.unverified);
    println!(
        "  divergent: {} ({:.1}% of verified)",
        stats.divergent, stats.divergence_rate
    );
    for g in &groups {
        println!(
            "  {:>6}  {} ({}) -> {} ({}){}",
            g.count,
            g.from.name,
            g.from.code,
            g.to.name,
            g.to.code,
            if g.routing_confirmed { "  confirmed" } else { "" }
        );
    }
}

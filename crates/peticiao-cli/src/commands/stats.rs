use crate::cli::SourceArgs;
use crate::support::{block_on, fetcher_or_exit, or_dash, or_exit, print_json};
use peticiao_reports::{Reports, StatsSummary};
use serde_json::json;

pub fn run(source: &SourceArgs, system: Option<String>, json: bool) {
    let reports = Reports::new(fetcher_or_exit(source));
    let stats = or_exit(block_on(reports.competency_stats(system.as_deref())));
    let summary = StatsSummary::from_rows(&stats);

    if json {
        print_json(&json!({ "summary": summary, "competencies": stats }));
        return;
    }

    println!("peticiao stats [{}]", system.as_deref().unwrap_or("all systems"));
    println!("  competencies: {}", summary.competencies);
    println!("  tests: {}", summary.tests);
    println!("  successes: {}", summary.successes);
    println!("  errors: {}", summary.errors);
    println!("  mean success rate: {:.1}%", summary.mean_success_rate);
    for s in &stats {
        println!(
            "  {:>5.1}%  {}  {}  tests={} classes={} subjects={}",
            s.success_rate,
            s.code,
            or_dash(s.name.as_deref()),
            s.tests,
            s.classes_tested,
            s.subjects_tested
        );
    }
}

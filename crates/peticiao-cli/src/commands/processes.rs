use crate::cli::SourceArgs;
use crate::support::{block_on, fetcher_or_exit, or_dash, or_exit, print_json};
use peticiao_reports::Reports;

pub fn run(source: &SourceArgs, from: String, to: String, page: usize, limit: usize, json: bool) {
    let reports = Reports::new(fetcher_or_exit(source));
    let page = or_exit(block_on(reports.divergent_processes(&from, &to, page, limit)));

    if json {
        print_json(&page);
        return;
    }

    println!(
        "peticiao processes {from} -> {to}: page {}/{} ({} total)",
        page.page, page.total_pages, page.total
    );
    for p in &page.processes {
        println!(
            "  {}  {}  {}  {}",
            p.process_number,
            or_dash(p.verified_at.as_deref()),
            or_dash(p.class_name.as_deref()),
            or_dash(p.subject_name.as_deref())
        );
    }
}

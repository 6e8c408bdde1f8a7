use crate::cli::SourceArgs;
use crate::support::{block_on, fetcher_or_exit, or_exit, print_json};
use peticiao_reports::Reports;

pub fn run(source: &SourceArgs, json: bool) {
    let reports = Reports::new(fetcher_or_exit(source));
    let localities = or_exit(block_on(reports.list_localities()));

    if json {
        print_json(&localities);
        return;
    }

    println!("peticiao localities ({})", localities.len());
    for l in &localities {
        println!(
            "  {}  {}  competencies={} classes={} subjects={}",
            l.code, l.name, l.competency_count, l.class_count, l.subject_count
        );
    }
}

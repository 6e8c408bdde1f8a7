use crate::cli::SourceArgs;
use crate::support::{block_on, fetcher_or_exit, or_dash, or_exit, print_json};
use peticiao_reports::{Classification, ClassificationFilter, ErrorGroup, Reports};
use serde_json::json;

pub fn run(
    source: &SourceArgs,
    filter: String,
    competency: Option<String>,
    class: Option<String>,
    json: bool,
) {
    let filter: ClassificationFilter = or_exit(filter.parse());
    let reports = Reports::new(fetcher_or_exit(source));

    match (competency, class) {
        (Some(competency), Some(class)) => {
            let records =
                or_exit(block_on(reports.errors_for_class(&competency, &class, filter)));
            if json {
                print_json(&records);
                return;
            }
            println!("peticiao errors {competency}/{class} [{filter}] ({})", records.len());
            for r in &records {
                println!(
                    "  {}x  {}  [{}]",
                    r.occurrences,
                    or_dash(r.error_type.as_deref()),
                    r.classification.map(Classification::label).unwrap_or("Não Classificado")
                );
                if let Some(message) = &r.example_message {
                    println!("      {message}");
                }
                if let Some(fix) = &r.suggested_fix {
                    println!("      fix: {fix}");
                }
            }
        }
        (Some(competency), None) => {
            let groups = or_exit(block_on(reports.classes_with_errors(&competency, filter)));
            if json {
                print_json(&groups);
                return;
            }
            println!("peticiao errors {competency} [{filter}]: classes");
            print_groups(&groups);
        }
        _ => {
            let (summary, groups) = or_exit(block_on(async {
                let summary = reports.classification_summary().await?;
                let groups = reports.competencies_with_errors(filter).await?;
                Ok::<_, peticiao_store::FetchError>((summary, groups))
            }));
            if json {
                print_json(&json!({ "summary": summary, "competencies": groups }));
                return;
            }
            println!("peticiao errors [{filter}]");
            println!("  uncategorized: {}", summary.uncategorized);
            println!("  categorized: {}", summary.categorized());
            for c in Classification::ALL {
                println!("    {}: {}", c.label(), summary.get(c));
            }
            println!("  competencies:");
            print_groups(&groups);
        }
    }
}

fn print_groups(groups: &[ErrorGroup]) {
    for g in groups {
        println!("  {:>6}  {}  {}", g.total_errors, g.code, or_dash(g.name.as_deref()));
    }
}

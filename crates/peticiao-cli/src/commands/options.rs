use crate::cli::SourceArgs;
use crate::support::{block_on, fetcher_or_exit, or_exit, print_json};
use peticiao_facets::{
    Dimension, DimensionValue, FacetEngine, FacetSession, FacetState, Resolution,
};
use serde_json::json;
use std::process;

pub struct Args {
    pub locality: Option<String>,
    pub competency: Option<String>,
    pub class: Option<String>,
    pub subject: Option<String>,
    pub json: bool,
}

impl Args {
    fn requested(&self) -> Vec<(Dimension, &str)> {
        [
            (Dimension::Competency, self.competency.as_deref()),
            (Dimension::Class, self.class.as_deref()),
            (Dimension::Subject, self.subject.as_deref()),
        ]
        .into_iter()
        .filter_map(|(d, code)| code.map(|c| (d, c)))
        .collect()
    }
}

pub fn run(source: &SourceArgs, args: Args) {
    let engine = FacetEngine::new(fetcher_or_exit(source), args.locality.clone());
    let state = or_exit(block_on(select_all(&engine, &args)));

    if let Some(error) = &state.error {
        eprintln!("error: {error}");
        process::exit(1);
    }

    if args.json {
        print_json(&json!({
            "locality": args.locality,
            "selection": state.selection,
            "phase": state.phase(),
            "status": state.status(),
            "options": *state.options,
        }));
        return;
    }

    println!("peticiao options");
    println!("  locality: {}", args.locality.as_deref().unwrap_or("*"));
    println!("  phase: {:?}", state.phase());
    println!("  status: {:?}", state.status());
    for dimension in Dimension::ALL {
        let selected = state.selection.get(dimension);
        let values = state.options.get(dimension);
        match selected {
            Some(value) => println!(
                "  {dimension}: {} = {} ({} options)",
                value.code,
                value.display_name,
                values.len()
            ),
            None => println!("  {dimension}: {} options", values.len()),
        }
        for value in values {
            println!(
                "    {}  {}  usage={}",
                value.code, value.display_name, value.usage_count
            );
        }
    }
}

/// Apply each requested code in order, the way a user would pick them.
async fn select_all(
    engine: &FacetEngine,
    args: &Args,
) -> Result<FacetState, peticiao_store::FetchError> {
    let mut session = FacetSession::initialize(engine).await?;
    for (dimension, code) in args.requested() {
        let value = session
            .state()
            .options
            .find(dimension, code)
            .cloned()
            .unwrap_or_else(|| DimensionValue::new(dimension, code, None, 0));
        let transition = session.select(dimension, value);
        if session.settle(engine, transition).await == Resolution::Stale {
            tracing::warn!(%dimension, code, "selection superseded");
        }
    }
    Ok(session.snapshot())
}

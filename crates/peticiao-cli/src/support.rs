use crate::cli::SourceArgs;
use peticiao_store::{Fetcher, MemoryStore, PostgrestStore, StoreConfig};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "peticiao=info";

/// Log to stderr so `--json` output on stdout stays machine-readable.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn fetcher_or_exit(source: &SourceArgs) -> Fetcher {
    if let Some(path) = &source.fixture {
        let store = MemoryStore::load_json(path).unwrap_or_else(|e| {
            eprintln!("error: failed to load fixture {}: {e}", path.display());
            process::exit(1);
        });
        return Fetcher::new(Arc::new(store));
    }

    let config = or_exit(StoreConfig::resolve(source.config.as_deref()));
    let store = or_exit(PostgrestStore::new(&config));
    Fetcher::with_limits(Arc::new(store), config.limits())
}

pub fn block_on<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
    runtime.block_on(future)
}

pub fn or_exit<T, E: Display>(result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    })
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: failed to serialize output: {e}");
            process::exit(1);
        }
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "peticiao",
    about = "Peticiao: competency/class/subject cross-filtering and dashboard views",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where rows come from.
#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    /// Store configuration TOML (SUPABASE_URL overrides its url)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Read tables from a JSON fixture `{ "table": [rows...] }` instead of the hosted store
    #[arg(long, global = true, conflicts_with = "config")]
    pub fixture: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List localities with their dimension counts
    Localities {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the options consistent with a (partial) selection
    Options {
        /// Locality code scoping every table
        #[arg(long)]
        locality: Option<String>,

        /// Selected competency code
        #[arg(long)]
        competency: Option<String>,

        /// Selected class code
        #[arg(long)]
        class: Option<String>,

        /// Selected subject code
        #[arg(long)]
        subject: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse the error-classification hierarchy
    Errors {
        /// uncategorized, categorized, combinacao_impossivel, erro_corrigivel or erro_sistema
        #[arg(long, default_value = "uncategorized")]
        filter: String,

        /// Competency code; lists its classes
        #[arg(long)]
        competency: Option<String>,

        /// Class code (requires --competency); lists its error records
        #[arg(long, requires = "competency")]
        class: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Competency routing verification summary and divergence groups
    Divergences {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// One page of processes in a divergence group
    Processes {
        /// Filed competency code
        from: String,

        /// Competency code reported after lookup
        to: String,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Processes per page
        #[arg(long, default_value_t = peticiao_reports::DEFAULT_PROCESS_PAGE_SIZE)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Per-competency routing test statistics
    Stats {
        /// Restrict to one court system
        #[arg(long)]
        system: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "wapo-search",
    version,
    about = "Query analysis and two-stage retrieval over a news collection",
    long_about = "wapo-search rewrites free-text queries (synonym expansion for short queries, \
                  salient-term summarization for long ones), retrieves candidates lexically from \
                  Elasticsearch or a local index, and optionally reranks them with fastText or \
                  sentence-BERT vectors."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/wapo-search/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the collection
    Search {
        /// Free-text query
        query: String,

        /// Text analyzer for the lexical stage: default, n_gram, whitespace
        #[arg(short, long)]
        analyzer: Option<String>,

        /// Ranking function: bm25, fasttext, sbert
        #[arg(short, long)]
        ranker: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Result page to show (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Show a single returned document in full
        #[arg(long, value_name = "ID")]
        doc: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show how a query is rewritten, without retrieval
    Analyze {
        /// Free-text query
        query: String,

        /// Show analysis in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Build or update the local index from a JSON Lines file
    Index {
        /// One article per line: doc_id, title, author, date, content, annotation
        file: PathBuf,

        /// Encode missing ft_vector / sbert_vector through the configured encoders
        #[arg(long)]
        embed: bool,

        /// Index directory (defaults to backend.index_dir)
        #[arg(short = 'o', long, value_name = "DIR")]
        index_dir: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

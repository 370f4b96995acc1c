//! # Voiceprint CLI (`vp`)
//!
//! ## Usage
//!
//! ```bash
//! vp --config ./config/vp.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vp chunk` | Chunk the corpus and print the chunks as JSON |
//! | `vp ingest` | Chunk, embed and index the corpus |
//! | `vp query "<text>"` | Show the nearest chunks |
//! | `vp draft "<request>"` | Draft text in the corpus author's voice |
//! | `vp stats` | Record counts by content type |
//! | `vp save <file>` | Write the collection to JSON |
//! | `vp load <file>` | Replace the collection from JSON (re-embeds) |
//! | `vp clear` | Remove every record |
//! | `vp serve` | Start the HTTP API |
//!
//! Logs go to stderr; set `RUST_LOG` to adjust (default `voiceprint=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use voiceprint::{collection, config, ingest, query, server, stats};

/// Voiceprint — draft new writing in your own voice from your own corpus.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/vp.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "vp",
    about = "Voiceprint — retrieval-augmented drafting in your own voice",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/vp.toml`.
    #[arg(long, global = true, default_value = "./config/vp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Chunk the corpus without embedding.
    ///
    /// Writes `[{text, metadata}]` JSON to `--output`, or stdout.
    Chunk {
        /// File to write instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Chunk, embed and index every corpus file.
    ///
    /// Each file fully replaces its previous records.
    Ingest {
        /// Show file and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the chunks nearest to a query.
    Query {
        /// The query text.
        text: String,

        /// Number of results (default: `[generation].top_k`).
        #[arg(long)]
        k: Option<usize>,

        /// Metadata filter `key=value`; repeat to combine.
        #[arg(long = "filter")]
        filters: Vec<String>,
    },

    /// Draft new text in the voice of the corpus.
    ///
    /// A `[make this ...]` instruction inside the request is used as the
    /// style hint unless `--style` is given.
    Draft {
        /// What to write.
        text: String,

        /// Number of examples to retrieve.
        #[arg(long)]
        k: Option<usize>,

        /// Explicit style instruction, e.g. "more formal".
        #[arg(long)]
        style: Option<String>,

        /// Metadata filter `key=value`; repeat to combine.
        #[arg(long = "filter")]
        filters: Vec<String>,
    },

    /// Show record counts by content type.
    Stats,

    /// Write the collection to a JSON file.
    Save { path: PathBuf },

    /// Replace the collection from a JSON file.
    ///
    /// Destructive: existing records are removed and every loaded text is
    /// re-embedded.
    Load { path: PathBuf },

    /// Remove every record from the collection.
    Clear,

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voiceprint=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chunk { output } => {
            ingest::run_chunk(&cfg, output.as_deref())?;
        }
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Query { text, k, filters } => {
            query::run_query(&cfg, &text, k, &filters).await?;
        }
        Commands::Draft {
            text,
            k,
            style,
            filters,
        } => {
            query::run_draft(&cfg, &text, k, style.as_deref(), &filters).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Save { path } => {
            collection::run_save(&cfg, &path).await?;
        }
        Commands::Load { path } => {
            collection::run_load(&cfg, &path).await?;
        }
        Commands::Clear => {
            collection::run_clear(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

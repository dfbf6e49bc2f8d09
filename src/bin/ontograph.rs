//! Ontograph CLI — personal ontology graph engine.
//!
//! Usage:
//!   ontograph ingest <payload.json> --keyword <kw> [--source user] [--db path]
//!   ontograph update --keyword <kw> --context <file> --extractor <cmd> [--db path]
//!   ontograph view [--keyword <kw>] [--focus] [--source user] [--db path]
//!   ontograph stats [--db path]
//!   ontograph reset [--db path]

use clap::{Parser, Subcommand};
use ontograph::{
    CommandExtractor, Normalizer, NormalizerConfig, OntographApi, OpenStore, RawGraphPayload,
    Script, SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ontograph", version, about = "Personal ontology graph engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an extraction payload file into the graph
    Ingest {
        /// Path to a {nodes, relationships} JSON payload
        payload: PathBuf,
        /// Driving keyword (becomes the batch root)
        #[arg(long)]
        keyword: String,
        /// Identity tag stamped onto every node (e.g. "user")
        #[arg(long)]
        source: Option<String>,
        /// Strip nodes written in this script when the keyword is not
        /// (hangul, han, kana, cyrillic)
        #[arg(long, value_parser = parse_script)]
        ban_script: Option<Script>,
    },
    /// Extract from context text via an external command and merge the result
    Update {
        /// Driving keyword
        #[arg(long)]
        keyword: String,
        /// File of context text handed to the extractor
        #[arg(long)]
        context: PathBuf,
        /// Extraction command to spawn (reads context on stdin, prints JSON)
        #[arg(long)]
        extractor: String,
    },
    /// Print the enriched graph as JSON for visualization
    View {
        /// Restrict to this keyword's neighborhood
        #[arg(long)]
        keyword: Option<String>,
        /// Reduce to the dominant connected component
        #[arg(long)]
        focus: bool,
        /// Only nodes carrying this source tag
        #[arg(long)]
        source: Option<String>,
    },
    /// Show node/edge counts
    Stats,
    /// Delete every node and edge
    Reset,
}

fn parse_script(value: &str) -> Result<Script, String> {
    match value.to_lowercase().as_str() {
        "hangul" => Ok(Script::Hangul),
        "han" => Ok(Script::Han),
        "kana" => Ok(Script::Kana),
        "cyrillic" => Ok(Script::Cyrillic),
        other => Err(format!("unknown script '{}'", other)),
    }
}

/// Default database path (~/.local/share/ontograph/ontograph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("ontograph").join("ontograph.db")
}

fn open_api(db: Option<PathBuf>, ban_script: Option<Script>) -> Result<OntographApi<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store =
        SqliteStore::open(&db_path).map_err(|e| format!("failed to open database: {}", e))?;
    let mut api = OntographApi::new(Arc::new(store));
    if let Some(script) = ban_script {
        api = api
            .with_normalizer(Normalizer::new(NormalizerConfig::new().with_banned_script(script)));
    }
    Ok(api)
}

fn cmd_ingest(
    api: &OntographApi<SqliteStore>,
    payload_path: &PathBuf,
    keyword: &str,
    source: Option<&str>,
) -> i32 {
    let text = match std::fs::read_to_string(payload_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", payload_path.display(), e);
            return 1;
        }
    };
    let payload = RawGraphPayload::from_json_lossy(&text);
    match api.ingest(payload, keyword, source) {
        Ok(outcome) => {
            println!(
                "Ingested '{}': {} created, {} merged, {} edges ({} dropped)",
                keyword,
                outcome.receipt.nodes_created,
                outcome.receipt.nodes_merged,
                outcome.receipt.edges_written,
                outcome.receipt.edges_dropped,
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_update(
    api: &OntographApi<SqliteStore>,
    keyword: &str,
    context_path: &PathBuf,
    extractor_cmd: &str,
) -> i32 {
    let context = match std::fs::read_to_string(context_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", context_path.display(), e);
            return 1;
        }
    };
    let extractor = CommandExtractor::new(extractor_cmd);
    match api.merge_search(&extractor, keyword, &context).await {
        Ok(outcome) => {
            match serde_json::to_string_pretty(&outcome.diff) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_view(
    api: &OntographApi<SqliteStore>,
    keyword: Option<&str>,
    focus: bool,
    source: Option<&str>,
) -> i32 {
    let view = match keyword {
        Some(kw) if focus => api.focused_view(kw),
        Some(kw) => api.keyword_view(kw),
        None => api.full_view(source),
    };
    match view.and_then(|v| Ok(serde_json::to_string_pretty(&v)?)) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_stats(api: &OntographApi<SqliteStore>) -> i32 {
    match api.counts() {
        Ok((nodes, edges)) => {
            println!("{} nodes, {} edges", nodes, edges);
            for label in ["Person", "Organization", "Skill", "Interest", "Concept", "Event"] {
                if let Ok(count) = api.count_label(label) {
                    if count > 0 {
                        println!("  {:<14} {}", label, count);
                    }
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_reset(api: &OntographApi<SqliteStore>) -> i32 {
    match api.reset() {
        Ok(()) => {
            println!("Graph reset.");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Ingest {
            payload,
            keyword,
            source,
            ban_script,
        } => match open_api(cli.db, ban_script) {
            Ok(api) => cmd_ingest(&api, &payload, &keyword, source.as_deref()),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Update {
            keyword,
            context,
            extractor,
        } => match open_api(cli.db, None) {
            Ok(api) => cmd_update(&api, &keyword, &context, &extractor).await,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::View {
            keyword,
            focus,
            source,
        } => match open_api(cli.db, None) {
            Ok(api) => cmd_view(&api, keyword.as_deref(), focus, source.as_deref()),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Stats => match open_api(cli.db, None) {
            Ok(api) => cmd_stats(&api),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Reset => match open_api(cli.db, None) {
            Ok(api) => cmd_reset(&api),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    };

    std::process::exit(code);
}

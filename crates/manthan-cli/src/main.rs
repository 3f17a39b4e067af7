mod display;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use manthan_ai::HashEmbedder;
use manthan_core::PipelineConfig;
use manthan_core::types::Draft;
use manthan_engine::{Pipeline, RawRecord};

#[derive(Parser)]
#[command(name = "manthan", version, about = "Public-comment analysis for draft legislation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse a batch of comments against a draft and print the report
    Analyze {
        /// Draft document as plain text
        #[arg(long)]
        draft: PathBuf,
        /// Comments as JSON Lines; each object needs a "text" field, any
        /// other string fields are kept as metadata
        #[arg(long)]
        comments: PathBuf,
        /// Pipeline configuration overrides as a JSON file
        #[arg(long, env = "MANTHAN_CONFIG")]
        config: Option<PathBuf>,
        /// Clauses shown in the most-discussed ranking
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Also list duplicate clusters with more than one member
        #[arg(long)]
        clusters: bool,
    },
    /// Parse a draft and list the clauses that would be linking targets
    Clauses {
        /// Draft document as plain text
        #[arg(long)]
        draft: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("manthan v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Analyze {
            draft,
            comments,
            config,
            top,
            clusters,
        } => analyze(&draft, &comments, config.as_deref(), top, clusters).await,
        Command::Clauses { draft } => {
            display::print_clauses(&load_draft(&draft)?);
            Ok(())
        }
    }
}

async fn analyze(
    draft_path: &Path,
    comments_path: &Path,
    config_path: Option<&Path>,
    top: usize,
    show_clusters: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    config.top_clauses = top;

    let draft = load_draft(draft_path)?;
    let records = load_records(comments_path)?;
    let title = draft.title.clone();

    let pipeline = Pipeline::new(config, Arc::new(HashEmbedder::default()), None);
    pipeline.replace_draft(draft)?;

    let batch = pipeline.ingest_batch(records).await;
    let snapshot = pipeline.analytics_snapshot();

    display::print_report(&title, &snapshot, &batch);
    if show_clusters {
        display::print_clusters(&pipeline.cluster_summaries());
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn load_draft(path: &Path) -> anyhow::Result<Draft> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading draft {}", path.display()))?;
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "draft".to_string());
    let title = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("Untitled draft")
        .trim()
        .to_string();
    Ok(Draft::parse(id, title, &content))
}

fn load_records(path: &Path) -> anyhow::Result<Vec<RawRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading comments {}", path.display()))?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parsing comment on line {}", n + 1))
        })
        .collect()
}

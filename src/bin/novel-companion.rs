//! Novel Companion CLI: chapter analysis, character graphs and chat.
//!
//! Usage:
//!   novel-companion normalize --chapter <file> [--novel <file>] [--analysis <file>]
//!   novel-companion graph --document <file> [--no-placeholders]
//!   novel-companion insights <text-file>
//!   novel-companion [--config path] novels | chapters <novel> | view <novel> <chapter>
//!   novel-companion [--config path] summary <chapter> | chat <novel> <message>...

use clap::{Parser, Subcommand};
use novel_companion::analysis::heuristics::reading_insights;
use novel_companion::{
    build_from_mapping, load_json, normalize, CompanionApi, CompanionConfig, CompanionError, GraphOptions,
    HttpAnalysisApi,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "novel-companion",
    version,
    about = "Chapter analysis and character graphs for readers"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical analysis document for local chapter data
    Normalize {
        /// Chapter record JSON
        #[arg(long)]
        chapter: PathBuf,
        /// Novel record JSON
        #[arg(long)]
        novel: Option<PathBuf>,
        /// Analysis document JSON
        #[arg(long)]
        analysis: Option<PathBuf>,
    },
    /// Print the character graph for a local chapter or analysis document
    Graph {
        #[arg(long)]
        document: PathBuf,
        /// Drop relationship participants missing from the character list
        #[arg(long)]
        no_placeholders: bool,
    },
    /// Run keyword heuristics over a plain-text chapter
    Insights {
        /// Plain-text file
        path: PathBuf,
    },
    /// List novels from the analysis API
    Novels,
    /// List a novel's chapters
    Chapters { novel_id: String },
    /// Print the full chapter view
    View { novel_id: String, chapter_id: String },
    /// Print only a chapter's summary
    Summary { chapter_id: String },
    /// Ask the companion one question about a novel
    Chat {
        novel_id: String,
        #[arg(required = true)]
        message: Vec<String>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            error!("cannot encode output: {}", e);
            1
        }
    }
}

fn report(err: CompanionError) -> i32 {
    error!("{}", err);
    1
}

fn load_optional(path: Option<&Path>) -> Result<Option<serde_json::Value>, CompanionError> {
    path.map(load_json).transpose()
}

fn cmd_normalize(chapter: &Path, novel: Option<&Path>, analysis: Option<&Path>) -> i32 {
    let loaded = load_json(chapter).and_then(|chapter| {
        Ok((chapter, load_optional(novel)?, load_optional(analysis)?))
    });
    let (chapter, novel, analysis) = match loaded {
        Ok(values) => values,
        Err(e) => return report(e),
    };

    let document = normalize(&chapter, novel.as_ref(), analysis.as_ref());
    if !document.is_complete() {
        warn!("analysis incomplete; chapter is still processing");
    }
    print_json(&document)
}

fn cmd_graph(document: &Path, no_placeholders: bool) -> i32 {
    let value = match load_json(document) {
        Ok(v) => v,
        Err(e) => return report(e),
    };
    let document = normalize(&value, None, None);
    let options = GraphOptions {
        include_unresolved: !no_placeholders,
    };
    let graph = build_from_mapping(&document.character_mapping, &options);
    if graph.stats.unresolved_relationships > 0 {
        warn!(
            dropped = graph.stats.unresolved_relationships,
            "some relationships name characters missing from the character list"
        );
    }
    print_json(&graph)
}

fn cmd_insights(path: &Path) -> i32 {
    match std::fs::read_to_string(path) {
        Ok(text) => print_json(&reading_insights(&text)),
        Err(source) => report(CompanionError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn cmd_novels(api: &CompanionApi) -> i32 {
    let novels = api.novels().await;
    if novels.is_empty() {
        println!("No novels available.");
        return 0;
    }
    println!("{:<26}  {:<40}  {:<20}", "ID", "TITLE", "AUTHOR");
    println!("{}", "-".repeat(90));
    for novel in novels {
        println!(
            "{:<26}  {:<40}  {:<20}",
            novel.id.unwrap_or_default(),
            novel.title.unwrap_or_default(),
            novel.author.unwrap_or_default()
        );
    }
    0
}

async fn cmd_chapters(api: &CompanionApi, novel_id: &str) -> i32 {
    let chapters = api.chapters(novel_id).await;
    if chapters.is_empty() {
        println!("No chapters available for '{}'.", novel_id);
        return 0;
    }
    println!("{:<12}  {:>4}  {:<44}  {:>7}  {:>4}", "ID", "NO", "TITLE", "WORDS", "DONE");
    println!("{}", "-".repeat(80));
    for chapter in chapters {
        println!(
            "{:<12}  {:>4}  {:<44}  {:>7}  {:>4}",
            chapter.id.unwrap_or_default(),
            chapter.chapter_number.unwrap_or(0),
            chapter.title.unwrap_or_default(),
            chapter.word_count.unwrap_or(0),
            if chapter.is_processed.unwrap_or(false) { "yes" } else { "no" }
        );
    }
    0
}

async fn cmd_view(api: &CompanionApi, novel_id: &str, chapter_id: &str) -> i32 {
    match api.chapter_view(novel_id, chapter_id).await {
        Ok(view) => print_json(&view),
        Err(e) => report(e),
    }
}

async fn cmd_summary(api: &CompanionApi, chapter_id: &str) -> i32 {
    match api.chapter_summary(chapter_id).await {
        Ok(Some(summary)) => print_json(&summary),
        Ok(None) => {
            println!("No summary available for '{}'.", chapter_id);
            0
        }
        Err(e) => report(e),
    }
}

async fn cmd_chat(api: &CompanionApi, novel_id: &str, message: &str) -> i32 {
    let mut session = api.new_session();
    session.select(Some(novel_id), None);
    let reply = api.chat(&mut session, message, None).await;
    print_json(&reply)
}

fn open_api(config: Option<&Path>) -> Result<CompanionApi, CompanionError> {
    let config = CompanionConfig::load_or_default(config)?;
    let client = HttpAnalysisApi::from_config(&config)?;
    Ok(CompanionApi::new(Arc::new(client), config))
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let code = match cli.command {
        Commands::Normalize {
            chapter,
            novel,
            analysis,
        } => cmd_normalize(&chapter, novel.as_deref(), analysis.as_deref()),
        Commands::Graph {
            document,
            no_placeholders,
        } => cmd_graph(&document, no_placeholders),
        Commands::Insights { path } => cmd_insights(&path),
        Commands::Novels => match open_api(config) {
            Ok(api) => cmd_novels(&api).await,
            Err(e) => report(e),
        },
        Commands::Chapters { novel_id } => match open_api(config) {
            Ok(api) => cmd_chapters(&api, &novel_id).await,
            Err(e) => report(e),
        },
        Commands::View {
            novel_id,
            chapter_id,
        } => match open_api(config) {
            Ok(api) => cmd_view(&api, &novel_id, &chapter_id).await,
            Err(e) => report(e),
        },
        Commands::Summary { chapter_id } => match open_api(config) {
            Ok(api) => cmd_summary(&api, &chapter_id).await,
            Err(e) => report(e),
        },
        Commands::Chat { novel_id, message } => match open_api(config) {
            Ok(api) => cmd_chat(&api, &novel_id, &message.join(" ")).await,
            Err(e) => report(e),
        },
    };
    std::process::exit(code);
}

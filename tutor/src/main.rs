//! Tutor - AI tutoring CLI
//!
//! Entry point for the tutoring engine: one-shot questions, offline
//! graph queries, and the interactive REPL (the default).

use std::fs;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use kgraph::KnowledgeGraph;
use tutor::cli::{Cli, Command, OutputFormat, get_log_path};
use tutor::config::Config;
use tutor::engine::TutorEngine;
use tutor::graph::GraphAccess;
use tutor::planner::Planner;
use tutor::repl::ReplSession;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!(
        "Tutor loaded config: provider={} model={}",
        config.llm.provider, config.llm.model
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Ask { message, user, format }) => {
            debug!(%user, ?format, "main: matched Ask command");
            cmd_ask(&config, &user, &message, format).await
        }
        Some(Command::Search { query, format }) => {
            debug!(%query, ?format, "main: matched Search command");
            cmd_search(&config, &query, format)
        }
        Some(Command::Path { start, end, format }) => {
            debug!(%start, %end, ?format, "main: matched Path command");
            cmd_path(&config, &start, &end, format)
        }
        Some(Command::Repl) | None => {
            debug!("main: launching REPL");
            cmd_repl(&config).await
        }
    }
}

/// Ask a single question (batch mode)
async fn cmd_ask(config: &Config, user: &str, message: &str, format: OutputFormat) -> Result<()> {
    debug!("cmd_ask: called");
    // Fail fast before any model call
    config
        .validate()
        .context("LLM API key not found. Check api-key-env in your config.")?;

    let engine = TutorEngine::from_config(config).context("Failed to initialize engine")?;
    let response = engine.handle_message(user, message, &[]).await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("{}", response.content);
            if let Some(next) = &response.next_action {
                println!("{}", format!("({next})").dimmed());
            }
        }
    }

    Ok(())
}

/// Search the graph directly, no model involved
fn cmd_search(config: &Config, query: &str, format: OutputFormat) -> Result<()> {
    debug!(%query, "cmd_search: called");
    let graph = open_graph(config)?;
    let hits = graph.search_by_keywords(&[query.to_string()]);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        OutputFormat::Text => {
            if hits.is_empty() {
                println!("No knowledge points match '{}'", query);
                return Ok(());
            }
            println!("Found {} knowledge point(s):", hits.len());
            println!();
            for hit in &hits {
                println!("  {}", hit.name.bright_cyan());
                println!("    {}", hit.description);
                println!("    难度: {}  时长: {}  分类: {}", hit.difficulty, hit.estimated_time, hit.category);
                if !hit.related_topics.is_empty() {
                    println!("    相关: {}", hit.related_topics.join("、").dimmed());
                }
                println!();
            }
        }
    }

    Ok(())
}

/// Plan learning paths directly, no model involved
fn cmd_path(config: &Config, start: &str, end: &str, format: OutputFormat) -> Result<()> {
    debug!(%start, %end, "cmd_path: called");
    let planner = Planner::new(open_graph(config)?);
    let paths = planner.plan(start, end);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
        OutputFormat::Text => {
            if paths.is_empty() {
                println!("No learning path found from '{}' to '{}'", start, end);
                return Ok(());
            }
            for (i, path) in paths.iter().enumerate() {
                println!(
                    "{} (总时长: {}, 难度: {})",
                    format!("路径 {}", i + 1).bright_cyan(),
                    path.estimated_total_time,
                    path.difficulty_level
                );
                for step in &path.nodes {
                    println!("  {}. {} ({})", step.step, step.name, step.estimated_time);
                }
                println!();
            }
        }
    }

    Ok(())
}

/// Launch the interactive REPL (default)
async fn cmd_repl(config: &Config) -> Result<()> {
    debug!("cmd_repl: called");
    config
        .validate()
        .context("LLM API key not found. Check api-key-env in your config.")?;

    let engine = TutorEngine::from_config(config).context("Failed to initialize engine")?;
    ReplSession::new(engine, "local").run().await
}

/// Open the graph store at the configured path
fn open_graph(config: &Config) -> Result<GraphAccess> {
    let store = KnowledgeGraph::open(&config.graph.path).context("Failed to open knowledge graph")?;
    Ok(GraphAccess::new(Arc::new(store)))
}

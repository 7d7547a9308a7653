use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use kgraph::cli::Cli;
use kgraph::config::Config;
use kgraph::{GraphStore, KnowledgeGraph, KnowledgePoint};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("kg starting");

    let graph = KnowledgeGraph::open(&config.graph_path)
        .with_context(|| format!("Failed to open graph at {}", config.graph_path.display()))?;

    match cli.command {
        kgraph::cli::Command::Seed { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let points: Vec<KnowledgePoint> =
                serde_yaml::from_str(&content).context("Failed to parse seed file")?;
            let mut inserted = 0usize;
            for point in points {
                let name = point.name.clone();
                match graph.insert(point) {
                    Ok(_) => inserted += 1,
                    Err(e) => eprintln!("{} {}: {}", "skip".yellow(), name, e),
                }
            }
            println!("{} Seeded {} points", "✓".green(), inserted);
        }
        kgraph::cli::Command::Search { keyword } => {
            let hits = graph.find_containing(&keyword)?;
            if hits.is_empty() {
                println!("No matches");
            } else {
                for point in hits {
                    println!(
                        "{} [{}] {} ({})",
                        point.name.cyan(),
                        point.difficulty.yellow(),
                        point.description,
                        point.estimated_time.dimmed()
                    );
                }
            }
        }
        kgraph::cli::Command::Path { start, end, depth } => {
            let starts = graph.match_topic(&start)?;
            let ends = graph.match_topic(&end)?;
            let paths = graph.paths_between(&starts, &ends, depth)?;
            if paths.is_empty() {
                println!("No path found");
            } else {
                for (i, path) in paths.iter().enumerate() {
                    let names: Vec<&str> = path.iter().map(|p| p.name.as_str()).collect();
                    println!("{} {}", format!("#{}", i + 1).green(), names.join(" -> "));
                }
            }
        }
        kgraph::cli::Command::Show { name } => match graph.get(&name)? {
            Some(point) => {
                println!("Name: {}", point.name.cyan());
                println!("  Category: {}", point.category);
                println!("  Difficulty: {}", point.difficulty);
                println!("  Estimated time: {}", point.estimated_time);
                println!("  Status: {}", point.status);
                println!("  Prerequisites: {}", point.prerequisites.join(", "));
                println!("  Description: {}", point.description);
            }
            None => println!("Not found: {}", name),
        },
        kgraph::cli::Command::List => {
            let hits = graph.find_containing("")?;
            if hits.is_empty() {
                println!("Graph is empty");
            } else {
                for point in hits {
                    println!("{}", point.name);
                }
            }
        }
    }

    Ok(())
}

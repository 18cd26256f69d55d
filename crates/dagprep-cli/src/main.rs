//! dagprep CLI: build, run, and inspect preprocessing pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dagprep_cli::{load_pipeline, ParsedPipeline};
use dagprep_core::config::EngineConfig;
use dagprep_core::graph::NodeKind;
use dagprep_exec::{Engine, RunStatus};
use dagprep_io::catalog::{JsonCatalog, RunLoader};
use dagprep_io::describe::SummaryDescriber;
use dagprep_io::readers::RoutedSource;
use dagprep_io::writers::JsonlWriter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "dagprep")]
#[command(about = "DAG-based data preprocessing: dedupe, impute, merge, profile", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Persist the run and its profiles into this catalog directory
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Write every produced dataset as <dir>/<node>.jsonl
        #[arg(long)]
        export: Option<PathBuf>,

        /// Neighbours used by imputation (overrides config)
        #[arg(long)]
        neighbors: Option<usize>,
    },

    /// Build the graph and check column compatibility without running
    Validate {
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the execution order (generations) for a pipeline
    Explain {
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Run a pipeline and print the profile of one node's dataset as JSON
    Profile {
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Node name from the pipeline file
        #[arg(long)]
        node: String,
    },

    /// Run a pipeline and print the profile diff of two nodes as JSON
    Diff {
        #[arg(short, long)]
        pipeline: PathBuf,

        #[arg(long)]
        left: String,

        #[arg(long)]
        right: String,
    },

    /// List runs stored in a catalog directory
    Runs {
        #[arg(long)]
        catalog: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            pipeline,
            catalog,
            export,
            neighbors,
        } => run_pipeline(&pipeline, catalog, export, neighbors),
        Commands::Validate { pipeline } => validate_pipeline(&pipeline),
        Commands::Explain { pipeline } => explain_pipeline(&pipeline),
        Commands::Profile { pipeline, node } => profile_node(&pipeline, &node),
        Commands::Diff {
            pipeline,
            left,
            right,
        } => diff_nodes(&pipeline, &left, &right),
        Commands::Runs { catalog } => list_runs(&catalog),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn prepare(
    pipeline_path: &Path,
    neighbors: Option<usize>,
) -> CliResult<(ParsedPipeline, Engine)> {
    let source = RoutedSource::new();
    let parsed = load_pipeline(pipeline_path, &source)?;

    let mut config = EngineConfig::from_env();
    config.merge(&parsed.config);
    if let Some(k) = neighbors {
        config.impute_neighbors = k;
    }
    config.validate()?;

    let engine = Engine::new(config, source).with_describer(SummaryDescriber);
    Ok((parsed, engine))
}

fn run_pipeline(
    pipeline_path: &Path,
    catalog: Option<PathBuf>,
    export: Option<PathBuf>,
    neighbors: Option<usize>,
) -> CliResult<()> {
    let (parsed, mut engine) = prepare(pipeline_path, neighbors)?;
    let run = engine.run_pipeline(&parsed.graph)?;

    println!("Run {}", run.id());
    for step in run.steps() {
        println!("  [{}] {}", step.output.get(), step.description);
    }
    let status = run.status().clone();
    match &status {
        RunStatus::Failed { node, reason } => {
            let at = node
                .and_then(|n| parsed.name_of(n).map(str::to_string))
                .unwrap_or_else(|| "-".into());
            println!("Status: failed at {} ({})", at, reason);
        }
        other => println!("Status: {:?}", other),
    }

    if let Some(dir) = export {
        fs::create_dir_all(&dir)?;
        for (name, &id) in &parsed.names {
            let Ok(data) = engine.get_dataset(id) else {
                continue;
            };
            let path = dir.join(format!("{}.jsonl", name));
            JsonlWriter::to_path(&path)?.write_dataset(data)?;
            println!("  wrote {}", path.display());
        }
    }

    let catalog = catalog.or_else(|| engine.config().catalog_dir.clone().map(PathBuf::from));
    if let Some(root) = catalog {
        engine.persist(&JsonCatalog::new(root))?;
    }

    if matches!(status, RunStatus::Failed { .. }) {
        return Err("pipeline run failed".into());
    }
    Ok(())
}

fn validate_pipeline(pipeline_path: &Path) -> CliResult<()> {
    let (parsed, engine) = prepare(pipeline_path, None)?;
    let columns = engine.preview(&parsed.graph)?;
    for (name, id) in &parsed.names {
        if let Some(cols) = columns.get(id) {
            println!("{:>12}: {}", name, cols.join(", "));
        }
    }
    println!("✓ Pipeline is valid");
    Ok(())
}

fn explain_pipeline(pipeline_path: &Path) -> CliResult<()> {
    let (parsed, _engine) = prepare(pipeline_path, None)?;
    let graph = &parsed.graph;

    println!("=== Nodes ===");
    for node in graph.nodes() {
        let name = parsed.name_of(node.id).unwrap_or("?");
        match &node.kind {
            NodeKind::RawSource { locator, .. } => {
                println!("  {} {} <- {} ({})", node.id, name, locator, node.label)
            }
            NodeKind::Step {
                transform,
                reference_columns,
                ..
            } => println!(
                "  {} {} = {} refs={:?} ({})",
                node.id, name, transform, reference_columns, node.label
            ),
        }
    }

    println!("\n=== Edges ===");
    for edge in graph.edges() {
        println!("  {} -> {} (input {})", edge.from, edge.to, edge.slot);
    }

    println!("\n=== Generations ===");
    for (i, generation) in graph.topological_order().enumerate() {
        let names: Vec<&str> = generation?
            .into_iter()
            .map(|id| parsed.name_of(id).unwrap_or("?"))
            .collect();
        println!("  {}: {}", i, names.join(", "));
    }
    Ok(())
}

fn profile_node(pipeline_path: &Path, node: &str) -> CliResult<()> {
    let (parsed, mut engine) = prepare(pipeline_path, None)?;
    let id = parsed.node(node)?;
    engine.run_pipeline(&parsed.graph)?;
    println!("{}", engine.profile_node(id)?.to_json()?);
    Ok(())
}

fn diff_nodes(pipeline_path: &Path, left: &str, right: &str) -> CliResult<()> {
    let (parsed, mut engine) = prepare(pipeline_path, None)?;
    let (l, r) = (parsed.node(left)?, parsed.node(right)?);
    engine.run_pipeline(&parsed.graph)?;
    let a = engine.profile_node(l)?;
    let b = engine.profile_node(r)?;
    println!("{}", dagprep_profile::diff(&a, &b)?.to_json()?);
    Ok(())
}

fn list_runs(root: &Path) -> CliResult<()> {
    let catalog = JsonCatalog::new(root);
    let runs = catalog.list_runs()?;
    if runs.is_empty() {
        println!("no runs in {}", root.display());
    }
    for run in runs {
        let outcome = match &run.outcome {
            Some(o) => serde_json::to_string(o)?,
            None => "unfinished".into(),
        };
        println!(
            "{}  started={}  datasets={}  steps={}  {}",
            run.id, run.started_ms, run.datasets, run.steps, outcome
        );
    }
    Ok(())
}

//! seshat CLI: frequent graph-pattern discovery over RDF knowledge graphs.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::info;

use seshat::graph::ntriples::load_ntriples;
use seshat::mine::grow::{QueryStream, generate};
use seshat::mine::roots::init_root_patterns;
use seshat::mine::{MineConfig, Mode, Strategy};
use seshat::pattern::VarAllocator;
use seshat::term::{RDF_NS, RDFS_NS, XSD_NS};

#[derive(Parser)]
#[command(name = "seshat", version, about = "Frequent graph-pattern discovery over RDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover patterns in a graph and write them as SPARQL queries.
    Mine {
        /// Path to the N-Triples input graph.
        #[arg(long)]
        input: PathBuf,

        /// Output file for the generated queries (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of iterative-deepening rounds.
        #[arg(long, default_value = "3")]
        depths: usize,

        /// Minimum number of entities a pattern must describe.
        #[arg(long, default_value = "2")]
        min_support: usize,

        /// Probability of exploring an endpoint variable.
        #[arg(long, default_value = "1.0")]
        p_explore: f64,

        /// Probability of considering each extension candidate.
        #[arg(long, default_value = "1.0")]
        p_extend: f64,

        /// Exclusive upper bound on pattern length.
        #[arg(long, default_value = "5")]
        max_length: usize,

        /// Exclusive upper bound on pattern width.
        #[arg(long, default_value = "3")]
        max_width: usize,

        /// Pattern kinds to generate: A (instance), T (schema), or AT.
        #[arg(long, default_value = "AT")]
        mode: Mode,

        /// Cluster textual literals into string shapes.
        #[arg(long)]
        textual: bool,

        /// Cluster numeric literals into value ranges.
        #[arg(long)]
        numerical: bool,

        /// Cluster temporal literals into period ranges.
        #[arg(long)]
        temporal: bool,

        /// Frontier strategy: bfs or dfs.
        #[arg(long, default_value = "bfs")]
        strategy: Strategy,

        /// Sampling RNG seed.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Namespace under which discovered patterns are named.
        #[arg(long, default_value = "http://purl.org/seshat/pattern#")]
        namespace: String,
    },

    /// Load a graph and print its statistics.
    Info {
        /// Path to the N-Triples input graph.
        #[arg(long)]
        input: PathBuf,

        /// Print statistics as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(serde::Serialize)]
struct GraphStats {
    nodes: usize,
    triples: usize,
    relations: usize,
    classes: usize,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mine {
            input,
            output,
            depths,
            min_support,
            p_explore,
            p_extend,
            max_length,
            max_width,
            mode,
            textual,
            numerical,
            temporal,
            strategy,
            seed,
            namespace,
        } => {
            let cfg = MineConfig {
                depths,
                min_support,
                p_explore,
                p_extend,
                max_length,
                max_width,
                mode,
                textual,
                numerical,
                temporal,
                strategy,
                seed,
            };
            cfg.validate().into_diagnostic()?;

            let kg = load_ntriples(&input).into_diagnostic()?;
            info!(
                nodes = kg.node_count(),
                triples = kg.triple_count(),
                relations = kg.num_relations(),
                "graph loaded"
            );

            let writer: Box<dyn std::io::Write + Send> = match &output {
                Some(path) => {
                    Box::new(BufWriter::new(File::create(path).into_diagnostic()?))
                }
                None => Box::new(std::io::stdout()),
            };
            let sink = QueryStream {
                writer,
                namespace,
                prefixes: default_prefixes(),
            };

            let vars = VarAllocator::new();
            let index = init_root_patterns(&kg, &cfg, &vars).into_diagnostic()?;
            info!(classes = index.len(), "root patterns initialized");

            let found = generate(&index, &cfg, &vars, Some(sink)).into_diagnostic()?;
            match &output {
                Some(path) => println!("{found} patterns written to {}", path.display()),
                None => info!(patterns = found, "done"),
            }
        }
        Commands::Info { input, json } => {
            let kg = load_ntriples(&input).into_diagnostic()?;
            let stats = GraphStats {
                nodes: kg.node_count(),
                triples: kg.triple_count(),
                relations: kg.num_relations(),
                classes: kg.classes().len(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
            } else {
                println!("nodes:     {}", stats.nodes);
                println!("triples:   {}", stats.triples);
                println!("relations: {}", stats.relations);
                println!("classes:   {}", stats.classes);
            }
        }
    }

    Ok(())
}

fn default_prefixes() -> Vec<(String, String)> {
    vec![
        ("rdf".to_string(), RDF_NS.to_string()),
        ("rdfs".to_string(), RDFS_NS.to_string()),
        ("xsd".to_string(), XSD_NS.to_string()),
    ]
}

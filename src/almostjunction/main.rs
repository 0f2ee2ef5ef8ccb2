// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use waycheck::config::{OutputFormat, ValidatorConfig};
use waycheck::export::{Report, write_report};
use waycheck::graph::Graph;
use waycheck::measurement::measure;
use waycheck::osm_loader::{load_highways, parse_bbox};
use waycheck::osm_types::{EntityId, NodeId, WayId};
use waycheck::spatial_index::WayTree;
use waycheck::validations::almost_junction::HighwayAlmostJunction;
use waycheck::validations::{Changes, Fix, Validation, run_validations};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to an OSM PBF extract.
    /// Can also be set via OSM_PBF env var.
    #[arg(long, env = "OSM_PBF")]
    osm_pbf: PathBuf,

    /// RON config file. Flags given on the command line take precedence.
    #[arg(long, env = "WAYCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Restrict loading to min_lon,min_lat,max_lon,max_lat
    #[arg(long)]
    bbox: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report highway ends that almost meet another highway
    Check {
        /// Ways to treat as edited. Defaults to every loaded highway.
        #[arg(long = "way", value_delimiter = ',')]
        ways: Vec<i64>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Write here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Apply suggested fixes to the loaded graph and list them
        #[arg(long)]
        apply_fixes: bool,
    },
    /// Print measurements for a selection of nodes and ways
    Measure {
        #[arg(long = "node", value_delimiter = ',')]
        nodes: Vec<i64>,

        #[arg(long = "way", value_delimiter = ',')]
        ways: Vec<i64>,

        #[arg(long)]
        imperial: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };

    let bbox = match &args.bbox {
        Some(text) => Some(parse_bbox(text).ok_or_else(|| anyhow!("invalid --bbox: {}", text))?),
        None => config.bbox_extent(),
    };

    let mut graph = load_highways(&args.osm_pbf, bbox)
        .with_context(|| format!("loading {}", args.osm_pbf.display()))?;
    info!(
        "Graph has {} nodes and {} ways",
        graph.node_count(),
        graph.way_count()
    );

    match args.command {
        Command::Check {
            ways,
            format,
            output,
            apply_fixes,
        } => {
            if let Some(format) = format {
                config.format = format;
            }
            config.apply_fixes |= apply_fixes;
            check(&mut graph, &config, ways, output)
        }
        Command::Measure {
            nodes,
            ways,
            imperial,
        } => {
            let selection: Vec<EntityId> = nodes
                .into_iter()
                .map(|id| EntityId::Node(NodeId(id)))
                .chain(ways.into_iter().map(|id| EntityId::Way(WayId(id))))
                .collect();
            let m = measure(&graph, &selection)?;
            if let Some(heading) = &m.heading {
                println!("{}", heading);
            }
            for (label, value) in m.rows(imperial || config.imperial) {
                println!("  {}: {}", label, value);
            }
            Ok(())
        }
    }
}

fn check(
    graph: &mut Graph,
    config: &ValidatorConfig,
    ways: Vec<i64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let modified = if ways.is_empty() {
        let mut all: Vec<WayId> = graph.ways().map(|w| w.id).collect();
        all.sort_unstable();
        all
    } else {
        let (known, unknown): (Vec<WayId>, Vec<WayId>) = ways
            .into_iter()
            .map(WayId)
            .partition(|id| graph.has_entity(EntityId::Way(*id)));
        if !unknown.is_empty() {
            warn!("Skipping ways that were not loaded: {:?}", unknown);
        }
        known
    };
    let changes = Changes {
        created: Vec::new(),
        modified,
    };

    let tree = WayTree::build(graph)?;
    info!("Indexed {} ways", tree.size());

    let rules: [&dyn Validation; 1] = [&HighwayAlmostJunction];
    let issues = run_validations(&rules, &changes, graph, &tree);
    info!("Found {} issues", issues.len());

    let mut applied: Vec<Fix> = Vec::new();
    if config.apply_fixes {
        for fix in issues.iter().flat_map(|issue| issue.fixes.iter()) {
            let current = graph.node(fix.target)?.tags.clone();
            // an end can be reported more than once when a way is both created and modified
            if fix.merged_tags(&current) == current {
                continue;
            }
            match fix.apply(&current, graph) {
                Ok(()) => applied.push(fix.clone()),
                Err(e) => warn!("could not apply fix to {}: {}", fix.target, e),
            }
        }
        info!("Applied {} fixes", applied.len());
    }

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let report = Report {
        issues: &issues,
        applied_fixes: &applied,
    };
    write_report(writer, config.format, &report).context("writing report")?;
    Ok(())
}

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use dynmbe::common::Partition;
use dynmbe::graph::BipartiteGraph;
use dynmbe::miner::mine_maximal;
use log::{info, warn};

use super::ingest::{read_edges, read_vertices};

#[derive(Debug, Args)]
pub struct MineArgs {
    /// Specify the left-partition vertex CSV.
    #[arg(long, value_name = "CSV_FILE")]
    left: PathBuf,
    /// Specify the right-partition vertex CSV.
    #[arg(long, value_name = "CSV_FILE")]
    right: PathBuf,
    /// Specify the edge CSV, one (left, right) record per line.
    #[arg(short, long, value_name = "CSV_FILE")]
    edges: PathBuf,
    /// Write the maximal set as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn mine(args: MineArgs) {
    let mut graph = BipartiteGraph::new();
    graph.insert_all_vertices(read_vertices(&args.left, Partition::Left).unwrap());
    graph.insert_all_vertices(read_vertices(&args.right, Partition::Right).unwrap());
    for edge in read_edges(&args.edges).unwrap() {
        if let Err(rejection) = graph.insert_edge(edge) {
            warn!("{rejection}");
        }
    }
    info!(
        "graph: {} vertices, {} edges",
        graph.num_vertices(),
        graph.num_edges()
    );
    let start = Instant::now();
    let bicliques: BTreeSet<_> = mine_maximal(&graph).into_iter().collect();
    info!("mine: {} s", start.elapsed().as_secs_f64());
    println!("maximal bicliques: {}", bicliques.len());
    if let Some(path) = args.output {
        let file = File::create(path).unwrap();
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &bicliques).unwrap();
    }
}

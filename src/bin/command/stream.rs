use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use dynmbe::common::Partition;
use dynmbe::process::StreamProcessor;
use log::info;

use super::ingest::{read_edges, read_vertices};

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Specify the left-partition vertex CSV.
    #[arg(long, value_name = "CSV_FILE")]
    left: PathBuf,
    /// Specify the right-partition vertex CSV.
    #[arg(long, value_name = "CSV_FILE")]
    right: PathBuf,
    /// Specify the edge CSV, one (left, right) record per line.
    #[arg(short, long, value_name = "CSV_FILE")]
    edges: PathBuf,
    /// Specify the execution strategy: sync, async or pipelined.
    #[arg(short, long, default_value = "sync")]
    strategy: String,
    /// Specify the concurrency (K for async, pool size for pipelined).
    #[arg(short, long, default_value = "4")]
    workers: usize,
    /// Write the final maximal set as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn stream(args: StreamArgs) {
    let vertices_l = read_vertices(&args.left, Partition::Left).unwrap();
    let vertices_r = read_vertices(&args.right, Partition::Right).unwrap();
    let edges = read_edges(&args.edges).unwrap();
    let mut processor = match args.strategy.as_str() {
        "sync" => StreamProcessor::synchronous(),
        "async" => StreamProcessor::asynchronous(args.workers).unwrap(),
        "pipelined" => StreamProcessor::pipelined(args.workers).unwrap(),
        _ => panic!("Invalid strategy"),
    };
    processor.initialize(vertices_l, vertices_r);
    let start = Instant::now();
    for edge in edges {
        processor.process_edge(edge);
    }
    let summary = processor.finalize();
    info!("stream: {} s", start.elapsed().as_secs_f64());
    let stats = &summary.statistics;
    println!(
        "edges: {}, skipped: {}, faults: {}, maximal bicliques: {}",
        stats.edges_processed,
        stats.edges_skipped,
        stats.mining_faults,
        summary.maximal_set.len()
    );
    if let Some(path) = args.output {
        let file = File::create(path).unwrap();
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &summary.maximal_set).unwrap();
    }
}

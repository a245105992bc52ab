mod command;

use std::thread;

use clap::Parser;
use mimalloc::MiMalloc;

use crate::command::*;

#[global_allocator]
static ALLOC: MiMalloc = MiMalloc;

/// Incremental maximal biclique enumeration over streaming bipartite edges.
#[derive(Parser)]
#[command(version, about)]
#[command(propagate_version = true)]
enum Command {
    /// Stream an edge file through an execution strategy.
    Stream(StreamArgs),
    /// Load the whole graph and mine its maximal bicliques once.
    Mine(MineArgs),
}

const STACK_SIZE: usize = 128 * 1024 * 1024;

fn main() {
    env_logger::init();
    let handle = thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(|| {
            let command = Command::parse();
            match command {
                Command::Stream(args) => stream(args),
                Command::Mine(args) => mine(args),
            }
        })
        .unwrap();
    handle.join().unwrap()
}

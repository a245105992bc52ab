pub mod biclique;
pub mod common;
pub mod error;
pub mod graph;
pub mod miner;
pub mod process;
#[cfg(test)]
mod test_utils;

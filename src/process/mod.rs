use std::collections::{BTreeSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ahash::HashSet;
use log::{debug, error};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::biclique::{Biclique, MaximalBicliqueSet};
use crate::common::{Edge, Vertex};
use crate::error::{DynMbeError, DynMbeResult, EdgeRejection};
use crate::graph::BipartiteGraph;
use crate::miner::mine_maximal;

/// Result of admitting one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Rejected at admission; no state changed.
    Skipped(EdgeRejection),
    /// Mined and merged before returning (synchronous strategy).
    Updated { new_bicliques: usize },
    /// Mining is in flight; the result is released in arrival order.
    Admitted,
}

#[derive(Debug, Clone)]
pub struct EdgeMetric {
    pub seq: u64,
    pub edge: Edge,
    pub elapsed: Duration,
    pub new_bicliques: usize,
}

/// Run-level audit trail. A non-zero fault count means the final set may
/// be missing bicliques from the faulted edges.
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    pub edges_processed: usize,
    pub edges_skipped: usize,
    pub mining_faults: usize,
    pub metrics: Vec<EdgeMetric>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub maximal_set: BTreeSet<Biclique>,
    pub statistics: RunStatistics,
}

/// Incremental maximal biclique enumeration over an edge stream.
///
/// All three strategies share this core: graph mutation is serialized in
/// arrival order through `&mut self`, mining always runs on an immutable
/// induced-subgraph snapshot, and every merge holds the global set for one
/// read-modify-write critical section. Only scheduling differs, so the
/// final maximal set is identical across strategies.
pub struct StreamProcessor {
    graph: BipartiteGraph,
    global: Arc<Mutex<MaximalBicliqueSet>>,
    policy: ExecutionPolicy,
    stats: RunStatistics,
    next_seq: u64,
}

enum ExecutionPolicy {
    /// Mine and merge on the caller thread before returning.
    Immediate,
    /// Up to `capacity` mining tasks in flight; completions are released
    /// to the merge step strictly in arrival order, and admission blocks
    /// on the oldest pending completion once the buffer is full.
    BoundedAsync {
        pool: Arc<ThreadPool>,
        capacity: usize,
        pending: VecDeque<PendingMine>,
    },
    /// Caller thread snapshots, a worker pool mines, one merger thread
    /// serializes merges in completion order.
    Pipelined {
        pool: Arc<ThreadPool>,
        completion_tx: Sender<MineCompletion>,
        merger: JoinHandle<MergerLog>,
    },
}

struct PendingMine {
    seq: u64,
    edge: Edge,
    started: Instant,
    receiver: oneshot::Receiver<Option<HashSet<Biclique>>>,
}

struct MineCompletion {
    seq: u64,
    edge: Edge,
    started: Instant,
    /// None marks a faulted mining task.
    bicliques: Option<HashSet<Biclique>>,
}

#[derive(Default)]
struct MergerLog {
    metrics: Vec<EdgeMetric>,
    mining_faults: usize,
}

impl StreamProcessor {
    pub fn synchronous() -> Self {
        Self::with_policy(ExecutionPolicy::Immediate)
    }

    pub fn asynchronous(max_in_flight: usize) -> DynMbeResult<Self> {
        if max_in_flight == 0 {
            let err = "asynchronous strategy needs a concurrency bound of at least 1".to_string();
            return Err(DynMbeError::Process(err));
        }
        let pool = build_mining_pool(max_in_flight)?;
        Ok(Self::with_policy(ExecutionPolicy::BoundedAsync {
            pool,
            capacity: max_in_flight,
            pending: VecDeque::new(),
        }))
    }

    pub fn pipelined(workers: usize) -> DynMbeResult<Self> {
        if workers == 0 {
            let err = "pipelined strategy needs at least 1 worker".to_string();
            return Err(DynMbeError::Process(err));
        }
        let pool = build_mining_pool(workers)?;
        let global = Arc::new(Mutex::new(MaximalBicliqueSet::new()));
        let (completion_tx, completion_rx) = mpsc::channel();
        let merger = spawn_merger(completion_rx, global.clone())?;
        Ok(Self {
            graph: BipartiteGraph::new(),
            global,
            policy: ExecutionPolicy::Pipelined {
                pool,
                completion_tx,
                merger,
            },
            stats: RunStatistics::default(),
            next_seq: 0,
        })
    }

    fn with_policy(policy: ExecutionPolicy) -> Self {
        Self {
            graph: BipartiteGraph::new(),
            global: Arc::new(Mutex::new(MaximalBicliqueSet::new())),
            policy,
            stats: RunStatistics::default(),
            next_seq: 0,
        }
    }

    /// One-time registration of the vertex universe, before streaming.
    pub fn initialize(
        &mut self,
        vertices_l: impl IntoIterator<Item = Vertex>,
        vertices_r: impl IntoIterator<Item = Vertex>,
    ) {
        self.graph.insert_all_vertices(vertices_l);
        self.graph.insert_all_vertices(vertices_r);
    }

    pub fn graph(&self) -> &BipartiteGraph {
        &self.graph
    }

    /// Statistics gathered so far. Concurrent strategies only account for
    /// completions already released; `finalize` delivers the full picture.
    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// Point-in-time snapshot of the global maximal set.
    pub fn current_maximal_set(&self) -> BTreeSet<Biclique> {
        lock_global(&self.global).snapshot()
    }

    pub fn process_edge(&mut self, edge: Edge) -> EdgeOutcome {
        let started = Instant::now();
        if let Err(rejection) = self.graph.insert_edge(edge) {
            debug!("edge {edge} skipped: {rejection}");
            self.stats.edges_skipped += 1;
            return EdgeOutcome::Skipped(rejection);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.stats.edges_processed += 1;
        // Snapshot after the insert, so the local closure reflects the new
        // edge; from here on mining never touches the live graph.
        let snapshot = self.graph.induced_subgraph(&edge);
        match &mut self.policy {
            ExecutionPolicy::Immediate => {
                let completion = MineCompletion {
                    seq,
                    edge,
                    started,
                    bicliques: Some(mine_maximal(&snapshot)),
                };
                let (metric, faulted) = apply_completion(&self.global, completion);
                debug_assert!(!faulted);
                let new_bicliques = metric.new_bicliques;
                self.stats.metrics.push(metric);
                EdgeOutcome::Updated { new_bicliques }
            }
            ExecutionPolicy::BoundedAsync {
                pool,
                capacity,
                pending,
            } => {
                // Backpressure: block on the oldest completion once the
                // reorder buffer is full.
                while pending.len() >= *capacity {
                    let released = pending.pop_front().map(await_pending);
                    if let Some(completion) = released {
                        let (metric, faulted) = apply_completion(&self.global, completion);
                        if faulted {
                            self.stats.mining_faults += 1;
                        }
                        self.stats.metrics.push(metric);
                    }
                }
                let (sender, receiver) = oneshot::channel();
                pool.spawn(move || {
                    let result =
                        panic::catch_unwind(AssertUnwindSafe(|| mine_maximal(&snapshot))).ok();
                    let _ = sender.send(result);
                });
                pending.push_back(PendingMine {
                    seq,
                    edge,
                    started,
                    receiver,
                });
                EdgeOutcome::Admitted
            }
            ExecutionPolicy::Pipelined { pool, completion_tx, .. } => {
                let sender = completion_tx.clone();
                pool.spawn(move || {
                    let bicliques =
                        panic::catch_unwind(AssertUnwindSafe(|| mine_maximal(&snapshot))).ok();
                    let _ = sender.send(MineCompletion {
                        seq,
                        edge,
                        started,
                        bicliques,
                    });
                });
                EdgeOutcome::Admitted
            }
        }
    }

    /// Drains all in-flight work and materializes the final maximal set.
    pub fn finalize(self) -> RunSummary {
        let StreamProcessor {
            global,
            policy,
            mut stats,
            ..
        } = self;
        match policy {
            ExecutionPolicy::Immediate => {}
            ExecutionPolicy::BoundedAsync { mut pending, .. } => {
                while let Some(oldest) = pending.pop_front() {
                    let (metric, faulted) = apply_completion(&global, await_pending(oldest));
                    if faulted {
                        stats.mining_faults += 1;
                    }
                    stats.metrics.push(metric);
                }
            }
            ExecutionPolicy::Pipelined {
                pool,
                completion_tx,
                merger,
            } => {
                // The merger exits once every in-flight task has reported
                // and the last sender clone is gone.
                drop(completion_tx);
                let log = match merger.join() {
                    Ok(log) => log,
                    Err(_) => {
                        error!("merger thread panicked; metrics are lost");
                        MergerLog::default()
                    }
                };
                drop(pool);
                stats.mining_faults += log.mining_faults;
                stats.metrics.extend(log.metrics);
                stats.metrics.sort_by_key(|m| m.seq);
            }
        }
        let maximal_set = lock_global(&global).snapshot();
        RunSummary {
            maximal_set,
            statistics: stats,
        }
    }
}

fn build_mining_pool(threads: usize) -> DynMbeResult<Arc<ThreadPool>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("dynmbe-miner-{i}"))
        .build()?;
    Ok(Arc::new(pool))
}

fn spawn_merger(
    completion_rx: Receiver<MineCompletion>,
    global: Arc<Mutex<MaximalBicliqueSet>>,
) -> DynMbeResult<JoinHandle<MergerLog>> {
    let handle = thread::Builder::new()
        .name("dynmbe-merger".to_string())
        .spawn(move || {
            let mut log = MergerLog::default();
            while let Ok(completion) = completion_rx.recv() {
                let (metric, faulted) = apply_completion(&global, completion);
                if faulted {
                    log.mining_faults += 1;
                }
                log.metrics.push(metric);
            }
            log
        })?;
    Ok(handle)
}

fn await_pending(pending: PendingMine) -> MineCompletion {
    let PendingMine {
        seq,
        edge,
        started,
        receiver,
    } = pending;
    // A dropped sender means the mining task died before reporting.
    let bicliques = receiver.recv().ok().flatten();
    MineCompletion {
        seq,
        edge,
        started,
        bicliques,
    }
}

/// The one atomic critical section over the global set: check, add and
/// evict subsumed members under a single lock.
fn apply_completion(
    global: &Mutex<MaximalBicliqueSet>,
    completion: MineCompletion,
) -> (EdgeMetric, bool) {
    let MineCompletion {
        seq,
        edge,
        started,
        bicliques,
    } = completion;
    let (new_bicliques, faulted) = match bicliques {
        Some(found) => (lock_global(global).merge_all(found), false),
        None => {
            error!("mining task for edge {edge} faulted; it contributes no bicliques");
            (0, true)
        }
    };
    let elapsed = started.elapsed();
    debug!(
        "edge {edge}: {new_bicliques} new maximal bicliques, {} s",
        elapsed.as_secs_f64()
    );
    (
        EdgeMetric {
            seq,
            edge,
            elapsed,
            new_bicliques,
        },
        faulted,
    )
}

fn lock_global(global: &Mutex<MaximalBicliqueSet>) -> MutexGuard<'_, MaximalBicliqueSet> {
    global.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use maplit::btreeset;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::test_utils::{edge, lv, rv};

    fn biclique(left: &[u64], right: &[u64]) -> Biclique {
        Biclique::new(
            left.iter().map(|id| lv(*id)).collect(),
            right.iter().map(|id| rv(*id)).collect(),
        )
    }

    fn initialized(mut processor: StreamProcessor, num_l: u64, num_r: u64) -> StreamProcessor {
        processor.initialize((0..num_l).map(lv), (0..num_r).map(rv));
        processor
    }

    #[test]
    fn test_scenario_single_edge() {
        let mut processor = initialized(StreamProcessor::synchronous(), 2, 2);
        assert_eq!(
            processor.process_edge(edge(0, 0)),
            EdgeOutcome::Updated { new_bicliques: 1 }
        );
        assert_eq!(
            processor.current_maximal_set(),
            btreeset! {biclique(&[0], &[0])}
        );
    }

    #[test]
    fn test_scenario_duplicate_is_skipped() {
        let mut processor = initialized(StreamProcessor::synchronous(), 2, 2);
        processor.process_edge(edge(0, 0));
        let before = processor.current_maximal_set();
        assert_eq!(
            processor.process_edge(edge(0, 0)),
            EdgeOutcome::Skipped(EdgeRejection::DuplicateEdge(edge(0, 0)))
        );
        assert_eq!(processor.current_maximal_set(), before);
        assert_eq!(processor.statistics().edges_skipped, 1);
        assert_eq!(processor.statistics().edges_processed, 1);
    }

    #[test]
    fn test_scenario_incremental_growth() {
        // L={a=0,b=1}, R={1=0,2=1}; edges (a,1),(b,1),(a,2).
        let mut processor = initialized(StreamProcessor::synchronous(), 2, 2);
        processor.process_edge(edge(0, 0));
        processor.process_edge(edge(1, 0));
        processor.process_edge(edge(0, 1));
        assert_eq!(
            processor.current_maximal_set(),
            btreeset! {
                biclique(&[0, 1], &[0]),
                biclique(&[0], &[0, 1]),
            }
        );
    }

    #[test]
    fn test_scenario_subsumption() {
        // Scenario D: (b,2) completes K2,2 and subsumes both prior members.
        let mut processor = initialized(StreamProcessor::synchronous(), 2, 2);
        processor.process_edge(edge(0, 0));
        processor.process_edge(edge(1, 0));
        processor.process_edge(edge(0, 1));
        assert_eq!(
            processor.process_edge(edge(1, 1)),
            EdgeOutcome::Updated { new_bicliques: 1 }
        );
        assert_eq!(
            processor.current_maximal_set(),
            btreeset! {biclique(&[0, 1], &[0, 1])}
        );
    }

    #[test]
    fn test_malformed_edges_are_rejected_without_mutation() {
        let mut processor = initialized(StreamProcessor::synchronous(), 2, 2);
        assert_eq!(
            processor.process_edge(edge(0, 9)),
            EdgeOutcome::Skipped(EdgeRejection::UnknownVertex(rv(9)))
        );
        let swapped = Edge::new(rv(0), lv(0));
        assert_eq!(
            processor.process_edge(swapped),
            EdgeOutcome::Skipped(EdgeRejection::PartitionMismatch(swapped))
        );
        assert_eq!(processor.graph().num_edges(), 0);
        assert!(processor.current_maximal_set().is_empty());
    }

    fn random_stream(seed: u64, num_l: u64, num_r: u64, len: usize) -> Vec<Edge> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|_| edge(rng.gen_range(0..num_l), rng.gen_range(0..num_r)))
            .collect()
    }

    fn run(mut processor: StreamProcessor, stream: &[Edge]) -> RunSummary {
        processor.initialize((0..6).map(lv), (0..6).map(rv));
        for e in stream {
            processor.process_edge(*e);
        }
        processor.finalize()
    }

    #[test]
    fn test_strategy_equivalence() {
        for seed in 0..4 {
            let stream = random_stream(seed, 6, 6, 40);
            let sync = run(StreamProcessor::synchronous(), &stream);
            let bounded = run(StreamProcessor::asynchronous(3).unwrap(), &stream);
            let pipelined = run(StreamProcessor::pipelined(2).unwrap(), &stream);
            assert_eq!(sync.maximal_set, bounded.maximal_set);
            assert_eq!(sync.maximal_set, pipelined.maximal_set);
        }
    }

    #[test]
    fn test_incremental_matches_static_remine() {
        let stream = random_stream(7, 6, 6, 40);
        let mut processor = initialized(StreamProcessor::synchronous(), 6, 6);
        for e in &stream {
            processor.process_edge(*e);
        }
        let from_scratch: BTreeSet<_> = mine_maximal(processor.graph()).into_iter().collect();
        assert_eq!(processor.current_maximal_set(), from_scratch);
    }

    #[test]
    fn test_async_metrics_released_in_arrival_order() {
        let stream = random_stream(11, 6, 6, 30);
        let summary = run(StreamProcessor::asynchronous(2).unwrap(), &stream);
        let seqs: Vec<_> = summary.statistics.metrics.iter().map(|m| m.seq).collect();
        let expected: Vec<_> = (0..seqs.len() as u64).collect();
        assert_eq!(seqs, expected);
        assert_eq!(
            summary.statistics.edges_processed,
            summary.statistics.metrics.len()
        );
    }

    #[test]
    fn test_pipelined_metrics_cover_every_edge() {
        let stream = random_stream(13, 6, 6, 30);
        let summary = run(StreamProcessor::pipelined(3).unwrap(), &stream);
        let seqs: Vec<_> = summary.statistics.metrics.iter().map(|m| m.seq).collect();
        let expected: Vec<_> = (0..seqs.len() as u64).collect();
        assert_eq!(seqs, expected);
        assert_eq!(summary.statistics.mining_faults, 0);
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        assert!(StreamProcessor::asynchronous(0).is_err());
        assert!(StreamProcessor::pipelined(0).is_err());
    }
}

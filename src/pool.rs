//! Per-query worker pool.
//!
//! Each query gets its own small work-stealing pool: a global injector
//! seeded with the root task, one FIFO deque per worker, and sibling
//! stealers for balance. Emitted results funnel through a bounded
//! channel back to the caller; capacity 0 (the default) makes every
//! send a rendezvous, so producers are back-pressured by consumption.
//!
//! Termination: an in-flight counter covers every queued or running
//! task. Children are counted before their parent retires, so the
//! counter only reaches zero when the whole search is exhausted; idle
//! workers then exit and drop their senders, closing the stream.
//!
//! Cancellation: dropping the result stream makes the next send fail,
//! which trips the stop flag; every worker checks it between tasks.
//! A fatal resolution error travels the same path, after being
//! forwarded to the consumer.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use crossbeam_deque::{Injector, Steal, Stealer, Worker as Deque};

use crate::engine::EngineError;
use crate::index::Index;
use crate::resolve::{self, Step, Task};
use crate::symbol::SymbolStore;
use crate::term::Atom;

#[cfg(feature = "tracing")]
use crate::trace::debug;

/// Configuration for query evaluation.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker threads per query.
    pub num_workers: usize,
    /// Result channel capacity; 0 makes every send a rendezvous.
    pub result_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus(),
            result_capacity: 0,
        }
    }
}

/// Number of CPUs (fallback to 1).
fn num_cpus() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Counters for one query's pool run. Relaxed ordering; exact once the
/// stream has closed.
#[derive(Debug, Default)]
pub struct PoolStats {
    pub tasks_spawned: AtomicUsize,
    pub tasks_completed: AtomicUsize,
    pub results_emitted: AtomicUsize,
}

/// State shared by all workers of one query.
struct Shared {
    injector: Injector<Task>,
    index: Arc<Index>,
    symbols: Arc<SymbolStore>,
    query: Atom,
    /// Tasks queued or running; the pool is done at zero.
    pending: AtomicUsize,
    stop: AtomicBool,
    stats: Arc<PoolStats>,
}

type ResultSender = Sender<Result<Atom, EngineError>>;

/// Launch the pool for one query and hand back the lazy result stream.
pub(crate) fn spawn_query(
    query: Atom,
    index: Arc<Index>,
    symbols: Arc<SymbolStore>,
    config: &PoolConfig,
) -> QueryResults {
    let (tx, rx) = bounded(config.result_capacity);
    let stats = Arc::new(PoolStats::default());
    let shared = Arc::new(Shared {
        injector: Injector::new(),
        index,
        symbols,
        query: query.clone(),
        pending: AtomicUsize::new(1),
        stop: AtomicBool::new(false),
        stats: Arc::clone(&stats),
    });
    shared.injector.push(Task::root(query));
    shared.stats.tasks_spawned.fetch_add(1, Ordering::Relaxed);

    let num_workers = config.num_workers.max(1);
    let locals: Vec<Deque<Task>> = (0..num_workers).map(|_| Deque::new_fifo()).collect();
    let stealers: Arc<Vec<Stealer<Task>>> =
        Arc::new(locals.iter().map(|local| local.stealer()).collect());

    #[cfg(feature = "tracing")]
    debug!(num_workers, "query_pool_start");

    for (id, local) in locals.into_iter().enumerate() {
        let shared = Arc::clone(&shared);
        let stealers = Arc::clone(&stealers);
        let tx = tx.clone();
        thread::spawn(move || worker_loop(id, local, stealers, shared, tx));
    }
    // workers hold the only senders now; the stream closes when the
    // last of them exits
    drop(tx);

    QueryResults { rx, stats }
}

fn worker_loop(
    id: usize,
    local: Deque<Task>,
    stealers: Arc<Vec<Stealer<Task>>>,
    shared: Arc<Shared>,
    tx: ResultSender,
) {
    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }
        match find_task(id, &local, &stealers, &shared.injector) {
            Some(task) => process(task, &local, &shared, &tx),
            None => {
                if shared.pending.load(Ordering::Acquire) == 0 {
                    break;
                }
                thread::yield_now();
            }
        }
    }
    #[cfg(feature = "tracing")]
    debug!(worker = id, "query_worker_exit");
}

/// Local queue first, then the injector, then the siblings.
fn find_task(
    id: usize,
    local: &Deque<Task>,
    stealers: &[Stealer<Task>],
    injector: &Injector<Task>,
) -> Option<Task> {
    if let Some(task) = local.pop() {
        return Some(task);
    }

    loop {
        match injector.steal() {
            Steal::Success(task) => return Some(task),
            Steal::Empty => break,
            Steal::Retry => continue,
        }
    }

    for (other, stealer) in stealers.iter().enumerate() {
        if other == id {
            continue;
        }
        loop {
            match stealer.steal() {
                Steal::Success(task) => return Some(task),
                Steal::Empty => break,
                Steal::Retry => continue,
            }
        }
    }

    None
}

fn process(task: Task, local: &Deque<Task>, shared: &Shared, tx: &ResultSender) {
    match resolve::step(task, &shared.index, &shared.symbols) {
        Ok(Step::Expand(children)) => {
            // count children before this task retires so the pending
            // counter can never dip to zero with work outstanding
            shared.pending.fetch_add(children.len(), Ordering::AcqRel);
            shared
                .stats
                .tasks_spawned
                .fetch_add(children.len(), Ordering::Relaxed);
            for child in children {
                local.push(child);
            }
        }
        Ok(Step::Solved(mut env)) => {
            env.collapse();
            let atom = resolve::materialize(&shared.query, &env);
            shared.stats.results_emitted.fetch_add(1, Ordering::Relaxed);
            if tx.send(Ok(atom)).is_err() {
                // consumer hung up; unwind the whole search
                shared.stop.store(true, Ordering::Release);
            }
        }
        Err(err) => {
            let _ = tx.send(Err(err));
            shared.stop.store(true, Ordering::Release);
        }
    }
    shared.stats.tasks_completed.fetch_add(1, Ordering::Relaxed);
    shared.pending.fetch_sub(1, Ordering::AcqRel);
}

/// The lazy, unordered stream of ground result atoms for one query.
///
/// Iteration blocks until the next result or end-of-stream; dropping
/// the stream cancels the remaining search.
pub struct QueryResults {
    rx: Receiver<Result<Atom, EngineError>>,
    stats: Arc<PoolStats>,
}

impl QueryResults {
    /// Drain the stream, failing on the first fatal error.
    pub fn try_collect(self) -> Result<Vec<Atom>, EngineError> {
        let mut out = Vec::new();
        for item in self {
            out.push(item?);
        }
        Ok(out)
    }

    /// Counters of the pool run feeding this stream.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

impl Iterator for QueryResults {
    type Item = Result<Atom, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

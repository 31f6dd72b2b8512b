//! Work partitioning, aggregation and the parallel counting drivers.
//!
//! The counter itself is sequential. Parallelism comes only from splitting the
//! work units (canonical first columns, or second rows on the legacy path)
//! across workers that share the read-only derangement cache and nothing else.
//! Each unit's result is multiplied by the symmetry factor exactly once and the
//! partial counts are summed.

use crate::counter::{CompletionCount, RectangleCounter, SignedCount};
use crate::derangement::DerangementCache;
use crate::error::{check_dimensions, LatinError};
use crate::first_column::{check_first_column, enumerate_first_columns, get_symmetry_factor};
use crossbeam::queue::ArrayQueue;
use rayon::prelude::*;
use std::io::Write;
use std::ops::AddAssign;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

// ============================================================================
// Configuration
// ============================================================================

/// What one work unit is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Partition {
    /// One canonical first column, scaled by `(r-1)!`.
    Canonical,
    /// One second-row derangement, unscaled (no symmetry reduction).
    SecondRow,
}

/// How work units are spread over threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Executor {
    /// A dedicated rayon pool with `workers` threads.
    Rayon,
    /// Scoped threads draining a bounded lock-free queue.
    Queue,
}

/// Counting run parameters.
#[derive(Clone, Debug)]
pub struct CountConfig {
    /// Number of rows `r`.
    pub rows: usize,
    /// Order `n`.
    pub order: usize,
    /// Worker threads.
    pub workers: usize,
    /// Work unit kind.
    pub partition: Partition,
    /// Thread scheduling.
    pub executor: Executor,
    /// Also derive the `(n, n)` counts (requires `rows == order - 1`).
    pub completion: bool,
    /// Count a single first column instead of all canonical ones (no symmetry factor).
    pub first_column: Option<Vec<u8>>,
    /// Print progress every this many finished units (0 disables).
    pub report_every: usize,
}

impl Default for CountConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(4);

        Self {
            rows: 5,
            order: 6,
            workers,
            partition: Partition::Canonical,
            executor: Executor::Rayon,
            completion: false,
            first_column: None,
            report_every: 0,
        }
    }
}

/// Result of [`run_count`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountReport {
    /// The `(r, n)` counts.
    pub rectangles: SignedCount,
    /// The `(n, n)` counts, when completion was requested.
    pub completed: Option<SignedCount>,
    /// Number of work units processed.
    pub units: usize,
    /// Wall-clock time of the counting phase.
    pub elapsed: Duration,
}

// ============================================================================
// Splitting
// ============================================================================

fn check_parts(parts: usize) -> Result<(), LatinError> {
    if parts == 0 {
        return Err(LatinError::InvalidPartition("need at least one part".to_string()));
    }
    Ok(())
}

/// Splits `items` into `parts` contiguous, balanced, order-preserving chunks.
///
/// Chunks may be empty when `parts > items.len()`.
///
/// # Errors
/// Returns [`LatinError::InvalidPartition`] if `parts == 0`.
pub fn partition_contiguous<T: Clone>(items: &[T], parts: usize) -> Result<Vec<Vec<T>>, LatinError> {
    check_parts(parts)?;
    let len = items.len();
    Ok((0..parts)
        .map(|p| items[p * len / parts..(p + 1) * len / parts].to_vec())
        .collect())
}

/// Deals `items` into `parts` chunks round-robin (item `i` goes to chunk `i % parts`).
///
/// # Errors
/// Returns [`LatinError::InvalidPartition`] if `parts == 0`.
pub fn partition_round_robin<T: Clone>(items: &[T], parts: usize) -> Result<Vec<Vec<T>>, LatinError> {
    check_parts(parts)?;
    let mut out = vec![Vec::with_capacity(items.len() / parts + 1); parts];
    for (i, item) in items.iter().enumerate() {
        out[i % parts].push(item.clone());
    }
    Ok(out)
}

// ============================================================================
// Aggregation
// ============================================================================

/// Sums the counts of a set of canonical first columns, each scaled by `(r-1)!`.
///
/// # Errors
/// Propagates the first counting error.
pub fn count_partition(
    r: usize,
    columns: &[Vec<u8>],
    cache: &DerangementCache,
) -> Result<SignedCount, LatinError> {
    let counter = RectangleCounter::new(cache);
    let factor = get_symmetry_factor(r)?;
    let mut total = SignedCount::default();
    for column in columns {
        total += counter.count(r, Some(column.as_slice()))?.scaled(factor);
    }
    Ok(total)
}

/// Completion-mode variant of [`count_partition`].
///
/// # Errors
/// Propagates the first counting error.
pub fn count_partition_with_completion(
    r: usize,
    columns: &[Vec<u8>],
    cache: &DerangementCache,
) -> Result<CompletionCount, LatinError> {
    let counter = RectangleCounter::new(cache);
    let factor = get_symmetry_factor(r)?;
    let mut total = CompletionCount::default();
    for column in columns {
        total += counter.count_with_completion(r, Some(column.as_slice()))?.scaled(factor);
    }
    Ok(total)
}

// ============================================================================
// Executors
// ============================================================================

/// Shared finished-unit counter for progress lines.
struct Progress {
    done: AtomicUsize,
    total: usize,
    report_every: usize,
    start: Instant,
}

impl Progress {
    fn new(total: usize, report_every: usize) -> Self {
        Self { done: AtomicUsize::new(0), total, report_every, start: Instant::now() }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.report_every > 0 && (done.is_multiple_of(self.report_every) || done == self.total) {
            print!(
                "\rUnits: {done}/{} | elapsed {:.1}s    ",
                self.total,
                self.start.elapsed().as_secs_f64()
            );
            let _ = std::io::stdout().flush();
            if done == self.total {
                println!();
            }
        }
    }
}

/// Runs `job` over `items` on a dedicated rayon pool and sums the results.
fn run_rayon<W, T, F>(items: &[W], workers: usize, progress: &Progress, job: F) -> Result<T, LatinError>
where
    W: Sync,
    T: Send + Default + AddAssign,
    F: Fn(&W) -> Result<T, LatinError> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| LatinError::ThreadPool(e.to_string()))?;
    pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let result = job(item);
                progress.tick();
                result
            })
            .try_reduce(T::default, |mut acc, part| {
                acc += part;
                Ok(acc)
            })
    })
}

/// Drains a bounded lock-free queue of unit indices with `workers` scoped threads.
///
/// Workers check `cancel` between units, never inside one. The first error stops
/// the remaining workers and is returned. Also returns how many units finished.
///
/// # Errors
/// The first unit error, or [`LatinError::ThreadPool`] if a worker panicked.
pub fn drain_queue<W, T, F>(
    items: &[W],
    workers: usize,
    cancel: &AtomicBool,
    job: F,
) -> Result<(T, usize), LatinError>
where
    W: Sync,
    T: Send + Default + AddAssign,
    F: Fn(&W) -> Result<T, LatinError> + Sync,
{
    let progress = Progress::new(items.len(), 0);
    drain_queue_with_progress(items, workers, cancel, &progress, job)
}

fn drain_queue_with_progress<W, T, F>(
    items: &[W],
    workers: usize,
    cancel: &AtomicBool,
    progress: &Progress,
    job: F,
) -> Result<(T, usize), LatinError>
where
    W: Sync,
    T: Send + Default + AddAssign,
    F: Fn(&W) -> Result<T, LatinError> + Sync,
{
    let queue = ArrayQueue::new(items.len().max(1));
    for i in 0..items.len() {
        queue
            .push(i)
            .map_err(|_| LatinError::InvalidPartition("work queue overflow".to_string()))?;
    }
    let finished = AtomicUsize::new(0);
    let (queue, finished, job) = (&queue, &finished, &job);

    let results: Vec<Result<T, LatinError>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers.max(1))
            .map(|_| {
                s.spawn(move || {
                    let mut local = T::default();
                    while !cancel.load(Ordering::Relaxed) {
                        let Some(i) = queue.pop() else { break };
                        match job(&items[i]) {
                            Ok(part) => local += part,
                            Err(e) => {
                                cancel.store(true, Ordering::Relaxed);
                                return Err(e);
                            }
                        }
                        finished.fetch_add(1, Ordering::Relaxed);
                        progress.tick();
                    }
                    Ok(local)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(LatinError::ThreadPool("worker panicked".to_string())))
            })
            .collect()
    });

    let mut total = T::default();
    for result in results {
        total += result?;
    }
    Ok((total, finished.load(Ordering::Relaxed)))
}

fn execute<W, T, F>(cfg: &CountConfig, items: &[W], job: F) -> Result<T, LatinError>
where
    W: Sync,
    T: Send + Default + AddAssign,
    F: Fn(&W) -> Result<T, LatinError> + Sync,
{
    let progress = Progress::new(items.len(), cfg.report_every);
    match cfg.executor {
        Executor::Rayon => run_rayon(items, cfg.workers, &progress, job),
        Executor::Queue => {
            let cancel = AtomicBool::new(false);
            let (total, _) = drain_queue_with_progress(items, cfg.workers, &cancel, &progress, job)?;
            Ok(total)
        }
    }
}

// ============================================================================
// Public drivers
// ============================================================================

/// Counts all `(cfg.rows, n)` rectangles by distributing the configured work
/// units over `cfg.workers` threads.
///
/// # Errors
/// Invalid dimensions, a cache built for another order, or any unit error.
pub fn count_all(cfg: &CountConfig, cache: &DerangementCache) -> Result<SignedCount, LatinError> {
    let r = cfg.rows;
    check_config(cfg, cache)?;
    let counter = RectangleCounter::new(cache);
    match cfg.partition {
        Partition::Canonical => {
            let columns = enumerate_first_columns(r, cfg.order)?;
            let factor = get_symmetry_factor(r)?;
            execute(cfg, &columns, |col| Ok(counter.count(r, Some(col.as_slice()))?.scaled(factor)))
        }
        Partition::SecondRow => {
            let indices: Vec<usize> = (0..cache.len()).collect();
            execute(cfg, &indices, |&i| counter.count_with_second_row(r, i))
        }
    }
}

/// Completion-mode variant of [`count_all`]; requires `cfg.rows == cfg.order - 1`.
///
/// # Errors
/// As [`count_all`], plus the completion errors.
pub fn count_all_with_completion(
    cfg: &CountConfig,
    cache: &DerangementCache,
) -> Result<CompletionCount, LatinError> {
    let r = cfg.rows;
    check_config(cfg, cache)?;
    if r + 1 != cfg.order {
        return Err(LatinError::CompletionRequiresPenultimate { r, n: cfg.order });
    }
    let counter = RectangleCounter::new(cache);
    match cfg.partition {
        Partition::Canonical => {
            let columns = enumerate_first_columns(r, cfg.order)?;
            let factor = get_symmetry_factor(r)?;
            execute(cfg, &columns, |col| {
                Ok(counter.count_with_completion(r, Some(col.as_slice()))?.scaled(factor))
            })
        }
        Partition::SecondRow => {
            let indices: Vec<usize> = (0..cache.len()).collect();
            execute(cfg, &indices, |&i| counter.count_with_second_row_completion(r, i))
        }
    }
}

fn check_config(cfg: &CountConfig, cache: &DerangementCache) -> Result<(), LatinError> {
    check_dimensions(cfg.rows, cfg.order)?;
    if cache.n() != cfg.order {
        return Err(LatinError::CacheMismatch { expected: cfg.order, got: cache.n() });
    }
    Ok(())
}

/// Builds the cache, runs the configured count, and prints a summary banner.
///
/// # Errors
/// Any error from cache construction or counting.
pub fn run_count(cfg: &CountConfig) -> Result<CountReport, LatinError> {
    let (r, n) = (cfg.rows, cfg.order);
    check_dimensions(r, n)?;
    if let Some(column) = &cfg.first_column {
        check_first_column(column, r, n)?;
    }

    println!("--------------------------------------------------");
    println!("Latin rectangles: r={r}, n={n}{}", if cfg.completion { " (+ completion)" } else { "" });
    match &cfg.first_column {
        Some(column) => println!("First column: {column:?} (single unit, unscaled)"),
        None => println!(
            "Partition: {:?} | Executor: {:?} | Workers: {}",
            cfg.partition, cfg.executor, cfg.workers
        ),
    }
    println!("--------------------------------------------------");

    let build_start = Instant::now();
    let cache = DerangementCache::build(n)?;
    println!(
        "Derangement cache: {} rows in {:.3}s",
        cache.len(),
        build_start.elapsed().as_secs_f64()
    );

    let start = Instant::now();
    let (rectangles, completed, units) = match (&cfg.first_column, cfg.completion) {
        (Some(column), false) => {
            (RectangleCounter::new(&cache).count(r, Some(column.as_slice()))?, None, 1)
        }
        (Some(column), true) => {
            let both = RectangleCounter::new(&cache).count_with_completion(r, Some(column.as_slice()))?;
            (both.rectangles, Some(both.completed), 1)
        }
        (None, completion) => {
            let units = match cfg.partition {
                Partition::Canonical => enumerate_first_columns(r, n)?.len(),
                Partition::SecondRow => cache.len(),
            };
            if completion {
                let both = count_all_with_completion(cfg, &cache)?;
                (both.rectangles, Some(both.completed), units)
            } else {
                (count_all(cfg, &cache)?, None, units)
            }
        }
    };

    Ok(CountReport { rectangles, completed, units, elapsed: start.elapsed() })
}

// ============================================================================
// Tests
// ============================================================================

//! Parallel chunked event builds.
//!
//! A range is cut on coarse-grid points into contiguous chunks. Each chunk is
//! built on a rayon worker with its own copy of the builder and its own last
//! alignment state, seeded from the grid point just before the chunk, and the
//! results are concatenated in chunk order. The output is identical to a serial
//! build of the same range.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::algorithms::scan::EventRangeBuilder;
use crate::error::{EphemerisError, EphemerisResult};
use crate::models::ScrollEvent;
use crate::settings::ParallelSettings;

/// Contiguous `[start, stop)` chunks covering a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    chunks: Vec<(i64, i64)>,
}

impl ChunkPlan {
    /// Split `[start, stop)` into at most `workers` chunks.
    ///
    /// Chunk width is rounded up to whole coarse steps so every chunk starts on a
    /// grid point; the last chunk is clamped to `stop`.
    pub fn new(start: i64, stop: i64, workers: usize, coarse_step: i64) -> Self {
        if start >= stop {
            return Self { chunks: Vec::new() };
        }
        let workers = workers.max(1) as i64;
        let span = stop - start;
        let raw_width = (span + workers - 1) / workers;
        let steps = ((raw_width + coarse_step - 1) / coarse_step).max(1);
        let width = steps * coarse_step;

        let mut chunks = Vec::with_capacity(workers as usize);
        let mut chunk_start = start;
        while chunk_start < stop {
            let chunk_stop = (chunk_start + width).min(stop);
            chunks.push((chunk_start, chunk_stop));
            chunk_start = chunk_stop;
        }
        Self { chunks }
    }

    pub fn chunks(&self) -> &[(i64, i64)] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Runs a batch up to `max_attempts` times, returning the first success.
///
/// An error that [`EphemerisError::is_retryable`] rejects is returned as is, without
/// further attempts.
pub fn with_batch_retry<T>(
    max_attempts: u32,
    mut batch: impl FnMut(u32) -> EphemerisResult<T>,
) -> EphemerisResult<T> {
    let attempts = max_attempts.max(1);
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match batch(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                warn!("parallel batch attempt {}/{} failed: {}", attempt, attempts, e);
                last_error = e.to_string();
            }
        }
    }
    Err(EphemerisError::WorkerFailure {
        attempts,
        message: last_error,
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Fans event builds out across a dedicated thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelOrchestrator {
    workers: usize,
    max_attempts: u32,
}

impl ParallelOrchestrator {
    pub fn new(workers: usize, max_attempts: u32) -> Self {
        Self {
            workers: workers.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_settings(settings: &ParallelSettings) -> Self {
        Self::new(settings.workers, settings.max_attempts)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Build `[start, stop)`, in parallel when there is something to split.
    pub fn build(
        &self,
        builder: &EventRangeBuilder,
        start: i64,
        stop: i64,
    ) -> EphemerisResult<Vec<ScrollEvent>> {
        if start >= stop || self.workers == 1 {
            return builder.build(start, stop);
        }

        let plan = ChunkPlan::new(start, stop, self.workers, builder.coarse_step());
        debug!(
            "building [{}, {}) in {} chunks on {} workers",
            start,
            stop,
            plan.len(),
            self.workers
        );
        self.build_with(builder, &plan, build_chunk)
    }

    /// Run `chunk_fn` over every chunk of `plan`, retrying the whole batch.
    fn build_with<F>(
        &self,
        builder: &EventRangeBuilder,
        plan: &ChunkPlan,
        chunk_fn: F,
    ) -> EphemerisResult<Vec<ScrollEvent>>
    where
        F: Fn(EventRangeBuilder, usize, i64, i64) -> EphemerisResult<Vec<ScrollEvent>> + Sync,
    {
        with_batch_retry(self.max_attempts, |_| {
            self.run_batch(builder, plan, &chunk_fn)
        })
    }

    fn run_batch<F>(
        &self,
        builder: &EventRangeBuilder,
        plan: &ChunkPlan,
        chunk_fn: &F,
    ) -> EphemerisResult<Vec<ScrollEvent>>
    where
        F: Fn(EventRangeBuilder, usize, i64, i64) -> EphemerisResult<Vec<ScrollEvent>> + Sync,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("ephemeris-chunk-{}", i))
            .build()?;

        let chunks = pool.install(|| {
            plan.chunks()
                .par_iter()
                .enumerate()
                .map(|(index, &(chunk_start, chunk_stop))| {
                    catch_unwind(AssertUnwindSafe(|| {
                        chunk_fn(*builder, index, chunk_start, chunk_stop)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(EphemerisError::WorkerPanic {
                            chunk: index,
                            message: panic_message(payload),
                        })
                    })
                })
                .collect::<EphemerisResult<Vec<_>>>()
        })?;

        Ok(chunks.into_iter().flatten().collect())
    }
}

/// Build one chunk. Chunk 0 also emits the opening event of the range.
fn build_chunk(
    builder: EventRangeBuilder,
    index: usize,
    chunk_start: i64,
    chunk_stop: i64,
) -> EphemerisResult<Vec<ScrollEvent>> {
    let (mut events, cursor) = if index == 0 {
        builder.initial(chunk_start)?
    } else {
        (Vec::new(), builder.cursor_before(chunk_start)?)
    };
    builder.scan_segment(chunk_start, chunk_stop, cursor, &mut events)?;
    Ok(events)
}

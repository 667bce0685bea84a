//! Asynchronous tile read pipeline.
//!
//! One [`AsyncTileDataProvider`] runs per raster dataset. The render
//! thread enqueues tile indices; a small pool of OS worker threads pulls
//! them off a channel, runs the blocking
//! [`RawTileDataReader`](crate::reader::RawTileDataReader), and pushes
//! finished [`RawTile`]s onto a completed queue the render thread polls
//! once per frame. No call on the render-thread side ever blocks.
//!
//! Teardown is cooperative: [`prepare_to_be_deleted`] closes the request
//! channel, the workers drain the backlog and exit, and
//! [`should_be_deleted`] reports once everything in flight has landed -
//! only then may the owner drop the pipeline and the reader behind it.
//!
//! [`prepare_to_be_deleted`]: AsyncTileDataProvider::prepare_to_be_deleted
//! [`should_be_deleted`]: AsyncTileDataProvider::should_be_deleted

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use dashmap::DashSet;
use tracing::{debug, trace, warn};

use crate::reader::{RawTile, RawTileDataReader};
use crate::tile::TileIndex;

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accepting requests.
    Active,
    /// Request channel closed; workers finishing the backlog.
    Draining,
    /// All workers exited and the completed queue is empty.
    Drained,
}

/// Off-render-thread tile decoding pipeline for one dataset.
pub struct AsyncTileDataProvider {
    name: String,
    reader: Arc<dyn RawTileDataReader>,
    /// Dropped to signal workers to finish; `None` once draining.
    request_tx: Option<Sender<TileIndex>>,
    result_rx: Receiver<RawTile>,
    /// Indices queued or being read. An index leaves the set when its
    /// result is popped, so at most one job per index is ever in flight.
    pending: Arc<DashSet<TileIndex>>,
    live_workers: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
    phase: Phase,
}

impl AsyncTileDataProvider {
    /// Spawn the worker pool for `reader`.
    ///
    /// `requested_workers` is clamped to one unless the reader reports
    /// itself safe for concurrent reads.
    pub fn new(name: &str, reader: Arc<dyn RawTileDataReader>, requested_workers: usize) -> Self {
        let worker_count = if reader.supports_concurrent_reads() {
            requested_workers.max(1)
        } else {
            1
        };

        let (request_tx, request_rx) = crossbeam_channel::unbounded::<TileIndex>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<RawTile>();
        let pending: Arc<DashSet<TileIndex>> = Arc::new(DashSet::new());
        let live_workers = Arc::new(AtomicUsize::new(worker_count));

        let workers = (0..worker_count)
            .map(|worker_index| {
                let reader = Arc::clone(&reader);
                let request_rx = request_rx.clone();
                let result_tx = result_tx.clone();
                let live_workers = Arc::clone(&live_workers);
                let thread_name = format!("tile-io-{}-{}", name, worker_index);

                std::thread::Builder::new()
                    .name(thread_name)
                    .spawn(move || {
                        // Exits when the request channel is closed and the
                        // backlog is empty.
                        for index in request_rx.iter() {
                            let raw = reader.read_tile_data(index);
                            if let Some(error) = &raw.error {
                                debug!(tile = %index, %error, "tile read failed");
                            }
                            if result_tx.send(raw).is_err() {
                                // Consumer is gone; nothing left to do.
                                break;
                            }
                        }
                        live_workers.fetch_sub(1, Ordering::Release);
                    })
                    .expect("failed to spawn tile I/O worker thread")
            })
            .collect();

        debug!(name, workers = worker_count, "tile read pipeline started");

        Self {
            name: name.to_string(),
            reader,
            request_tx: Some(request_tx),
            result_rx,
            pending,
            live_workers,
            workers,
            phase: Phase::Active,
        }
    }

    /// Request an asynchronous read of `index`.
    ///
    /// Suppressed when a request for the same index is already queued or
    /// in flight, and ignored once the pipeline is draining. Returns
    /// whether a new request was actually enqueued.
    pub fn enqueue_tile_io(&mut self, index: TileIndex) -> bool {
        if self.phase != Phase::Active {
            trace!(name = %self.name, tile = %index, "enqueue ignored while draining");
            return false;
        }
        if !self.pending.insert(index) {
            return false;
        }
        let Some(tx) = &self.request_tx else {
            return false;
        };
        if tx.send(index).is_err() {
            warn!(name = %self.name, "request channel closed unexpectedly");
            self.pending.remove(&index);
            return false;
        }
        true
    }

    /// Pop at most one finished raw tile. Non-blocking; called once per
    /// frame from the update thread to bound per-frame upload cost.
    pub fn pop_finished_raw_tile(&mut self) -> Option<RawTile> {
        match self.result_rx.try_recv() {
            Ok(raw) => {
                self.pending.remove(&raw.index);
                Some(raw)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Reconcile worker state: once a draining pipeline's workers have all
    /// exited and the completed queue is empty, mark it drained and join
    /// the finished threads.
    pub fn update(&mut self) {
        if self.phase == Phase::Draining
            && self.live_workers.load(Ordering::Acquire) == 0
            && self.result_rx.is_empty()
        {
            for handle in self.workers.drain(..) {
                // The threads have already exited; this only reclaims them.
                let _ = handle.join();
            }
            self.phase = Phase::Drained;
            debug!(name = %self.name, "tile read pipeline drained");
        }
    }

    /// Stop accepting work and let the workers finish the backlog.
    pub fn prepare_to_be_deleted(&mut self) {
        if self.phase == Phase::Active {
            debug!(name = %self.name, "tile read pipeline draining");
            self.phase = Phase::Draining;
            self.request_tx = None;
        }
    }

    /// Whether all in-flight work has landed and the pipeline may be
    /// dropped.
    pub fn should_be_deleted(&self) -> bool {
        self.phase == Phase::Drained
    }

    /// The dataset reader, for metadata queries that need no tile fetch.
    pub fn reader(&self) -> &Arc<dyn RawTileDataReader> {
        &self.reader
    }
}

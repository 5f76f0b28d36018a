// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Tracer Event Cache
//!
//! A single worker task owns the map from tracer id to that tracer's events
//! (arrival order). Everything else holds an [`EventCache`] handle and talks
//! to the worker over a bounded request queue; every request carries its own
//! oneshot reply channel, so concurrent callers never see each other's
//! results.
//!
//! ```text
//!  handle ─┐   bounded mpsc    ┌──────────────┐   miss   ┌───────┐
//!  handle ─┼──────────────────►│    worker    │─────────►│ Store │
//!  handle ─┘ ◄── oneshot ──────│ HashMap<..>  │          └───────┘
//!                              └──────────────┘
//! ```
//!
//! The worker handles one request at a time. A cache miss awaits the Store
//! inline, so no other request is served until the load completes. A failed
//! load is fatal: serving an empty list would look like "no findings yet".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::errors::{CacheError, StoreError};
use crate::store::{self, Store};
use crate::types::{TracerEvent, TracerId};

/// Default bound on queued requests
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

enum CacheRequest {
    Get {
        tracer_id: TracerId,
        reply: oneshot::Sender<Vec<TracerEvent>>,
    },
    Append {
        tracer_id: TracerId,
        event: TracerEvent,
        reply: oneshot::Sender<()>,
    },
    InvalidateAll {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    appends: AtomicU64,
    invalidations: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    /// Every miss is exactly one Store load
    pub misses: u64,
    pub appends: u64,
    pub invalidations: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            appends: self.appends.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable handle to the cache worker
#[derive(Clone)]
pub struct EventCache {
    requests: mpsc::Sender<CacheRequest>,
    stats: Arc<CacheStats>,
}

/// The worker half. Drive it with [`EventCacheWorker::run`].
pub struct EventCacheWorker {
    requests: mpsc::Receiver<CacheRequest>,
    store: Arc<dyn Store>,
    events: HashMap<TracerId, Vec<TracerEvent>>,
    stats: Arc<CacheStats>,
}

impl EventCache {
    /// Create a handle and its worker without starting the worker
    pub fn new(store: Arc<dyn Store>, queue_capacity: usize) -> (Self, EventCacheWorker) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let stats = Arc::new(CacheStats::default());

        let cache = Self {
            requests: tx,
            stats: stats.clone(),
        };
        let worker = EventCacheWorker {
            requests: rx,
            store,
            events: HashMap::new(),
            stats,
        };
        (cache, worker)
    }

    /// Start the worker on the tokio runtime. A Store failure while loading
    /// a tracer terminates the process.
    pub fn spawn(store: Arc<dyn Store>, queue_capacity: usize) -> Self {
        let (cache, worker) = Self::new(store, queue_capacity);

        tokio::spawn(async move {
            if let Err(e) = worker.run().await {
                error!("[EventCache] Failed to load tracer events, shutting down: {}", e);
                std::process::exit(1);
            }
        });

        info!(
            "[EventCache] Worker started (queue capacity {})",
            queue_capacity.max(1)
        );
        cache
    }

    /// Events for a tracer, loading them from the Store on first access
    pub async fn get(&self, tracer_id: TracerId) -> Result<Vec<TracerEvent>, CacheError> {
        self.request(|reply| CacheRequest::Get { tracer_id, reply })
            .await
    }

    /// Add one event to the end of a tracer's list. Never touches the Store.
    /// An event whose id is already listed is ignored.
    pub async fn append(&self, tracer_id: TracerId, event: TracerEvent) -> Result<(), CacheError> {
        self.request(|reply| CacheRequest::Append {
            tracer_id,
            event,
            reply,
        })
        .await
    }

    /// Drop every cached list
    pub async fn invalidate_all(&self) -> Result<(), CacheError> {
        self.request(|reply| CacheRequest::InvalidateAll { reply })
            .await
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> CacheRequest,
    ) -> Result<T, CacheError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        // Blocks while the queue is full
        self.requests
            .send(build(reply_tx))
            .await
            .map_err(|_| CacheError::WorkerGone)?;

        reply_rx.await.map_err(|_| CacheError::ReplyDropped)
    }
}

impl EventCacheWorker {
    /// Serve requests until every handle is dropped. Returns the Store error
    /// if a load fails; the worker stops at that point.
    pub async fn run(mut self) -> Result<(), StoreError> {
        while let Some(request) = self.requests.recv().await {
            self.handle(request).await?;
        }
        debug!("[EventCache] All handles dropped, worker exiting");
        Ok(())
    }

    async fn handle(&mut self, request: CacheRequest) -> Result<(), StoreError> {
        match request {
            CacheRequest::Get { tracer_id, reply } => {
                if self.events.contains_key(&tracer_id) {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    let loaded = store::load_tracer_events(self.store.as_ref(), tracer_id).await?;
                    debug!(
                        "[EventCache] Loaded {} events for tracer {}",
                        loaded.len(),
                        tracer_id
                    );
                    self.events.insert(tracer_id, loaded);
                }

                let events = self.events.get(&tracer_id).cloned().unwrap_or_default();
                // The caller may have given up; that is not the worker's problem
                let _ = reply.send(events);
            }
            CacheRequest::Append {
                tracer_id,
                event,
                reply,
            } => {
                // A load that raced the append may already hold this event
                let events = self.events.entry(tracer_id).or_default();
                if events.iter().any(|e| e.id == event.id) {
                    debug!(
                        "[EventCache] Event {} already cached for tracer {}",
                        event.id, tracer_id
                    );
                } else {
                    self.stats.appends.fetch_add(1, Ordering::Relaxed);
                    events.push(event);
                }
                let _ = reply.send(());
            }
            CacheRequest::InvalidateAll { reply } => {
                self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
                debug!("[EventCache] Dropping {} cached tracers", self.events.len());
                self.events.clear();
                let _ = reply.send(());
            }
        }
        Ok(())
    }
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tracer Event Ingestion
 * Classifies new captures, persists the resulting events, keeps the tracer
 * severity watermark current and fans updates out to subscribers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::{self, Classification};
use crate::config::{AppConfig, ClassifierConfig};
use crate::dom::ParseLimits;
use crate::errors::{TracerError, TracerResult};
use crate::event_cache::{CacheStatsSnapshot, EventCache};
use crate::store::{Store, TracerPatch};
use crate::subscribers::{SubscriberUpdate, Subscribers};
use crate::types::{
    CaptureFormat, EventKind, EventRecord, Notification, RawCapture, RawCaptureId, Severity,
    Tracer, TracerEvent, TracerId,
};

pub struct EventIngestor {
    store: Arc<dyn Store>,
    subscribers: Arc<dyn Subscribers>,
    cache: EventCache,
    limits: ParseLimits,
    /// Serializes tracer read-modify-write per tracer id
    tracer_locks: Mutex<HashMap<TracerId, Arc<tokio::sync::Mutex<()>>>>,
}

impl EventIngestor {
    pub fn new(
        store: Arc<dyn Store>,
        subscribers: Arc<dyn Subscribers>,
        cache: EventCache,
        config: &ClassifierConfig,
    ) -> Self {
        Self {
            store,
            subscribers,
            cache,
            limits: ParseLimits::from(config),
            tracer_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build an ingestor with its own cache worker on the current runtime
    pub fn start(
        config: &AppConfig,
        store: Arc<dyn Store>,
        subscribers: Arc<dyn Subscribers>,
    ) -> Self {
        let cache = EventCache::spawn(store.clone(), config.cache.queue_capacity);
        Self::new(store, subscribers, cache, &config.classifier)
    }

    /// Register captured text, reusing the existing row for identical content
    pub async fn record_capture(&self, text: &str, format: CaptureFormat) -> TracerResult<RawCapture> {
        Ok(self.store.find_or_create_raw_capture(text, format).await?)
    }

    /// Classify, persist and publish one tracer event. Returns the event as JSON.
    pub async fn add_event(
        &self,
        tracer_id: TracerId,
        raw_capture_id: RawCaptureId,
        event_kind: EventKind,
    ) -> TracerResult<Vec<u8>> {
        let tracer = self
            .store
            .find_tracer(tracer_id)
            .await?
            .ok_or(TracerError::TracerNotFound(tracer_id))?;
        let capture = self
            .store
            .find_raw_capture(raw_capture_id)
            .await?
            .ok_or(TracerError::RawCaptureNotFound(raw_capture_id))?;

        // Only markup has a DOM to classify
        let classification = match capture.format {
            CaptureFormat::Markup => classifier::classify_markup(
                &capture.text,
                &tracer.marker,
                &event_kind,
                &self.limits,
            )
            .map_err(|e| {
                warn!("[Ingest] Capture {} rejected: {}", capture.id, e);
                e
            })?,
            CaptureFormat::Structured => Classification::default(),
        };

        let record = EventRecord {
            id: 0,
            tracer_id,
            raw_capture_id: capture.id,
            event_kind,
            findings: classification.findings,
        };
        let record = self.store.create_event(record).await.map_err(|e| {
            warn!("[Ingest] Failed to store event for tracer {}: {}", tracer_id, e);
            e
        })?;
        let event = TracerEvent::from_record(record, capture);

        let watermark = if event.findings.is_empty() {
            Ok(tracer)
        } else {
            self.raise_watermark(tracer_id, classification.highest).await
        };

        // The event is stored; cache and subscribers see it whatever happened to the tracer
        self.cache.append(tracer_id, event.clone()).await?;
        self.subscribers.publish(SubscriberUpdate::Event(event.clone()));

        let tracer = watermark.map_err(|e| {
            warn!("[Ingest] Failed to update tracer {}: {}", tracer_id, e);
            e
        })?;

        let body = serde_json::to_vec(&event)?;

        if event.findings.iter().any(|f| f.severity.is_actionable()) {
            info!(
                "[Ingest] Actionable finding for tracer {} in event {} (severity {})",
                tracer_id,
                event.id,
                event.highest_severity()
            );
            self.subscribers
                .publish(SubscriberUpdate::Notification(Notification { tracer, event }));
        }

        Ok(body)
    }

    /// All events for a tracer as JSON, served from the cache
    pub async fn get_events(&self, tracer_id: TracerId) -> TracerResult<Vec<u8>> {
        let events = self.cache.get(tracer_id).await?;
        debug!("[Ingest] Serving {} events for tracer {}", events.len(), tracer_id);
        Ok(serde_json::to_vec(&events)?)
    }

    pub async fn clear_cache(&self) -> TracerResult<()> {
        Ok(self.cache.invalidate_all().await?)
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    fn tracer_lock(&self, tracer_id: TracerId) -> Arc<tokio::sync::Mutex<()>> {
        self.tracer_locks.lock().entry(tracer_id).or_default().clone()
    }

    /// Persist a higher overall severity and/or the first-event flag, then
    /// tell subscribers about the changed tracer. The tracer is re-read under
    /// its lock so concurrent events can only raise the watermark.
    async fn raise_watermark(&self, tracer_id: TracerId, highest: Severity) -> TracerResult<Tracer> {
        let lock = self.tracer_lock(tracer_id);
        let _guard = lock.lock().await;

        let mut tracer = self
            .store
            .find_tracer(tracer_id)
            .await?
            .ok_or(TracerError::TracerNotFound(tracer_id))?;

        let patch = TracerPatch {
            overall_severity: (highest > tracer.overall_severity).then_some(highest),
            has_events: (!tracer.has_events).then_some(true),
        };
        if patch.is_empty() {
            return Ok(tracer);
        }

        self.store.update_tracer_fields(tracer.id, &patch).await?;
        patch.apply(&mut tracer);

        debug!(
            "[Ingest] Tracer {} now at severity {} (has events: {})",
            tracer.id, tracer.overall_severity, tracer.has_events
        );
        self.subscribers.publish(SubscriberUpdate::Tracer(tracer.clone()));
        Ok(tracer)
    }
}

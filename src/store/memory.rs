// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! In-memory [`Store`] used for tests, demos and single-process deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Store, TracerPatch};
use crate::errors::StoreError;
use crate::types::{
    CaptureFormat, EventRecord, RawCapture, RawCaptureId, Severity, Tracer, TracerId,
};

#[derive(Default)]
struct Tables {
    tracers: HashMap<TracerId, Tracer>,
    captures: HashMap<RawCaptureId, RawCapture>,
    capture_index: HashMap<(String, CaptureFormat), RawCaptureId>,
    events: Vec<EventRecord>,
    next_tracer_id: u64,
    next_capture_id: u64,
    next_finding_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    event_queries: AtomicU64,
    capture_lookups: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tracer for `marker` with no events yet
    pub fn insert_tracer(&self, marker: &str) -> Tracer {
        let mut tables = self.tables.write();
        tables.next_tracer_id += 1;
        let tracer = Tracer {
            id: tables.next_tracer_id,
            marker: marker.to_string(),
            overall_severity: Severity::None,
            has_events: false,
        };
        tables.tracers.insert(tracer.id, tracer.clone());
        tracer
    }

    /// Number of `query_events_by_tracer` calls served
    pub fn event_queries(&self) -> u64 {
        self.event_queries.load(Ordering::Relaxed)
    }

    /// Number of `find_raw_capture` calls served
    pub fn capture_lookups(&self) -> u64 {
        self.capture_lookups.load(Ordering::Relaxed)
    }

    pub fn event_count(&self) -> usize {
        self.tables.read().events.len()
    }

    pub fn capture_count(&self) -> usize {
        self.tables.read().captures.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_tracer(&self, tracer_id: TracerId) -> Result<Option<Tracer>, StoreError> {
        Ok(self.tables.read().tracers.get(&tracer_id).cloned())
    }

    async fn update_tracer_fields(
        &self,
        tracer_id: TracerId,
        patch: &TracerPatch,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let tracer = tables
            .tracers
            .get_mut(&tracer_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "tracer".to_string(),
                id: tracer_id,
            })?;
        patch.apply(tracer);
        Ok(())
    }

    async fn find_or_create_raw_capture(
        &self,
        text: &str,
        format: CaptureFormat,
    ) -> Result<RawCapture, StoreError> {
        let mut tables = self.tables.write();
        let key = (text.to_string(), format);

        if let Some(id) = tables.capture_index.get(&key).copied() {
            if let Some(existing) = tables.captures.get(&id) {
                return Ok(existing.clone());
            }
        }

        tables.next_capture_id += 1;
        let capture = RawCapture {
            id: tables.next_capture_id,
            text: key.0.clone(),
            format,
        };
        tables.capture_index.insert(key, capture.id);
        tables.captures.insert(capture.id, capture.clone());
        Ok(capture)
    }

    async fn find_raw_capture(&self, id: RawCaptureId) -> Result<Option<RawCapture>, StoreError> {
        self.capture_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.tables.read().captures.get(&id).cloned())
    }

    async fn create_event(&self, mut record: EventRecord) -> Result<EventRecord, StoreError> {
        let mut tables = self.tables.write();

        if !tables.tracers.contains_key(&record.tracer_id) {
            return Err(StoreError::ConstraintViolation {
                entity: "tracer_event".to_string(),
                reason: format!("unknown tracer {}", record.tracer_id),
            });
        }
        if !tables.captures.contains_key(&record.raw_capture_id) {
            return Err(StoreError::ConstraintViolation {
                entity: "tracer_event".to_string(),
                reason: format!("unknown raw capture {}", record.raw_capture_id),
            });
        }

        record.id = tables.events.len() as u64 + 1;
        for finding in &mut record.findings {
            tables.next_finding_id += 1;
            finding.id = tables.next_finding_id;
            finding.event_id = record.id;
        }
        tables.events.push(record.clone());
        Ok(record)
    }

    async fn query_events_by_tracer(
        &self,
        tracer_id: TracerId,
    ) -> Result<Vec<EventRecord>, StoreError> {
        self.event_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .tables
            .read()
            .events
            .iter()
            .filter(|e| e.tracer_id == tracer_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::load_tracer_events;
    use crate::types::EventKind;

    fn record(tracer_id: TracerId, raw_capture_id: RawCaptureId) -> EventRecord {
        EventRecord {
            id: 0,
            tracer_id,
            raw_capture_id,
            event_kind: EventKind::Response,
            findings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_raw_capture_created_once() {
        let store = MemoryStore::new();
        let a = store
            .find_or_create_raw_capture("<p>x</p>", CaptureFormat::Markup)
            .await
            .unwrap();
        let b = store
            .find_or_create_raw_capture("<p>x</p>", CaptureFormat::Markup)
            .await
            .unwrap();
        let c = store
            .find_or_create_raw_capture("<p>x</p>", CaptureFormat::Structured)
            .await
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(store.capture_count(), 2);
    }

    #[tokio::test]
    async fn test_create_event_assigns_ids() {
        let store = MemoryStore::new();
        let tracer = store.insert_tracer("zzMARKzz");
        let capture = store
            .find_or_create_raw_capture("<p>zzMARKzz</p>", CaptureFormat::Markup)
            .await
            .unwrap();

        let mut rec = record(tracer.id, capture.id);
        rec.findings.push(crate::types::Finding {
            id: 0,
            event_id: 0,
            location: crate::types::LocationKind::Text,
            enclosing_node: "p".to_string(),
            snippet: "zzMARKzz".to_string(),
            severity: Severity::None,
            reason: crate::types::Reason::LeafNode,
        });

        let stored = store.create_event(rec).await.unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.findings[0].event_id, 1);
        assert_eq!(stored.findings[0].id, 1);
    }

    #[tokio::test]
    async fn test_create_event_rejects_unknown_references() {
        let store = MemoryStore::new();
        let tracer = store.insert_tracer("zzMARKzz");

        let err = store.create_event(record(tracer.id, 99)).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation { .. }));
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn test_update_tracer_fields() {
        let store = MemoryStore::new();
        let tracer = store.insert_tracer("zzMARKzz");

        let patch = TracerPatch {
            overall_severity: Some(Severity::Medium),
            has_events: None,
        };
        store.update_tracer_fields(tracer.id, &patch).await.unwrap();

        let updated = store.find_tracer(tracer.id).await.unwrap().unwrap();
        assert_eq!(updated.overall_severity, Severity::Medium);
        assert!(!updated.has_events);

        let err = store.update_tracer_fields(42, &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 42, .. }));
    }

    #[tokio::test]
    async fn test_load_dedupes_captures_by_id() {
        let store = MemoryStore::new();
        let tracer = store.insert_tracer("zzMARKzz");
        let shared = store
            .find_or_create_raw_capture("<p>zzMARKzz</p>", CaptureFormat::Markup)
            .await
            .unwrap();
        let other = store
            .find_or_create_raw_capture("<b>zzMARKzz</b>", CaptureFormat::Markup)
            .await
            .unwrap();

        store.create_event(record(tracer.id, shared.id)).await.unwrap();
        store.create_event(record(tracer.id, other.id)).await.unwrap();
        store.create_event(record(tracer.id, shared.id)).await.unwrap();

        let events = load_tracer_events(&store, tracer.id).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].raw_capture, shared);
        assert_eq!(events[1].raw_capture, other);
        assert_eq!(events[2].raw_capture, shared);
        assert_eq!(store.capture_lookups(), 2);
        assert_eq!(store.event_queries(), 1);
    }
}

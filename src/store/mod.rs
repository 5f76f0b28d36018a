// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Persistence collaborator.
//!
//! The backend never owns storage; it talks to whatever implements [`Store`].
//! Events are written without their capture text and captures are shared
//! between events by id.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::errors::StoreError;
use crate::types::{
    CaptureFormat, EventRecord, RawCapture, RawCaptureId, Severity, Tracer, TracerEvent, TracerId,
};

/// Partial update of a tracer row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_events: Option<bool>,
}

impl TracerPatch {
    pub fn is_empty(&self) -> bool {
        self.overall_severity.is_none() && self.has_events.is_none()
    }

    pub fn apply(&self, tracer: &mut Tracer) {
        if let Some(severity) = self.overall_severity {
            tracer.overall_severity = severity;
        }
        if let Some(has_events) = self.has_events {
            tracer.has_events = has_events;
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_tracer(&self, tracer_id: TracerId) -> Result<Option<Tracer>, StoreError>;

    async fn update_tracer_fields(
        &self,
        tracer_id: TracerId,
        patch: &TracerPatch,
    ) -> Result<(), StoreError>;

    /// Return the capture with this exact (text, format), creating it once
    async fn find_or_create_raw_capture(
        &self,
        text: &str,
        format: CaptureFormat,
    ) -> Result<RawCapture, StoreError>;

    async fn find_raw_capture(&self, id: RawCaptureId) -> Result<Option<RawCapture>, StoreError>;

    /// Persist an event and its findings. Ids in `record` are ignored and
    /// the stored record, with ids assigned, is returned.
    async fn create_event(&self, record: EventRecord) -> Result<EventRecord, StoreError>;

    /// Events for a tracer in arrival order, findings preloaded
    async fn query_events_by_tracer(
        &self,
        tracer_id: TracerId,
    ) -> Result<Vec<EventRecord>, StoreError>;
}

/// Load every event of a tracer with its capture resolved.
/// Each distinct capture is fetched once however many events share it.
pub async fn load_tracer_events(
    store: &dyn Store,
    tracer_id: TracerId,
) -> Result<Vec<TracerEvent>, StoreError> {
    let records = store.query_events_by_tracer(tracer_id).await?;
    let mut captures: HashMap<RawCaptureId, RawCapture> = HashMap::new();
    let mut events = Vec::with_capacity(records.len());

    for record in records {
        let capture = match captures.get(&record.raw_capture_id) {
            Some(capture) => capture.clone(),
            None => {
                let capture = store
                    .find_raw_capture(record.raw_capture_id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        entity: "raw capture".to_string(),
                        id: record.raw_capture_id,
                    })?;
                captures.insert(capture.id, capture.clone());
                capture
            }
        };
        events.push(TracerEvent::from_record(record, capture));
    }

    debug!(
        "[Store] Loaded {} events for tracer {} ({} distinct captures)",
        events.len(),
        tracer_id,
        captures.len()
    );
    Ok(events)
}

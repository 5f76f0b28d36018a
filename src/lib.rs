// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tracer Analysis Backend
 * Classifies where injected tracer markers resurface in captured markup and
 * serves the accumulated findings to live observers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod types;

// Error handling
pub mod errors;

// Configuration and logging
pub mod config;
pub mod telemetry;

// Location classification
pub mod classifier;
pub mod dom;
pub mod severity;

// Collaborators
pub mod store;
pub mod subscribers;

// Event cache actor and ingestion
pub mod event_cache;
pub mod ingestion;

pub use classifier::{classify, classify_markup, Classification};
pub use errors::{CacheError, InvalidSeverity, ParseError, StoreError, TracerError, TracerResult};
pub use event_cache::EventCache;
pub use ingestion::EventIngestor;

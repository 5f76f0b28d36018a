// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Error taxonomy for ingestion, persistence and the event cache
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use thiserror::Error;

use crate::types::{RawCaptureId, TracerId};

/// Top-level error returned to callers of the ingestion API
#[derive(Error, Debug)]
pub enum TracerError {
    /// Capture claimed to be markup could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Event cache errors
    #[error("Event cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Tracer {0} not found")]
    TracerNotFound(TracerId),

    #[error("Raw capture {0} not found")]
    RawCaptureNotFound(RawCaptureId),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Markup parse failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Capture too large ({size} bytes), max: {max_size}")]
    CaptureTooLarge { size: usize, max_size: usize },

    #[error("Document has more than {max_nodes} nodes")]
    TooManyNodes { max_nodes: usize },
}

/// Store collaborator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Constraint violation on {entity}: {reason}")]
    ConstraintViolation { entity: String, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: u64 },

    #[error("Store error: {0}")]
    Other(String),
}

/// Event cache errors. The cache worker never reports a missing key as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Event cache worker is not running")]
    WorkerGone,

    #[error("Event cache worker dropped the reply")]
    ReplyDropped,
}

/// Severity outside the 0-3 scale
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Severity out of range: {0}")]
pub struct InvalidSeverity(pub u8);

pub type TracerResult<T> = std::result::Result<T, TracerError>;

impl TracerError {
    /// Missing tracer or capture references
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TracerError::TracerNotFound(_)
                | TracerError::RawCaptureNotFound(_)
                | TracerError::Store(StoreError::NotFound { .. })
        )
    }
}

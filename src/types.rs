// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tracer Data Model
 * Tracers, raw captures, tracer events and their DOM findings
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::InvalidSeverity;

pub type TracerId = u64;
pub type RawCaptureId = u64;
pub type EventId = u64;
pub type FindingId = u64;

/// Exploitability estimate for a single finding, 0 (inert) to 3 (attacker controls markup)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_u8(self) -> u8 {
        match self {
            Severity::None => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }

    /// Findings at or above this level raise a high-severity notification
    pub fn is_actionable(self) -> bool {
        self >= Severity::Medium
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.as_u8()
    }
}

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverity;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Severity::None),
            1 => Ok(Severity::Low),
            2 => Ok(Severity::Medium),
            3 => Ok(Severity::High),
            other => Err(InvalidSeverity(other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Syntactic location of a marker occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    Text,
    NodeName,
    Attr,
    AttrVal,
    Comment,
}

/// Reason code attached to every finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    LeafNode,
    LeafNodeScriptTag,
    LeafNodeCommentTag,
    TagName,
    AttributeName,
    #[serde(rename = "AttributeNameHTTPResponse")]
    AttributeNameHttpResponse,
    #[serde(rename = "AttributeValueHTTPResponse")]
    AttributeValueHttpResponse,
    AttributeValueStartHref,
    AttributeValueOnEventHandler,
    Unclassified,
}

/// Origin of a capture. Rendered HTTP responses and plain-text reports
/// change the severity rules; every other kind is instrumentation-defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Response,
    Text,
    Other(String),
}

impl EventKind {
    pub fn is_response(&self) -> bool {
        matches!(self, EventKind::Response)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, EventKind::Text)
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Response => "response",
            EventKind::Text => "text",
            EventKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for EventKind {
    fn from(kind: &str) -> Self {
        match kind {
            "response" => EventKind::Response,
            "text" => EventKind::Text,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(kind: String) -> Self {
        EventKind::from(kind.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    Markup,
    Structured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracer {
    pub id: TracerId,
    pub marker: String,
    pub overall_severity: Severity,
    pub has_events: bool,
}

/// Captured payload, content-addressed by (text, format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapture {
    pub id: RawCaptureId,
    pub text: String,
    pub format: CaptureFormat,
}

/// One classified marker location inside a capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Assigned by the store; zero until persisted
    #[serde(default)]
    pub id: FindingId,
    #[serde(default)]
    pub event_id: EventId,
    pub location: LocationKind,
    pub enclosing_node: String,
    pub snippet: String,
    pub severity: Severity,
    pub reason: Reason,
}

/// Persisted event row. Refers to its capture by id so that many events
/// share one capture row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub tracer_id: TracerId,
    pub raw_capture_id: RawCaptureId,
    pub event_kind: EventKind,
    pub findings: Vec<Finding>,
}

/// Event as served to readers, with its capture resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerEvent {
    pub id: EventId,
    pub tracer_id: TracerId,
    pub raw_capture: RawCapture,
    pub event_kind: EventKind,
    pub findings: Vec<Finding>,
}

impl TracerEvent {
    pub fn from_record(record: EventRecord, raw_capture: RawCapture) -> Self {
        Self {
            id: record.id,
            tracer_id: record.tracer_id,
            raw_capture,
            event_kind: record.event_kind,
            findings: record.findings,
        }
    }

    pub fn highest_severity(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or_default()
    }
}

/// High-severity alert for a tracer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub tracer: Tracer,
    pub event: TracerEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "3");
        let parsed: Severity = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, Severity::Medium);
        assert!(serde_json::from_str::<Severity>("4").is_err());
        assert_eq!(Severity::try_from(4), Err(InvalidSeverity(4)));
        assert_eq!(Severity::try_from(1), Ok(Severity::Low));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium.is_actionable());
        assert!(!Severity::Low.is_actionable());
    }

    #[test]
    fn test_event_kind_strings() {
        assert_eq!(EventKind::from("response"), EventKind::Response);
        assert_eq!(EventKind::from("text"), EventKind::Text);
        assert_eq!(EventKind::from("dom"), EventKind::Other("dom".to_string()));
        assert_eq!(
            serde_json::to_string(&EventKind::Other("html".to_string())).unwrap(),
            "\"html\""
        );
    }

    #[test]
    fn test_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&Reason::AttributeValueHttpResponse).unwrap(),
            "\"AttributeValueHTTPResponse\""
        );
        assert_eq!(serde_json::to_string(&Reason::TagName).unwrap(), "\"TagName\"");
    }
}

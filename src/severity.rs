// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Severity model: rule table mapping a marker placement and the capture's
//! origin to a location kind, severity and reason code. No state.

use crate::dom::NodeKind;
use crate::types::{EventKind, LocationKind, Reason, Severity};

/// Where a marker matched, with the structural facts the rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// The node's own name or content
    Node { kind: NodeKind, parent_name: &'a str },
    AttributeName,
    AttributeValue {
        key: &'a str,
        value: &'a str,
        marker: &'a str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating {
    pub location: LocationKind,
    pub severity: Severity,
    pub reason: Reason,
}

impl Rating {
    const fn new(location: LocationKind, severity: Severity, reason: Reason) -> Self {
        Self {
            location,
            severity,
            reason,
        }
    }
}

pub fn rate(placement: &Placement<'_>, event_kind: &EventKind) -> Rating {
    let response = event_kind.is_response();

    match *placement {
        Placement::Node { kind, parent_name } => rate_node(kind, parent_name, response),

        Placement::AttributeName => {
            if response {
                Rating::new(LocationKind::Attr, Severity::Low, Reason::AttributeNameHttpResponse)
            } else {
                Rating::new(LocationKind::Attr, Severity::High, Reason::AttributeName)
            }
        }

        Placement::AttributeValue { key, value, marker } => {
            if !response {
                // javascript: URLs
                if key == "href" && value.starts_with(marker) {
                    return Rating::new(
                        LocationKind::AttrVal,
                        Severity::Medium,
                        Reason::AttributeValueStartHref,
                    );
                }
                if key.starts_with("on") {
                    return Rating::new(
                        LocationKind::AttrVal,
                        Severity::Medium,
                        Reason::AttributeValueOnEventHandler,
                    );
                }
            }
            Rating::new(
                LocationKind::AttrVal,
                Severity::Low,
                Reason::AttributeValueHttpResponse,
            )
        }
    }
}

fn rate_node(kind: NodeKind, parent_name: &str, response: bool) -> Rating {
    match kind {
        NodeKind::Text => Rating::new(LocationKind::Text, Severity::None, Reason::LeafNode),

        NodeKind::Element | NodeKind::Document | NodeKind::Doctype => {
            if response {
                Rating::new(LocationKind::NodeName, Severity::None, Reason::Unclassified)
            } else if kind == NodeKind::Element {
                // Tag name wins over the script-parent rule
                Rating::new(LocationKind::NodeName, Severity::High, Reason::TagName)
            } else if parent_name == "script" {
                Rating::new(LocationKind::NodeName, Severity::Low, Reason::LeafNodeScriptTag)
            } else {
                Rating::new(LocationKind::NodeName, Severity::None, Reason::Unclassified)
            }
        }

        NodeKind::Comment | NodeKind::Other => {
            let severity = if response { Severity::None } else { Severity::Low };
            Rating::new(LocationKind::Comment, severity, Reason::LeafNodeCommentTag)
        }
    }
}

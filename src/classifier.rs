// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tracer Location Classifier
 * Finds every occurrence of a tracer marker in a parsed capture and rates
 * how exploitable its syntactic location is
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{self, CaptureTree, ParseLimits};
use crate::errors::ParseError;
use crate::severity::{self, Placement, Rating};
use crate::types::{EventKind, Finding, Severity};

/// Findings for one capture plus the highest severity among them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub findings: Vec<Finding>,
    pub highest: Severity,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Classify every marker occurrence in `tree`.
///
/// Nodes are visited in pre-order: the node's own name or content, then its
/// attributes, then its children in document order. Matching is a
/// case-sensitive substring test; an empty marker matches nothing.
/// Captures reported as plain text are never exploitable, so every finding
/// from a `text` event is forced to severity 0.
pub fn classify(tree: &CaptureTree, marker: &str, event_kind: &EventKind) -> Classification {
    let mut findings = Vec::new();

    let root = match tree.root() {
        Some(root) if !marker.is_empty() => root,
        _ => return Classification::default(),
    };

    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        let parent_name = tree.parent_name(id);

        if node.data.contains(marker) {
            let rating = severity::rate(
                &Placement::Node {
                    kind: node.kind,
                    parent_name,
                },
                event_kind,
            );
            findings.push(finding(rating, parent_name, node.data.trim()));
        }

        for (key, value) in &node.attrs {
            let placement = if key.contains(marker) {
                Placement::AttributeName
            } else if value.contains(marker) {
                Placement::AttributeValue { key, value, marker }
            } else {
                continue;
            };
            let rating = severity::rate(&placement, event_kind);
            findings.push(finding(rating, &node.data, value));
        }

        stack.extend(node.children.iter().rev());
    }

    let mut highest = findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or_default();

    if event_kind.is_text() {
        for finding in &mut findings {
            finding.severity = Severity::None;
        }
        highest = Severity::None;
    }

    debug!(
        "[Classifier] {} findings for {} event, highest severity {}",
        findings.len(),
        event_kind,
        highest
    );

    Classification { findings, highest }
}

/// Parse a markup capture and classify it
pub fn classify_markup(
    text: &str,
    marker: &str,
    event_kind: &EventKind,
    limits: &ParseLimits,
) -> Result<Classification, ParseError> {
    let tree = dom::parse_markup(text, limits)?;
    Ok(classify(&tree, marker, event_kind))
}

fn finding(rating: Rating, enclosing_node: &str, snippet: &str) -> Finding {
    Finding {
        id: 0,
        event_id: 0,
        location: rating.location,
        enclosing_node: enclosing_node.to_string(),
        snippet: snippet.to_string(),
        severity: rating.severity,
        reason: rating.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeKind;
    use crate::types::{LocationKind, Reason};

    const MARKER: &str = "zzTRACERzz";

    fn html() -> EventKind {
        EventKind::from("html")
    }

    fn run(markup: &str, kind: &EventKind) -> Classification {
        classify_markup(markup, MARKER, kind, &ParseLimits::default()).unwrap()
    }

    #[test]
    fn test_no_marker_no_findings() {
        let result = run("<p>nothing to see</p>", &html());
        assert!(result.is_empty());
        assert_eq!(result.highest, Severity::None);
    }

    #[test]
    fn test_text_node() {
        let result = run("<div>hello zzTRACERzz</div>", &html());
        assert_eq!(result.findings.len(), 1);
        let f = &result.findings[0];
        assert_eq!(f.location, LocationKind::Text);
        assert_eq!(f.reason, Reason::LeafNode);
        assert_eq!(f.enclosing_node, "div");
        assert_eq!(f.snippet, "hello zzTRACERzz");
    }

    #[test]
    fn test_comment_node() {
        let result = run("<body><!--zzTRACERzz--></body>", &html());
        assert_eq!(result.findings.len(), 1);
        let f = &result.findings[0];
        assert_eq!(f.location, LocationKind::Comment);
        assert_eq!(f.severity, Severity::Low);
        assert_eq!(f.reason, Reason::LeafNodeCommentTag);
        assert_eq!(result.highest, Severity::Low);
    }

    #[test]
    fn test_tag_name() {
        let result = run("<div><zztracerzz></zztracerzz></div>", &html());
        // html5ever lowercases tag names, matching stays case-sensitive
        assert!(result.is_empty());

        let result = classify_markup(
            "<div><zztracerzz></zztracerzz></div>",
            "zztracerzz",
            &html(),
            &ParseLimits::default(),
        )
        .unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].location, LocationKind::NodeName);
        assert_eq!(result.findings[0].reason, Reason::TagName);
        assert_eq!(result.findings[0].enclosing_node, "div");
        assert_eq!(result.highest, Severity::High);
    }

    #[test]
    fn test_tag_name_under_script_parent() {
        let mut tree = CaptureTree::new();
        let doc = tree.push(None, NodeKind::Document, "", Vec::new()).unwrap();
        let script = tree.push(Some(doc), NodeKind::Element, "script", Vec::new()).unwrap();
        tree.push(Some(script), NodeKind::Element, MARKER, Vec::new()).unwrap();

        let result = classify(&tree, MARKER, &html());
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].reason, Reason::TagName);
        assert_eq!(result.findings[0].severity, Severity::High);
    }

    #[test]
    fn test_attribute_name_and_value() {
        // attribute names are lowercased by the parser
        let result = run(r#"<a zzTRACERzz="1">x</a>"#, &html());
        assert!(result.is_empty());

        let result = run(r#"<a title="see zzTRACERzz">x</a>"#, &html());
        assert_eq!(result.findings.len(), 1);
        let f = &result.findings[0];
        assert_eq!(f.location, LocationKind::AttrVal);
        assert_eq!(f.reason, Reason::AttributeValueHttpResponse);
        assert_eq!(f.enclosing_node, "a");
        assert_eq!(f.snippet, "see zzTRACERzz");
    }

    #[test]
    fn test_attribute_name_match() {
        let result = classify_markup(
            r#"<img zztracerzz="zztracerzz">"#,
            "zztracerzz",
            &html(),
            &ParseLimits::default(),
        )
        .unwrap();
        // name match suppresses the value check
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].location, LocationKind::Attr);
        assert_eq!(result.findings[0].reason, Reason::AttributeName);
        assert_eq!(result.findings[0].severity, Severity::High);
    }

    #[test]
    fn test_href_and_on_handlers() {
        let markup = r#"<a href="zzTRACERzz/x" onclick="run('zzTRACERzz')">go</a>"#;

        let result = run(markup, &html());
        let reasons: Vec<Reason> = result.findings.iter().map(|f| f.reason).collect();
        assert_eq!(
            reasons,
            vec![Reason::AttributeValueStartHref, Reason::AttributeValueOnEventHandler]
        );
        assert_eq!(result.highest, Severity::Medium);

        let result = run(markup, &EventKind::Response);
        assert!(result
            .findings
            .iter()
            .all(|f| f.reason == Reason::AttributeValueHttpResponse && f.severity == Severity::Low));
    }

    #[test]
    fn test_text_event_forces_zero() {
        let result = classify_markup(
            r#"<zztracerzz onclick="zztracerzz"><!--zztracerzz--></zztracerzz>"#,
            "zztracerzz",
            &EventKind::Text,
            &ParseLimits::default(),
        )
        .unwrap();
        assert_eq!(result.findings.len(), 3);
        assert!(result.findings.iter().all(|f| f.severity == Severity::None));
        assert_eq!(result.highest, Severity::None);
    }

    #[test]
    fn test_pre_order_visit() {
        let markup = r#"<div title="zzTRACERzz">zzTRACERzz<p>zzTRACERzz</p></div><!--zzTRACERzz-->"#;
        let result = run(markup, &html());
        let locations: Vec<(LocationKind, &str)> = result
            .findings
            .iter()
            .map(|f| (f.location, f.enclosing_node.as_str()))
            .collect();
        assert_eq!(
            locations,
            vec![
                (LocationKind::AttrVal, "div"),
                (LocationKind::Text, "div"),
                (LocationKind::Text, "p"),
                (LocationKind::Comment, "body"),
            ]
        );
    }

    #[test]
    fn test_highest_only_counts_findings() {
        // a high-severity attribute followed by a non-matching one must not leak
        let mut tree = CaptureTree::new();
        let doc = tree.push(None, NodeKind::Document, "", Vec::new()).unwrap();
        tree.push(
            Some(doc),
            NodeKind::Element,
            "p",
            vec![
                ("title".to_string(), MARKER.to_string()),
                ("class".to_string(), "plain".to_string()),
            ],
        );
        let result = classify(&tree, MARKER, &EventKind::Response);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.highest, Severity::Low);
    }

    #[test]
    fn test_empty_marker_matches_nothing() {
        let tree = dom::parse_markup("<p>x</p>", &ParseLimits::default()).unwrap();
        assert!(classify(&tree, "", &html()).is_empty());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let markup = r#"<a href="zzTRACERzz" onmouseover="zzTRACERzz">zzTRACERzz</a><!--zzTRACERzz-->"#;
        let tree = dom::parse_markup(markup, &ParseLimits::default()).unwrap();
        let first = classify(&tree, MARKER, &html());
        let second = classify(&tree, MARKER, &html());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}

//! Annotation reconciliation: action controls and badges.
//!
//! The reconciler owns every element it creates and nothing else. The
//! idempotency contract is strict: reconciling an unchanged entry performs
//! zero document writes, so repeated scans cannot accumulate controls or
//! retrigger observation. Every created node carries the reserved marker
//! before it is attached, which is what lets the change observer discard
//! the resulting mutations.

use crate::dom::{Document, NodeId};
use crate::scanner::Entry;
use tracing::debug;
use triage_protocol::defaults::{
    ACTIONS_CONTAINER_CLASS, ACTION_ATTR, BADGE_CLASS, BADGE_TEXT, DELETE_CONTROL_CLASS,
    MARKER_ATTR, REPORT_CONTROL_CLASS, ROW_REF_ATTR,
};
use triage_protocol::ControlKind;

/// Align the entry's action control with the match verdict. Returns true
/// if any document write happened.
pub fn reconcile_entry(doc: &mut Document, entry: &Entry, matched: bool) -> bool {
    let desired = if matched {
        ControlKind::Delete
    } else {
        ControlKind::Report
    };

    let Some(host) = doc.parent(entry.row) else {
        debug!(row = %entry.row, "Row has no parent to host controls; skipping");
        return false;
    };

    let container = doc.child_with_class(host, ACTIONS_CONTAINER_CLASS);
    if let Some(container) = container {
        if current_control(doc, container) == Some(desired) {
            return false;
        }
        rebuild_control(doc, container, entry.row, desired);
        return true;
    }

    let container = doc.create_element("span");
    doc.set_attribute(container, MARKER_ATTR, "1");
    doc.add_class(container, ACTIONS_CONTAINER_CLASS);
    doc.append_child(host, container);
    rebuild_control(doc, container, entry.row, desired);
    true
}

/// Align badge presence on an error container with whether its text
/// currently matches any stored pattern. Returns true on write.
pub fn reconcile_badge(doc: &mut Document, error_node: NodeId, matched: bool) -> bool {
    let existing = doc.child_with_class(error_node, BADGE_CLASS);
    match (matched, existing) {
        (true, None) => {
            let badge = doc.create_element("span");
            doc.set_attribute(badge, MARKER_ATTR, "1");
            doc.add_class(badge, BADGE_CLASS);
            doc.set_text(badge, BADGE_TEXT);
            doc.append_child(error_node, badge);
            true
        }
        (false, Some(badge)) => {
            doc.remove_node(badge);
            true
        }
        _ => false,
    }
}

/// The control kind currently present, if the container holds exactly one
/// well-formed control. Anything else forces a rebuild.
fn current_control(doc: &Document, container: NodeId) -> Option<ControlKind> {
    let children = doc.children(container);
    if children.len() != 1 {
        return None;
    }
    doc.attr(children[0], ACTION_ATTR)?.parse().ok()
}

fn rebuild_control(doc: &mut Document, container: NodeId, row: NodeId, desired: ControlKind) {
    for child in doc.children(container).to_vec() {
        doc.remove_node(child);
    }

    let (class, label, title) = match desired {
        ControlKind::Report => (REPORT_CONTROL_CLASS, "R", "Report Known Issue"),
        ControlKind::Delete => (DELETE_CONTROL_CLASS, "D", "Delete Known Issue"),
    };

    let control = doc.create_element("button");
    doc.set_attribute(control, MARKER_ATTR, "1");
    doc.set_attribute(control, ACTION_ATTR, desired.as_str());
    doc.set_attribute(control, ROW_REF_ATTR, row.to_string());
    doc.set_attribute(control, "title", title);
    doc.add_class(control, class);
    doc.set_text(control, label);
    doc.append_child(container, control);
}

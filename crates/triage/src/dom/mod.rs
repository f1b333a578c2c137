//! In-memory document model.
//!
//! The report document is an arena tree of elements owned by the host.
//! The matcher holds a [`DocumentHandle`] to it, never a copy: entries are
//! referenced by [`NodeId`] and annotations are written in place.
//!
//! Every structural, text, or attribute mutation emits a
//! [`MutationRecord`] to all subscribers. Records are only emitted for
//! nodes attached to the root - building a detached subtree is silent
//! until it is appended, which mirrors how change observation behaves in
//! the host environments this models.

pub mod selector;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use triage_protocol::defaults::MARKER_ATTR;

use selector::Selector;

/// Identity of a node within one [`Document`] arena. Stable for the
/// document's lifetime; detached nodes keep their id but become
/// unreachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// One observed document mutation.
///
/// `added_nodes` lists subtree roots appended to `target`;
/// `attribute_changed` names the attribute when the mutation was an
/// attribute write. Text edits and child removals surface as records with
/// neither.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub attribute_changed: Option<String>,
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
}

/// Serializable document snapshot, used to load report files and to build
/// fixtures. The tree shape mirrors [`Node`] minus arena bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_child(mut self, child: NodeSnapshot) -> Self {
        self.children.push(child);
        self
    }
}

/// The live document: an arena element tree plus the current location and
/// the mutation subscriber list.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    location: String,
    subscribers: Vec<mpsc::UnboundedSender<MutationRecord>>,
}

impl Document {
    /// Create an empty document with a `body` root.
    pub fn new(location: impl Into<String>) -> Self {
        let root_node = Node {
            parent: None,
            children: Vec::new(),
            tag: "body".to_string(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
        };
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
            location: location.into(),
            subscribers: Vec::new(),
        }
    }

    /// Build a document whose root children come from a snapshot.
    pub fn from_snapshot(location: impl Into<String>, snapshot: &NodeSnapshot) -> Self {
        let mut doc = Self::new(location);
        let root = doc.root;
        doc.build_subtree(root, snapshot);
        doc
    }

    /// Parse a JSON snapshot into a document.
    pub fn load_json(location: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let snapshot: NodeSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(location, &snapshot))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Navigate. Location changes produce no mutation record; the observer
    /// discovers them through its poll or a navigation attribute write.
    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    /// Subscribe to mutation records. Each subscriber gets every record
    /// emitted after the call.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<MutationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    // --- node construction & mutation ---

    /// Create a detached element. It emits nothing until appended.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            tag: tag.into(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        if self.is_attached(parent) {
            self.emit(MutationRecord {
                target: parent,
                added_nodes: vec![child],
                attribute_changed: None,
            });
        }
    }

    /// Detach a node from its parent. The arena slot survives, so stale
    /// [`NodeId`]s resolve to detached nodes rather than dangling.
    pub fn remove_node(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.index()].parent.take() else {
            return;
        };
        let was_attached = self.is_attached(parent);
        self.nodes[parent.index()].children.retain(|&c| c != node);
        if was_attached {
            self.emit(MutationRecord {
                target: parent,
                added_nodes: Vec::new(),
                attribute_changed: None,
            });
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.nodes[node.index()].text = text.into();
        if self.is_attached(node) {
            self.emit(MutationRecord {
                target: node,
                added_nodes: Vec::new(),
                attribute_changed: None,
            });
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.nodes[node.index()].attrs.insert(name.clone(), value.into());
        if self.is_attached(node) {
            self.emit(MutationRecord {
                target: node,
                added_nodes: Vec::new(),
                attribute_changed: Some(name),
            });
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: impl Into<String>) {
        let class = class.into();
        let entry = &mut self.nodes[node.index()];
        if !entry.classes.contains(&class) {
            entry.classes.push(class);
            if self.is_attached(node) {
                self.emit(MutationRecord {
                    target: node,
                    added_nodes: Vec::new(),
                    attribute_changed: Some("class".to_string()),
                });
            }
        }
    }

    /// Replace the root's children with a new snapshot subtree. Used when
    /// the backing report file is rewritten: the removals and appends are
    /// ordinary (unmarked) mutations, so the observer reacts to them.
    pub fn replace_content(&mut self, snapshot: &NodeSnapshot) {
        let children: Vec<NodeId> = self.nodes[self.root.index()].children.clone();
        for child in children {
            self.remove_node(child);
        }
        let root = self.root;
        self.build_subtree(root, snapshot);
    }

    // --- accessors ---

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.index()].tag
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].children
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.index()].attrs.get(name).map(String::as_str)
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.nodes[node.index()].classes
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.index()].classes.iter().any(|c| c == class)
    }

    pub fn own_text(&self, node: NodeId) -> &str {
        &self.nodes[node.index()].text
    }

    /// Concatenated text of the node and all descendants, document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, false, &mut out);
        out
    }

    /// Like [`Self::text_content`], but skipping subtrees that carry the
    /// reserved marker. This is the text the matcher classifies: badges
    /// and controls are annotations about the content, not content, and
    /// must not feed back into their own verdicts.
    pub fn text_excluding_marked(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, true, &mut out);
        out
    }

    /// Whether the node carries the reserved self-produced marker.
    pub fn is_marked(&self, node: NodeId) -> bool {
        self.attr(node, MARKER_ATTR).is_some()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.index()].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Count of nodes reachable from the root. Detached nodes do not
    /// count, which makes this a cheap annotation-accumulation probe.
    pub fn attached_count(&self) -> usize {
        let mut count = 0;
        self.walk(self.root, &mut |_| count += 1);
        count
    }

    // --- queries ---

    /// All attached nodes matching the selector, in document order.
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |node| {
            if selector.matches(self, node) {
                out.push(node);
            }
        });
        out
    }

    /// First descendant of `scope` (excluding `scope` itself) matching the
    /// selector.
    pub fn select_first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut found = None;
        self.walk(scope, &mut |node| {
            if found.is_none() && node != scope && selector.matches(self, node) {
                found = Some(node);
            }
        });
        found
    }

    /// Nearest ancestor (including the node itself) with the given tag.
    pub fn closest_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.nodes[n.index()].tag.eq_ignore_ascii_case(tag) {
                return Some(n);
            }
            current = self.nodes[n.index()].parent;
        }
        None
    }

    /// First direct child carrying the given class.
    pub fn child_with_class(&self, parent: NodeId, class: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.has_class(c, class))
    }

    // --- internals ---

    fn build_subtree(&mut self, parent: NodeId, snapshot: &NodeSnapshot) {
        for child_snapshot in &snapshot.children {
            let child = self.build_detached(child_snapshot);
            self.append_child(parent, child);
        }
        // Root-level text/attrs from the snapshot apply to the parent node.
        if !snapshot.text.is_empty() {
            self.set_text(parent, snapshot.text.clone());
        }
    }

    fn build_detached(&mut self, snapshot: &NodeSnapshot) -> NodeId {
        let node = self.create_element(snapshot.tag.clone());
        {
            let entry = &mut self.nodes[node.index()];
            entry.classes = snapshot.classes.clone();
            entry.attrs = snapshot.attrs.clone();
            entry.text = snapshot.text.clone();
        }
        for child_snapshot in &snapshot.children {
            let child = self.build_detached(child_snapshot);
            self.nodes[child.index()].parent = Some(node);
            self.nodes[node.index()].children.push(child);
        }
        node
    }

    /// Export the attached tree as a snapshot (root children only).
    pub fn to_snapshot(&self) -> NodeSnapshot {
        self.snapshot_node(self.root)
    }

    fn snapshot_node(&self, node: NodeId) -> NodeSnapshot {
        let entry = &self.nodes[node.index()];
        NodeSnapshot {
            tag: entry.tag.clone(),
            classes: entry.classes.clone(),
            attrs: entry.attrs.clone(),
            text: entry.text.clone(),
            children: entry
                .children
                .iter()
                .map(|&c| self.snapshot_node(c))
                .collect(),
        }
    }

    fn collect_text(&self, node: NodeId, skip_marked: bool, out: &mut String) {
        if skip_marked && self.is_marked(node) {
            return;
        }
        out.push_str(&self.nodes[node.index()].text);
        for &child in &self.nodes[node.index()].children {
            self.collect_text(child, skip_marked, out);
        }
    }

    fn walk(&self, node: NodeId, visit: &mut impl FnMut(NodeId)) {
        visit(node);
        for &child in &self.nodes[node.index()].children {
            self.walk(child, visit);
        }
    }

    fn emit(&mut self, record: MutationRecord) {
        self.subscribers
            .retain(|tx| tx.send(record.clone()).is_ok());
    }
}

/// Cloneable shared handle to a [`Document`].
///
/// The lock is held for whole synchronous phases (a full scan's writes),
/// never across an await point, so reconciliation is atomic with respect
/// to the matcher's own change detection.
#[derive(Clone)]
pub struct DocumentHandle {
    inner: Arc<Mutex<Document>>,
}

impl DocumentHandle {
    pub fn new(document: Document) -> Self {
        Self {
            inner: Arc::new(Mutex::new(document)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Document> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<MutationRecord> {
        self.lock().subscribe()
    }
}

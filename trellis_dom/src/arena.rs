use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// A stable identity for a node in a [`Document`], bound to the node's
    /// lifetime in the arena rather than to any host garbage collector.
    pub struct NodeId;
}

/// Every dispatch walks a propagation path that ends at the document and then
/// the window, neither of which is itself an element. `EventTarget` is the
/// common currency the event engine uses for "the thing a listener is
/// attached to" or "the thing currently being visited while walking a path".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// An element (or other) node living in the arena.
    Node(NodeId),
    /// The document pseudo-target, always the second-to-last path entry.
    Document,
    /// The window pseudo-target, always the last path entry.
    Window,
}

impl EventTarget {
    /// Returns the underlying [`NodeId`], if this target is a node.
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            EventTarget::Node(id) => Some(id),
            _ => None,
        }
    }
}

/// A minimal, strongly typed stand-in for a DOM element: enough structure to
/// drive selector matching and propagation-path construction without pulling
/// in a full layout/rendering tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 4]>,
    pub attrs: FxHashMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: SmallVec::new(),
            attrs: FxHashMap::default(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An in-memory arena of [`Node`]s, rooted at a single element, that models
/// "the document" for native/test builds. Detaching a subtree does not free
/// its nodes immediately — callers observe detachment through
/// [`Document::is_connected`], mirroring how a real DOM node can be detached
/// yet still referenced (and eventually collected) by the host.
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Document {
    /// Creates a new document with a single root element (commonly `<body>` or
    /// an app-mount `<div>`).
    pub fn new(root_tag: impl Into<String>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(root_tag));
        Self { nodes, root }
    }

    /// The document's root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Creates a new, unattached element. Call [`Document::append_child`] to
    /// attach it somewhere in the tree.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(tag))
    }

    /// Appends `child` to `parent`, detaching it from any previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Detaches `node` from its parent, if any. The node and its descendants
    /// remain valid arena entries (and keep their own parent/child links among
    /// themselves) until [`Document::remove`] is called, so that a
    /// detach-then-reattach within the same task never loses state.
    pub fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get(node).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&c| c != node);
            }
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = None;
        }
    }

    /// Permanently removes `node` and its descendants from the arena. This is
    /// the point at which the memory governor's detach sweep actually frees a
    /// subtree, as opposed to merely un-parenting it.
    pub fn remove(&mut self, node: NodeId) {
        let children = self.nodes.get(node).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.remove(child);
        }
        self.detach(node);
        self.nodes.remove(node);
    }

    /// A node is connected if it is the root, or if walking its parent chain
    /// reaches the root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns `true` if `node` is still a live arena entry (has not been
    /// [`Document::remove`]d).
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Builds the ancestor chain from `node` (inclusive) up to and including
    /// the root, used when the host has no authoritative `composedPath()`.
    pub fn ancestor_chain(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path
    }

    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.id = Some(id.into());
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.classes.push(class.into());
        }
    }

    pub fn set_attr(&mut self, node: NodeId, key: impl Into<String>, value: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.attrs.insert(key.into(), value.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detach_then_reattach_preserves_subtree() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(doc.root(), row);
        doc.append_child(row, button);
        assert!(doc.is_connected(button));

        doc.detach(row);
        assert!(!doc.is_connected(button));
        assert!(doc.contains(button), "detach must not free nodes");

        doc.append_child(doc.root(), row);
        assert!(doc.is_connected(button));
    }

    #[test]
    fn remove_frees_subtree() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(doc.root(), row);
        doc.append_child(row, button);

        doc.remove(row);
        assert!(!doc.contains(row));
        assert!(!doc.contains(button));
    }
}

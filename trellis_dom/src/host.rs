use crate::{
    arena::{Document, EventTarget, NodeId},
    selector::Selector,
};

/// What the Event Dispatcher needs from its host environment: a way to find a
/// node's propagation path, check whether it's still connected, and match it
/// against a delegation selector. [`Document`] implements this directly for
/// native/test builds; the `browser` feature adds an implementation backed by
/// real `web_sys` nodes.
pub trait DomHost {
    /// Builds the full propagation path for `target`: the node itself, its
    /// ancestors in order, then [`EventTarget::Document`] and
    /// [`EventTarget::Window`]. Prefers the host's authoritative
    /// `composedPath()` where available (see the `browser` backend); falls
    /// back to walking `parent` links.
    fn propagation_path(&self, target: NodeId) -> Vec<EventTarget>;

    /// Whether `node` is still reachable from the document root.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Whether `node` is still a live entry at all (not yet fully removed).
    fn node_exists(&self, node: NodeId) -> bool;

    /// Does `node` satisfy `selector`?
    fn matches(&self, node: NodeId, selector: &Selector) -> bool;

    /// The nearest ancestor of `target` (inclusive) matching `selector`,
    /// bounded by `root`.
    fn closest(&self, target: NodeId, selector: &Selector, root: NodeId) -> Option<NodeId>;
}

impl DomHost for Document {
    fn propagation_path(&self, target: NodeId) -> Vec<EventTarget> {
        let mut path: Vec<EventTarget> = self
            .ancestor_chain(target)
            .into_iter()
            .map(EventTarget::Node)
            .collect();
        path.push(EventTarget::Document);
        path.push(EventTarget::Window);
        path
    }

    fn is_connected(&self, node: NodeId) -> bool {
        Document::is_connected(self, node)
    }

    fn node_exists(&self, node: NodeId) -> bool {
        self.contains(node)
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    fn closest(&self, target: NodeId, selector: &Selector, root: NodeId) -> Option<NodeId> {
        selector.closest(self, target, root)
    }
}

#[cfg(feature = "browser")]
pub use browser::BrowserHost;

#[cfg(feature = "browser")]
mod browser {
    use super::*;
    use wasm_bindgen::JsCast;

    /// A [`DomHost`] backed by a real `web_sys::Node`, used when the `browser`
    /// feature is enabled. Node identity is tracked by a side arena so the
    /// rest of the event engine can keep using the same [`NodeId`] currency it
    /// uses against [`Document`].
    pub struct BrowserHost {
        nodes: slotmap::SlotMap<NodeId, web_sys::Node>,
    }

    impl BrowserHost {
        pub fn new() -> Self {
            Self {
                nodes: slotmap::SlotMap::with_key(),
            }
        }

        pub fn adopt(&mut self, node: web_sys::Node) -> NodeId {
            self.nodes.insert(node)
        }

        fn raw(&self, id: NodeId) -> Option<&web_sys::Node> {
            self.nodes.get(id)
        }
    }

    impl Default for BrowserHost {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DomHost for BrowserHost {
        fn propagation_path(&self, target: NodeId) -> Vec<EventTarget> {
            // Real browsers expose `Event::composed_path()` at dispatch time,
            // which is authoritative for shadow DOM; absent a live event this
            // falls back to walking `parentNode`, which is what the dispatcher
            // uses when building a path ahead of time (e.g. for diagnostics).
            let mut path = Vec::new();
            let mut current = self.raw(target).cloned();
            while let Some(node) = current {
                let id = self
                    .nodes
                    .iter()
                    .find(|(_, n)| n.is_same_node(Some(&node)))
                    .map(|(id, _)| id);
                if let Some(id) = id {
                    path.push(EventTarget::Node(id));
                }
                current = node.parent_node();
            }
            path.push(EventTarget::Document);
            path.push(EventTarget::Window);
            path
        }

        fn is_connected(&self, node: NodeId) -> bool {
            self.raw(node).map(|n| n.is_connected()).unwrap_or(false)
        }

        fn node_exists(&self, node: NodeId) -> bool {
            self.nodes.contains_key(node)
        }

        fn matches(&self, node: NodeId, selector: &Selector) -> bool {
            let Some(raw) = self.raw(node) else {
                return false;
            };
            let Some(element) = raw.dyn_ref::<web_sys::Element>() else {
                return false;
            };
            element.matches(selector.source()).unwrap_or(false)
        }

        fn closest(&self, target: NodeId, selector: &Selector, root: NodeId) -> Option<NodeId> {
            let mut current = Some(target);
            while let Some(node) = current {
                if self.matches(node, selector) {
                    return Some(node);
                }
                if node == root {
                    break;
                }
                let parent = self.raw(node).and_then(|n| n.parent_node());
                current = parent.and_then(|p| {
                    self.nodes.iter().find(|(_, n)| n.is_same_node(Some(&p))).map(|(id, _)| id)
                });
            }
            None
        }
    }
}

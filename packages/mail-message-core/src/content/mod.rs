//! Content tree for rendered message bodies.
//!
//! The tree is an arena: a [`Document`] owns every node and hands out
//! copyable [`NodeId`]s. Detached nodes stay in the arena but are no longer
//! reachable from the root, so they are never serialized.

mod html;

pub use html::{sanitize, VOID_ELEMENTS};

/// Handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element node: tag, ordered attributes and display state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in source order
    pub attrs: Vec<(String, String)>,
    /// Whether display is suppressed
    pub hidden: bool,
}

impl Element {
    /// Create an element with the given tag.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            hidden: false,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Whether the element has the given tag.
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    /// Whether the whitespace-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The document root; serializes as its children only
    Fragment,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed tree of content nodes rooted at a fragment.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Fragment,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The fragment root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Element data, if the node is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element data, if the node is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Text value, if the node is a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Text(_))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Add a detached element to the arena.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    /// Add a detached text node to the arena.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Move `node` right before `reference`.
    ///
    /// Returns false, leaving `node` untouched, when `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> bool {
        if self.parent(reference).is_none() || reference == node {
            return false;
        }
        self.detach(node);
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        let Some(index) = self.index_in_parent(reference) else {
            return false;
        };
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, node);
        true
    }

    /// Put `new` in place of `old`, which becomes detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        if !self.insert_before(old, new) {
            return false;
        }
        self.detach(old);
        true
    }

    /// Remove a node from its parent; it keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// All siblings before `id`, nearest first.
    pub fn previous_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            return Vec::new();
        };
        self.children(parent)[..index].iter().rev().copied().collect()
    }

    /// Closest preceding sibling that is an element.
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.previous_siblings(id)
            .into_iter()
            .find(|&sibling| self.is_element(sibling))
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    /// Concatenated text of all text descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Replace the children of `id` with a single text node.
    ///
    /// A lone text child is rewritten in place.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let [only] = self.nodes[id.0].children[..] {
            if let NodeKind::Text(existing) = &mut self.nodes[only.0].kind {
                existing.clear();
                existing.push_str(text);
                return;
            }
        }
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        let text_node = self.create_text(text);
        self.append_child(id, text_node);
    }

    /// Number of nodes held by the arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every node unreachable from the root.
    ///
    /// Surviving nodes are renumbered in document order, so every `NodeId`
    /// obtained before the call is invalidated. Returns how many nodes were
    /// freed.
    pub fn compact(&mut self) -> usize {
        let reachable: Vec<NodeId> = std::iter::once(self.root())
            .chain(self.descendants(self.root()))
            .collect();
        let freed = self.nodes.len() - reachable.len();
        if freed == 0 {
            return 0;
        }

        let mut remap = vec![None; self.nodes.len()];
        for (new_index, old) in reachable.iter().enumerate() {
            remap[old.0] = Some(NodeId(new_index));
        }
        let mut old_nodes: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        self.nodes = reachable
            .iter()
            .filter_map(|old| old_nodes[old.0].take())
            .map(|node| Node {
                kind: node.kind,
                parent: node.parent.and_then(|parent| remap[parent.0]),
                children: node
                    .children
                    .iter()
                    .filter_map(|child| remap[child.0])
                    .collect(),
            })
            .collect();
        freed
    }

    /// Suppress or restore display of an element; no-op for other nodes.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(element) = self.element_mut(id) {
            element.hidden = hidden;
        }
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.element(id).map(|e| e.hidden).unwrap_or(false)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

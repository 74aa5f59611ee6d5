//! Arena backed document model.
//!
//! Nodes are never freed. Detaching a node only unlinks it from its parent,
//! so a [`NodeId`] stays meaningful for the lifetime of the document.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let position = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(position).1)
    }

    /// `hidden` attribute or an inline `display: none` style.
    pub(crate) fn is_hidden(&self) -> bool {
        if self.attribute("hidden").is_some() {
            return true;
        }
        self.attribute("style").is_some_and(|style| {
            style.split(';').any(|decl| {
                let mut parts = decl.splitn(2, ':');
                let property = parts.next().unwrap_or_default().trim();
                let value = parts.next().unwrap_or_default().trim();
                property.eq_ignore_ascii_case("display") && value.eq_ignore_ascii_case("none")
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable tree of elements and text nodes below a single root.
///
/// Methods taking a [`NodeId`] panic when the id was not produced by this
/// document.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self { nodes: vec![NodeData { kind: NodeKind::Root, parent: None, children: Vec::new() }] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes ever created, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|child| self.element(*child).is_some())
    }

    /// Parent if it is an element (the root is not).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|parent| self.element(*parent).is_some())
    }

    pub fn append_element(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let index = self.nodes[parent.0].children.len();
        self.insert_element(parent, index, name)
    }

    /// Inserts a new element at `index` among the children of `parent` (clamped).
    pub fn insert_element(&mut self, parent: NodeId, index: usize, name: impl Into<String>) -> NodeId {
        self.insert_node(parent, index, NodeKind::Element(Element::new(name)))
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let index = self.nodes[parent.0].children.len();
        self.insert_node(parent, index, NodeKind::Text(text.into()))
    }

    fn insert_node(&mut self, parent: NodeId, index: usize, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { kind, parent: Some(parent), children: Vec::new() });
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        id
    }

    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.set_attribute(name, value);
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.remove_attribute(name)
    }

    /// Replaces all children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        self.append_text(id, text);
    }

    /// Unlinks `id` (and its subtree) from the document.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |node| self.parent(*node))
    }

    /// `id` and all nodes below it in document order.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        order
    }

    /// Rank of every attached node in document order, `None` for detached ones.
    pub(crate) fn order_ranks(&self) -> Vec<Option<usize>> {
        let mut ranks = vec![None; self.nodes.len()];
        for (rank, node) in self.preorder(self.root()).into_iter().enumerate() {
            ranks[node.0] = Some(rank);
        }
        ranks
    }

    /// Concatenated descendant text with runs of whitespace collapsed.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut raw = String::new();
        for node in self.preorder(id) {
            if let NodeKind::Text(text) = &self.nodes[node.0].kind {
                raw.push_str(text);
            }
        }
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Attached, not hidden itself or through an ancestor, and not disabled.
    pub fn is_interactable(&self, id: NodeId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if !self.is_attached(id) || element.attribute("disabled").is_some() {
            return false;
        }
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|node| self.element(node))
            .all(|element| !element.is_hidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn list() -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root(), "ul");
        let items = ["a", "b", "c"]
            .into_iter()
            .map(|text| {
                let li = doc.append_element(ul, "li");
                doc.append_text(li, format!("  item\n {text} "));
                li
            })
            .collect();
        (doc, ul, items)
    }

    #[rstest]
    fn text_content_is_normalised(list: (Document, NodeId, Vec<NodeId>)) {
        let (doc, ul, items) = list;
        assert_eq!(doc.text_content(items[0]), "item a");
        assert_eq!(doc.text_content(ul), "item a item b item c");
    }

    #[rstest]
    fn insert_keeps_ids_and_changes_order(list: (Document, NodeId, Vec<NodeId>)) {
        let (mut doc, ul, items) = list;
        let first = doc.insert_element(ul, 0, "li");
        let children: Vec<_> = doc.element_children(ul).collect();
        assert_eq!(children, vec![first, items[0], items[1], items[2]]);
        let ranks = doc.order_ranks();
        assert!(ranks[first.index()] < ranks[items[0].index()]);
    }

    #[rstest]
    fn detached_nodes_are_not_interactable(list: (Document, NodeId, Vec<NodeId>)) {
        let (mut doc, _, items) = list;
        assert!(doc.is_interactable(items[1]));
        doc.detach(items[1]);
        assert!(!doc.is_attached(items[1]));
        assert!(!doc.is_interactable(items[1]));
        assert_eq!(doc.order_ranks()[items[1].index()], None);
    }

    #[rstest]
    #[case("hidden", "")]
    #[case("style", "color: red; display : NONE")]
    fn hidden_ancestors_hide_descendants(
        list: (Document, NodeId, Vec<NodeId>),
        #[case] name: &str,
        #[case] value: &str,
    ) {
        let (mut doc, ul, items) = list;
        doc.set_attribute(ul, name, value);
        assert!(!doc.is_interactable(items[0]));
        doc.remove_attribute(ul, name);
        assert!(doc.is_interactable(items[0]));
    }

    #[rstest]
    fn disabled_only_applies_to_the_node_itself(list: (Document, NodeId, Vec<NodeId>)) {
        let (mut doc, ul, items) = list;
        doc.set_attribute(ul, "disabled", "");
        assert!(!doc.is_interactable(ul));
        assert!(doc.is_interactable(items[2]));
    }

    #[rstest]
    fn set_text_replaces_children(list: (Document, NodeId, Vec<NodeId>)) {
        let (mut doc, _, items) = list;
        doc.set_text(items[0], "fresh");
        assert_eq!(doc.text_content(items[0]), "fresh");
        assert_eq!(doc.children(items[0]).len(), 1);
    }
}

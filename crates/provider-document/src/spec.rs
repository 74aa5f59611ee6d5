use crate::document::{Document, NodeId};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Content {
    Text(String),
    Element(ElementSpec),
}

/// Declarative description of an element subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementSpec {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
}

impl ElementSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new(), content: Vec::new() }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(Content::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: ElementSpec) -> Self {
        self.content.push(Content::Element(child));
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = ElementSpec>,
    {
        self.content.extend(children.into_iter().map(Content::Element));
        self
    }
}

impl Document {
    /// Document whose single top-level element is built from `spec`.
    pub fn from_spec(spec: &ElementSpec) -> Self {
        let mut document = Document::new();
        let root = document.root();
        document.append_spec(root, spec);
        document
    }

    pub fn append_spec(&mut self, parent: NodeId, spec: &ElementSpec) -> NodeId {
        let index = self.children(parent).len();
        self.insert_spec(parent, index, spec)
    }

    /// Instantiates `spec` at `index` among the children of `parent`.
    pub fn insert_spec(&mut self, parent: NodeId, index: usize, spec: &ElementSpec) -> NodeId {
        let top = self.insert_element(parent, index, spec.name.as_str());
        let mut pending = vec![(top, spec)];
        while let Some((node, spec)) = pending.pop() {
            for (name, value) in &spec.attributes {
                self.set_attribute(node, name.as_str(), value.as_str());
            }
            for content in &spec.content {
                match content {
                    Content::Text(text) => {
                        self.append_text(node, text.as_str());
                    }
                    Content::Element(child) => {
                        let id = self.append_element(node, child.name.as_str());
                        pending.push((id, child));
                    }
                }
            }
        }
        top
    }
}

//! Evaluation of structural paths with per-context positional predicates.

use crate::document::{Document, NodeId};
use crate::query::{NameTest, Predicate, Step, Subject};

pub(crate) fn select(document: &Document, steps: &[Step]) -> Vec<NodeId> {
    let ranks = document.order_ranks();
    let mut context = vec![document.root()];
    for step in steps {
        let mut matched = Vec::new();
        for &node in &context {
            let parents = if step.descendant { document.preorder(node) } else { vec![node] };
            for parent in parents {
                let group: Vec<NodeId> =
                    document.element_children(parent).filter(|child| step.test.matches(document, *child)).collect();
                matched.extend(filter(document, group, &step.predicates));
            }
        }
        matched.sort_by_key(|node| ranks[node.index()]);
        matched.dedup();
        context = matched;
        if context.is_empty() {
            break;
        }
    }
    context
}

/// Applies predicates in turn; positions are recomputed after each one.
fn filter(document: &Document, mut nodes: Vec<NodeId>, predicates: &[Predicate]) -> Vec<NodeId> {
    for predicate in predicates {
        let size = nodes.len();
        nodes = nodes
            .into_iter()
            .enumerate()
            .filter(|(idx, node)| predicate.accepts(document, *node, idx + 1, size))
            .map(|(_, node)| node)
            .collect();
    }
    nodes
}

impl NameTest {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        match (self, document.element(node)) {
            (_, None) => false,
            (NameTest::Any, Some(_)) => true,
            (NameTest::Named(name), Some(element)) => element.name() == name,
        }
    }
}

impl Predicate {
    fn accepts(&self, document: &Document, node: NodeId, position: usize, size: usize) -> bool {
        let attribute = |name: &str| document.element(node).and_then(|element| element.attribute(name));
        match self {
            Predicate::Position(wanted) => position == *wanted,
            Predicate::Last => position == size,
            Predicate::LastMinus(offset) => size.checked_sub(*offset) == Some(position),
            Predicate::HasAttribute(name) => attribute(name).is_some(),
            Predicate::AttributeEquals(name, value) => attribute(name) == Some(value.as_str()),
            Predicate::TextEquals(value) => document.text_content(node) == *value,
            Predicate::Contains(Subject::Attribute(name), value) => {
                attribute(name).unwrap_or_default().contains(value.as_str())
            }
            Predicate::Contains(Subject::Text, value) => document.text_content(node).contains(value.as_str()),
        }
    }
}

//! Evaluation of attribute selectors, matched right to left.

use crate::document::{Document, NodeId};
use crate::query::{AttrOp, Combinator, ComplexSelector, Compound, Filter};

pub(crate) fn select(document: &Document, selectors: &[ComplexSelector]) -> Vec<NodeId> {
    document
        .preorder(document.root())
        .into_iter()
        .filter(|node| document.element(*node).is_some())
        .filter(|node| selectors.iter().any(|selector| selector.matches(document, *node)))
        .collect()
}

impl ComplexSelector {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            len => self.matches_at(document, node, len - 1),
        }
    }

    fn matches_at(&self, document: &Document, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(document, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators.get(index - 1) {
            Some(Combinator::Child) => document
                .parent_element(node)
                .is_some_and(|parent| self.matches_at(document, parent, index - 1)),
            Some(Combinator::Descendant) => document
                .ancestors(node)
                .filter(|ancestor| document.element(*ancestor).is_some())
                .any(|ancestor| self.matches_at(document, ancestor, index - 1)),
            None => false,
        }
    }
}

impl Compound {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        let Some(element) = document.element(node) else {
            return false;
        };
        if let Some(name) = &self.element
            && !element.name().eq_ignore_ascii_case(name)
        {
            return false;
        }
        self.filters.iter().all(|filter| filter.matches(document, node))
    }
}

impl Filter {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        let Some(element) = document.element(node) else {
            return false;
        };
        let siblings = || -> Vec<NodeId> {
            document.parent(node).map(|parent| document.element_children(parent).collect()).unwrap_or_default()
        };
        match self {
            Filter::Id(id) => element.attribute("id") == Some(id.as_str()),
            Filter::Class(class) => element.has_class(class),
            Filter::Attribute { name, test } => match (element.attribute(name), test) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some((op, expected))) => op.accepts(actual, expected),
            },
            Filter::NthChild(wanted) => siblings().iter().position(|sibling| *sibling == node) == wanted.checked_sub(1),
            Filter::NthOfType(wanted) => {
                let same_type: Vec<NodeId> = siblings()
                    .into_iter()
                    .filter(|sibling| {
                        document
                            .element(*sibling)
                            .is_some_and(|other| other.name().eq_ignore_ascii_case(element.name()))
                    })
                    .collect();
                same_type.iter().position(|sibling| *sibling == node) == wanted.checked_sub(1)
            }
            Filter::FirstChild => siblings().first() == Some(&node),
            Filter::LastChild => siblings().last() == Some(&node),
        }
    }
}

impl AttrOp {
    fn accepts(self, actual: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => !expected.is_empty() && actual.split_whitespace().any(|word| word == expected),
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

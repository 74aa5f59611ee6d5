//! Parsed locators and their evaluation against a [`Document`].

use crate::document::{Document, NodeId};
use crate::{selector, structural};
use gleaner_core::{Dialect, Locator, TreeError};
use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::{Pair, Pairs};

#[derive(pest_derive::Parser)]
#[grammar = "locator.pest"]
struct LocatorParser;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Query {
    Path(Vec<Step>),
    Selectors(Vec<ComplexSelector>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub descendant: bool,
    pub test: NameTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NameTest {
    Any,
    Named(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Predicate {
    Position(usize),
    Last,
    LastMinus(usize),
    HasAttribute(String),
    AttributeEquals(String, String),
    TextEquals(String),
    Contains(Subject, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Subject {
    Attribute(String),
    Text,
}

/// Compound selectors joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ComplexSelector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Combinator {
    Child,
    Descendant,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub element: Option<String>,
    pub filters: Vec<Filter>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Filter {
    Id(String),
    Class(String),
    Attribute { name: String, test: Option<(AttrOp, String)> },
    NthChild(usize),
    NthOfType(usize),
    FirstChild,
    LastChild,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
}

impl Query {
    pub(crate) fn parse(locator: &Locator) -> Result<Self, TreeError> {
        let rule = match locator.dialect() {
            Dialect::Structural => Rule::structural,
            Dialect::Attribute => Rule::attribute,
        };
        let mut pairs = LocatorParser::parse(rule, locator.as_str()).map_err(|err| {
            let column = match err.line_col {
                LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
            };
            TreeError::invalid_locator(
                locator.as_str(),
                format!("{} at column {column}", err.variant.message()),
            )
        })?;
        build_query(&mut pairs).map_err(|reason| TreeError::invalid_locator(locator.as_str(), reason))
    }

    pub(crate) fn evaluate(&self, document: &Document) -> Vec<NodeId> {
        match self {
            Query::Path(steps) => structural::select(document, steps),
            Query::Selectors(selectors) => selector::select(document, selectors),
        }
    }
}

fn build_query(pairs: &mut Pairs<'_, Rule>) -> Result<Query, String> {
    let top = next(pairs, "locator")?;
    let body = next(&mut top.into_inner(), "locator body")?;
    match body.as_rule() {
        Rule::path => build_path(body).map(Query::Path),
        Rule::selector_group => build_group(body).map(Query::Selectors),
        other => Err(format!("unexpected {other:?}")),
    }
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>, String> {
    pairs.next().ok_or_else(|| format!("missing {what}"))
}

fn number(pair: &Pair<'_, Rule>) -> Result<usize, String> {
    pair.as_str().parse::<usize>().map_err(|err| format!("invalid number '{}': {err}", pair.as_str()))
}

fn literal(pair: Pair<'_, Rule>) -> Result<String, String> {
    let inner = next(&mut pair.into_inner(), "literal content")?;
    Ok(inner.as_str().to_owned())
}

fn build_path(pair: Pair<'_, Rule>) -> Result<Vec<Step>, String> {
    pair.into_inner().map(build_step).collect()
}

fn build_step(pair: Pair<'_, Rule>) -> Result<Step, String> {
    let mut inner = pair.into_inner();
    let descendant = next(&mut inner, "axis")?.as_str() == "//";
    let test_pair = next(&mut next(&mut inner, "node test")?.into_inner(), "name")?;
    let test = match test_pair.as_rule() {
        Rule::wildcard => NameTest::Any,
        _ => NameTest::Named(test_pair.as_str().to_owned()),
    };
    let predicates = inner
        .map(|predicate| next(&mut predicate.into_inner(), "predicate").and_then(build_predicate))
        .collect::<Result<_, _>>()?;
    Ok(Step { descendant, test, predicates })
}

fn attr_name(pair: Pair<'_, Rule>) -> Result<String, String> {
    Ok(next(&mut pair.into_inner(), "attribute name")?.as_str().to_owned())
}

fn build_predicate(pair: Pair<'_, Rule>) -> Result<Predicate, String> {
    match pair.as_rule() {
        Rule::index => Ok(Predicate::Position(number(&pair)?)),
        Rule::last => Ok(Predicate::Last),
        Rule::last_offset => {
            let offset = next(&mut pair.into_inner(), "offset")?;
            Ok(Predicate::LastMinus(number(&offset)?))
        }
        Rule::attr_exists => {
            let attr = next(&mut pair.into_inner(), "attribute")?;
            Ok(Predicate::HasAttribute(attr_name(attr)?))
        }
        Rule::attr_equals => {
            let mut inner = pair.into_inner();
            let name = attr_name(next(&mut inner, "attribute")?)?;
            let value = literal(next(&mut inner, "value")?)?;
            Ok(Predicate::AttributeEquals(name, value))
        }
        Rule::text_equals => {
            let mut inner = pair.into_inner();
            next(&mut inner, "text()")?;
            Ok(Predicate::TextEquals(literal(next(&mut inner, "value")?)?))
        }
        Rule::contains_fn => {
            let mut inner = pair.into_inner();
            let subject = next(&mut inner, "contains subject")?;
            let subject = match subject.as_rule() {
                Rule::attr_ref => Subject::Attribute(attr_name(subject)?),
                _ => Subject::Text,
            };
            Ok(Predicate::Contains(subject, literal(next(&mut inner, "value")?)?))
        }
        other => Err(format!("unsupported predicate {other:?}")),
    }
}

fn build_group(pair: Pair<'_, Rule>) -> Result<Vec<ComplexSelector>, String> {
    pair.into_inner().map(build_selector).collect()
}

fn build_selector(pair: Pair<'_, Rule>) -> Result<ComplexSelector, String> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::compound => compounds.push(build_compound(part)?),
            Rule::combinator => combinators.push(if part.into_inner().next().is_some() {
                Combinator::Child
            } else {
                Combinator::Descendant
            }),
            other => return Err(format!("unexpected {other:?} in selector")),
        }
    }
    Ok(ComplexSelector { compounds, combinators })
}

fn ident(pair: Pair<'_, Rule>) -> Result<String, String> {
    Ok(next(&mut pair.into_inner(), "identifier")?.as_str().to_owned())
}

fn build_compound(pair: Pair<'_, Rule>) -> Result<Compound, String> {
    let mut compound = Compound::default();
    for part in pair.into_inner() {
        let filter = match part.as_rule() {
            Rule::type_selector => {
                let inner = next(&mut part.into_inner(), "type")?;
                if inner.as_rule() == Rule::ident {
                    compound.element = Some(inner.as_str().to_owned());
                }
                continue;
            }
            Rule::id_selector => Filter::Id(ident(part)?),
            Rule::class_selector => Filter::Class(ident(part)?),
            Rule::attr_selector => {
                let mut inner = part.into_inner();
                let name = next(&mut inner, "attribute name")?.as_str().to_owned();
                let test = match inner.next() {
                    Some(op) => {
                        let op = match op.as_str() {
                            "~=" => AttrOp::Includes,
                            "^=" => AttrOp::Prefix,
                            "$=" => AttrOp::Suffix,
                            "*=" => AttrOp::Substring,
                            _ => AttrOp::Equals,
                        };
                        let value = next(&mut inner, "attribute value")?;
                        let value = match value.as_rule() {
                            Rule::literal => literal(value)?,
                            _ => value.as_str().to_owned(),
                        };
                        Some((op, value))
                    }
                    None => None,
                };
                Filter::Attribute { name, test }
            }
            Rule::nth_child => Filter::NthChild(number(&next(&mut part.into_inner(), "position")?)?),
            Rule::nth_of_type => {
                Filter::NthOfType(number(&next(&mut part.into_inner(), "position")?)?)
            }
            Rule::first_child => Filter::FirstChild,
            Rule::last_child => Filter::LastChild,
            other => return Err(format!("unexpected {other:?} in compound selector")),
        };
        compound.filters.push(filter);
    }
    Ok(compound)
}

impl Document {
    /// Every attached element matching `locator`, in document order.
    pub fn select(&self, locator: &Locator) -> Result<Vec<NodeId>, TreeError> {
        Ok(Query::parse(locator)?.evaluate(self))
    }
}

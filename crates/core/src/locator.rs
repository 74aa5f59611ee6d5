use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Placeholder token that enumeration replaces with the 1-based physical position.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Addressing dialect of a locator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Path through the tree (`/html/body/div[2]/span`).
    Structural,
    /// Attribute based selector (`main > div.post:nth-of-type(2) .author`).
    Attribute,
}

impl Dialect {
    /// Infers the dialect from the first non-whitespace character.
    pub fn infer(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('/') => Dialect::Structural,
            _ => Dialect::Attribute,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Structural => "structural",
            Dialect::Attribute => "attribute",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable addressing expression into the live tree.
///
/// The dialect is derived once at construction. Composition never re-infers it:
/// a child locator built with [`Locator::join`] keeps the dialect of its parent.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locator {
    text: Arc<str>,
    dialect: Dialect,
}

impl Locator {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let dialect = Dialect::infer(&text);
        Self { text, dialect }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Appends `fragment` verbatim, keeping this locator's dialect.
    pub fn join(&self, fragment: &str) -> Locator {
        let mut text = String::with_capacity(self.text.len() + fragment.len());
        text.push_str(&self.text);
        text.push_str(fragment);
        Locator { text: text.into(), dialect: self.dialect }
    }

    pub fn has_index_placeholder(&self) -> bool {
        self.text.contains(INDEX_PLACEHOLDER)
    }

    /// Substitutes every `{index}` placeholder with `position`.
    pub fn with_index(&self, position: usize) -> Locator {
        if !self.has_index_placeholder() {
            return self.clone();
        }
        let text = self.text.replace(INDEX_PLACEHOLDER, &position.to_string());
        Locator { text: text.into(), dialect: self.dialect }
    }
}

impl std::fmt::Debug for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Locator").field(&self.dialect).field(&self.as_str()).finish()
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Locator::new(value)
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Locator::new(value)
    }
}

impl From<Locator> for String {
    fn from(value: Locator) -> Self {
        value.text.as_ref().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/html/body", Dialect::Structural)]
    #[case("   //div[2]", Dialect::Structural)]
    #[case("main > div.post", Dialect::Attribute)]
    #[case(".author", Dialect::Attribute)]
    #[case("", Dialect::Attribute)]
    fn dialect_follows_first_significant_character(#[case] text: &str, #[case] expected: Dialect) {
        assert_eq!(Locator::new(text).dialect(), expected);
    }

    #[rstest]
    fn join_appends_fragment_and_keeps_dialect() {
        let root = Locator::new("/html/body/div[3]");
        let joined = root.join("/span[1]");
        assert_eq!(joined.as_str(), "/html/body/div[3]/span[1]");
        assert_eq!(joined.dialect(), Dialect::Structural);

        let css = Locator::new("div.post").join(" /weird");
        assert_eq!(css.dialect(), Dialect::Attribute);
    }

    #[rstest]
    fn index_placeholder_is_substituted_everywhere() {
        let template = Locator::new("/feed/item[{index}]/title[{index}]");
        assert!(template.has_index_placeholder());
        let located = template.with_index(4);
        assert_eq!(located.as_str(), "/feed/item[4]/title[4]");
        assert!(!located.has_index_placeholder());
    }

    #[rstest]
    fn serde_uses_plain_string() {
        let locator: Locator = serde_json::from_str("\"ul > li\"").unwrap();
        assert_eq!(locator.dialect(), Dialect::Attribute);
        assert_eq!(serde_json::to_string(&locator).unwrap(), "\"ul > li\"");
    }
}

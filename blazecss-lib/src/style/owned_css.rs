// src/style/owned_css.rs: a fully-owned rule tree, detached from the tokenizer's borrowed input.
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedStylesheet {
    pub nodes: Vec<CssNode>,
}

/// One item of a stylesheet or block body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssNode {
    Rule(OwnedRule),
    AtRule(OwnedAtRule),
    /// A bare declaration. Only meaningful inside a block (e.g. `@media` nested in a rule).
    Declaration(OwnedDeclaration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRule {
    /// e.g. ".red", ":global(.card)", one entry per comma-separated branch
    pub selectors: Vec<String>,
    pub declarations: Vec<OwnedDeclaration>,
    /// Nested rules and at-rules (CSS nesting).
    pub children: Vec<CssNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedAtRule {
    /// Lowercased, without the `@`.
    pub name: String,
    pub prelude: String,
    /// `None` for statement at-rules such as `@import ...;`
    pub block: Option<Vec<CssNode>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnedDeclaration {
    pub property: String,
    pub value: String,
}

impl OwnedDeclaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        OwnedDeclaration {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl OwnedAtRule {
    pub fn is_keyframes(&self) -> bool {
        // also matches vendor forms like `-webkit-keyframes`
        self.name.ends_with("keyframes")
    }
}

impl fmt::Display for OwnedDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {};", self.property, self.value)
    }
}

impl fmt::Display for OwnedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selectors: {:?}", self.selectors)?;
        for decl in &self.declarations {
            writeln!(f, "  {}", decl)?;
        }
        Ok(())
    }
}

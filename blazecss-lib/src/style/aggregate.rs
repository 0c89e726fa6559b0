use crate::style::owned_css::{CssNode, OwnedAtRule, OwnedDeclaration, OwnedRule, OwnedStylesheet};
use crate::style::selector::class_names;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Everything a stylesheet says about one global class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRecord {
    /// Unique by property, in first-seen order.
    pub declarations: Vec<OwnedDeclaration>,
    /// Media condition -> declarations, buckets in first-seen order.
    pub media: Vec<MediaBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBucket {
    pub condition: String,
    pub declarations: Vec<OwnedDeclaration>,
}

impl ClassRecord {
    /// Merge declarations into the top-level bucket or the bucket for `media`.
    pub fn merge(&mut self, media: Option<&str>, declarations: &[OwnedDeclaration]) {
        let bucket = match media {
            None => &mut self.declarations,
            Some(condition) => {
                let index = match self.media.iter().position(|b| b.condition == condition) {
                    Some(index) => index,
                    None => {
                        self.media.push(MediaBucket {
                            condition: condition.to_string(),
                            declarations: Vec::new(),
                        });
                        self.media.len() - 1
                    }
                };
                &mut self.media[index].declarations
            }
        };

        for declaration in declarations {
            upsert(bucket, declaration);
        }
    }

    pub fn media_declarations(&self, condition: &str) -> Option<&[OwnedDeclaration]> {
        self.media
            .iter()
            .find(|bucket| bucket.condition == condition)
            .map(|bucket| bucket.declarations.as_slice())
    }

    /// Property block shown by hover and the class panel.
    ///
    /// ```text
    /// color: red;
    /// @media (min-width: 600px) {
    ///   color: blue;
    /// }
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        for declaration in &self.declarations {
            let _ = writeln!(out, "{}", declaration);
        }
        for bucket in &self.media {
            let _ = writeln!(out, "@media {} {{", bucket.condition);
            for declaration in &bucket.declarations {
                let _ = writeln!(out, "  {}", declaration);
            }
            out.push_str("}\n");
        }
        out.truncate(out.trim_end().len());
        out
    }
}

/// Last value wins, first position is kept.
fn upsert(bucket: &mut Vec<OwnedDeclaration>, declaration: &OwnedDeclaration) {
    match bucket
        .iter_mut()
        .find(|existing| existing.property == declaration.property)
    {
        Some(existing) => existing.value.clone_from(&declaration.value),
        None => bucket.push(declaration.clone()),
    }
}

/// Collect a [`ClassRecord`] for every global class named by a selector in `sheet`.
pub fn aggregate(sheet: &OwnedStylesheet) -> BTreeMap<String, ClassRecord> {
    let mut aggregator = Aggregator::default();
    aggregator.walk(&sheet.nodes, None, None);
    aggregator.records
}

/// Identity of one rule application, used to drop exact repeats.
#[derive(Debug, PartialEq, Eq)]
struct RuleSignature {
    selector: String,
    declarations: Vec<OwnedDeclaration>,
}

/// The style rule enclosing a nested at-rule.
struct ParentRule<'a> {
    selectors: &'a [String],
}

#[derive(Default)]
struct Aggregator {
    records: BTreeMap<String, ClassRecord>,
    /// Last rule applied per (class, media); a repeat with nothing in between is dropped.
    last_applied: HashMap<(String, Option<String>), RuleSignature>,
}

impl Aggregator {
    fn walk(&mut self, nodes: &[CssNode], media: Option<&str>, parent: Option<&ParentRule<'_>>) {
        let mut loose_declarations = Vec::new();

        for node in nodes {
            match node {
                CssNode::Rule(rule) => self.visit_rule(rule, media),
                CssNode::AtRule(at_rule) => self.visit_at_rule(at_rule, media, parent),
                CssNode::Declaration(declaration) => loose_declarations.push(declaration.clone()),
            }
        }

        // e.g. `.card { @media print { padding: 0 } }`
        if let Some(parent) = parent {
            if !loose_declarations.is_empty() {
                for selector in parent.selectors {
                    self.attach(selector, media, &loose_declarations);
                }
            }
        }
    }

    fn visit_rule(&mut self, rule: &OwnedRule, media: Option<&str>) {
        if rule.selectors.is_empty() {
            debug!("Skipping rule without selectors: {}", rule);
        }
        if !rule.declarations.is_empty() {
            for selector in &rule.selectors {
                self.attach(selector, media, &rule.declarations);
            }
        }
        let parent = ParentRule {
            selectors: &rule.selectors,
        };
        self.walk(&rule.children, media, Some(&parent));
    }

    fn visit_at_rule(&mut self, at_rule: &OwnedAtRule, media: Option<&str>, parent: Option<&ParentRule<'_>>) {
        let Some(block) = &at_rule.block else {
            return;
        };

        if at_rule.is_keyframes() {
            return;
        }

        match at_rule.name.as_str() {
            "media" => {
                let condition = match media {
                    Some(outer) => format!("{} and {}", outer, at_rule.prelude),
                    None => at_rule.prelude.clone(),
                };
                self.walk(block, Some(&condition), parent);
            }
            "supports" | "layer" | "container" | "scope" | "document" | "-moz-document" => {
                self.walk(block, media, parent);
            }
            // @font-face, @page, @counter-style, ...: descriptor blocks, no selectors
            other => debug!("Ignoring @{} block", other),
        }
    }

    fn attach(&mut self, selector: &str, media: Option<&str>, declarations: &[OwnedDeclaration]) {
        for class_name in class_names(selector) {
            let signature = RuleSignature {
                selector: selector.to_string(),
                declarations: declarations.to_vec(),
            };
            let key = (class_name.clone(), media.map(str::to_string));
            if self.last_applied.get(&key) == Some(&signature) {
                continue;
            }
            self.last_applied.insert(key, signature);
            self.records
                .entry(class_name)
                .or_default()
                .merge(media, declarations);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::blaze_css::parse_stylesheet;
    use pretty_assertions::assert_eq;

    fn decl(property: &str, value: &str) -> OwnedDeclaration {
        OwnedDeclaration::new(property, value)
    }

    fn aggregate_css(css: &str) -> BTreeMap<String, ClassRecord> {
        aggregate(&parse_stylesheet(css))
    }

    #[test]
    fn test_global_function_rule() {
        let records = aggregate_css(".global(btn-primary) { color: red; }");
        assert_eq!(records.len(), 1);
        assert_eq!(records["btn-primary"].declarations, vec![decl("color", "red")]);
        assert!(records["btn-primary"].media.is_empty());
    }

    #[test]
    fn test_media_bucket_kept_apart_from_top_level() {
        let records = aggregate_css(
            ":global(.card) { padding: 4px; } @media (min-width: 600px) { :global(.card) { padding: 8px; } }",
        );
        let card = &records["card"];
        assert_eq!(card.declarations, vec![decl("padding", "4px")]);
        assert_eq!(
            card.media_declarations("(min-width: 600px)"),
            Some(&[decl("padding", "8px")][..])
        );
    }

    #[test]
    fn test_identical_rules_collapse() {
        let records = aggregate_css(".btn { color: red; } .btn { color: red; }");
        assert_eq!(records["btn"].declarations, vec![decl("color", "red")]);
    }

    #[test]
    fn test_repeated_rule_after_override_wins_again() {
        let records = aggregate_css(".btn { color: red } .btn { color: blue } .btn { color: red }");
        assert_eq!(records["btn"].declarations, vec![decl("color", "red")]);
    }

    #[test]
    fn test_last_value_wins_in_first_position() {
        let records = aggregate_css(
            ".btn { color: red; margin: 0; } .btn:hover { color: blue; } .btn { padding: 1px; }",
        );
        assert_eq!(
            records["btn"].declarations,
            vec![decl("color", "blue"), decl("margin", "0"), decl("padding", "1px")]
        );
    }

    #[test]
    fn test_same_property_repeats_across_buckets() {
        let records = aggregate_css(
            ".a { color: red } @media print { .a { color: black } } @media (max-width: 10px) { .a { color: gray } }",
        );
        let a = &records["a"];
        assert_eq!(a.declarations, vec![decl("color", "red")]);
        assert_eq!(a.media.len(), 2);
        assert_eq!(a.media_declarations("print"), Some(&[decl("color", "black")][..]));
        assert_eq!(a.media_declarations("(max-width: 10px)"), Some(&[decl("color", "gray")][..]));
    }

    #[test]
    fn test_keyframes_contribute_nothing() {
        let records = aggregate_css(
            "@keyframes spin { from { transform: rotate(0) } to { transform: rotate(360deg) } }
             @-webkit-keyframes pulse { 0% { opacity: 0 } .5% { opacity: 1 } }
             @keyframes g { :global(.x) { color: red } }",
        );
        assert!(records.is_empty(), "{records:?}");
    }

    #[test]
    fn test_selector_list_attaches_to_every_class() {
        let records = aggregate_css(".a, .b.c { margin: 0 }");
        let names: Vec<_> = records.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_nested_media_and_transparent_at_rules() {
        let records = aggregate_css(
            "@supports (display: grid) { .grid { display: grid } }
             @media screen { @media (min-width: 1px) { .grid { gap: 1px } } }
             .card { padding: 4px; @media print { padding: 0; } &.active { color: red } }
             @font-face { font-family: x; }",
        );
        assert_eq!(records["grid"].declarations, vec![decl("display", "grid")]);
        assert_eq!(
            records["grid"].media_declarations("screen and (min-width: 1px)"),
            Some(&[decl("gap", "1px")][..])
        );
        assert_eq!(records["card"].media_declarations("print"), Some(&[decl("padding", "0")][..]));
        assert_eq!(records["active"].declarations, vec![decl("color", "red")]);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let css = ".a { color: red } @media print { .a, .b { color: black } } .b { margin: 0 }";
        let sheet = parse_stylesheet(css);
        assert_eq!(aggregate(&sheet), aggregate(&sheet));
    }

    #[test]
    fn test_render_layout() {
        let records = aggregate_css(
            ".card { padding: 4px; color: red } @media (min-width: 600px) { .card { padding: 8px } }",
        );
        assert_eq!(
            records["card"].render(),
            "padding: 4px;\ncolor: red;\n@media (min-width: 600px) {\n  padding: 8px;\n}"
        );
    }

    #[test]
    fn test_render_reparses_to_same_declarations() {
        let records = aggregate_css(
            ".card { padding: 4px; color: red } @media (min-width: 600px) { .card { padding: 8px; color: blue } }",
        );
        let original = &records["card"];
        let reparsed = aggregate_css(&format!(".card {{\n{}\n}}", original.render()));
        assert_eq!(&reparsed["card"], original);
    }
}

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// ------------------------------
/// Global class syntaxes
/// ------------------------------

/// Which selector syntax produced a class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorSyntax {
    /// `.global(name)`, `global(name)`, `.global.name`
    GlobalFunction,
    /// `:global(name)`, `:global(.name)`, `:global.name`
    GlobalPseudo,
    /// Any `.name` token.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassNameMatch {
    pub name: String,
    pub syntax: SelectorSyntax,
}

type Matcher = fn(&str) -> Vec<ClassNameMatch>;

/// Matchers in priority order. The first one returning anything wins.
const MATCHERS: [Matcher; 3] = [match_global_function, match_global_pseudo, match_plain_classes];

// The preceding-character group keeps `:global(...)` out of this syntax.
static GLOBAL_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^:\w-])\.?global(?:\(\s*\.?([\w-]+)\s*\)|\.([\w-]+))")
        .expect("global function pattern is valid")
});

static GLOBAL_PSEUDO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":global(?:\(\s*\.?([\w-]+)\s*\)|\s*\.([\w-]+))")
        .expect("global pseudo pattern is valid")
});

// Allows CSS escapes so utility classes like `.sm\:flex` survive.
static PLAIN_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.((?:[\w-]|\\.)+)").expect("plain class pattern is valid")
});

/// Extract the global class names a selector denotes.
///
/// The two `global` syntaxes are checked first and yield at most one name;
/// only when neither applies is every `.name` token of the selector returned.
pub fn classify(selector: &str) -> Vec<ClassNameMatch> {
    MATCHERS
        .iter()
        .map(|matcher| matcher(selector))
        .find(|matches| !matches.is_empty())
        .unwrap_or_default()
}

/// Convenience wrapper returning bare names.
pub fn class_names(selector: &str) -> Vec<String> {
    classify(selector).into_iter().map(|m| m.name).collect()
}

pub fn match_global_function(selector: &str) -> Vec<ClassNameMatch> {
    first_capture(&GLOBAL_FUNCTION, selector, SelectorSyntax::GlobalFunction)
}

pub fn match_global_pseudo(selector: &str) -> Vec<ClassNameMatch> {
    first_capture(&GLOBAL_PSEUDO, selector, SelectorSyntax::GlobalPseudo)
}

pub fn match_plain_classes(selector: &str) -> Vec<ClassNameMatch> {
    let mut seen = HashSet::new();
    PLAIN_CLASS
        .captures_iter(selector)
        .filter_map(|caps| caps.get(1))
        .map(|name| unescape(name.as_str()))
        .filter(|name| seen.insert(name.clone()))
        .map(|name| ClassNameMatch {
            name,
            syntax: SelectorSyntax::Plain,
        })
        .collect()
}

fn first_capture(pattern: &Regex, selector: &str, syntax: SelectorSyntax) -> Vec<ClassNameMatch> {
    pattern
        .captures(selector)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|name| ClassNameMatch {
            name: name.as_str().trim_start_matches('.').to_string(),
            syntax,
        })
        .into_iter()
        .collect()
}

/// `sm\:flex` -> `sm:flex`
fn unescape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(selector: &str) -> ClassNameMatch {
        let mut matches = classify(selector);
        assert_eq!(matches.len(), 1, "selector {selector:?} gave {matches:?}");
        matches.remove(0)
    }

    #[test]
    fn test_global_function_forms() {
        for selector in [".global(btn-primary)", "global(btn-primary)", ".global( .btn-primary )"] {
            assert_eq!(
                single(selector),
                ClassNameMatch {
                    name: "btn-primary".into(),
                    syntax: SelectorSyntax::GlobalFunction
                }
            );
        }
        assert_eq!(single(".global.layout-flex").name, "layout-flex");
        assert_eq!(single(".wrapper .global.item:hover").name, "item");
    }

    #[test]
    fn test_global_pseudo_forms() {
        for selector in [":global(card)", ":global(.card)", ":global.card", ".root :global .card"] {
            assert_eq!(
                single(selector),
                ClassNameMatch {
                    name: "card".into(),
                    syntax: SelectorSyntax::GlobalPseudo
                }
            );
        }
    }

    #[test]
    fn test_global_syntaxes_win_over_plain_tokens() {
        // `.local` and `.other` would be plain matches, but a global form is present
        assert_eq!(class_names(".local :global(.shared) .other"), vec!["shared"]);
        assert_eq!(class_names(".local .global(shared)"), vec!["shared"]);
    }

    #[test]
    fn test_plain_classes_are_exhaustive() {
        assert_eq!(class_names(".foo.bar"), vec!["foo", "bar"]);
        assert_eq!(class_names("ul.nav > li.item:hover .icon"), vec!["nav", "item", "icon"]);
        assert_eq!(class_names(".a .a"), vec!["a"]);
        assert!(class_names("#header > p").is_empty());
        assert!(class_names("from").is_empty());
    }

    #[test]
    fn test_names_containing_global_stay_plain() {
        assert_eq!(classify(".globalnav")[0].syntax, SelectorSyntax::Plain);
        assert_eq!(class_names(".global-header"), vec!["global-header"]);
    }

    #[test]
    fn test_escaped_plain_class() {
        assert_eq!(class_names(r".sm\:flex"), vec!["sm:flex"]);
        assert_eq!(class_names(r".w-1\/2"), vec!["w-1/2"]);
    }
}

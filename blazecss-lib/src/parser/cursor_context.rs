use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

/// How the line being edited should be read. Decided from the file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// CSS-Modules style sheets: `composes: a b from global;`
    Stylesheet,
    /// HTML `class=`, JSX `className=` and friends.
    Markup,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("css" | "scss" | "sass" | "less" | "pcss" | "postcss") => SourceKind::Stylesheet,
            _ => SourceKind::Markup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// `composes: ... from global`
    Composes,
    /// `class="...` with the quote still open
    QuotedAttribute,
    /// `class=` with no quote typed yet
    UnquotedAttribute,
    /// ``className={`...``
    TemplateLiteral,
    /// `className={cx("...` or any other open string inside the expression
    Expression,
}

/// Where class names may be typed at the cursor, and which are already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorContext {
    pub kind: ContextKind,
    pub existing_classes: BTreeSet<String>,
    /// Classes are already present and the cursor is glued to the last one.
    pub needs_separator: bool,
}

impl CursorContext {
    /// Text a completion for `class_name` should insert at the cursor.
    pub fn insert_text(&self, class_name: &str) -> String {
        if self.kind == ContextKind::UnquotedAttribute {
            format!("\"{}\"", class_name)
        } else if self.needs_separator {
            format!(" {}", class_name)
        } else {
            class_name.to_string()
        }
    }
}

const COMPOSES: &str = "composes:";
const WORD_BREAKS: &str = "\"'`<>{}(),;=";
const FROM_GLOBAL: &str = "from global";

static QUOTED_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^\w-])(?:class|className)\s*=\s*(["'])"#).expect("attribute pattern is valid")
});

static UNQUOTED_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w-])(?:class|className)\s*=\s*$").expect("attribute pattern is valid")
});

static TEMPLATE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w-])className\s*=\s*\{\s*`").expect("template pattern is valid")
});

static EXPRESSION_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w-])className\s*=\s*\{").expect("expression pattern is valid")
});

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").expect("interpolation pattern is valid"));

/// Decide whether class completion applies at `cursor` (a character offset
/// into `line`) and collect the classes already written before it.
pub fn detect(line: &str, cursor: usize, source_kind: SourceKind) -> Option<CursorContext> {
    let split = byte_offset(line, cursor);
    let before = &line[..split];
    let after = &line[split..];

    let (kind, listed) = match source_kind {
        SourceKind::Stylesheet => (ContextKind::Composes, detect_composes(before, after)?),
        SourceKind::Markup => detect_quoted_attribute(before)
            .map(|listed| (ContextKind::QuotedAttribute, listed))
            .or_else(|| detect_unquoted_attribute(before).map(|listed| (ContextKind::UnquotedAttribute, listed)))
            .or_else(|| detect_template_literal(before).map(|listed| (ContextKind::TemplateLiteral, listed)))
            .or_else(|| detect_expression(before).map(|listed| (ContextKind::Expression, listed)))?,
    };

    let existing_classes: BTreeSet<String> = listed.split_whitespace().map(str::to_string).collect();
    let needs_separator =
        !existing_classes.is_empty() && !before.ends_with(|c: char| c.is_whitespace());

    Some(CursorContext {
        kind,
        existing_classes,
        needs_separator,
    })
}

fn detect_composes(before: &str, after: &str) -> Option<String> {
    let start = before.rfind(COMPOSES)? + COMPOSES.len();
    let listed = &before[start..];
    if !after.contains(FROM_GLOBAL) || listed.split_whitespace().any(|token| token == "from") {
        return None;
    }
    Some(listed.to_string())
}

fn detect_quoted_attribute(before: &str) -> Option<String> {
    let captures = QUOTED_ATTRIBUTE.captures_iter(before).last()?;
    let quote = captures.get(1)?;
    let listed = &before[quote.end()..];
    if listed.contains(quote.as_str()) {
        return None;
    }
    Some(listed.to_string())
}

fn detect_unquoted_attribute(before: &str) -> Option<String> {
    UNQUOTED_ATTRIBUTE.is_match(before).then(String::new)
}

fn detect_template_literal(before: &str) -> Option<String> {
    let opening = TEMPLATE_OPEN.find_iter(before).last()?;
    let listed = &before[opening.end()..];
    if listed.contains('`') {
        return None;
    }
    let without_interpolations = INTERPOLATION.replace_all(listed, " ");
    // cursor inside an unfinished `${`
    if without_interpolations.contains("${") {
        return None;
    }
    Some(without_interpolations.into_owned())
}

fn detect_expression(before: &str) -> Option<String> {
    let opening = EXPRESSION_OPEN.find_iter(before).last()?;
    let expression = &before[opening.end()..];

    let mut depth = 1usize;
    let mut open_quote: Option<(char, usize)> = None;
    let mut escaped = false;

    for (index, ch) in expression.char_indices() {
        if let Some((quote, _)) = open_quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                open_quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => open_quote = Some((ch, index + ch.len_utf8())),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            _ => {}
        }
    }

    let (_, start) = open_quote?;
    Some(expression[start..].to_string())
}

/// The class-name-like word touching `cursor`, used for hover.
///
/// Anything but whitespace and markup/JS punctuation counts, so unescaped
/// names such as `sm:flex` or `w-1/2` come back whole.
pub fn word_at(line: &str, cursor: usize) -> Option<&str> {
    let split = byte_offset(line, cursor);
    let is_word = |c: char| !c.is_whitespace() && !WORD_BREAKS.contains(c);

    let start = line[..split]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_word(c))
        .last()
        .map_or(split, |(index, _)| index);
    let end = line[split..]
        .char_indices()
        .find(|&(_, c)| !is_word(c))
        .map_or(line.len(), |(index, _)| split + index);

    (start < end).then(|| &line[start..end])
}

fn byte_offset(line: &str, cursor: usize) -> usize {
    line.char_indices()
        .nth(cursor)
        .map_or(line.len(), |(index, _)| index)
}

use crate::style::owned_css::{CssNode, OwnedAtRule, OwnedDeclaration, OwnedRule, OwnedStylesheet};
use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};
use log::debug;
use std::ops::Range;

type CssParseError<'i> = ParseError<'i, ()>;

/// A top-level `@import` statement and the byte range it occupies in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub specifier: String,
    pub range: Range<usize>,
}

/// Parse raw CSS into an owned rule tree.
///
/// Only structure is recovered: at-rules with their raw prelude, style rules
/// with their raw selector list, and `property: value` pairs. Values are never
/// validated. Anything the tokenizer cannot make sense of is skipped, so a
/// broken rule never hides the rules that follow it.
pub fn parse_stylesheet(css_text: &str) -> OwnedStylesheet {
    let mut input = ParserInput::new(css_text);
    let mut parser = Parser::new(&mut input);
    OwnedStylesheet {
        nodes: parse_block_contents(&mut parser),
    }
}

/// Find every top-level `@import` in `css_text`, in source order.
pub fn scan_imports(css_text: &str) -> Vec<ImportStatement> {
    let mut input = ParserInput::new(css_text);
    let mut parser = Parser::new(&mut input);
    let mut imports = Vec::new();

    loop {
        parser.skip_whitespace();
        let start = parser.position().byte_index();
        let state = parser.state();
        let is_import = match parser.next() {
            Err(_) => break,
            Ok(Token::AtKeyword(name)) => name.eq_ignore_ascii_case("import"),
            Ok(_) => false,
        };

        if !is_import {
            parser.reset(&state);
            skip_item(&mut parser);
            continue;
        }

        let specifier = parser.parse_until_after(Delimiter::Semicolon, |input| {
            let specifier = input.expect_url_or_string()?.as_ref().to_owned();
            // trailing media list / layer() / supports() are not used
            consume_rest(input);
            Ok::<_, CssParseError<'_>>(specifier)
        });
        let end = parser.position().byte_index();

        match specifier {
            Ok(specifier) => imports.push(ImportStatement {
                specifier,
                range: start..end,
            }),
            Err(_) => debug!(
                "Skipping malformed @import: {}",
                css_text[start..end].trim()
            ),
        }
    }

    imports
}

/// Parse the items of a stylesheet or of one `{ ... }` block.
fn parse_block_contents<'i>(input: &mut Parser<'i, '_>) -> Vec<CssNode> {
    let mut nodes = Vec::new();

    loop {
        input.skip_whitespace();
        let state = input.state();
        let at_keyword = match input.next() {
            Err(_) => break,
            Ok(Token::Semicolon)
            | Ok(Token::CloseCurlyBracket)
            | Ok(Token::CloseParenthesis)
            | Ok(Token::CloseSquareBracket)
            | Ok(Token::CDO)
            | Ok(Token::CDC) => continue,
            Ok(Token::AtKeyword(name)) => Some(name.to_ascii_lowercase()),
            Ok(_) => None,
        };

        match at_keyword {
            Some(name) => nodes.push(parse_at_rule(input, name)),
            None => {
                input.reset(&state);
                if let Some(node) = parse_rule_or_declaration(input) {
                    nodes.push(node);
                }
            }
        }
    }

    nodes
}

/// Called right after the at-keyword token has been consumed.
fn parse_at_rule<'i>(input: &mut Parser<'i, '_>, name: String) -> CssNode {
    let prelude_start = input.position();
    let _ = input.parse_until_before(
        Delimiter::Semicolon | Delimiter::CurlyBracketBlock,
        |input| {
            consume_rest(input);
            Ok::<_, CssParseError<'i>>(())
        },
    );
    let prelude = clean_text(input.slice_from(prelude_start));

    let opens_block = matches!(input.next(), Ok(Token::CurlyBracketBlock));
    let block = if opens_block {
        Some(parse_nested_contents(input))
    } else {
        None
    };

    CssNode::AtRule(OwnedAtRule {
        name,
        prelude,
        block,
    })
}

/// A run of tokens up to `;` or `{`: a declaration when it ends in `;` (or
/// the end of the block), a style rule when a `{ ... }` block follows.
fn parse_rule_or_declaration<'i>(input: &mut Parser<'i, '_>) -> Option<CssNode> {
    let start = input.position();
    let _ = input.parse_until_before(
        Delimiter::Semicolon | Delimiter::CurlyBracketBlock,
        |input| {
            consume_rest(input);
            Ok::<_, CssParseError<'i>>(())
        },
    );
    let text = clean_text(input.slice_from(start));

    let opens_block = matches!(input.next(), Ok(Token::CurlyBracketBlock));
    if opens_block {
        let mut declarations = Vec::new();
        let mut children = Vec::new();
        for node in parse_nested_contents(input) {
            match node {
                CssNode::Declaration(declaration) => declarations.push(declaration),
                other => children.push(other),
            }
        }
        return Some(CssNode::Rule(OwnedRule {
            selectors: split_selector_list(&text),
            declarations,
            children,
        }));
    }

    match parse_declaration(&text) {
        Some(declaration) => Some(CssNode::Declaration(declaration)),
        None => {
            if !text.is_empty() {
                debug!("Skipping unparseable CSS fragment: {}", text);
            }
            None
        }
    }
}

/// Must be called right after a `{` token was returned by `next()`.
fn parse_nested_contents<'i>(input: &mut Parser<'i, '_>) -> Vec<CssNode> {
    input
        .parse_nested_block(|input| Ok::<_, CssParseError<'i>>(parse_block_contents(input)))
        .unwrap_or_default()
}

fn parse_declaration(text: &str) -> Option<OwnedDeclaration> {
    let (property, value) = text.split_once(':')?;
    let property = property.trim();
    let starts_like_identifier = property
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '-' || c == '_');
    let is_identifier = starts_like_identifier
        && property
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    if !is_identifier {
        return None;
    }
    Some(OwnedDeclaration::new(property, value.trim()))
}

/// Skip one top-level statement or rule, including its block.
fn skip_item(input: &mut Parser<'_, '_>) {
    let _ = input.parse_until_before(
        Delimiter::Semicolon | Delimiter::CurlyBracketBlock,
        |input| {
            consume_rest(input);
            Ok::<_, CssParseError<'_>>(())
        },
    );
    // consumes the `;` or the whole `{ ... }` block
    let _ = input.next();
}

fn consume_rest(input: &mut Parser<'_, '_>) {
    while input.next().is_ok() {}
}

/// Split a selector list on commas that are not nested in `()`, `[]` or strings.
pub fn split_selector_list(text: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut current = String::new();

    for ch in text.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' | '[' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                let selector = current.trim();
                if !selector.is_empty() {
                    selectors.push(selector.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    let selector = current.trim();
    if !selector.is_empty() {
        selectors.push(selector.to_string());
    }
    selectors
}

/// Drop `/* ... */` comments outside of strings and collapse whitespace runs.
fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        if ch == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for c in chars.by_ref() {
                if previous == '*' && c == '/' {
                    break;
                }
                previous = c;
            }
            pending_space = true;
            continue;
        }

        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
        }
        out.push(ch);
    }

    out
}

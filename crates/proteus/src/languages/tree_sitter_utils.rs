//! Shared tree-sitter utilities for language extractors.
//!
//! Text, span, signature and doc-comment helpers used by every extractor.

// Tree-sitter returns usize for positions, but we store u32 for compactness.
// This is safe for practical source files (no file has 4 billion lines).
#![allow(clippy::cast_possible_truncation)]

use tree_sitter::Node;

use crate::types::Span;

/// Get text content of a tree-sitter node.
///
/// Returns `None` if the node's byte range contains invalid UTF-8.
pub fn node_text(node: &Node<'_>, content: &[u8]) -> Option<String> {
    match std::str::from_utf8(&content[node.byte_range()]) {
        Ok(s) => Some(s.to_string()),
        Err(e) => {
            tracing::trace!(
                byte_range = ?node.byte_range(),
                error = %e,
                node_kind = %node.kind(),
                "Failed to decode node text as UTF-8"
            );
            None
        }
    }
}

/// Convert tree-sitter positions to our `Span`.
///
/// Tree-sitter uses 0-indexed rows and columns; `Span` uses 1-indexed.
pub fn node_span(node: &Node<'_>) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span {
        start_line: start.row as u32 + 1,
        start_column: start.column as u32 + 1,
        end_line: end.row as u32 + 1,
        end_column: end.column as u32 + 1,
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

/// First direct child of the given kind.
pub fn child_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

/// First direct child whose kind is any of `kinds`.
pub fn child_of_kinds<'t>(node: &Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| kinds.contains(&c.kind()))
}

/// All direct children of the given kind.
pub fn children_of_kind<'t>(node: &Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == kind)
        .collect()
}

/// Whether any direct child (named or anonymous) has the given kind.
pub fn has_child_kind(node: &Node<'_>, kind: &str) -> bool {
    child_of_kind(node, kind).is_some()
}

/// First descendant (depth-first, including `node`) of the given kind.
pub fn descendant_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(*node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = descendant_of_kind(&child, kind) {
            return Some(found);
        }
    }
    None
}

/// Named descendants of `node` whose kind is in `kinds`, in document order.
pub fn named_descendants<'t>(node: &Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        if current.is_named() && kinds.contains(&current.kind()) {
            found.push(current);
        }
        let mut cursor = current.walk();
        let children: Vec<_> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    found
}

/// Rightmost name inside a member-access chain.
///
/// Descends through the last named child of every `path_kinds` node until it
/// reaches one of `name_kinds`; `a.b.c` yields the `c` node.
pub fn trailing_name<'t>(node: &Node<'t>, path_kinds: &[&str], name_kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = *node;
    loop {
        if name_kinds.contains(&current.kind()) {
            return Some(current);
        }
        if !path_kinds.contains(&current.kind()) {
            return None;
        }
        let last = current.named_child_count().checked_sub(1)?;
        current = current.named_child(u32::try_from(last).ok()?)?;
    }
}

/// Whether some ancestor of `node` has one of `kinds`.
pub fn has_ancestor_kind(node: &Node<'_>, kinds: &[&str]) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if kinds.contains(&parent.kind()) {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First line of `text`, trimmed.
pub fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

/// Declaration head of a brace-delimited declaration.
///
/// Joins lines until the first `{` and cuts there. With `keep_semicolon`,
/// a `;` also ends the head and is kept, so prototypes read `int f(int);`.
pub fn head_signature(text: &str, keep_semicolon: bool) -> String {
    let mut head = String::new();
    for line in text.lines() {
        let brace = line.find('{');
        let semi = if keep_semicolon { line.find(';') } else { None };
        match (brace, semi) {
            (Some(b), Some(s)) if s < b => {
                head.push_str(&line[..=s]);
                break;
            }
            (Some(b), _) => {
                head.push_str(&line[..b]);
                break;
            }
            (None, Some(s)) => {
                head.push_str(&line[..=s]);
                break;
            }
            (None, None) => {
                head.push_str(line);
                head.push(' ');
            }
        }
    }
    collapse_whitespace(&head)
}

/// Python-style head: lines joined until the first one containing `:`.
pub fn colon_head_signature(text: &str) -> String {
    let mut head = String::new();
    for line in text.lines() {
        head.push_str(line);
        if line.contains(':') {
            break;
        }
        head.push(' ');
    }
    head.trim().to_string()
}

/// Strip comment markers from a single comment node's text.
///
/// Handles block comments (`/** */`, `/*! */`, `/* */`) with per-line leading
/// `*`, and line comments (`///`, `//!`, `//`, `#`).
pub fn clean_comment(text: &str) -> String {
    let text = text.trim();
    let block = text
        .strip_prefix("/**")
        .or_else(|| text.strip_prefix("/*!"))
        .or_else(|| text.strip_prefix("/*"));
    if let Some(body) = block {
        let body = body.strip_suffix("*/").unwrap_or(body);
        return body
            .lines()
            .map(|line| {
                let line = line.trim();
                line.strip_prefix('*').unwrap_or(line).trim()
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
    }

    // Per line, since some grammars merge consecutive `//` lines into one node
    text.lines()
        .map(|line| {
            let line = line.trim();
            ["///", "//!", "//", "#"]
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
                .unwrap_or(line)
                .trim()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Documentation from the comment siblings immediately preceding `node`.
///
/// Walks backward while siblings are comments, stops at the first
/// non-comment, and returns the cleaned comments in source order.
pub fn preceding_doc(node: &Node<'_>, content: &[u8], comment_kinds: &[&str]) -> String {
    let mut comments = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        if !comment_kinds.contains(&sibling.kind()) {
            break;
        }
        if let Some(text) = node_text(&sibling, content) {
            comments.push(clean_comment(&text));
        }
        current = sibling.prev_sibling();
    }
    comments.reverse();
    comments.join("\n")
}

/// Strip generic arguments: `List<String>` becomes `List`.
pub fn strip_generics(name: &str) -> &str {
    name.split('<').next().unwrap_or(name).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Grammar, SyntaxTreeProvider};

    #[test]
    fn head_signature_cuts_at_brace() {
        let text = "public void run(\n    int a,\n    int b) {\n  go();\n}";
        assert_eq!(head_signature(text, false), "public void run( int a, int b)");
    }

    #[test]
    fn head_signature_keeps_prototype_semicolon() {
        assert_eq!(head_signature("int add(int, int);", true), "int add(int, int);");
        assert_eq!(
            head_signature("int add(int a, int b) { return a + b; }", true),
            "int add(int a, int b)"
        );
    }

    #[test]
    fn colon_head_signature_spans_wrapped_parameters() {
        let text = "def f(a,\n      b) -> int:\n    return a";
        assert_eq!(colon_head_signature(text), "def f(a,       b) -> int:");
    }

    #[test]
    fn clean_block_doc_comment() {
        let text = "/**\n * Adds numbers.\n *\n * @param a first\n */";
        assert_eq!(clean_comment(text), "Adds numbers.\n@param a first");
    }

    #[test]
    fn clean_line_comments() {
        assert_eq!(clean_comment("/// Swift doc"), "Swift doc");
        assert_eq!(clean_comment("//! inner"), "inner");
        assert_eq!(clean_comment("// plain"), "plain");
        assert_eq!(clean_comment("# hash"), "hash");
        assert_eq!(clean_comment("/*! qt style */"), "qt style");
    }

    #[test]
    fn strip_generics_keeps_raw_type() {
        assert_eq!(strip_generics("Comparable<User>"), "Comparable");
        assert_eq!(strip_generics("Runnable"), "Runnable");
    }

    #[test]
    fn preceding_doc_stops_at_non_comment() {
        let source = b"package a\n\n// unrelated\nvar x = 1\n\n// Doc line one\n// Doc line two\nfunc f() {}\n";
        let mut provider = SyntaxTreeProvider::new();
        let tree = provider.parse(source, Grammar::Go).unwrap();
        let root = tree.root();
        let func = child_of_kind(&root, "function_declaration").unwrap();

        assert_eq!(
            preceding_doc(&func, source, &["comment"]),
            "Doc line one\nDoc line two"
        );
    }

    #[test]
    fn trailing_name_follows_last_segment() {
        let source = b"package a\n\nfunc f() {\n\tpkg.Client.Do()\n}\n";
        let mut provider = SyntaxTreeProvider::new();
        let tree = provider.parse(source, Grammar::Go).unwrap();
        let root = tree.root();
        let call = descendant_of_kind(&root, "call_expression").unwrap();
        let callee = call.child_by_field_name("function").unwrap();

        let name = trailing_name(&callee, &["selector_expression"], &["field_identifier", "identifier"]).unwrap();
        assert_eq!(node_text(&name, source).as_deref(), Some("Do"));
        assert!(trailing_name(&callee, &[], &["identifier"]).is_none());
    }

    #[test]
    fn node_span_is_one_indexed() {
        let source = b"x = 1\ny = 2\n";
        let mut provider = SyntaxTreeProvider::new();
        let tree = provider.parse(source, Grammar::Python).unwrap();
        let root = tree.root();
        let second = root.named_child(1).unwrap();

        let span = node_span(&second);
        assert_eq!(span.start_line, 2);
        assert_eq!(span.start_column, 1);
        assert_eq!(span.start_byte, 6);
    }
}

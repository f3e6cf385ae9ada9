//! Per-parse extraction state shared by the passes of one file.

use std::collections::HashMap;

use tree_sitter::Node;

use super::tree_sitter_utils::{node_span, node_text, preceding_doc};
use crate::error::Result;
use crate::syntax::{Grammar, QueryMatch, SyntaxTreeProvider};
use crate::types::{
    DependencyKind, Language, NodeId, ParsedDependency, ParsedSymbol, ScannedFile, Span,
    SymbolKind,
};

/// Mutable state threaded through every extraction pass of one file.
///
/// The declarations table maps the syntax node of every function-like symbol
/// to the name it was recorded under. Call attribution walks a call's
/// ancestors and stops at the first one found in the table, so a call inside
/// an unnamed closure is attributed to the named function around it.
pub(crate) struct FileContext<'a> {
    pub file: &'a ScannedFile,
    pub language: Language,
    pub grammar: Grammar,
    pub source: &'a [u8],
    pub root: Node<'a>,
    provider: &'a mut SyntaxTreeProvider,
    pub symbols: Vec<ParsedSymbol>,
    pub dependencies: Vec<ParsedDependency>,
    declarations: HashMap<NodeId, String>,
}

impl<'a> FileContext<'a> {
    pub fn new(
        file: &'a ScannedFile,
        language: Language,
        grammar: Grammar,
        source: &'a [u8],
        root: Node<'a>,
        provider: &'a mut SyntaxTreeProvider,
    ) -> Self {
        Self {
            file,
            language,
            grammar,
            source,
            root,
            provider,
            symbols: Vec::new(),
            dependencies: Vec::new(),
            declarations: HashMap::new(),
        }
    }

    /// Run a query against the whole file.
    pub fn query(&mut self, pattern: &str) -> Result<Vec<QueryMatch<'a>>> {
        self.provider
            .query(self.grammar, self.root, pattern, self.source)
    }

    /// Run a query against a subtree.
    pub fn query_in(&mut self, node: Node<'a>, pattern: &str) -> Result<Vec<QueryMatch<'a>>> {
        self.provider.query(self.grammar, node, pattern, self.source)
    }

    /// Node text, empty when it is not valid UTF-8.
    pub fn text(&self, node: &Node<'_>) -> String {
        node_text(node, self.source).unwrap_or_default()
    }

    pub fn span(&self, node: &Node<'_>) -> Span {
        node_span(node)
    }

    /// Doc comment made of the comment siblings right before `node`.
    pub fn doc(&self, node: &Node<'_>, comment_kinds: &[&str]) -> String {
        preceding_doc(node, self.source, comment_kinds)
    }

    /// Record `node` as the declaration of `name` for call attribution.
    pub fn declare(&mut self, node: &Node<'_>, name: impl Into<String>) {
        self.declarations.insert(NodeId::from(node), name.into());
    }

    /// Name under which `node` was declared, if any.
    pub fn declared_name(&self, node: &Node<'_>) -> Option<&str> {
        self.declarations.get(&NodeId::from(node)).map(String::as_str)
    }

    /// Name of the nearest declared ancestor whose kind is in `kinds`.
    ///
    /// Ancestors of a matching kind that were never declared (anonymous
    /// closures, lambdas) are skipped and the walk continues outward.
    pub fn enclosing_declaration(&self, node: &Node<'_>, kinds: &[&str]) -> Option<String> {
        let mut current = node.parent();
        while let Some(parent) = current {
            if kinds.contains(&parent.kind())
                && let Some(name) = self.declared_name(&parent)
            {
                return Some(name.to_string());
            }
            current = parent.parent();
        }
        None
    }

    /// Append a symbol built from `node` and declare it.
    pub fn add_symbol(&mut self, node: &Node<'_>, symbol: ParsedSymbol) {
        self.declare(node, symbol.name.clone());
        self.symbols.push(symbol);
    }

    pub fn add_edge(
        &mut self,
        kind: DependencyKind,
        source: impl Into<String>,
        target: impl Into<String>,
    ) {
        self.dependencies
            .push(ParsedDependency::edge(kind, source, target));
    }

    pub fn add_import(&mut self, module: impl Into<String>, is_external: bool) {
        self.dependencies
            .push(ParsedDependency::import(module, is_external));
    }

    /// Name of the first top-level symbol of `kind`.
    pub fn first_symbol_named(&self, kind: SymbolKind) -> Option<&str> {
        self.symbols
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.name.as_str())
    }

    /// Whether the file is a header by extension.
    pub fn is_header(&self) -> bool {
        self.file
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "h" | "hh" | "hpp" | "hxx"))
    }

    pub fn finish(self) -> (Vec<ParsedSymbol>, Vec<ParsedDependency>) {
        (self.symbols, self.dependencies)
    }
}

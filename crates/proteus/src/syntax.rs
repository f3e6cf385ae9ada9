//! Syntax tree provider.
//!
//! Wraps tree-sitter behind two operations: `parse` bytes into a tree, and
//! `query` a tree (or subtree) with a structural pattern.
//!
//! ## Concurrency
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ REGISTRY (LazyLock, shared)  │  one tree_sitter::Language per grammar
//! └──────────────┬───────────────┘
//!                │ read-only
//!      ┌─────────┴─────────┐
//!      ▼                   ▼
//! SyntaxTreeProvider   SyntaxTreeProvider    one per extractor, per worker
//! (Parser, queries)    (Parser, queries)     never shared between threads
//! ```
//!
//! A `tree_sitter::Parser` carries mutable cursor state, so every concurrent
//! parse needs its own instance. Grammars are immutable and loaded once.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use tree_sitter::{Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

use crate::error::{Error, Result};
use crate::types::Language;

/// A concrete tree-sitter grammar.
///
/// Mostly one per `Language`; TypeScript splits into plain and TSX, and
/// Objective-C++ reuses the Objective-C grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// tree-sitter-go
    Go,
    /// tree-sitter-javascript (includes JSX)
    JavaScript,
    /// tree-sitter-typescript, `.ts` dialect
    TypeScript,
    /// tree-sitter-typescript, `.tsx` dialect
    Tsx,
    /// tree-sitter-python
    Python,
    /// tree-sitter-kotlin-ng
    Kotlin,
    /// tree-sitter-java
    Java,
    /// tree-sitter-swift
    Swift,
    /// tree-sitter-objc
    ObjC,
    /// tree-sitter-c
    C,
    /// tree-sitter-cpp
    Cpp,
}

impl Grammar {
    /// Every grammar, in registry order.
    pub const ALL: [Self; 11] = [
        Self::Go,
        Self::JavaScript,
        Self::TypeScript,
        Self::Tsx,
        Self::Python,
        Self::Kotlin,
        Self::Java,
        Self::Swift,
        Self::ObjC,
        Self::C,
        Self::Cpp,
    ];

    /// Default grammar for a language.
    #[must_use]
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Go => Self::Go,
            Language::JavaScript => Self::JavaScript,
            Language::TypeScript => Self::TypeScript,
            Language::Python => Self::Python,
            Language::Kotlin => Self::Kotlin,
            Language::Java => Self::Java,
            Language::Swift => Self::Swift,
            Language::ObjC | Language::ObjCpp => Self::ObjC,
            Language::C => Self::C,
            Language::Cpp => Self::Cpp,
        }
    }

    /// Grammar for a specific file, honoring the `.tsx` dialect.
    #[must_use]
    pub fn for_file(language: Language, path: &Path) -> Self {
        let is_tsx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsx"));
        match language {
            Language::TypeScript if is_tsx => Self::Tsx,
            other => Self::for_language(other),
        }
    }

    /// The shared, immutable tree-sitter language for this grammar.
    #[must_use]
    pub fn language(self) -> &'static tree_sitter::Language {
        &REGISTRY[self as usize]
    }

    fn load(self) -> tree_sitter::Language {
        match self {
            Self::Go => tree_sitter_go::LANGUAGE.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Kotlin => tree_sitter_kotlin_ng::LANGUAGE.into(),
            Self::Java => tree_sitter_java::LANGUAGE.into(),
            Self::Swift => tree_sitter_swift::LANGUAGE.into(),
            Self::ObjC => tree_sitter_objc::LANGUAGE.into(),
            Self::C => tree_sitter_c::LANGUAGE.into(),
            Self::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }
}

/// Process-wide grammar registry, indexed by `Grammar as usize`.
static REGISTRY: LazyLock<[tree_sitter::Language; 11]> =
    LazyLock::new(|| Grammar::ALL.map(Grammar::load));

/// A parsed syntax tree together with the grammar that produced it.
pub struct SyntaxTree {
    tree: Tree,
    grammar: Grammar,
}

impl SyntaxTree {
    /// Root node of the tree.
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Grammar used to build the tree.
    #[must_use]
    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Whether the grammar rejected any part of the input.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// 1-indexed `(line, column)` of the first ERROR or MISSING node.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn first_error(&self) -> Option<(u32, u32)> {
        let node = find_error(self.tree.root_node())?;
        let pos = node.start_position();
        Some((pos.row as u32 + 1, pos.column as u32 + 1))
    }
}

fn find_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

/// One capture inside a query match.
#[derive(Debug, Clone)]
pub struct Capture<'tree> {
    /// Capture index within the query
    pub index: u32,
    /// Capture name without the leading `@` (e.g. `class.name`)
    pub name: Arc<str>,
    /// Captured node
    pub node: Node<'tree>,
}

/// A single structural match, captures in document order.
#[derive(Debug, Clone)]
pub struct QueryMatch<'tree> {
    /// Index of the pattern that matched, for multi-pattern queries
    pub pattern_index: usize,
    /// Captured nodes
    pub captures: Vec<Capture<'tree>>,
}

impl<'tree> QueryMatch<'tree> {
    /// First node captured under `name`.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<Node<'tree>> {
        self.captures
            .iter()
            .find(|c| &*c.name == name)
            .map(|c| c.node)
    }
}

struct CompiledQuery {
    query: Query,
    capture_names: Vec<Arc<str>>,
}

/// Per-worker parser and query cache.
///
/// Not `Sync`: each worker constructs its own provider.
#[derive(Default)]
pub struct SyntaxTreeProvider {
    parsers: HashMap<Grammar, Parser>,
    queries: HashMap<Grammar, HashMap<String, CompiledQuery>>,
}

impl SyntaxTreeProvider {
    /// Create an empty provider. Parsers are created on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with parsers for `languages` already constructed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if any grammar is incompatible with the
    /// linked tree-sitter runtime.
    pub fn for_languages(languages: &[Language]) -> Result<Self> {
        let mut provider = Self::new();
        for &language in languages {
            provider.parser(Grammar::for_language(language))?;
            if language == Language::TypeScript {
                provider.parser(Grammar::Tsx)?;
            }
        }
        Ok(provider)
    }

    fn parser(&mut self, grammar: Grammar) -> Result<&mut Parser> {
        match self.parsers.entry(grammar) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser.set_language(grammar.language())?;
                Ok(entry.insert(parser))
            }
        }
    }

    /// Parse `content` with `grammar`.
    ///
    /// A tree containing syntax errors is still returned; check
    /// [`SyntaxTree::has_errors`].
    ///
    /// # Errors
    ///
    /// - `Error::EmptyContent` if `content` is empty
    /// - `Error::NoTree` if tree-sitter produced no tree
    /// - `Error::Grammar` if the parser could not be constructed
    pub fn parse(&mut self, content: &[u8], grammar: Grammar) -> Result<SyntaxTree> {
        if content.is_empty() {
            return Err(Error::EmptyContent);
        }
        let parser = self.parser(grammar)?;
        let Some(tree) = parser.parse(content, None) else {
            parser.reset();
            return Err(Error::NoTree);
        };
        Ok(SyntaxTree { tree, grammar })
    }

    /// Parse `content` for a scanner language tag.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedLanguage` for unknown tags, otherwise the
    /// same errors as [`Self::parse`].
    pub fn parse_tagged(&mut self, content: &[u8], tag: &str) -> Result<SyntaxTree> {
        let language =
            Language::from_tag(tag).ok_or_else(|| Error::UnsupportedLanguage(tag.to_string()))?;
        self.parse(content, Grammar::for_language(language))
    }

    fn compiled(&mut self, grammar: Grammar, pattern: &str) -> Result<&CompiledQuery> {
        let cache = self.queries.entry(grammar).or_default();
        if !cache.contains_key(pattern) {
            let query = Query::new(grammar.language(), pattern)?;
            let capture_names = query
                .capture_names()
                .iter()
                .map(|name| Arc::from(*name))
                .collect();
            cache.insert(
                pattern.to_string(),
                CompiledQuery {
                    query,
                    capture_names,
                },
            );
        }
        cache
            .get(pattern)
            .ok_or_else(|| Error::Extraction(format!("query cache miss for {grammar:?}")))
    }

    /// Run a structural query over `node` and everything beneath it.
    ///
    /// Compiled queries are cached per grammar and pattern.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyQuery` if `pattern` is blank
    /// - `Error::Query` if the pattern does not compile for `grammar`
    pub fn query<'tree>(
        &mut self,
        grammar: Grammar,
        node: Node<'tree>,
        pattern: &str,
        source: &[u8],
    ) -> Result<Vec<QueryMatch<'tree>>> {
        if pattern.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        let compiled = self.compiled(grammar, pattern)?;

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&compiled.query, node, source);
        let mut results = Vec::new();
        while let Some(m) = matches.next() {
            let captures = m
                .captures
                .iter()
                .map(|c| Capture {
                    index: c.index,
                    name: Arc::clone(&compiled.capture_names[c.index as usize]),
                    node: c.node,
                })
                .collect();
            results.push(QueryMatch {
                pattern_index: m.pattern_index,
                captures,
            });
        }
        Ok(results)
    }
}

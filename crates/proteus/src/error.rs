//! Error types for extraction.
//!
//! Errors come in two layers:
//!
//! - **`Error`**: infrastructure failures inside the crate (grammar loading,
//!   query compilation, empty input). Extraction passes return these and the
//!   pass driver discards them.
//! - **`ExtractionError`**: file-level errors the pool collects and hands back
//!   to the caller alongside any partial results.
//!
//! ## Error Philosophy
//!
//! Extraction is "best effort":
//! - A single malformed file never prevents the rest of a batch
//! - A failing extraction pass never prevents the passes after it
//! - Only an unreadable file yields no `ParsedFile` at all
//!
//! ## Error Categorization
//!
//! `ExtractionErrorKind` uses a 4xx/5xx style categorization:
//! - Input problems (the source's fault): parse errors, unsupported languages
//! - Internal problems (our fault or the environment's): I/O, cancellation

use std::path::PathBuf;
use thiserror::Error;

/// Result type for crate-internal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure error raised while building or querying syntax trees.
#[derive(Debug, Error)]
pub enum Error {
    /// A grammar could not be loaded into a parser
    #[error("grammar error: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// A structural query failed to compile
    #[error("query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    /// Parse was asked to handle zero bytes
    #[error("empty content")]
    EmptyContent,

    /// The grammar produced no tree at all
    #[error("parser produced no syntax tree")]
    NoTree,

    /// Query pattern was empty
    #[error("empty query pattern")]
    EmptyQuery,

    /// Language tag does not map to a known grammar
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An extraction pass hit a shape it could not handle
    #[error("extraction error: {0}")]
    Extraction(String),
}

/// Error encountered while extracting a specific file.
///
/// These errors are collected by the pool but never halt a batch. A `Parse`
/// error usually travels together with a partially populated `ParsedFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    /// Repo-relative path of the file that failed
    pub path: PathBuf,
    /// Category of the error
    pub kind: ExtractionErrorKind,
    /// Human-readable error message
    pub message: String,
    /// 1-indexed line of the first syntax error, when known
    pub line: Option<u32>,
    /// 1-indexed column of the first syntax error, when known
    pub column: Option<u32>,
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(
                f,
                "{}:{line}:{column}: {} ({})",
                self.path.display(),
                self.message,
                self.kind
            ),
            _ => write!(
                f,
                "{}: {} ({})",
                self.path.display(),
                self.message,
                self.kind
            ),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Categorization of extraction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionErrorKind {
    // === Input Problems (analogous to HTTP 4xx) ===
    /// Grammar rejected part of the input, or the worker's extractors could
    /// not be constructed. Partial results may be attached.
    Parse,

    /// Language tag is not one the pool knows how to route
    UnsupportedLanguage,

    // === Internal Problems (analogous to HTTP 5xx) ===
    /// Source file could not be read
    Filesystem,

    /// The job was skipped because the batch was cancelled
    Cancelled,
}

impl std::fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::UnsupportedLanguage => write!(f, "unsupported language"),
            Self::Filesystem => write!(f, "filesystem"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl ExtractionErrorKind {
    /// Returns `true` if this is an input problem (4xx-style).
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Parse | Self::UnsupportedLanguage)
    }

    /// Returns `true` if this is an internal problem (5xx-style).
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(self, Self::Filesystem | Self::Cancelled)
    }
}

impl ExtractionError {
    /// Create a new extraction error without a source position.
    #[must_use]
    pub fn new(path: PathBuf, kind: ExtractionErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Attach the 1-indexed position of the offending syntax.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Create a parse error for a file.
    #[must_use]
    pub fn parse(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(path, ExtractionErrorKind::Parse, message)
    }

    /// Create a filesystem error for a file that could not be read.
    #[must_use]
    pub fn filesystem(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(
            path,
            ExtractionErrorKind::Filesystem,
            format!("failed to read file: {error}"),
        )
    }

    /// Create an unsupported language error.
    #[must_use]
    pub fn unsupported_language(path: PathBuf, tag: &str) -> Self {
        let tag = if tag.is_empty() { "none" } else { tag };
        Self::new(
            path,
            ExtractionErrorKind::UnsupportedLanguage,
            format!("unsupported language: {tag}"),
        )
    }

    /// Create an error for a job skipped by cancellation.
    #[must_use]
    pub fn cancelled(path: PathBuf) -> Self {
        Self::new(path, ExtractionErrorKind::Cancelled, "batch cancelled")
    }
}

//! # Proteus: Multi-Language Symbol and Dependency Extraction
//!
//! Proteus turns source files into a language-agnostic summary of what they
//! declare and how those declarations relate: imports, calls, inheritance,
//! conformance, annotation usage and overrides. It parses with tree-sitter and
//! always returns what it could recover, even from files that do not parse
//! cleanly.
//!
//! Supported: C, C++, Go, Java, JavaScript, Kotlin, Objective-C,
//! Objective-C++, Python, Swift and TypeScript.
//!
//! ## Design Philosophy
//!
//! - **Best effort** - A syntax error yields partial results plus an error, never nothing
//! - **Syntactic only** - Names, not resolved references; no type checking
//! - **Isolated failures** - One bad file, pass or worker never sinks a batch
//! - **No shared parsers** - Each worker owns its extractors; only grammars are shared
//!
//! ## Quick Start
//!
//! ```no_run
//! use proteus::{ParserPool, PoolOptions, ScannedFile};
//!
//! let files = vec![
//!     ScannedFile::new("src/main.go", "/repo/src/main.go", "go"),
//!     ScannedFile::new("lib/widget.h", "/repo/lib/widget.h", "cpp"),
//!     ScannedFile::new("lib/widget.cpp", "/repo/lib/widget.cpp", "cpp"),
//! ];
//!
//! let pool = ParserPool::with_options(PoolOptions::default().with_workers(4));
//! let output = pool.process(&files);
//!
//! for file in &output.files {
//!     println!("{}: {} symbols", file.path.display(), file.symbols.len());
//! }
//! for error in &output.errors {
//!     eprintln!("{error}");
//! }
//! ```
//!
//! Single files can be extracted without a pool through
//! [`languages::ExtractorSet`].

mod error;
pub mod languages;
pub mod pool;
pub mod resolver;
pub mod syntax;
mod types;

pub use error::{Error, ExtractionError, ExtractionErrorKind, Result};
pub use languages::{Extraction, Extractor, ExtractorSet};
pub use pool::{
    CancellationToken, ExtractorFactory, ParserPool, PoolOptions, PoolOutput, PoolState,
    ProgressReporter,
};
pub use syntax::{Grammar, SyntaxTree, SyntaxTreeProvider};
pub use types::{
    DependencyKind, Language, ParsedDependency, ParsedFile, ParsedSymbol, ScannedFile, Span,
    SymbolKind,
};

//! Language-specific symbol and dependency extraction.
//!
//! Each supported language implements the `Extractor` trait, which turns one
//! `ScannedFile` into an `Extraction`. Extractors own their
//! `SyntaxTreeProvider`, so an extractor is never shared between threads;
//! the pool builds a fresh `ExtractorSet` per worker.
//!
//! ## Extraction passes
//!
//! Every extractor is a list of named passes (imports, classes, functions,
//! calls, ...) run in order over one parse. A pass that fails is logged at
//! debug level and skipped; the passes after it still run and whatever the
//! earlier passes collected is kept.
//!
//! ## Adding a New Language
//!
//! 1. Add the variant to `Language` in `types.rs` and its grammar in `syntax.rs`
//! 2. Create a new module (e.g., `rust.rs`) with its passes
//! 3. Implement `Extractor`, delegating to `run_passes`
//! 4. Register it in `ExtractorSet::new()`

pub mod cpp;
pub mod go;
pub mod imports;
pub mod java;
pub mod javascript;
pub mod kotlin;
pub mod objc;
pub mod python;
pub mod swift;
pub(crate) mod tree_sitter_utils;

mod context;

use std::collections::HashMap;

use tracing::debug;

pub(crate) use context::FileContext;

use crate::error::{ExtractionError, Result};
use crate::syntax::{Grammar, SyntaxTreeProvider};
use crate::types::{Language, ParsedFile, ScannedFile};

pub use cpp::CppExtractor;
pub use go::GoExtractor;
pub use java::JavaExtractor;
pub use javascript::JavaScriptExtractor;
pub use kotlin::KotlinExtractor;
pub use objc::{ObjCExtractor, ObjCppExtractor};
pub use python::PythonExtractor;
pub use swift::SwiftExtractor;

/// Outcome of extracting one file.
///
/// Never "nothing and no error": a file that could be read always yields a
/// `ParsedFile`, possibly together with the syntax error that truncated it.
#[derive(Debug)]
pub enum Extraction {
    /// Parsed cleanly
    Complete(ParsedFile),
    /// The grammar rejected part of the file; `file` holds what was recovered
    Partial {
        /// Symbols and dependencies recovered around the error
        file: ParsedFile,
        /// The first syntax error
        error: ExtractionError,
    },
    /// Nothing could be extracted (unreadable file)
    Failed(ExtractionError),
}

impl Extraction {
    /// The extracted file, if any.
    #[must_use]
    pub fn file(&self) -> Option<&ParsedFile> {
        match self {
            Self::Complete(file) | Self::Partial { file, .. } => Some(file),
            Self::Failed(_) => None,
        }
    }

    /// The error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            Self::Complete(_) => None,
            Self::Partial { error, .. } | Self::Failed(error) => Some(error),
        }
    }

    /// Whether the file parsed without errors.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Split into the optional file and optional error.
    #[must_use]
    pub fn into_parts(self) -> (Option<ParsedFile>, Option<ExtractionError>) {
        match self {
            Self::Complete(file) => (Some(file), None),
            Self::Partial { file, error } => (Some(file), Some(error)),
            Self::Failed(error) => (None, Some(error)),
        }
    }
}

/// Per-language extraction.
///
/// Implementations hold mutable parser state and must only be driven from
/// one thread at a time; the pool moves each one into a single worker.
pub trait Extractor: Send {
    /// Languages this extractor accepts.
    fn languages(&self) -> &'static [Language];

    /// Extract symbols and dependencies from one file.
    fn extract(&mut self, file: &ScannedFile) -> Extraction;
}

/// A named extraction pass.
pub(crate) struct Pass<'p> {
    name: &'static str,
    run: &'p dyn Fn(&mut FileContext<'_>) -> Result<()>,
}

impl<'p> Pass<'p> {
    pub(crate) const fn new(name: &'static str, run: &'p dyn Fn(&mut FileContext<'_>) -> Result<()>) -> Self {
        Self { name, run }
    }
}

/// Pick the language for `file` among `supported`, falling back to `default`.
pub(crate) fn resolve_language(file: &ScannedFile, supported: &[Language], default: Language) -> Language {
    Language::from_tag(&file.language)
        .filter(|lang| supported.contains(lang))
        .unwrap_or(default)
}

/// Read a file's bytes, mapping I/O failures to a filesystem error.
pub(crate) fn read_source(file: &ScannedFile) -> std::result::Result<Vec<u8>, ExtractionError> {
    std::fs::read(&file.abs_path).map_err(|e| ExtractionError::filesystem(file.path.clone(), &e))
}

/// Read, parse and run `passes` over one file.
pub(crate) fn run_passes(
    provider: &mut SyntaxTreeProvider,
    file: &ScannedFile,
    language: Language,
    passes: &[Pass<'_>],
) -> Extraction {
    match read_source(file) {
        Ok(content) => {
            let grammar = Grammar::for_file(language, &file.path);
            extract_source(provider, file, language, grammar, content, passes)
        }
        Err(error) => Extraction::Failed(error),
    }
}

/// Parse already-read `content` with `grammar` and run `passes`.
pub(crate) fn extract_source(
    provider: &mut SyntaxTreeProvider,
    file: &ScannedFile,
    language: Language,
    grammar: Grammar,
    content: Vec<u8>,
    passes: &[Pass<'_>],
) -> Extraction {
    let tree = match provider.parse(&content, grammar) {
        Ok(tree) => tree,
        Err(e) => {
            let error = ExtractionError::parse(
                file.path.clone(),
                format!("failed to parse {language} file: {e}"),
            );
            return Extraction::Partial {
                file: ParsedFile::new(file.path.clone(), language, content),
                error,
            };
        }
    };

    let mut ctx = FileContext::new(file, language, grammar, &content, tree.root(), provider);
    for pass in passes {
        if let Err(e) = (pass.run)(&mut ctx) {
            debug!(
                file = %file.path.display(),
                pass = pass.name,
                error = %e,
                "Extraction pass failed, continuing with remaining passes"
            );
        }
    }
    let (symbols, dependencies) = ctx.finish();

    let syntax_error = tree.has_errors().then(|| tree.first_error());
    drop(tree);

    let mut parsed = ParsedFile::new(file.path.clone(), language, content);
    parsed.symbols = symbols;
    parsed.dependencies = dependencies;

    match syntax_error {
        None => Extraction::Complete(parsed),
        Some(position) => {
            let mut error = ExtractionError::parse(
                file.path.clone(),
                format!("syntax error in {language} file"),
            );
            if let Some((line, column)) = position {
                error = error.at(line, column);
            }
            Extraction::Partial {
                file: parsed,
                error,
            }
        }
    }
}

/// One extractor of every language, routed by `Language`.
///
/// Not `Sync`; each pool worker owns its own set.
pub struct ExtractorSet {
    extractors: Vec<Box<dyn Extractor>>,
    routes: HashMap<Language, usize>,
}

impl ExtractorSet {
    /// Build an extractor for every supported language.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if any grammar fails to load into a parser.
    pub fn new() -> Result<Self> {
        let extractors: Vec<Box<dyn Extractor>> = vec![
            Box::new(GoExtractor::new()?),
            Box::new(JavaScriptExtractor::new()?),
            Box::new(PythonExtractor::new()?),
            Box::new(KotlinExtractor::new()?),
            Box::new(JavaExtractor::new()?),
            Box::new(SwiftExtractor::new()?),
            Box::new(ObjCExtractor::new()?),
            Box::new(ObjCppExtractor::new()?),
            Box::new(CppExtractor::new()?),
        ];
        Ok(Self::from_extractors(extractors))
    }

    /// Route to the given extractors. A later extractor claiming a language
    /// already claimed replaces the earlier route.
    #[must_use]
    pub fn from_extractors(extractors: Vec<Box<dyn Extractor>>) -> Self {
        let mut routes = HashMap::new();
        for (index, extractor) in extractors.iter().enumerate() {
            for &language in extractor.languages() {
                routes.insert(language, index);
            }
        }
        Self { extractors, routes }
    }

    /// Extractor responsible for `language`.
    pub fn extractor_for(&mut self, language: Language) -> Option<&mut dyn Extractor> {
        let index = *self.routes.get(&language)?;
        self.extractors.get_mut(index).map(|e| &mut **e as &mut dyn Extractor)
    }

    /// Languages with a registered extractor.
    #[must_use]
    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|lang| self.routes.contains_key(lang))
            .collect()
    }

    /// Route `file` by its language tag and extract it.
    pub fn extract(&mut self, file: &ScannedFile) -> Extraction {
        let Some(language) = Language::from_tag(&file.language) else {
            return Extraction::Failed(ExtractionError::unsupported_language(
                file.path.clone(),
                &file.language,
            ));
        };
        match self.extractor_for(language) {
            Some(extractor) => extractor.extract(file),
            None => Extraction::Failed(ExtractionError::unsupported_language(
                file.path.clone(),
                &file.language,
            )),
        }
    }
}

impl std::fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorSet")
            .field("languages", &self.languages())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Extractor;
    use crate::error::ExtractionError;
    use crate::types::{ParsedFile, ScannedFile};
    use tempfile::TempDir;

    /// Write `code` to a temp file at `path` and extract it.
    pub(crate) fn extract_code(
        extractor: &mut dyn Extractor,
        path: &str,
        tag: &str,
        code: &str,
    ) -> (ParsedFile, Option<ExtractionError>) {
        let dir = TempDir::new().unwrap();
        let abs = dir.path().join(path);
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&abs, code).unwrap();
        let file = ScannedFile::new(path, abs, tag);
        let (parsed, error) = extractor.extract(&file).into_parts();
        (parsed.expect("a readable file always yields a ParsedFile"), error)
    }

    /// Extract `code` and assert it parsed without syntax errors.
    pub(crate) fn extract_clean(
        extractor: &mut dyn Extractor,
        path: &str,
        tag: &str,
        code: &str,
    ) -> ParsedFile {
        let (parsed, error) = extract_code(extractor, path, tag, code);
        assert!(error.is_none(), "unexpected error: {error:?}");
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionErrorKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn every_language_has_an_extractor() {
        let set = ExtractorSet::new().expect("all grammars should load");
        assert_eq!(set.languages(), Language::ALL.to_vec());
    }

    #[test]
    fn missing_file_fails_with_filesystem_error() {
        let mut set = ExtractorSet::new().unwrap();
        let file = ScannedFile::new("gone.go", "/definitely/not/here/gone.go", "go");

        let extraction = set.extract(&file);
        let error = extraction.error().expect("error expected");
        assert_eq!(error.kind, ExtractionErrorKind::Filesystem);
        assert!(extraction.file().is_none());
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let mut set = ExtractorSet::new().unwrap();
        let file = ScannedFile::new("a.rb", "/tmp/a.rb", "ruby");

        let (parsed, error) = set.extract(&file).into_parts();
        assert!(parsed.is_none());
        assert_eq!(error.unwrap().kind, ExtractionErrorKind::UnsupportedLanguage);
    }

    #[test]
    fn empty_file_is_partial_with_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("empty.py"), "").unwrap();
        let mut set = ExtractorSet::new().unwrap();
        let file = ScannedFile::under(dir.path(), "empty.py", "python");

        match set.extract(&file) {
            Extraction::Partial { file, error } => {
                assert_eq!(file.path, PathBuf::from("empty.py"));
                assert!(file.symbols.is_empty());
                assert_eq!(error.kind, ExtractionErrorKind::Parse);
            }
            other => panic!("expected partial extraction, got {other:?}"),
        }
    }

    #[test]
    fn failing_pass_does_not_stop_later_passes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.go"), "package a\n").unwrap();
        let file = ScannedFile::under(dir.path(), "a.go", "go");
        let mut provider = SyntaxTreeProvider::new();

        fn broken(ctx: &mut FileContext<'_>) -> Result<()> {
            ctx.query("(no_such_node) @x").map(|_| ())
        }
        fn marker(ctx: &mut FileContext<'_>) -> Result<()> {
            ctx.add_import("after", false);
            Ok(())
        }
        let passes = [Pass::new("broken", &broken), Pass::new("marker", &marker)];

        let extraction = run_passes(&mut provider, &file, Language::Go, &passes);
        assert!(extraction.is_complete());
        let parsed = extraction.file().unwrap();
        assert_eq!(parsed.dependencies.len(), 1);
        assert_eq!(parsed.dependencies[0].target, "after");
    }

    #[test]
    fn later_extractor_overrides_route() {
        let set = ExtractorSet::from_extractors(vec![
            Box::new(CppExtractor::new().unwrap()),
            Box::new(ObjCExtractor::new().unwrap()),
        ]);
        assert!(set.languages().contains(&Language::C));
        assert!(set.languages().contains(&Language::ObjC));
        assert!(!set.languages().contains(&Language::Go));
    }
}

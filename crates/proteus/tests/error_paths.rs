//! Error path tests for extraction.
//!
//! Verifies that unreadable files, unsupported languages, broken syntax and
//! failing workers are reported per file instead of aborting a batch.

use std::fs;
use std::path::PathBuf;

use proteus::{
    CancellationToken, Error, Extraction, ExtractionErrorKind, ExtractorSet, ParserPool,
    PoolOptions, ScannedFile, SymbolKind,
};
use tempfile::TempDir;

/// Create a temporary workspace with the given `(path, tag, content)` files.
fn workspace(files: &[(&str, &str, &str)]) -> (TempDir, Vec<ScannedFile>) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let mut scanned = Vec::new();
    for (path, tag, content) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("should create parent dirs");
        }
        fs::write(&full_path, content).expect("should write file");
        scanned.push(ScannedFile::under(dir.path(), *path, tag));
    }
    (dir, scanned)
}

// === Single-file extraction ===

#[test]
fn missing_file_is_the_only_failure() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let missing = ScannedFile::under(dir.path(), "gone.go", "go");
    let mut extractors = ExtractorSet::new().expect("should build extractors");

    let extraction = extractors.extract(&missing);

    assert!(extraction.file().is_none());
    let error = extraction.error().expect("missing file should be reported");
    assert_eq!(error.kind, ExtractionErrorKind::Filesystem);
    assert_eq!(error.path, PathBuf::from("gone.go"));
}

#[test]
fn readable_files_always_produce_a_result() {
    let (_dir, files) = workspace(&[
        ("empty.py", "python", ""),
        ("garbage.js", "js", "}}}{{{ )))((( @@@"),
        ("binaryish.swift", "swift", "\u{1}\u{2}\u{3} class"),
        ("half.kt", "kotlin", "class Half {\n    fun"),
    ]);
    let mut extractors = ExtractorSet::new().expect("should build extractors");

    for file in &files {
        let extraction = extractors.extract(file);
        assert!(
            extraction.file().is_some(),
            "{} should yield a (possibly empty) result",
            file.path.display()
        );
        assert!(!matches!(extraction, Extraction::Failed(_)));
    }
}

#[test]
fn syntax_error_keeps_valid_declarations() {
    let (_dir, files) = workspace(&[(
        "service.go",
        "go",
        "package svc\n\nfunc Good() int {\n\treturn 1\n}\n\nfunc Bad( {\n",
    )]);
    let mut extractors = ExtractorSet::new().expect("should build extractors");

    let extraction = extractors.extract(&files[0]);

    let Extraction::Partial { file, error } = extraction else {
        panic!("syntax error should give a partial result");
    };
    assert_eq!(error.kind, ExtractionErrorKind::Parse);
    let good = file.find_symbol("Good").expect("valid function survives");
    assert_eq!(good.kind, SymbolKind::Function);
}

#[test]
fn unknown_tag_is_unsupported() {
    let (_dir, files) = workspace(&[("notes.txt", "plaintext", "hello")]);
    let mut extractors = ExtractorSet::new().expect("should build extractors");

    let extraction = extractors.extract(&files[0]);

    assert_eq!(
        extraction.error().map(|e| e.kind),
        Some(ExtractionErrorKind::UnsupportedLanguage)
    );
    assert!(extraction.file().is_none());
}

// === Pool failures ===

#[test]
fn failing_factory_reports_every_file() {
    let (_dir, files) = workspace(&[
        ("a.go", "go", "package a\n"),
        ("b.py", "python", "x = 1\n"),
        ("c.js", "js", "let c = 1;\n"),
    ]);
    let pool = ParserPool::with_options(PoolOptions::default().with_workers(2))
        .with_factory(|| Err(Error::Extraction("grammar version mismatch".to_string())));

    let output = pool.process(&files);

    assert!(output.files.is_empty());
    assert_eq!(output.errors.len(), files.len());
    assert!(
        output
            .errors
            .iter()
            .all(|e| e.kind == ExtractionErrorKind::Parse && e.message.contains("failed to create extractors"))
    );
}

#[test]
fn cancelled_pool_reports_cancellation() {
    let (_dir, files) = workspace(&[
        ("a.go", "go", "package a\n\nfunc A() {}\n"),
        ("b.go", "go", "package b\n\nfunc B() {}\n"),
    ]);
    let token = CancellationToken::new();
    token.cancel();
    let pool = ParserPool::with_options(PoolOptions::default().with_cancellation(token));

    let output = pool.process(&files);

    assert!(output.files.is_empty());
    assert_eq!(output.errors.len(), 2);
    assert!(output.errors.iter().all(|e| e.kind == ExtractionErrorKind::Cancelled));
}

#[test]
fn one_bad_file_does_not_sink_the_batch() {
    let (dir, mut files) = workspace(&[
        ("ok.py", "python", "def ok():\n    pass\n"),
        ("also_ok.go", "go", "package main\n\nfunc main() {}\n"),
    ]);
    files.push(ScannedFile::under(dir.path(), "vanished.java", "java"));

    let output = ParserPool::new().process(&files);

    assert_eq!(output.files.len(), 2);
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].kind, ExtractionErrorKind::Filesystem);
    assert_eq!(output.errors[0].path, PathBuf::from("vanished.java"));
}

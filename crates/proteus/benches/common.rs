//! Shared utilities for Proteus benchmarks.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

use std::fs;

use proteus::ScannedFile;
use tempfile::TempDir;

/// Write `files` (`(path, tag, content)`) into a temp dir and scan them.
/// The temp dir must be kept alive while the files are in use.
pub fn create_workspace(files: &[(String, &str, String)]) -> (TempDir, Vec<ScannedFile>) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut scanned = Vec::with_capacity(files.len());

    for (path, tag, content) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("failed to write file");
        scanned.push(ScannedFile::under(dir.path(), path.as_str(), tag));
    }

    (dir, scanned)
}

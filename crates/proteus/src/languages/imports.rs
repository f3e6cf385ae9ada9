//! Import classification: internal (project or standard library) versus
//! external (third-party ecosystem).
//!
//! The rules are heuristics keyed off the import string alone, with two
//! exceptions: Go consults the nearest `go.mod`, and Java/Kotlin compare
//! against the file's own package.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::trace;

// ============================================================================
// Go
// ============================================================================

/// Classify a Go import path.
///
/// Standard library paths have no `.` in their first segment. Paths under the
/// enclosing module are internal; everything else is third-party.
pub fn go_is_external(import: &str, module: Option<&str>) -> bool {
    let first = import.split('/').next().unwrap_or(import);
    if !first.contains('.') {
        return false;
    }
    match module {
        Some(module) => !(import == module || import.starts_with(&format!("{module}/"))),
        None => true,
    }
}

/// Lookup of the `module` line of the nearest `go.mod`, cached per directory.
#[derive(Debug, Default)]
pub struct GoModules {
    by_dir: HashMap<PathBuf, Option<String>>,
}

impl GoModules {
    /// Module path declared by the `go.mod` closest to `file`.
    pub fn module_for(&mut self, file: &Path) -> Option<String> {
        let dir = file.parent()?;
        if let Some(cached) = self.by_dir.get(dir) {
            return cached.clone();
        }
        let found = dir.ancestors().find_map(|candidate| {
            let contents = std::fs::read_to_string(candidate.join("go.mod")).ok()?;
            parse_module_line(&contents)
        });
        trace!(dir = %dir.display(), module = ?found, "Resolved Go module path");
        self.by_dir.insert(dir.to_path_buf(), found.clone());
        found
    }
}

fn parse_module_line(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

// ============================================================================
// JVM
// ============================================================================

fn base_package(name: &str) -> String {
    name.split('.').take(2).collect::<Vec<_>>().join(".")
}

/// Classify a Java import against the importing file's package.
pub fn java_is_external(import: &str, package: Option<&str>) -> bool {
    if import.starts_with("java.") || import.starts_with("javax.") {
        return false;
    }
    !shares_base_package(import, package)
}

/// Classify a Kotlin import; Java's standard library counts as internal too.
pub fn kotlin_is_external(import: &str, package: Option<&str>) -> bool {
    if import.starts_with("kotlin.") || import.starts_with("kotlinx.") {
        return false;
    }
    java_is_external(import, package)
}

fn shares_base_package(import: &str, package: Option<&str>) -> bool {
    let Some(package) = package.filter(|p| !p.is_empty()) else {
        return false;
    };
    let ours = base_package(package);
    !ours.is_empty() && ours == base_package(import)
}

// ============================================================================
// C family
// ============================================================================

const C_STANDARD_HEADERS: &[&str] = &[
    "assert.h", "complex.h", "ctype.h", "errno.h", "fenv.h", "float.h", "inttypes.h",
    "iso646.h", "limits.h", "locale.h", "math.h", "setjmp.h", "signal.h", "stdalign.h",
    "stdarg.h", "stdatomic.h", "stdbool.h", "stddef.h", "stdint.h", "stdio.h", "stdlib.h",
    "stdnoreturn.h", "string.h", "threads.h", "time.h", "uchar.h", "wchar.h", "wctype.h",
];

const CPP_STANDARD_HEADERS: &[&str] = &[
    "algorithm", "any", "array", "atomic", "bitset", "cassert", "cctype", "cerrno",
    "chrono", "cmath", "codecvt", "complex", "condition_variable", "cstdio", "cstdlib",
    "cstring", "ctime", "cwchar", "cwctype", "deque", "exception", "filesystem", "fstream",
    "functional", "future", "iomanip", "iostream", "iterator", "limits", "list", "locale",
    "map", "memory", "mutex", "numeric", "optional", "queue", "random", "regex", "set",
    "sstream", "stack", "stdexcept", "string", "thread", "tuple", "type_traits", "typeinfo",
    "utility", "valarray", "variant", "vector",
];

const EXTERNAL_LIBRARY_PREFIXES: &[&str] = &[
    "boost/", "Qt", "wx/", "gtk/", "SDL", "SFML/", "eigen", "opencv", "curl/", "json/",
    "yaml-cpp/", "protobuf/", "grpc/",
];

const POSIX_HEADERS: &[&str] = &[
    "sys/", "linux/", "unix/", "windows.h", "pthread.h", "unistd.h", "fcntl.h", "dirent.h",
];

/// Classify a C or C++ `#include`.
///
/// `is_system` is true for `<...>` includes.
pub fn c_family_is_external(include: &str, is_system: bool) -> bool {
    if C_STANDARD_HEADERS.contains(&include) || CPP_STANDARD_HEADERS.contains(&include) {
        return false;
    }
    if is_system {
        if EXTERNAL_LIBRARY_PREFIXES
            .iter()
            .any(|prefix| include.contains(prefix))
        {
            return true;
        }
        if POSIX_HEADERS.iter().any(|prefix| include.starts_with(prefix)) {
            return true;
        }
    }
    let local_header = [".h", ".hh", ".hpp", ".hxx"]
        .iter()
        .any(|ext| include.ends_with(ext));
    !(local_header && !include.contains('/'))
}

// ============================================================================
// Apple platforms
// ============================================================================

const SWIFT_FRAMEWORKS: &[&str] = &[
    "Foundation", "UIKit", "SwiftUI", "Combine", "CoreData", "CoreGraphics",
    "CoreLocation", "MapKit", "AVFoundation", "WebKit", "AppKit", "Cocoa",
];

const OBJC_FRAMEWORKS: &[&str] = &[
    "Foundation", "UIKit", "CoreData", "CoreGraphics", "CoreLocation", "MapKit",
    "AVFoundation", "WebKit", "AppKit", "Cocoa", "QuartzCore", "CoreAnimation", "CoreText",
    "Security", "SystemConfiguration",
];

/// Classify a Swift `import` by framework name.
pub fn swift_is_external(module: &str) -> bool {
    SWIFT_FRAMEWORKS.iter().any(|framework| {
        module == *framework
            || module
                .strip_prefix(framework)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Classify an Objective-C `#import`: `Foundation/Foundation.h` or `UIKit.h`.
pub fn objc_is_external(path: &str) -> bool {
    OBJC_FRAMEWORKS.iter().any(|framework| {
        path.strip_prefix(framework).is_some_and(|rest| {
            rest.starts_with('/') || rest == ".h"
        })
    })
}

// ============================================================================
// Scripting languages
// ============================================================================

const PYTHON_STDLIB: &[&str] = &[
    "abc", "argparse", "array", "ast", "asyncio", "base64", "bisect", "builtins", "bz2",
    "calendar", "collections", "concurrent", "configparser", "contextlib", "copy", "csv",
    "ctypes", "dataclasses", "datetime", "decimal", "difflib", "email", "enum", "errno",
    "fnmatch", "fractions", "functools", "gc", "getpass", "gettext", "glob", "gzip",
    "hashlib", "heapq", "hmac", "html", "http", "importlib", "inspect", "io", "ipaddress",
    "itertools", "json", "logging", "lzma", "math", "mimetypes", "multiprocessing", "operator",
    "os", "pathlib", "pickle", "platform", "pprint", "queue", "random", "re", "secrets",
    "select", "shlex", "shutil", "signal", "socket", "sqlite3", "ssl", "stat", "statistics",
    "string", "struct", "subprocess", "sys", "tempfile", "textwrap", "threading", "time",
    "timeit", "traceback", "types", "typing", "unittest", "urllib", "uuid", "warnings",
    "weakref", "xml", "zipfile", "zlib",
];

/// Classify a Python import (module path as written, possibly relative).
pub fn python_is_external(module: &str) -> bool {
    if module.starts_with('.') {
        return false;
    }
    let top = module.split('.').next().unwrap_or(module);
    !PYTHON_STDLIB.contains(&top)
}

const NODE_BUILTINS: &[&str] = &[
    "assert", "buffer", "child_process", "cluster", "crypto", "dgram", "dns", "events", "fs",
    "http", "http2", "https", "net", "os", "path", "perf_hooks", "process", "querystring",
    "readline", "stream", "string_decoder", "timers", "tls", "url", "util", "v8", "vm",
    "worker_threads", "zlib",
];

/// Classify a JavaScript/TypeScript module specifier.
pub fn js_is_external(specifier: &str) -> bool {
    if specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with("@/")
        || specifier.starts_with("~/")
        || specifier.starts_with("node:")
    {
        return false;
    }
    let top = specifier.split('/').next().unwrap_or(specifier);
    !NODE_BUILTINS.contains(&top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("fmt", None, false)]
    #[case("net/http", None, false)]
    #[case("github.com/me/proj/internal/db", Some("github.com/me/proj"), false)]
    #[case("github.com/me/proj", Some("github.com/me/proj"), false)]
    #[case("github.com/me/project2", Some("github.com/me/proj"), true)]
    #[case("github.com/other/lib", Some("github.com/me/proj"), true)]
    #[case("golang.org/x/sync/errgroup", None, true)]
    fn go_classification(#[case] import: &str, #[case] module: Option<&str>, #[case] external: bool) {
        assert_eq!(go_is_external(import, module), external);
    }

    #[test]
    fn go_module_found_in_ancestor_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "// comment\nmodule github.com/me/proj\n\ngo 1.22\n",
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("pkg/db")).unwrap();

        let mut modules = GoModules::default();
        let file = dir.path().join("pkg/db/db.go");
        assert_eq!(modules.module_for(&file).as_deref(), Some("github.com/me/proj"));
        // served from cache the second time
        assert_eq!(modules.module_for(&file).as_deref(), Some("github.com/me/proj"));
    }

    #[test]
    fn go_module_line_requires_separator() {
        assert_eq!(parse_module_line("modulex foo\n"), None);
        assert_eq!(parse_module_line("module \"a/b\"\n").as_deref(), Some("a/b"));
    }

    #[rstest]
    #[case("java.util.List", Some("com.example.app"), false)]
    #[case("javax.inject.Inject", None, false)]
    #[case("com.example.model.User", Some("com.example.app"), false)]
    #[case("org.springframework.Bean", Some("com.example.app"), true)]
    #[case("com.google.gson.Gson", None, true)]
    fn java_classification(#[case] import: &str, #[case] package: Option<&str>, #[case] external: bool) {
        assert_eq!(java_is_external(import, package), external);
    }

    #[test]
    fn kotlin_treats_both_standard_libraries_as_internal() {
        assert!(!kotlin_is_external("kotlinx.coroutines.launch", None));
        assert!(!kotlin_is_external("java.io.File", None));
        assert!(kotlin_is_external("io.ktor.server.Application", Some("com.example")));
    }

    #[rstest]
    #[case("stdio.h", true, false)]
    #[case("vector", true, false)]
    #[case("boost/asio.hpp", true, true)]
    #[case("QtCore/QString", true, true)]
    #[case("sys/types.h", true, true)]
    #[case("unistd.h", true, true)]
    #[case("foo.h", false, false)]
    #[case("widget.hpp", false, false)]
    #[case("lib/foo.h", false, true)]
    fn c_family_classification(#[case] include: &str, #[case] system: bool, #[case] external: bool) {
        assert_eq!(c_family_is_external(include, system), external);
    }

    #[rstest]
    #[case("Foundation", true)]
    #[case("UIKit.UIView", true)]
    #[case("FoundationExtras", false)]
    #[case("MyAppCore", false)]
    fn swift_classification(#[case] module: &str, #[case] external: bool) {
        assert_eq!(swift_is_external(module), external);
    }

    #[rstest]
    #[case("Foundation/Foundation.h", true)]
    #[case("UIKit.h", true)]
    #[case("MyView.h", false)]
    fn objc_classification(#[case] path: &str, #[case] external: bool) {
        assert_eq!(objc_is_external(path), external);
    }

    #[rstest]
    #[case("os.path", false)]
    #[case(".models", false)]
    #[case("..utils.helpers", false)]
    #[case("requests", true)]
    #[case("numpy.linalg", true)]
    fn python_classification(#[case] module: &str, #[case] external: bool) {
        assert_eq!(python_is_external(module), external);
    }

    #[rstest]
    #[case("./utils", false)]
    #[case("../lib/api", false)]
    #[case("@/components/Button", false)]
    #[case("~/store", false)]
    #[case("node:fs", false)]
    #[case("path", false)]
    #[case("react", true)]
    #[case("@tanstack/query", true)]
    fn js_classification(#[case] specifier: &str, #[case] external: bool) {
        assert_eq!(js_is_external(specifier), external);
    }
}

//! Cross-file resolution between headers and implementation files.
//!
//! C, C++ and Objective-C split declarations (headers) from definitions
//! (`.c`, `.cpp`, `.m`, `.mm`). After a batch is extracted, each
//! implementation file is paired with its sibling header and gains
//! `implements_declaration` edges per matched symbol plus one
//! `implements_header` edge naming the header.
//!
//! Matching is syntactic. Function signatures are compared by name and
//! parameter types after dropping qualifiers and parameter names; nothing is
//! type-checked.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{DependencyKind, Language, ParsedDependency, ParsedFile, ParsedSymbol, ScannedFile, SymbolKind};

const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx"];

/// Implementation extensions tried for a header, in order.
const IMPLEMENTATION_CANDIDATES: &[&str] = &["cpp", "cc", "cxx", "c++", "c", "m", "mm"];

/// Header extensions tried for a C++ implementation file, in order.
const CPP_HEADER_CANDIDATES: &[&str] = &["hpp", "hh", "hxx", "h"];

/// Qualifiers ignored when comparing signatures.
const IGNORED_QUALIFIERS: &[&str] = &["const", "volatile", "noexcept", "override", "final"];

/// Words that end a parameter type rather than name the parameter.
const BUILTIN_TYPES: &[&str] = &[
    "auto", "bool", "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
    "wchar_t", "size_t",
];

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Whether `path` is a C-family header by extension.
#[must_use]
pub fn is_header(path: &Path) -> bool {
    extension(path).is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext))
}

/// Sibling paths that could pair with `path`, most preferred first.
///
/// Headers map to implementation files and implementation files to headers.
/// Files of other languages have no candidates.
#[must_use]
pub fn pair_candidates(path: &Path) -> Vec<PathBuf> {
    let extensions: &[&str] = match extension(path) {
        Some(ext) if HEADER_EXTENSIONS.contains(&ext) => IMPLEMENTATION_CANDIDATES,
        Some("cpp" | "cc" | "cxx" | "c++") => CPP_HEADER_CANDIDATES,
        Some("c" | "m" | "mm") => &["h"],
        _ => &[],
    };
    extensions.iter().map(|ext| path.with_extension(ext)).collect()
}

/// The first pairing candidate of `path` that exists on disk.
#[must_use]
pub fn paired_file(path: &Path) -> Option<PathBuf> {
    pair_candidates(path).into_iter().find(|candidate| candidate.is_file())
}

// ============================================================================
// Signature matching
// ============================================================================

/// Collapse whitespace and drop `const`, `volatile`, `noexcept`, `override`
/// and `final` wherever they appear as whole words.
#[must_use]
pub fn normalize_signature(signature: &str) -> String {
    let mut out = String::with_capacity(signature.len());
    let mut word = String::new();
    let flush = |word: &mut String, out: &mut String| {
        if !IGNORED_QUALIFIERS.contains(&word.as_str()) {
            out.push_str(word);
        }
        word.clear();
    };
    for c in signature.chars() {
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a signature into its unqualified name and raw parameter list.
///
/// `int Widget::add(int a, int b)` gives `("add", ["int a", "int b"])`. An
/// empty list or `void` means no parameters. Without parentheses the name is
/// empty.
#[must_use]
pub fn parse_signature(signature: &str) -> (String, Vec<String>) {
    let Some(open) = signature.find('(') else {
        return (String::new(), Vec::new());
    };
    let name = signature[..open]
        .split_whitespace()
        .last()
        .map(|token| {
            let token = token.rsplit("::").next().unwrap_or(token);
            token.trim_start_matches(['*', '&']).to_string()
        })
        .unwrap_or_default();

    let Some(close) = signature.rfind(')').filter(|&close| close > open) else {
        return (name, Vec::new());
    };
    let params = signature[open + 1..close].trim();
    if params.is_empty() || params == "void" {
        return (name, Vec::new());
    }
    let params = split_parameters(params)
        .into_iter()
        .map(|p| p.trim().to_string())
        .collect();
    (name, params)
}

/// Split on commas outside template argument lists.
#[must_use]
pub fn split_parameters(params: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in params.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn is_identifier(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && word.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Type of one parameter with its name and default value removed.
///
/// `int *x`, `int* x` and `int*` all give `int*`; `unsigned int` stays
/// whole because its last word is a builtin type.
#[must_use]
pub fn parameter_type(param: &str) -> String {
    let param = param.split('=').next().unwrap_or(param);
    let mut tokens: Vec<&str> = param.split_whitespace().collect();
    if tokens.len() > 1
        && let Some(last) = tokens.last().copied()
    {
        let name = last.trim_start_matches(['*', '&']);
        if is_identifier(name) && !BUILTIN_TYPES.contains(&name) {
            let prefix = &last[..last.len() - name.len()];
            tokens.pop();
            if !prefix.is_empty() {
                tokens.push(prefix);
            }
        }
    }
    tokens
        .join(" ")
        .replace(" *", "*")
        .replace(" &", "&")
}

/// Whether two signatures declare the same function.
///
/// Names must agree after dropping qualifiers, and parameter types must agree
/// pairwise after dropping parameter names.
#[must_use]
pub fn signatures_match(a: &str, b: &str) -> bool {
    let (name_a, params_a) = parse_signature(&normalize_signature(a));
    let (name_b, params_b) = parse_signature(&normalize_signature(b));
    name_a == name_b
        && params_a.len() == params_b.len()
        && params_a
            .iter()
            .zip(&params_b)
            .all(|(x, y)| parameter_type(x) == parameter_type(y))
}

/// Method name of an out-of-class definition of `class`.
///
/// `void Widget::draw(int)` with class `Widget` gives `draw`.
/// `MyWidget::draw` does not count for class `Widget`.
fn qualified_method<'s>(signature: &'s str, class: &str) -> Option<&'s str> {
    let pattern = format!("{class}::");
    let (index, _) = signature.match_indices(&pattern).find(|(index, _)| {
        signature[..*index]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })?;
    let rest = &signature[index + pattern.len()..];
    let name = rest[..rest.find('(')?].trim();
    (!name.is_empty()).then_some(name)
}

// ============================================================================
// Linking
// ============================================================================

fn implements(source: impl Into<String>, target: impl Into<String>) -> ParsedDependency {
    ParsedDependency::edge(DependencyKind::ImplementsDeclaration, source, target)
}

fn implements_header(header: &ParsedFile, implementation: &ParsedFile) -> Option<ParsedDependency> {
    (!header.symbols.is_empty() && !implementation.symbols.is_empty()).then(|| {
        ParsedDependency::edge(
            DependencyKind::ImplementsHeader,
            implementation.path.display().to_string(),
            header.path.display().to_string(),
        )
    })
}

fn is_class_like(symbol: &ParsedSymbol) -> bool {
    matches!(symbol.kind, SymbolKind::Class | SymbolKind::Struct)
}

/// Edges from a C/C++ implementation file to the header it implements.
#[must_use]
pub fn link_cpp(header: &ParsedFile, implementation: &ParsedFile) -> Vec<ParsedDependency> {
    let mut edges = Vec::new();

    for declared in &header.symbols {
        if declared.kind == SymbolKind::FunctionDeclaration {
            edges.extend(
                implementation
                    .symbols
                    .iter()
                    .filter(|defined| defined.kind.is_function_definition() && defined.name == declared.name)
                    .filter(|defined| signatures_match(&declared.signature, &defined.signature))
                    .map(|defined| implements(&defined.name, &declared.name)),
            );
        }

        if !is_class_like(declared) {
            continue;
        }

        // Methods defined inside a same-named class body
        for defined in implementation
            .symbols
            .iter()
            .filter(|s| is_class_like(s) && s.name == declared.name)
        {
            for method in declared.children.iter().filter(|m| m.kind.is_method()) {
                if let Some(body) = defined
                    .children
                    .iter()
                    .find(|m| m.kind.is_method() && m.name == method.name)
                {
                    edges.push(implements(
                        format!("{}::{}", defined.name, body.name),
                        format!("{}::{}", declared.name, method.name),
                    ));
                }
            }
        }

        // `Class::method` definitions outside any class body
        for defined in implementation.symbols.iter().filter(|s| {
            matches!(s.kind, SymbolKind::Function | SymbolKind::InlineFunction)
        }) {
            let Some(method) = qualified_method(&defined.signature, &declared.name) else {
                continue;
            };
            if declared.children.iter().any(|m| m.name == method) {
                let name = format!("{}::{method}", declared.name);
                edges.push(implements(&name, name.clone()));
            }
        }
    }

    edges.extend(implements_header(header, implementation));
    edges
}

/// Edges from an Objective-C implementation file to its header.
///
/// `@implementation` blocks link to the `@interface` or category of the same
/// name, and method implementations to declarations with the same selector.
#[must_use]
pub fn link_objc(header: &ParsedFile, implementation: &ParsedFile) -> Vec<ParsedDependency> {
    let mut edges = Vec::new();

    for defined in implementation
        .symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Implementation)
    {
        let Some(declared) = header.symbols.iter().find(|s| {
            matches!(s.kind, SymbolKind::Interface | SymbolKind::Category) && s.name == defined.name
        }) else {
            continue;
        };
        edges.push(implements(&defined.name, &declared.name));

        for method in &defined.children {
            if declared
                .children
                .iter()
                .any(|m| m.kind == SymbolKind::Method && m.name == method.name)
            {
                edges.push(implements(
                    format!("{}::{}", defined.name, method.name),
                    format!("{}::{}", declared.name, method.name),
                ));
            }
        }
    }

    edges.extend(implements_header(header, implementation));
    edges
}

fn link(header: &ParsedFile, implementation: &ParsedFile) -> Vec<ParsedDependency> {
    match implementation.language {
        Language::ObjC => link_objc(header, implementation),
        Language::ObjCpp => {
            let mut seen = HashSet::new();
            link_cpp(header, implementation)
                .into_iter()
                .chain(link_objc(header, implementation))
                .filter(|edge| seen.insert((edge.kind, edge.source.clone(), edge.target.clone())))
                .collect()
        }
        _ => link_cpp(header, implementation),
    }
}

/// Pair headers with implementation files inside one batch and append the
/// resulting edges to each implementation file.
///
/// `scanned` supplies the absolute paths used to look for the sibling on
/// disk. A file whose sibling is missing, or was not part of the batch,
/// gains no edges.
pub fn resolve_pairs(files: &mut [ParsedFile], scanned: &[ScannedFile]) {
    let absolute: HashMap<&Path, &Path> = scanned
        .iter()
        .map(|s| (s.path.as_path(), s.abs_path.as_path()))
        .collect();
    let by_absolute: HashMap<&Path, usize> = files
        .iter()
        .enumerate()
        .filter_map(|(index, f)| Some((*absolute.get(f.path.as_path())?, index)))
        .collect();

    let mut pending = Vec::new();
    for (index, file) in files.iter().enumerate() {
        if !file.language.has_paired_files() || is_header(&file.path) {
            continue;
        }
        let Some(header) = absolute
            .get(file.path.as_path())
            .and_then(|abs| paired_file(abs))
            .and_then(|abs| by_absolute.get(abs.as_path()).copied())
        else {
            continue;
        };
        let edges = link(&files[header], file);
        debug!(
            implementation = %file.path.display(),
            header = %files[header].path.display(),
            edges = edges.len(),
            "Linked header and implementation"
        );
        pending.push((index, edges));
    }

    for (index, edges) in pending {
        files[index].dependencies.extend(edges);
    }
}

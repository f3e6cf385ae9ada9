//! Kotlin extraction.
//!
//! Declarations are found by walking the tree rather than through queries,
//! since the grammar spells names as `identifier`, `simple_identifier` or
//! `type_identifier` depending on the construct.

use std::collections::HashSet;

use tree_sitter::Node;

use super::imports::kotlin_is_external;
use super::java::{infer_package, qualify};
use super::tree_sitter_utils::{
    child_of_kind, child_of_kinds, collapse_whitespace, has_ancestor_kind, has_child_kind,
    head_signature, named_descendants, strip_generics, trailing_name,
};
use super::{Extraction, Extractor, FileContext, Pass, run_passes};
use crate::error::Result;
use crate::syntax::SyntaxTreeProvider;
use crate::types::{
    DependencyKind, Language, ParsedDependency, ParsedSymbol, ScannedFile, Span, SymbolKind,
};

mod node_kinds {
    pub const PACKAGE_HEADER: &str = "package_header";
    pub const IMPORT: &str = "import";
    pub const IMPORT_HEADER: &str = "import_header";
    pub const CLASS_DECLARATION: &str = "class_declaration";
    pub const OBJECT_DECLARATION: &str = "object_declaration";
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const PROPERTY_DECLARATION: &str = "property_declaration";
    pub const VARIABLE_DECLARATION: &str = "variable_declaration";
    pub const CLASS_BODY: &str = "class_body";
    pub const ENUM_CLASS_BODY: &str = "enum_class_body";
    pub const ENUM_ENTRY: &str = "enum_entry";
    pub const MODIFIERS: &str = "modifiers";
    pub const ANNOTATION: &str = "annotation";
    pub const DELEGATION_SPECIFIERS: &str = "delegation_specifiers";
    pub const DELEGATION_SPECIFIER: &str = "delegation_specifier";
    pub const RECEIVER_TYPE: &str = "receiver_type";
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const NAVIGATION_EXPRESSION: &str = "navigation_expression";
    pub const NAVIGATION_SUFFIX: &str = "navigation_suffix";
}

const COMMENTS: &[&str] = &["line_comment", "block_comment", "multiline_comment", "comment"];
const NAMES: &[&str] = &["identifier", "simple_identifier", "type_identifier"];
const TYPES: &[&str] = &[node_kinds::CLASS_DECLARATION, node_kinds::OBJECT_DECLARATION];
const CALLERS: &[&str] = &[node_kinds::FUNCTION_DECLARATION];

/// Source roots for Kotlin, which also lives in Java trees.
const KOTLIN_SOURCE_ROOTS: &[&str] = &[
    "src/main/kotlin/",
    "src/test/kotlin/",
    "src/main/java/",
    "src/test/java/",
    "src/",
    "kotlin/",
    "java/",
];

/// Extractor for `.kt` and `.kts` files.
pub struct KotlinExtractor {
    provider: SyntaxTreeProvider,
}

impl KotlinExtractor {
    /// Create an extractor with its own parser.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if the Kotlin grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::Kotlin])?,
        })
    }
}

impl Extractor for KotlinExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::Kotlin]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        run_passes(
            &mut self.provider,
            file,
            Language::Kotlin,
            &[
                Pass::new("package", &extract_package),
                Pass::new("imports", &extract_imports),
                Pass::new("classes", &extract_classes),
                Pass::new("interfaces", &extract_interfaces),
                Pass::new("functions", &extract_functions),
                Pass::new("properties", &extract_properties),
                Pass::new("annotations", &extract_annotations),
                Pass::new("calls", &extract_calls),
            ],
        )
    }
}

fn package(ctx: &FileContext<'_>) -> String {
    ctx.first_symbol_named(SymbolKind::Package)
        .unwrap_or_default()
        .to_string()
}

/// Name of a declaration: its `name` field, else its first identifier child.
fn declaration_name(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<String> {
    node.child_by_field_name("name")
        .or_else(|| child_of_kinds(node, NAMES))
        .map(|n| ctx.text(&n))
        .filter(|name| !name.is_empty())
}

fn property_name(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<String> {
    let declaration = child_of_kind(node, node_kinds::VARIABLE_DECLARATION)?;
    declaration_name(ctx, &declaration)
}

/// Modifier words and keywords written before a declaration's name.
///
/// `data class Foo` gives `["data", "class"]`; annotations are skipped.
fn keywords(ctx: &FileContext<'_>, node: &Node<'_>) -> Vec<String> {
    let mut words = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if NAMES.contains(&child.kind()) {
            break;
        }
        if child.kind() == node_kinds::MODIFIERS {
            let mut inner = child.walk();
            for modifier in child.named_children(&mut inner) {
                if modifier.kind() != node_kinds::ANNOTATION {
                    words.extend(ctx.text(&modifier).split_whitespace().map(str::to_string));
                }
            }
        } else if !child.is_named() {
            words.push(child.kind().to_string());
        }
    }
    words
}

fn has_keyword(words: &[String], keyword: &str) -> bool {
    words.iter().any(|w| w == keyword)
}

fn is_interface(ctx: &FileContext<'_>, node: &Node<'_>) -> bool {
    node.kind() == node_kinds::CLASS_DECLARATION && has_keyword(&keywords(ctx, node), "interface")
}

fn type_kind(ctx: &FileContext<'_>, node: &Node<'_>) -> SymbolKind {
    if node.kind() == node_kinds::OBJECT_DECLARATION {
        return SymbolKind::Object;
    }
    let words = keywords(ctx, node);
    if has_keyword(&words, "data") {
        SymbolKind::DataClass
    } else if has_keyword(&words, "sealed") {
        SymbolKind::SealedClass
    } else if has_keyword(&words, "enum") {
        SymbolKind::EnumClass
    } else {
        SymbolKind::Class
    }
}

fn extract_package(ctx: &mut FileContext<'_>) -> Result<()> {
    if let Some(header) = child_of_kind(&ctx.root, node_kinds::PACKAGE_HEADER) {
        let text = ctx.text(&header);
        let name = text.trim().strip_prefix("package").unwrap_or(&text);
        let name = collapse_whitespace(name.trim_end_matches(';'));
        if !name.is_empty() {
            let symbol = ParsedSymbol::new(&name, SymbolKind::Package, format!("package {name}"), ctx.span(&header));
            ctx.symbols.push(symbol);
            return Ok(());
        }
    }

    let inferred = infer_package(&ctx.file.path, KOTLIN_SOURCE_ROOTS);
    if !inferred.is_empty() {
        let signature = format!("package {inferred}");
        ctx.symbols
            .push(ParsedSymbol::new(inferred, SymbolKind::Package, signature, Span::default()));
    }
    Ok(())
}

/// Imported path without the keyword, alias or terminator.
fn import_path(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix("import").unwrap_or(text);
    let text = text.split(" as ").next().unwrap_or(text);
    collapse_whitespace(text.trim().trim_end_matches(';')).replace(' ', "")
}

fn extract_imports(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for node in named_descendants(&ctx.root, &[node_kinds::IMPORT, node_kinds::IMPORT_HEADER]) {
        let path = import_path(&ctx.text(&node));
        if path.is_empty() {
            continue;
        }
        let external = kotlin_is_external(&path, Some(&package));
        let mut dependency = ParsedDependency::import(path, external);
        dependency.source.clone_from(&package);
        ctx.dependencies.push(dependency);
    }
    Ok(())
}

/// Body members, looking through a `class_member_declarations` wrapper.
fn body_members<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let Some(body) = child_of_kinds(node, &[node_kinds::CLASS_BODY, node_kinds::ENUM_CLASS_BODY]) else {
        return Vec::new();
    };
    let mut members = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind().starts_with("class_member_declaration") {
            let mut inner = child.walk();
            members.extend(child.named_children(&mut inner));
        } else {
            members.push(child);
        }
    }
    members
}

fn is_suspend(ctx: &FileContext<'_>, node: &Node<'_>) -> bool {
    has_keyword(&keywords(ctx, node), "suspend")
}

fn method_symbol(ctx: &mut FileContext<'_>, node: &Node<'_>, kind: SymbolKind) -> Option<ParsedSymbol> {
    let name = declaration_name(ctx, node)?;
    ctx.declare(node, name.clone());
    Some(
        ParsedSymbol::new(name, kind, head_signature(&ctx.text(node), false), ctx.span(node))
            .with_docstring(ctx.doc(node, COMMENTS)),
    )
}

/// Properties, then methods, then enum entries.
fn type_members(ctx: &mut FileContext<'_>, node: &Node<'_>) -> Vec<ParsedSymbol> {
    let mut properties = Vec::new();
    let mut methods = Vec::new();
    let mut entries = Vec::new();
    for member in body_members(node) {
        match member.kind() {
            node_kinds::PROPERTY_DECLARATION => {
                if let Some(name) = property_name(ctx, &member) {
                    properties.push(
                        ParsedSymbol::new(name, SymbolKind::Property, head_signature(&ctx.text(&member), false), ctx.span(&member))
                            .with_docstring(ctx.doc(&member, COMMENTS)),
                    );
                }
            }
            node_kinds::FUNCTION_DECLARATION => {
                let kind = if is_suspend(ctx, &member) {
                    SymbolKind::SuspendMethod
                } else {
                    SymbolKind::Method
                };
                methods.extend(method_symbol(ctx, &member, kind));
            }
            node_kinds::ENUM_ENTRY => {
                if let Some(name) = declaration_name(ctx, &member) {
                    entries.push(ParsedSymbol::new(
                        name,
                        SymbolKind::EnumConstant,
                        collapse_whitespace(&ctx.text(&member)),
                        ctx.span(&member),
                    ));
                }
            }
            _ => {}
        }
    }
    properties.extend(methods);
    properties.extend(entries);
    properties
}

/// Supertype names from the delegation specifiers, without arguments or generics.
fn supertypes(ctx: &FileContext<'_>, node: &Node<'_>) -> Vec<String> {
    let specifiers = match child_of_kind(node, node_kinds::DELEGATION_SPECIFIERS) {
        Some(list) => {
            let mut cursor = list.walk();
            list.named_children(&mut cursor).collect::<Vec<_>>()
        }
        None => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|c| c.kind() == node_kinds::DELEGATION_SPECIFIER)
                .collect()
        }
    };
    specifiers
        .iter()
        .filter_map(|specifier| {
            let text = ctx.text(specifier);
            let text = text.split('(').next().unwrap_or(&text);
            let text = text.split(" by ").next().unwrap_or(text);
            let name = strip_generics(text);
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

fn extract_classes(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for node in named_descendants(&ctx.root, TYPES) {
        if is_interface(ctx, &node) {
            continue;
        }
        let Some(name) = declaration_name(ctx, &node) else {
            continue;
        };
        let qualified = qualify(&package, &name);
        let kind = type_kind(ctx, &node);
        let children = type_members(ctx, &node);
        let parents = supertypes(ctx, &node);

        let symbol = ParsedSymbol::new(&qualified, kind, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        for parent in parents {
            ctx.add_edge(DependencyKind::Extends, &qualified, parent);
        }
    }
    Ok(())
}

fn extract_interfaces(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for node in named_descendants(&ctx.root, &[node_kinds::CLASS_DECLARATION]) {
        if !is_interface(ctx, &node) {
            continue;
        }
        let Some(name) = declaration_name(ctx, &node) else {
            continue;
        };
        let qualified = qualify(&package, &name);
        let mut methods = Vec::new();
        for member in body_members(&node) {
            if member.kind() == node_kinds::FUNCTION_DECLARATION {
                methods.extend(method_symbol(ctx, &member, SymbolKind::Method));
            }
        }
        let parents = supertypes(ctx, &node);

        let symbol = ParsedSymbol::new(&qualified, SymbolKind::Interface, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(methods);
        ctx.symbols.push(symbol);

        for parent in parents {
            ctx.add_edge(DependencyKind::Extends, &qualified, parent);
        }
    }
    Ok(())
}

fn is_extension(ctx: &FileContext<'_>, node: &Node<'_>) -> bool {
    if has_child_kind(node, node_kinds::RECEIVER_TYPE) {
        return true;
    }
    let text = ctx.text(node);
    let head = text.split('(').next().unwrap_or_default();
    head.contains("fun ") && head.contains('.')
}

fn extract_functions(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::FUNCTION_DECLARATION]) {
        if has_ancestor_kind(&node, TYPES) {
            continue;
        }
        let Some(name) = declaration_name(ctx, &node) else {
            continue;
        };
        let kind = if is_suspend(ctx, &node) {
            SymbolKind::SuspendFunction
        } else if is_extension(ctx, &node) {
            SymbolKind::ExtensionFunction
        } else {
            SymbolKind::Function
        };
        let symbol = ParsedSymbol::new(name, kind, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS));
        ctx.add_symbol(&node, symbol);
    }
    Ok(())
}

fn extract_properties(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::PROPERTY_DECLARATION]) {
        if has_ancestor_kind(&node, &[node_kinds::CLASS_DECLARATION, node_kinds::OBJECT_DECLARATION, node_kinds::FUNCTION_DECLARATION]) {
            continue;
        }
        let Some(name) = property_name(ctx, &node) else {
            continue;
        };
        let symbol = ParsedSymbol::new(name, SymbolKind::Property, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

/// `@Inject`, `@field:Json("x")` and `@a.b.Named` all name their last segment.
fn annotation_name(text: &str) -> String {
    let text = text.trim().trim_start_matches('@');
    let text = text.split('(').next().unwrap_or(text);
    let text = text.rsplit(':').next().unwrap_or(text);
    let text = strip_generics(text);
    text.rsplit('.').next().unwrap_or(text).trim().to_string()
}

/// Simple name of the declaration an annotation decorates.
fn annotated_target(ctx: &FileContext<'_>, annotation: &Node<'_>) -> Option<String> {
    let mut current = annotation.parent();
    while let Some(node) = current {
        match node.kind() {
            node_kinds::CLASS_DECLARATION | node_kinds::OBJECT_DECLARATION | node_kinds::FUNCTION_DECLARATION => {
                return declaration_name(ctx, &node);
            }
            node_kinds::PROPERTY_DECLARATION => return property_name(ctx, &node),
            _ => current = node.parent(),
        }
    }
    None
}

fn extract_annotations(ctx: &mut FileContext<'_>) -> Result<()> {
    let mut symbols_seen = HashSet::new();
    let mut edges_seen = HashSet::new();
    for node in named_descendants(&ctx.root, &[node_kinds::ANNOTATION]) {
        let text = ctx.text(&node);
        let name = annotation_name(&text);
        if name.is_empty() {
            continue;
        }
        if let Some(target) = annotated_target(ctx, &node)
            && edges_seen.insert((target.clone(), name.clone()))
        {
            ctx.add_edge(DependencyKind::AnnotatedWith, target, name.clone());
        }
        if symbols_seen.insert(name.clone()) {
            let symbol = ParsedSymbol::new(name, SymbolKind::Annotation, collapse_whitespace(&text), ctx.span(&node));
            ctx.symbols.push(symbol);
        }
    }
    Ok(())
}

fn extract_calls(ctx: &mut FileContext<'_>) -> Result<()> {
    const PATHS: &[&str] = &[node_kinds::NAVIGATION_EXPRESSION, node_kinds::NAVIGATION_SUFFIX];
    for call in named_descendants(&ctx.root, &[node_kinds::CALL_EXPRESSION]) {
        let Some(target) = call
            .named_child(0)
            .and_then(|callee| trailing_name(&callee, PATHS, NAMES))
        else {
            continue;
        };
        if let Some(caller) = ctx.enclosing_declaration(&call, CALLERS) {
            let target = ctx.text(&target);
            ctx.add_edge(DependencyKind::Call, caller, target);
        }
    }
    Ok(())
}

//! Objective-C and Objective-C++ extraction.
//!
//! Headers contribute `@interface` declarations and sources contribute
//! `@implementation` blocks; the resolver links the two. Method names are
//! full selectors (`moveTo:y:`).
//!
//! Objective-C++ runs the C++ passes and the Objective-C passes over the same
//! bytes and merges what each grammar understood.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use super::imports::objc_is_external;
use super::tree_sitter_utils::{child_of_kinds, head_signature, named_descendants};
use super::{Extraction, Extractor, FileContext, Pass, cpp, extract_source, read_source, run_passes};
use crate::error::Result;
use crate::syntax::{Grammar, SyntaxTreeProvider};
use crate::types::{DependencyKind, Language, ParsedFile, ParsedSymbol, ScannedFile, SymbolKind};

mod node_kinds {
    pub const PREPROC_INCLUDE: &str = "preproc_include";
    pub const SYSTEM_LIB_STRING: &str = "system_lib_string";
    pub const STRING_LITERAL: &str = "string_literal";
    pub const CLASS_INTERFACE: &str = "class_interface";
    pub const CLASS_IMPLEMENTATION: &str = "class_implementation";
    pub const IMPLEMENTATION_DEFINITION: &str = "implementation_definition";
    pub const PROTOCOL_DECLARATION: &str = "protocol_declaration";
    pub const QUALIFIED_PROTOCOL_INTERFACE_DECLARATION: &str =
        "qualified_protocol_interface_declaration";
    pub const METHOD_DECLARATION: &str = "method_declaration";
    pub const METHOD_DEFINITION: &str = "method_definition";
    pub const METHOD_PARAMETER: &str = "method_parameter";
    pub const PROPERTY_DECLARATION: &str = "property_declaration";
    pub const STRUCT_DECLARATOR: &str = "struct_declarator";
    pub const MESSAGE_EXPRESSION: &str = "message_expression";
    pub const KEYWORD_ARGUMENT: &str = "keyword_argument";
    pub const IDENTIFIER: &str = "identifier";
    pub const FIELD_IDENTIFIER: &str = "field_identifier";
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
}

const COMMENTS: &[&str] = &["comment"];
const CALLERS: &[&str] = &[node_kinds::METHOD_DEFINITION, node_kinds::METHOD_DECLARATION];

/// Conformance lists as spelled by the grammar.
const PROTOCOL_LISTS: &[&str] = &["protocol_qualifiers", "parameterized_arguments", "protocol_reference_list"];

/// Bodies whose children are members of the enclosing declaration.
const MEMBER_SECTIONS: &[&str] = &[
    node_kinds::IMPLEMENTATION_DEFINITION,
    node_kinds::QUALIFIED_PROTOCOL_INTERFACE_DECLARATION,
];

/// Objective-C passes, shared with the Objective-C++ extractor.
pub(crate) const PASSES: &[Pass<'static>] = &[
    Pass::new("imports", &extract_imports),
    Pass::new("interfaces_or_implementations", &extract_interfaces_or_implementations),
    Pass::new("protocols", &extract_protocols),
    Pass::new("categories", &extract_categories),
    Pass::new("calls", &extract_calls),
];

/// Extractor for `.m` files and Objective-C headers.
pub struct ObjCExtractor {
    provider: SyntaxTreeProvider,
}

impl ObjCExtractor {
    /// Create an extractor with its own parser.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if the Objective-C grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::ObjC])?,
        })
    }
}

impl Extractor for ObjCExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::ObjC]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        run_passes(&mut self.provider, file, Language::ObjC, PASSES)
    }
}

fn extract_imports(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::PREPROC_INCLUDE]) {
        let Some(path) = node.child_by_field_name("path").or_else(|| {
            child_of_kinds(&node, &[node_kinds::SYSTEM_LIB_STRING, node_kinds::STRING_LITERAL])
        }) else {
            continue;
        };
        let path = ctx.text(&path);
        let path = path.trim_matches(|c| matches!(c, '<' | '>' | '"'));
        if !path.is_empty() {
            ctx.add_import(path, objc_is_external(path));
        }
    }
    Ok(())
}

/// Full selector of a method declaration or definition.
///
/// `- (void)moveTo:(int)x y:(int)y` gives `moveTo:y:`; a method without
/// parameters gives its bare name.
fn method_selector(ctx: &FileContext<'_>, method: &Node<'_>) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut cursor = method.walk();
    for child in method.children(&mut cursor) {
        match child.kind() {
            node_kinds::IDENTIFIER => parts.push(ctx.text(&child)),
            node_kinds::METHOD_PARAMETER | ":" => {
                let keyword = child
                    .child(0)
                    .filter(|first| first.kind() == node_kinds::IDENTIFIER)
                    .filter(|_| child.child(1).is_some_and(|c| c.kind() == ":"));
                match keyword {
                    Some(keyword) => parts.push(format!("{}:", ctx.text(&keyword))),
                    None => {
                        if let Some(last) = parts.last_mut()
                            && !last.ends_with(':')
                        {
                            last.push(':');
                        }
                    }
                }
            }
            _ => {}
        }
    }
    let selector = parts.concat();
    (!selector.is_empty()).then_some(selector)
}

/// Selector of a message send, skipping the receiver and the arguments.
///
/// `[obj moveTo:1 y:2]` gives `moveTo:y:` and `[obj draw]` gives `draw`.
fn message_selector(ctx: &FileContext<'_>, message: &Node<'_>) -> Option<String> {
    let mut cursor = message.walk();
    let keywords: String = message
        .named_children(&mut cursor)
        .filter(|c| c.kind() == node_kinds::KEYWORD_ARGUMENT)
        .filter_map(|arg| {
            arg.child_by_field_name("keyword")
                .or_else(|| arg.named_child(0).filter(|n| n.kind() == node_kinds::IDENTIFIER))
        })
        .map(|keyword| format!("{}:", ctx.text(&keyword)))
        .collect();
    if !keywords.is_empty() {
        return Some(keywords);
    }

    let receiver = message
        .child_by_field_name("receiver")
        .or_else(|| message.named_child(0))?;
    let mut cursor = message.walk();
    let rest: Vec<_> = message
        .children(&mut cursor)
        .skip_while(|c| c.id() != receiver.id())
        .skip(1)
        .collect();

    if !rest.iter().any(|c| c.kind() == ":") {
        return rest
            .iter()
            .find(|c| c.kind() == node_kinds::IDENTIFIER)
            .map(|name| ctx.text(name));
    }
    let selector: String = rest
        .windows(2)
        .filter(|pair| pair[0].kind() == node_kinds::IDENTIFIER && pair[1].kind() == ":")
        .map(|pair| format!("{}:", ctx.text(&pair[0])))
        .collect();
    (!selector.is_empty()).then_some(selector)
}

fn property_name(ctx: &FileContext<'_>, property: &Node<'_>) -> Option<String> {
    const NAMES: &[&str] = &[node_kinds::IDENTIFIER, node_kinds::FIELD_IDENTIFIER];
    let declarator = named_descendants(property, &[node_kinds::STRUCT_DECLARATOR])
        .into_iter()
        .next();
    let name = match declarator {
        Some(declarator) => named_descendants(&declarator, NAMES).into_iter().next(),
        None => named_descendants(property, NAMES).into_iter().last(),
    }?;
    Some(ctx.text(&name))
}

/// Member nodes of a declaration, looking through implementation and
/// `@required`/`@optional` sections.
fn member_nodes<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut members = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if MEMBER_SECTIONS.contains(&child.kind()) {
            let mut inner = child.walk();
            members.extend(child.named_children(&mut inner));
        } else {
            members.push(child);
        }
    }
    members
}

/// Properties first, then methods. Methods are declared for call attribution.
fn members(ctx: &mut FileContext<'_>, node: &Node<'_>) -> Vec<ParsedSymbol> {
    let mut properties = Vec::new();
    let mut methods = Vec::new();
    for member in member_nodes(node) {
        match member.kind() {
            node_kinds::PROPERTY_DECLARATION => {
                if let Some(name) = property_name(ctx, &member) {
                    let signature = head_signature(&ctx.text(&member), true);
                    properties.push(
                        ParsedSymbol::new(name, SymbolKind::Property, signature, ctx.span(&member))
                            .with_docstring(ctx.doc(&member, COMMENTS)),
                    );
                }
            }
            node_kinds::METHOD_DECLARATION | node_kinds::METHOD_DEFINITION => {
                let Some(selector) = method_selector(ctx, &member) else {
                    continue;
                };
                let kind = if member.kind() == node_kinds::METHOD_DEFINITION {
                    SymbolKind::MethodImplementation
                } else {
                    SymbolKind::Method
                };
                ctx.declare(&member, selector.clone());
                methods.push(
                    ParsedSymbol::new(selector, kind, head_signature(&ctx.text(&member), true), ctx.span(&member))
                        .with_docstring(ctx.doc(&member, COMMENTS)),
                );
            }
            _ => {}
        }
    }
    properties.extend(methods);
    properties
}

/// The class name and, for categories, the category name.
fn class_and_category(ctx: &FileContext<'_>, node: &Node<'_>) -> (Option<String>, Option<String>) {
    let mut class = node.child_by_field_name("name").map(|n| ctx.text(&n));
    let mut category = node.child_by_field_name("category").map(|n| ctx.text(&n));
    let mut in_parens = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "(" => in_parens = true,
            ")" => in_parens = false,
            node_kinds::IDENTIFIER if class.is_none() => class = Some(ctx.text(&child)),
            node_kinds::IDENTIFIER if in_parens && category.is_none() => {
                category = Some(ctx.text(&child));
            }
            _ => {}
        }
    }
    (class, category)
}

fn is_category(node: &Node<'_>) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "(")
}

fn superclass(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<String> {
    if let Some(name) = node.child_by_field_name("superclass") {
        return Some(ctx.text(&name));
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .skip_while(|c| c.kind() != ":")
        .find(|c| c.kind() == node_kinds::IDENTIFIER)
        .map(|name| ctx.text(&name))
}

fn protocols(ctx: &FileContext<'_>, node: &Node<'_>) -> Vec<String> {
    let mut cursor = node.walk();
    let lists: Vec<_> = node
        .children(&mut cursor)
        .filter(|c| PROTOCOL_LISTS.contains(&c.kind()))
        .collect();
    lists
        .iter()
        .flat_map(|list| named_descendants(list, &[node_kinds::IDENTIFIER, node_kinds::TYPE_IDENTIFIER]))
        .map(|name| ctx.text(&name))
        .collect()
}

fn extract_interfaces_or_implementations(ctx: &mut FileContext<'_>) -> Result<()> {
    if ctx.is_header() {
        extract_interfaces(ctx)
    } else {
        extract_implementations(ctx)
    }
}

fn extract_interfaces(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::CLASS_INTERFACE]) {
        if is_category(&node) {
            continue;
        }
        let (Some(name), _) = class_and_category(ctx, &node) else {
            continue;
        };
        let children = members(ctx, &node);
        let parent = superclass(ctx, &node);
        let conformed = protocols(ctx, &node);

        let symbol = ParsedSymbol::new(&name, SymbolKind::Interface, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        if let Some(parent) = parent {
            ctx.add_edge(DependencyKind::Extends, &name, parent);
        }
        for protocol in conformed {
            ctx.add_edge(DependencyKind::Conforms, &name, protocol);
        }
    }
    Ok(())
}

fn extract_implementations(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::CLASS_IMPLEMENTATION]) {
        let name = match class_and_category(ctx, &node) {
            (Some(class), Some(category)) => format!("{class}({category})"),
            (Some(class), None) => class,
            (None, _) => continue,
        };
        let children = members(ctx, &node);
        let symbol = ParsedSymbol::new(name, SymbolKind::Implementation, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_protocols(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::PROTOCOL_DECLARATION]) {
        let Some(name) = node
            .child_by_field_name("name")
            .or_else(|| child_of_kinds(&node, &[node_kinds::IDENTIFIER]))
            .map(|n| ctx.text(&n))
        else {
            continue;
        };
        let children = members(ctx, &node);
        let inherited = protocols(ctx, &node);

        let symbol = ParsedSymbol::new(&name, SymbolKind::Protocol, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        for parent in inherited {
            ctx.add_edge(DependencyKind::Extends, &name, parent);
        }
    }
    Ok(())
}

/// `@interface Class (Category)` becomes `Class(Category)` extending `Class`.
fn extract_categories(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::CLASS_INTERFACE]) {
        if !is_category(&node) {
            continue;
        }
        let (Some(class), Some(category)) = class_and_category(ctx, &node) else {
            continue;
        };
        let name = format!("{class}({category})");
        let children = members(ctx, &node);

        let symbol = ParsedSymbol::new(&name, SymbolKind::Category, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);
        ctx.add_edge(DependencyKind::Extends, name, class);
    }
    Ok(())
}

fn extract_calls(ctx: &mut FileContext<'_>) -> Result<()> {
    for message in named_descendants(&ctx.root, &[node_kinds::MESSAGE_EXPRESSION]) {
        let Some(selector) = message_selector(ctx, &message) else {
            continue;
        };
        if let Some(caller) = ctx.enclosing_declaration(&message, CALLERS) {
            ctx.add_edge(DependencyKind::Call, caller, selector);
        }
    }
    Ok(())
}

// ============================================================================
// Objective-C++
// ============================================================================

/// Extractor for `.mm` files.
///
/// Runs the C++ passes with the C++ grammar and the Objective-C passes with
/// the Objective-C grammar, then merges the two results.
pub struct ObjCppExtractor {
    provider: SyntaxTreeProvider,
}

impl ObjCppExtractor {
    /// Create an extractor with C++ and Objective-C parsers.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if either grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::Cpp, Language::ObjC])?,
        })
    }
}

impl Extractor for ObjCppExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::ObjCpp]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        let content = match read_source(file) {
            Ok(content) => content,
            Err(error) => return Extraction::Failed(error),
        };
        let cpp = extract_source(
            &mut self.provider,
            file,
            Language::ObjCpp,
            Grammar::Cpp,
            content.clone(),
            cpp::PASSES,
        );
        let objc = extract_source(&mut self.provider, file, Language::ObjCpp, Grammar::ObjC, content, PASSES);
        combine(cpp, objc)
    }
}

/// Pick or merge the two grammars' results.
///
/// A side that parsed cleanly wins outright; when both are clean their
/// results are merged. When both hit syntax errors the partial results are
/// still merged and the C++ error is reported.
fn combine(cpp: Extraction, objc: Extraction) -> Extraction {
    match (cpp, objc) {
        (Extraction::Complete(cpp), Extraction::Complete(objc)) => Extraction::Complete(merge(cpp, objc)),
        (Extraction::Complete(cpp), _) => Extraction::Complete(cpp),
        (_, Extraction::Complete(objc)) => Extraction::Complete(objc),
        (Extraction::Partial { file: cpp, error }, Extraction::Partial { file: objc, .. }) => Extraction::Partial {
            file: merge(cpp, objc),
            error,
        },
        (cpp @ (Extraction::Partial { .. } | Extraction::Failed(_)), _) => cpp,
    }
}

/// Objective-C declaration kinds that replace a C++ symbol with the same key.
fn objc_wins(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Class
            | SymbolKind::Interface
            | SymbolKind::Implementation
            | SymbolKind::Protocol
            | SymbolKind::Category
    )
}

/// Merge two results for the same file.
///
/// Symbols are unique by `(kind, name)` and dependencies by
/// `(kind, source, target)`, keeping C++ order first.
fn merge(cpp: ParsedFile, objc: ParsedFile) -> ParsedFile {
    let mut merged = ParsedFile::new(cpp.path, Language::ObjCpp, cpp.content);

    let mut index: HashMap<(SymbolKind, String), usize> = HashMap::new();
    for symbol in cpp.symbols.into_iter().chain(objc.symbols) {
        let key = (symbol.kind, symbol.name.clone());
        match index.get(&key) {
            Some(&at) => {
                if objc_wins(symbol.kind) {
                    merged.symbols[at] = symbol;
                }
            }
            None => {
                index.insert(key, merged.symbols.len());
                merged.symbols.push(symbol);
            }
        }
    }

    let mut seen = HashSet::new();
    for dependency in cpp.dependencies.into_iter().chain(objc.dependencies) {
        if seen.insert((dependency.kind, dependency.source.clone(), dependency.target.clone())) {
            merged.dependencies.push(dependency);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::languages::test_support::{extract_clean, extract_code};
    use crate::types::{ParsedDependency, Span};
    use std::path::PathBuf;

    const HEADER: &str = r#"#import <Foundation/Foundation.h>
#import "Helper.h"

/** A widget. */
@interface Widget : NSObject <NSCopying, Drawable>
@property (nonatomic, strong) NSString *title;
- (void)draw;
- (void)moveTo:(int)x y:(int)y;
@end

@interface Widget (Animation)
- (void)animate;
@end

@protocol Drawable <NSObject>
- (void)render;
@end
"#;

    const SOURCE: &str = r#"#import "Widget.h"

@implementation Widget

- (void)draw {
    [self moveTo:1 y:2];
    [self.layer setNeedsDisplay];
}

- (void)moveTo:(int)x y:(int)y {
}

@end
"#;

    fn objc(path: &str, code: &str) -> ParsedFile {
        let mut extractor = ObjCExtractor::new().unwrap();
        extract_clean(&mut extractor, path, "objc", code)
    }

    #[test]
    fn header_imports_are_classified() {
        let parsed = objc("Widget.h", HEADER);
        let imports: Vec<_> = parsed
            .dependencies_of(DependencyKind::Import)
            .map(|d| (d.target.as_str(), d.is_external))
            .collect();
        assert_eq!(imports, vec![("Foundation/Foundation.h", true), ("Helper.h", false)]);
    }

    #[test]
    fn header_interface_members_and_inheritance() {
        let parsed = objc("Widget.h", HEADER);
        let widget = parsed
            .symbols
            .iter()
            .find(|s| s.name == "Widget" && s.kind == SymbolKind::Interface)
            .unwrap();
        assert_eq!(widget.docstring, "A widget.");
        let members: Vec<_> = widget.children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            members,
            vec![
                ("title", SymbolKind::Property),
                ("draw", SymbolKind::Method),
                ("moveTo:y:", SymbolKind::Method),
            ]
        );
        assert!(parsed.has_edge(DependencyKind::Extends, "Widget", "NSObject"));
        assert!(parsed.has_edge(DependencyKind::Conforms, "Widget", "NSCopying"));
        assert!(parsed.has_edge(DependencyKind::Conforms, "Widget", "Drawable"));
    }

    #[test]
    fn categories_and_protocols() {
        let parsed = objc("Widget.h", HEADER);
        let category = parsed.find_symbol("Widget(Animation)").unwrap();
        assert_eq!(category.kind, SymbolKind::Category);
        assert!(category.child("animate").is_some());
        assert!(parsed.has_edge(DependencyKind::Extends, "Widget(Animation)", "Widget"));

        let drawable = parsed.find_symbol("Drawable").unwrap();
        assert_eq!(drawable.kind, SymbolKind::Protocol);
        assert!(drawable.child("render").is_some());
    }

    #[test]
    fn implementation_methods_and_message_sends() {
        let parsed = objc("Widget.m", SOURCE);
        assert!(parsed.symbols.iter().all(|s| s.kind != SymbolKind::Interface));
        let widget = parsed.find_symbol("Widget").unwrap();
        assert_eq!(widget.kind, SymbolKind::Implementation);
        let methods: Vec<_> = widget.children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            methods,
            vec![
                ("draw", SymbolKind::MethodImplementation),
                ("moveTo:y:", SymbolKind::MethodImplementation),
            ]
        );
        assert!(parsed.has_edge(DependencyKind::Call, "draw", "moveTo:y:"));
        assert!(parsed.has_edge(DependencyKind::Call, "draw", "setNeedsDisplay"));
    }

    fn symbol(name: &str, kind: SymbolKind, signature: &str) -> ParsedSymbol {
        ParsedSymbol::new(name, kind, signature, Span::default())
    }

    fn file(symbols: Vec<ParsedSymbol>, dependencies: Vec<ParsedDependency>) -> ParsedFile {
        let mut parsed = ParsedFile::new(PathBuf::from("Bridge.mm"), Language::Cpp, b"x".to_vec());
        parsed.symbols = symbols;
        parsed.dependencies = dependencies;
        parsed
    }

    #[test]
    fn merge_prefers_objc_declarations_and_dedupes_edges() {
        let cpp = file(
            vec![
                symbol("Bridge", SymbolKind::Interface, "cpp view"),
                symbol("helper", SymbolKind::Function, "int helper()"),
            ],
            vec![
                ParsedDependency::import("vector", false),
                ParsedDependency::edge(DependencyKind::Call, "helper", "run"),
            ],
        );
        let objc = file(
            vec![
                symbol("Bridge", SymbolKind::Interface, "@interface Bridge : NSObject"),
                symbol("helper", SymbolKind::Function, "objc view"),
                symbol("run", SymbolKind::Method, "- (void)run;"),
            ],
            vec![ParsedDependency::edge(DependencyKind::Call, "helper", "run")],
        );

        let merged = merge(cpp, objc);
        assert_eq!(merged.language, Language::ObjCpp);
        let symbols: Vec<_> = merged
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.signature.as_str()))
            .collect();
        assert_eq!(
            symbols,
            vec![
                ("Bridge", "@interface Bridge : NSObject"),
                ("helper", "int helper()"),
                ("run", "- (void)run;"),
            ]
        );
        assert_eq!(merged.dependencies.len(), 2);
    }

    #[test]
    fn combine_keeps_cpp_error_when_both_fail() {
        let cpp_error = ExtractionError::parse(PathBuf::from("Bridge.mm"), "syntax error in cpp file");
        let objc_error = ExtractionError::parse(PathBuf::from("Bridge.mm"), "syntax error in objc file");
        let combined = combine(
            Extraction::Partial { file: file(vec![symbol("A", SymbolKind::Class, "")], vec![]), error: cpp_error },
            Extraction::Partial { file: file(vec![symbol("B", SymbolKind::Interface, "")], vec![]), error: objc_error },
        );
        let (parsed, error) = combined.into_parts();
        assert_eq!(error.unwrap().message, "syntax error in cpp file");
        assert_eq!(parsed.unwrap().symbols.len(), 2);
    }

    #[test]
    fn objcpp_file_with_plain_objc_uses_objc_side() {
        let mut extractor = ObjCppExtractor::new().unwrap();
        let (parsed, error) = extract_code(
            &mut extractor,
            "Bridge.mm",
            "objcpp",
            "@implementation Bridge\n- (void)run {\n    [self stop];\n}\n@end\n",
        );
        assert!(error.is_none(), "unexpected error: {error:?}");
        assert_eq!(parsed.language, Language::ObjCpp);
        assert_eq!(parsed.find_symbol("Bridge").map(|s| s.kind), Some(SymbolKind::Implementation));
        assert!(parsed.has_edge(DependencyKind::Call, "run", "stop"));
    }

    #[test]
    fn objcpp_file_with_plain_cpp_uses_cpp_side() {
        let mut extractor = ObjCppExtractor::new().unwrap();
        let (parsed, error) = extract_code(
            &mut extractor,
            "Engine.mm",
            "objcpp",
            "namespace engine {\nclass Buffer {\npublic:\n    int size() const { return 0; }\n};\n}\n",
        );
        assert!(error.is_none(), "unexpected error: {error:?}");
        assert_eq!(parsed.language, Language::ObjCpp);
        assert!(parsed.find_symbol("Buffer").is_some());
    }
}

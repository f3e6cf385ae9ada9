//! Swift extraction.
//!
//! The grammar uses one `class_declaration` node for classes, structs, enums,
//! actors and extensions; the declaration keyword tells them apart.

use tree_sitter::Node;

use super::imports::swift_is_external;
use super::tree_sitter_utils::{
    child_of_kind, child_of_kinds, collapse_whitespace, descendant_of_kind, has_ancestor_kind,
    head_signature, named_descendants, strip_generics, trailing_name,
};
use super::{Extraction, Extractor, FileContext, Pass, run_passes};
use crate::error::Result;
use crate::syntax::SyntaxTreeProvider;
use crate::types::{DependencyKind, Language, ParsedSymbol, ScannedFile, SymbolKind};

mod node_kinds {
    pub const IMPORT_DECLARATION: &str = "import_declaration";
    pub const CLASS_DECLARATION: &str = "class_declaration";
    pub const PROTOCOL_DECLARATION: &str = "protocol_declaration";
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const PROTOCOL_FUNCTION_DECLARATION: &str = "protocol_function_declaration";
    pub const INIT_DECLARATION: &str = "init_declaration";
    pub const PROPERTY_DECLARATION: &str = "property_declaration";
    pub const PROTOCOL_PROPERTY_DECLARATION: &str = "protocol_property_declaration";
    pub const CLASS_BODY: &str = "class_body";
    pub const ENUM_CLASS_BODY: &str = "enum_class_body";
    pub const PROTOCOL_BODY: &str = "protocol_body";
    pub const ENUM_ENTRY: &str = "enum_entry";
    pub const INHERITANCE_SPECIFIER: &str = "inheritance_specifier";
    pub const PATTERN: &str = "pattern";
    pub const SIMPLE_IDENTIFIER: &str = "simple_identifier";
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const NAVIGATION_EXPRESSION: &str = "navigation_expression";
    pub const NAVIGATION_SUFFIX: &str = "navigation_suffix";
}

const COMMENTS: &[&str] = &["comment", "multiline_comment"];
const CALLERS: &[&str] = &[node_kinds::FUNCTION_DECLARATION, node_kinds::INIT_DECLARATION];
const TYPES: &[&str] = &[node_kinds::CLASS_DECLARATION, node_kinds::PROTOCOL_DECLARATION];

/// Declaration keywords of `class_declaration`.
const DECLARATION_KEYWORDS: &[&str] = &["class", "struct", "enum", "extension", "actor"];

/// Extractor for `.swift` files.
pub struct SwiftExtractor {
    provider: SyntaxTreeProvider,
}

impl SwiftExtractor {
    /// Create an extractor with its own parser.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if the Swift grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::Swift])?,
        })
    }
}

impl Extractor for SwiftExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::Swift]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        run_passes(
            &mut self.provider,
            file,
            Language::Swift,
            &[
                Pass::new("imports", &extract_imports),
                Pass::new("classes", &extract_classes),
                Pass::new("structs", &extract_structs),
                Pass::new("enums", &extract_enums),
                Pass::new("protocols", &extract_protocols),
                Pass::new("extensions", &extract_extensions),
                Pass::new("functions", &extract_functions),
                Pass::new("properties", &extract_properties),
                Pass::new("calls", &extract_calls),
            ],
        )
    }
}

/// Module named by an import, skipping `@testable` and kind keywords.
///
/// `import struct Foundation.Date` names `Foundation.Date`.
fn import_module(text: &str) -> Option<String> {
    const KINDS: &[&str] = &["typealias", "struct", "class", "enum", "protocol", "let", "var", "func"];
    let mut words = text.split_whitespace().skip_while(|w| *w != "import").skip(1);
    let mut module = words.next()?;
    if KINDS.contains(&module) {
        module = words.next()?;
    }
    Some(module.trim_end_matches(';').to_string())
}

fn extract_imports(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::IMPORT_DECLARATION]) {
        if let Some(module) = import_module(&ctx.text(&node)) {
            let external = swift_is_external(&module);
            ctx.add_import(module, external);
        }
    }
    Ok(())
}

/// `class`, `struct`, `enum`, `extension` or `actor`.
fn declaration_keyword(node: &Node<'_>) -> Option<&'static str> {
    if let Some(kind) = node.child_by_field_name("declaration_kind") {
        return DECLARATION_KEYWORDS.iter().copied().find(|k| *k == kind.kind());
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .filter(|c| !c.is_named())
        .find_map(|c| DECLARATION_KEYWORDS.iter().copied().find(|k| *k == c.kind()));
    found
}

fn type_name(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<String> {
    let name = node
        .child_by_field_name("name")
        .or_else(|| child_of_kind(node, node_kinds::TYPE_IDENTIFIER))?;
    let name = strip_generics(&ctx.text(&name)).to_string();
    (!name.is_empty()).then_some(name)
}

/// Types listed after `:`, in order.
fn inherited_types(ctx: &FileContext<'_>, node: &Node<'_>) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == node_kinds::INHERITANCE_SPECIFIER)
        .map(|c| strip_generics(&ctx.text(&c)).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn member_name(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<String> {
    node.child_by_field_name("name")
        .or_else(|| child_of_kind(node, node_kinds::SIMPLE_IDENTIFIER))
        .map(|n| ctx.text(&n))
        .filter(|name| !name.is_empty())
}

fn property_name(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<String> {
    let pattern = node
        .child_by_field_name("name")
        .or_else(|| child_of_kind(node, node_kinds::PATTERN))?;
    descendant_of_kind(&pattern, node_kinds::SIMPLE_IDENTIFIER).map(|n| ctx.text(&n))
}

fn property_kind(ctx: &FileContext<'_>, node: &Node<'_>) -> SymbolKind {
    let text = ctx.text(node);
    if text.contains("willSet") || text.contains("didSet") {
        SymbolKind::PropertyObserver
    } else {
        SymbolKind::Property
    }
}

fn property_symbol(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<ParsedSymbol> {
    let name = property_name(ctx, node)?;
    Some(
        ParsedSymbol::new(name, property_kind(ctx, node), head_signature(&ctx.text(node), false), ctx.span(node))
            .with_docstring(ctx.doc(node, COMMENTS)),
    )
}

fn method_symbol(ctx: &mut FileContext<'_>, node: &Node<'_>, kind: SymbolKind) -> Option<ParsedSymbol> {
    let name = if kind == SymbolKind::Constructor {
        "init".to_string()
    } else {
        member_name(ctx, node)?
    };
    ctx.declare(node, name.clone());
    Some(
        ParsedSymbol::new(name, kind, head_signature(&ctx.text(node), false), ctx.span(node))
            .with_docstring(ctx.doc(node, COMMENTS)),
    )
}

/// One case symbol per name in `case a, b(Int)`.
fn enum_cases(ctx: &FileContext<'_>, entry: &Node<'_>) -> Vec<ParsedSymbol> {
    let signature = collapse_whitespace(&ctx.text(entry));
    let mut cursor = entry.walk();
    entry
        .children(&mut cursor)
        .filter(|c| c.kind() == node_kinds::SIMPLE_IDENTIFIER)
        .map(|name| {
            ParsedSymbol::new(ctx.text(&name), SymbolKind::EnumCase, signature.clone(), ctx.span(entry))
                .with_docstring(ctx.doc(entry, COMMENTS))
        })
        .collect()
}

/// Members of a type body: enum cases, then properties, then methods.
fn body_members(ctx: &mut FileContext<'_>, node: &Node<'_>) -> Vec<ParsedSymbol> {
    let Some(body) = node.child_by_field_name("body").or_else(|| {
        child_of_kinds(
            node,
            &[node_kinds::CLASS_BODY, node_kinds::ENUM_CLASS_BODY, node_kinds::PROTOCOL_BODY],
        )
    }) else {
        return Vec::new();
    };

    let mut cases = Vec::new();
    let mut properties = Vec::new();
    let mut methods = Vec::new();
    let mut cursor = body.walk();
    let members: Vec<_> = body.named_children(&mut cursor).collect();
    for member in members {
        match member.kind() {
            node_kinds::ENUM_ENTRY => cases.extend(enum_cases(ctx, &member)),
            node_kinds::PROPERTY_DECLARATION | node_kinds::PROTOCOL_PROPERTY_DECLARATION => {
                properties.extend(property_symbol(ctx, &member));
            }
            node_kinds::FUNCTION_DECLARATION | node_kinds::PROTOCOL_FUNCTION_DECLARATION => {
                methods.extend(method_symbol(ctx, &member, SymbolKind::Method));
            }
            node_kinds::INIT_DECLARATION => {
                methods.extend(method_symbol(ctx, &member, SymbolKind::Constructor));
            }
            _ => {}
        }
    }
    cases.extend(properties);
    cases.extend(methods);
    cases
}

/// Record every `class_declaration` spelled with `keyword`.
///
/// Classes get an extends edge to their first inherited type; every inherited
/// type becomes a conforms edge, since the grammar cannot tell a superclass
/// from a protocol.
fn extract_type_declarations(ctx: &mut FileContext<'_>, keyword: &str, kind: SymbolKind) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::CLASS_DECLARATION]) {
        let declared = declaration_keyword(&node);
        let matches = declared == Some(keyword) || (keyword == "class" && declared == Some("actor"));
        if !matches {
            continue;
        }
        let Some(name) = type_name(ctx, &node) else {
            continue;
        };
        let children = body_members(ctx, &node);
        let inherited = inherited_types(ctx, &node);

        let symbol = ParsedSymbol::new(&name, kind, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        if kind == SymbolKind::Class
            && let Some(superclass) = inherited.first()
        {
            ctx.add_edge(DependencyKind::Extends, &name, superclass);
        }
        for parent in inherited {
            ctx.add_edge(DependencyKind::Conforms, &name, parent);
        }
    }
    Ok(())
}

fn extract_classes(ctx: &mut FileContext<'_>) -> Result<()> {
    extract_type_declarations(ctx, "class", SymbolKind::Class)
}

fn extract_structs(ctx: &mut FileContext<'_>) -> Result<()> {
    extract_type_declarations(ctx, "struct", SymbolKind::Struct)
}

fn extract_enums(ctx: &mut FileContext<'_>) -> Result<()> {
    extract_type_declarations(ctx, "enum", SymbolKind::Enum)
}

fn extract_protocols(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::PROTOCOL_DECLARATION]) {
        let Some(name) = type_name(ctx, &node) else {
            continue;
        };
        let children = body_members(ctx, &node);
        let inherited = inherited_types(ctx, &node);

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

/// Extensions are named `extension_<Type>` and extend the type they open.
fn extract_extensions(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::CLASS_DECLARATION]) {
        if declaration_keyword(&node) != Some("extension") {
            continue;
        }
        let Some(extended) = type_name(ctx, &node) else {
            continue;
        };
        let name = format!("extension_{extended}");
        let children = body_members(ctx, &node);
        let protocols = inherited_types(ctx, &node);

        let symbol = ParsedSymbol::new(&name, SymbolKind::Extension, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        ctx.add_edge(DependencyKind::Extends, &name, extended);
        for protocol in protocols {
            ctx.add_edge(DependencyKind::Conforms, &name, protocol);
        }
    }
    Ok(())
}

fn extract_functions(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::FUNCTION_DECLARATION]) {
        if has_ancestor_kind(&node, TYPES) {
            continue;
        }
        let Some(name) = member_name(ctx, &node) else {
            continue;
        };
        let symbol = ParsedSymbol::new(name, SymbolKind::Function, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS));
        ctx.add_symbol(&node, symbol);
    }
    Ok(())
}

fn extract_properties(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::PROPERTY_DECLARATION]) {
        if has_ancestor_kind(&node, &[node_kinds::CLASS_DECLARATION, node_kinds::PROTOCOL_DECLARATION, node_kinds::FUNCTION_DECLARATION]) {
            continue;
        }
        if let Some(symbol) = property_symbol(ctx, &node) {
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
            .and_then(|callee| trailing_name(&callee, PATHS, &[node_kinds::SIMPLE_IDENTIFIER]))
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

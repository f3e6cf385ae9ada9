//! C and C++ extraction.
//!
//! One set of passes serves both languages and the C++ half of
//! Objective-C++. Declarations are found by walking the tree rather than by
//! structural queries, so a pass never depends on node kinds that only one
//! of the two grammars defines.
//!
//! Calls are only collected from implementation files; headers contribute
//! declarations, which the resolver later links to their definitions.

use std::collections::HashSet;

use tree_sitter::Node;

use super::imports::c_family_is_external;
use super::tree_sitter_utils::{
    first_line, has_ancestor_kind, head_signature, named_descendants, strip_generics,
};
use super::{Extraction, Extractor, FileContext, Pass, resolve_language, run_passes};
use crate::error::Result;
use crate::syntax::SyntaxTreeProvider;
use crate::types::{DependencyKind, Language, ParsedSymbol, ScannedFile, SymbolKind};

mod node_kinds {
    pub const PREPROC_INCLUDE: &str = "preproc_include";
    pub const SYSTEM_LIB_STRING: &str = "system_lib_string";
    pub const NAMESPACE_DEFINITION: &str = "namespace_definition";
    pub const CLASS_SPECIFIER: &str = "class_specifier";
    pub const STRUCT_SPECIFIER: &str = "struct_specifier";
    pub const UNION_SPECIFIER: &str = "union_specifier";
    pub const ENUM_SPECIFIER: &str = "enum_specifier";
    pub const ENUMERATOR: &str = "enumerator";
    pub const FIELD_DECLARATION_LIST: &str = "field_declaration_list";
    pub const FIELD_DECLARATION: &str = "field_declaration";
    pub const BASE_CLASS_CLAUSE: &str = "base_class_clause";
    pub const TEMPLATE_DECLARATION: &str = "template_declaration";
    pub const TEMPLATE_TYPE: &str = "template_type";
    pub const FUNCTION_DEFINITION: &str = "function_definition";
    pub const FUNCTION_DECLARATOR: &str = "function_declarator";
    pub const DECLARATION: &str = "declaration";
    pub const OPERATOR_NAME: &str = "operator_name";
    pub const QUALIFIED_IDENTIFIER: &str = "qualified_identifier";
    pub const TEMPLATE_FUNCTION: &str = "template_function";
    pub const FIELD_EXPRESSION: &str = "field_expression";
    pub const VIRTUAL_SPECIFIER: &str = "virtual_specifier";
    pub const TYPE_DEFINITION: &str = "type_definition";
    pub const ALIAS_DECLARATION: &str = "alias_declaration";
    pub const PREPROC_DEF: &str = "preproc_def";
    pub const PREPROC_FUNCTION_DEF: &str = "preproc_function_def";
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
    pub const QUALIFIED_TYPE_IDENTIFIER: &str = "qualified_type_identifier";
    pub const COMMENT: &str = "comment";
}

const COMMENTS: &[&str] = &[node_kinds::COMMENT];
const CALLERS: &[&str] = &[node_kinds::FUNCTION_DEFINITION];
const CLASS_KINDS: &[&str] = &[node_kinds::CLASS_SPECIFIER, node_kinds::STRUCT_SPECIFIER];

/// Declarations whose body can mention a template type.
const TEMPLATE_USERS: &[&str] = &[
    node_kinds::FUNCTION_DEFINITION,
    node_kinds::CLASS_SPECIFIER,
    node_kinds::STRUCT_SPECIFIER,
];

/// Leaf kinds a declarator chain can end in.
const DECLARATOR_NAMES: &[&str] = &[
    "identifier",
    "field_identifier",
    "type_identifier",
    "destructor_name",
    "operator_name",
    "namespace_identifier",
];

/// Node kinds that carry declaration keywords (`static`, `inline`, `virtual`).
const MODIFIER_KINDS: &[&str] = &[
    "storage_class_specifier",
    "type_qualifier",
    "virtual",
    "virtual_function_specifier",
];

/// C/C++ passes, shared with the Objective-C++ extractor.
pub(crate) const PASSES: &[Pass<'static>] = &[
    Pass::new("includes", &extract_includes),
    Pass::new("namespaces", &extract_namespaces),
    Pass::new("classes", &extract_classes),
    Pass::new("unions", &extract_unions),
    Pass::new("enums", &extract_enums),
    Pass::new("templates", &extract_templates),
    Pass::new("functions", &extract_functions),
    Pass::new("operators", &extract_operators),
    Pass::new("typedefs", &extract_typedefs),
    Pass::new("macros", &extract_macros),
    Pass::new("calls", &extract_calls),
    Pass::new("inheritance", &extract_inheritance),
    Pass::new("overrides", &extract_overrides),
    Pass::new("template_uses", &extract_template_uses),
];

/// Extractor for C and C++ sources and headers.
pub struct CppExtractor {
    provider: SyntaxTreeProvider,
}

impl CppExtractor {
    /// Create an extractor with C and C++ parsers.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if either grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::C, Language::Cpp])?,
        })
    }
}

impl Extractor for CppExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::C, Language::Cpp]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        let language = resolve_language(file, self.languages(), Language::Cpp);
        run_passes(&mut self.provider, file, language, PASSES)
    }
}

// ============================================================================
// Declarator helpers
// ============================================================================

/// Name at the end of a declarator chain.
///
/// Pointer, reference, array and function declarators are unwrapped; a
/// qualified name yields its last segment, so `Widget::draw` gives `draw`.
fn declarator_name<'t>(declarator: &Node<'t>) -> Option<Node<'t>> {
    let mut current = *declarator;
    loop {
        if DECLARATOR_NAMES.contains(&current.kind()) {
            return Some(current);
        }
        current = match current.kind() {
            node_kinds::QUALIFIED_IDENTIFIER | node_kinds::TEMPLATE_FUNCTION => {
                current.child_by_field_name("name")?
            }
            _ => current
                .child_by_field_name("declarator")
                .or_else(|| last_named_child(&current))?,
        };
    }
}

fn last_named_child<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let last = node.named_child_count().checked_sub(1)?;
    node.named_child(u32::try_from(last).ok()?)
}

/// The `function_declarator` of a definition or declaration, looking through
/// pointer and reference declarators.
fn function_declarator<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        if current.kind() == node_kinds::FUNCTION_DECLARATOR {
            return Some(current);
        }
        if DECLARATOR_NAMES.contains(&current.kind())
            || current.kind() == node_kinds::QUALIFIED_IDENTIFIER
        {
            return None;
        }
        current = current
            .child_by_field_name("declarator")
            .or_else(|| last_named_child(&current))?;
    }
}

/// Function name and whether it names an operator overload.
fn function_name(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<(String, bool)> {
    let declarator = function_declarator(node)?;
    let name = declarator_name(&declarator.child_by_field_name("declarator")?)?;
    Some((ctx.text(&name), name.kind() == node_kinds::OPERATOR_NAME))
}

fn has_modifier(ctx: &FileContext<'_>, node: &Node<'_>, keyword: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| (!c.is_named() || MODIFIER_KINDS.contains(&c.kind())) && ctx.text(&c) == keyword)
}

/// `override` among the member's specifiers.
fn is_override(ctx: &FileContext<'_>, node: &Node<'_>) -> bool {
    let head = match node.child_by_field_name("body") {
        Some(body) => node.start_byte()..body.start_byte(),
        None => node.byte_range(),
    };
    named_descendants(node, &[node_kinds::VIRTUAL_SPECIFIER])
        .iter()
        .any(|spec| head.contains(&spec.start_byte()) && ctx.text(spec).contains("override"))
}

/// Comments attach to the `template <...>` line when there is one.
fn doc(ctx: &FileContext<'_>, node: &Node<'_>) -> String {
    let anchor = node
        .parent()
        .filter(|p| p.kind() == node_kinds::TEMPLATE_DECLARATION)
        .unwrap_or(*node);
    ctx.doc(&anchor, COMMENTS)
}

fn type_name(ctx: &FileContext<'_>, node: &Node<'_>) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    let name = ctx.text(&name);
    (!name.is_empty()).then_some(name)
}

fn in_class_body(node: &Node<'_>) -> bool {
    node.parent()
        .is_some_and(|p| p.kind() == node_kinds::FIELD_DECLARATION_LIST)
}

fn in_template(node: &Node<'_>) -> bool {
    node.parent()
        .is_some_and(|p| p.kind() == node_kinds::TEMPLATE_DECLARATION)
}

// ============================================================================
// Passes
// ============================================================================

fn extract_includes(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::PREPROC_INCLUDE]) {
        let Some(path) = node.child_by_field_name("path") else {
            continue;
        };
        let is_system = path.kind() == node_kinds::SYSTEM_LIB_STRING;
        let text = ctx.text(&path);
        let include = text.trim_matches(|c| matches!(c, '<' | '>' | '"'));
        if !include.is_empty() {
            ctx.add_import(include, c_family_is_external(include, is_system));
        }
    }
    Ok(())
}

fn extract_namespaces(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::NAMESPACE_DEFINITION]) {
        let Some(name) = type_name(ctx, &node) else {
            continue;
        };
        let symbol = ParsedSymbol::new(&name, SymbolKind::Namespace, format!("namespace {name}"), ctx.span(&node))
            .with_docstring(doc(ctx, &node));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

/// Members of a class, struct or union body in source order.
///
/// In-class definitions and declarations both count as methods; a
/// declaration named after the class is its constructor.
fn class_members(ctx: &mut FileContext<'_>, class_name: &str, body: &Node<'_>) -> Vec<ParsedSymbol> {
    let mut members = Vec::new();
    let mut cursor = body.walk();
    let items: Vec<_> = body.named_children(&mut cursor).collect();

    for item in items {
        match item.kind() {
            node_kinds::FUNCTION_DEFINITION => {
                let Some((name, _)) = function_name(ctx, &item) else {
                    continue;
                };
                let kind = method_kind(ctx, &item, class_name, &name);
                ctx.declare(&item, name.clone());
                members.push(
                    ParsedSymbol::new(name, kind, head_signature(&ctx.text(&item), false), ctx.span(&item))
                        .with_docstring(doc(ctx, &item)),
                );
            }
            node_kinds::FIELD_DECLARATION | node_kinds::DECLARATION => {
                if let Some((name, _)) = function_name(ctx, &item) {
                    let kind = method_kind(ctx, &item, class_name, &name);
                    members.push(
                        ParsedSymbol::new(name, kind, head_signature(&ctx.text(&item), true), ctx.span(&item))
                            .with_docstring(doc(ctx, &item)),
                    );
                    continue;
                }
                let signature = head_signature(&ctx.text(&item), true);
                let mut declarators = item.walk();
                let names: Vec<_> = item
                    .children_by_field_name("declarator", &mut declarators)
                    .filter_map(|d| declarator_name(&d))
                    .map(|n| ctx.text(&n))
                    .collect();
                for name in names {
                    members.push(
                        ParsedSymbol::new(name, SymbolKind::Field, &signature, ctx.span(&item))
                            .with_docstring(doc(ctx, &item)),
                    );
                }
            }
            _ => {}
        }
    }
    members
}

fn method_kind(ctx: &FileContext<'_>, node: &Node<'_>, class_name: &str, name: &str) -> SymbolKind {
    if name == class_name {
        SymbolKind::Constructor
    } else if has_modifier(ctx, node, "virtual") {
        SymbolKind::VirtualMethod
    } else {
        SymbolKind::Method
    }
}

/// Classes and structs with a body; forward declarations are skipped.
fn extract_classes(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, CLASS_KINDS) {
        let (Some(name), Some(body)) = (type_name(ctx, &node), node.child_by_field_name("body")) else {
            continue;
        };
        let (kind, keyword) = if node.kind() == node_kinds::CLASS_SPECIFIER {
            (SymbolKind::Class, "class")
        } else {
            (SymbolKind::Struct, "struct")
        };
        let children = class_members(ctx, &name, &body);
        let symbol = ParsedSymbol::new(&name, kind, format!("{keyword} {name}"), ctx.span(&node))
            .with_docstring(doc(ctx, &node))
            .with_children(children);
        ctx.add_symbol(&node, symbol);
    }
    Ok(())
}

fn extract_unions(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::UNION_SPECIFIER]) {
        let (Some(name), Some(body)) = (type_name(ctx, &node), node.child_by_field_name("body")) else {
            continue;
        };
        let children = class_members(ctx, &name, &body);
        let symbol = ParsedSymbol::new(&name, SymbolKind::Union, format!("union {name}"), ctx.span(&node))
            .with_docstring(doc(ctx, &node))
            .with_children(children);
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_enums(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::ENUM_SPECIFIER]) {
        let (Some(name), Some(body)) = (type_name(ctx, &node), node.child_by_field_name("body")) else {
            continue;
        };
        let constants = named_descendants(&body, &[node_kinds::ENUMERATOR])
            .iter()
            .filter_map(|enumerator| {
                let constant = type_name(ctx, enumerator)?;
                Some(ParsedSymbol::new(
                    constant,
                    SymbolKind::EnumConstant,
                    ctx.text(enumerator),
                    ctx.span(enumerator),
                ))
            })
            .collect();
        let symbol = ParsedSymbol::new(&name, SymbolKind::Enum, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(doc(ctx, &node))
            .with_children(constants);
        ctx.symbols.push(symbol);
    }
    Ok(())
}

/// Class and function templates.
///
/// A templated class is also reported by the classes pass with its members;
/// the template symbol records the `template <...>` head.
fn extract_templates(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::TEMPLATE_DECLARATION]) {
        let mut cursor = node.walk();
        let Some(inner) = node.named_children(&mut cursor).find(|c| {
            CLASS_KINDS.contains(&c.kind())
                || matches!(
                    c.kind(),
                    node_kinds::FUNCTION_DEFINITION | node_kinds::DECLARATION | node_kinds::ALIAS_DECLARATION
                )
        }) else {
            continue;
        };

        let (name, kind) = match inner.kind() {
            node_kinds::CLASS_SPECIFIER | node_kinds::STRUCT_SPECIFIER => {
                (type_name(ctx, &inner), SymbolKind::ClassTemplate)
            }
            node_kinds::FUNCTION_DEFINITION => {
                (function_name(ctx, &inner).map(|(name, _)| name), SymbolKind::FunctionTemplate)
            }
            node_kinds::ALIAS_DECLARATION => (type_name(ctx, &inner), SymbolKind::Template),
            _ => (function_name(ctx, &inner).map(|(name, _)| name), SymbolKind::Template),
        };
        let Some(name) = name else {
            continue;
        };
        if inner.kind() == node_kinds::FUNCTION_DEFINITION {
            ctx.declare(&inner, name.clone());
        }
        let symbol = ParsedSymbol::new(name, kind, head_signature(&ctx.text(&node), true), ctx.span(&node))
            .with_docstring(ctx.doc(&node, COMMENTS));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

/// Free functions, out-of-class method definitions and prototypes.
///
/// Definitions are `static_function`, `inline_function` or `function`; a
/// prototype is a `function_declaration` whose signature keeps its `;`.
fn extract_functions(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::FUNCTION_DEFINITION]) {
        if in_class_body(&node) || in_template(&node) {
            continue;
        }
        let Some((name, false)) = function_name(ctx, &node) else {
            continue;
        };
        let kind = if has_modifier(ctx, &node, "inline") {
            SymbolKind::InlineFunction
        } else if has_modifier(ctx, &node, "static") {
            SymbolKind::StaticFunction
        } else {
            SymbolKind::Function
        };
        let symbol = ParsedSymbol::new(name, kind, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(doc(ctx, &node));
        ctx.add_symbol(&node, symbol);
    }

    for node in named_descendants(&ctx.root, &[node_kinds::DECLARATION]) {
        if in_class_body(&node) || in_template(&node) || has_ancestor_kind(&node, CALLERS) {
            continue;
        }
        let Some((name, _)) = function_name(ctx, &node) else {
            continue;
        };
        let symbol = ParsedSymbol::new(
            name,
            SymbolKind::FunctionDeclaration,
            head_signature(&ctx.text(&node), true),
            ctx.span(&node),
        )
        .with_docstring(doc(ctx, &node));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

/// Operator overloads defined outside a class body.
fn extract_operators(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::FUNCTION_DEFINITION]) {
        if in_class_body(&node) {
            continue;
        }
        let Some((name, true)) = function_name(ctx, &node) else {
            continue;
        };
        let symbol = ParsedSymbol::new(name, SymbolKind::Operator, head_signature(&ctx.text(&node), false), ctx.span(&node))
            .with_docstring(doc(ctx, &node));
        ctx.add_symbol(&node, symbol);
    }
    Ok(())
}

/// `typedef` declarations and C++ `using` aliases.
fn extract_typedefs(ctx: &mut FileContext<'_>) -> Result<()> {
    for node in named_descendants(&ctx.root, &[node_kinds::TYPE_DEFINITION]) {
        let mut cursor = node.walk();
        let names: Vec<_> = node
            .children_by_field_name("declarator", &mut cursor)
            .filter_map(|d| declarator_name(&d))
            .map(|n| ctx.text(&n))
            .collect();
        for name in names {
            let symbol = ParsedSymbol::new(name, SymbolKind::Typedef, head_signature(&ctx.text(&node), true), ctx.span(&node))
                .with_docstring(doc(ctx, &node));
            ctx.symbols.push(symbol);
        }
    }

    for node in named_descendants(&ctx.root, &[node_kinds::ALIAS_DECLARATION]) {
        if in_template(&node) {
            continue;
        }
        let Some(name) = type_name(ctx, &node) else {
            continue;
        };
        let symbol = ParsedSymbol::new(name, SymbolKind::TypeAlias, head_signature(&ctx.text(&node), true), ctx.span(&node))
            .with_docstring(doc(ctx, &node));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_macros(ctx: &mut FileContext<'_>) -> Result<()> {
    let macros = named_descendants(
        &ctx.root,
        &[node_kinds::PREPROC_DEF, node_kinds::PREPROC_FUNCTION_DEF],
    );
    for node in macros {
        let Some(name) = type_name(ctx, &node) else {
            continue;
        };
        let kind = if node.kind() == node_kinds::PREPROC_FUNCTION_DEF {
            SymbolKind::FunctionMacro
        } else {
            SymbolKind::Macro
        };
        let symbol = ParsedSymbol::new(name, kind, first_line(&ctx.text(&node)), ctx.span(&node))
            .with_docstring(doc(ctx, &node));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

/// Callee as written: plain and qualified names keep their text, member
/// calls keep only the member name.
fn callee(ctx: &FileContext<'_>, function: &Node<'_>) -> Option<String> {
    let name = match function.kind() {
        "identifier" | node_kinds::QUALIFIED_IDENTIFIER => ctx.text(function),
        node_kinds::FIELD_EXPRESSION => ctx.text(&function.child_by_field_name("field")?),
        node_kinds::TEMPLATE_FUNCTION => ctx.text(&function.child_by_field_name("name")?),
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

fn extract_calls(ctx: &mut FileContext<'_>) -> Result<()> {
    if ctx.is_header() {
        return Ok(());
    }
    for call in named_descendants(&ctx.root, &[node_kinds::CALL_EXPRESSION]) {
        let Some(target) = call.child_by_field_name("function").and_then(|f| callee(ctx, &f)) else {
            continue;
        };
        if let Some(caller) = ctx.enclosing_declaration(&call, CALLERS) {
            ctx.add_edge(DependencyKind::Call, caller, target);
        }
    }
    Ok(())
}

fn extract_inheritance(ctx: &mut FileContext<'_>) -> Result<()> {
    const BASE_KINDS: &[&str] = &[
        node_kinds::TYPE_IDENTIFIER,
        node_kinds::QUALIFIED_TYPE_IDENTIFIER,
        node_kinds::TEMPLATE_TYPE,
    ];
    for node in named_descendants(&ctx.root, CLASS_KINDS) {
        let Some(name) = type_name(ctx, &node) else {
            continue;
        };
        let mut cursor = node.walk();
        let Some(clause) = node
            .children(&mut cursor)
            .find(|c| c.kind() == node_kinds::BASE_CLASS_CLAUSE)
        else {
            continue;
        };
        let mut bases = clause.walk();
        let parents: Vec<_> = clause
            .named_children(&mut bases)
            .filter(|c| BASE_KINDS.contains(&c.kind()))
            .map(|base| strip_generics(&ctx.text(&base)).to_string())
            .collect();
        for parent in parents {
            ctx.add_edge(DependencyKind::Extends, &name, parent);
        }
    }
    Ok(())
}

/// `Class::method -> method` for every member marked `override`.
fn extract_overrides(ctx: &mut FileContext<'_>) -> Result<()> {
    for class in named_descendants(&ctx.root, CLASS_KINDS) {
        let (Some(class_name), Some(body)) = (type_name(ctx, &class), class.child_by_field_name("body")) else {
            continue;
        };
        let mut cursor = body.walk();
        let members: Vec<_> = body.named_children(&mut cursor).collect();
        for member in members {
            if !is_override(ctx, &member) {
                continue;
            }
            if let Some((method, _)) = function_name(ctx, &member) {
                ctx.add_edge(DependencyKind::Overrides, format!("{class_name}::{method}"), method);
            }
        }
    }
    Ok(())
}

/// `uses` edges from a function or class to each template it instantiates.
fn extract_template_uses(ctx: &mut FileContext<'_>) -> Result<()> {
    let mut seen = HashSet::new();
    for node in named_descendants(&ctx.root, &[node_kinds::TEMPLATE_TYPE]) {
        let Some(template) = type_name(ctx, &node) else {
            continue;
        };
        let Some(user) = ctx.enclosing_declaration(&node, TEMPLATE_USERS) else {
            continue;
        };
        if seen.insert((user.clone(), template.clone())) {
            ctx.add_edge(DependencyKind::Uses, user, template);
        }
    }
    Ok(())
}

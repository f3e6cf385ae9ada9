//! Python extraction.
//!
//! Module docstrings, imports, functions, classes with their methods, base
//! classes and calls. Docstrings come from the first string statement of a
//! body rather than from comments.

use tree_sitter::Node;

use super::imports::python_is_external;
use super::tree_sitter_utils::{child_of_kind, colon_head_signature, has_ancestor_kind, has_child_kind};
use super::{Extraction, Extractor, FileContext, Pass, run_passes};
use crate::error::Result;
use crate::syntax::SyntaxTreeProvider;
use crate::types::{DependencyKind, Language, ParsedSymbol, ScannedFile, SymbolKind};

mod node_kinds {
    pub const FUNCTION_DEFINITION: &str = "function_definition";
    pub const CLASS_DEFINITION: &str = "class_definition";
    pub const DECORATED_DEFINITION: &str = "decorated_definition";
    pub const DECORATOR: &str = "decorator";
    pub const BLOCK: &str = "block";
    pub const EXPRESSION_STATEMENT: &str = "expression_statement";
    pub const STRING: &str = "string";
    pub const COMMENT: &str = "comment";
    pub const ARGUMENT_LIST: &str = "argument_list";
    pub const IDENTIFIER: &str = "identifier";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ASYNC: &str = "async";
}

const MODULE_SYMBOL: &str = "__module__";

/// Extractor for `.py` files.
pub struct PythonExtractor {
    provider: SyntaxTreeProvider,
}

impl PythonExtractor {
    /// Create an extractor with its own parser.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if the Python grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::Python])?,
        })
    }
}

impl Extractor for PythonExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::Python]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        run_passes(
            &mut self.provider,
            file,
            Language::Python,
            &[
                Pass::new("module_docstring", &extract_module_docstring),
                Pass::new("imports", &extract_imports),
                Pass::new("functions", &extract_functions),
                Pass::new("classes", &extract_classes),
                Pass::new("calls", &extract_calls),
            ],
        )
    }
}

/// Strip triple or single quotes and surrounding whitespace.
fn clean_docstring(raw: &str) -> String {
    let mut text = raw.trim();
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            text = inner;
            break;
        }
    }
    text.trim().to_string()
}

/// First string statement among `container`'s leading children.
fn leading_string<'t>(container: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = container.walk();
    for child in container.children(&mut cursor) {
        match child.kind() {
            node_kinds::EXPRESSION_STATEMENT => {
                return child_of_kind(&child, node_kinds::STRING);
            }
            node_kinds::COMMENT => {}
            _ => return None,
        }
    }
    None
}

fn body_docstring(ctx: &FileContext<'_>, def: &Node<'_>) -> String {
    child_of_kind(def, node_kinds::BLOCK)
        .and_then(|block| leading_string(&block))
        .map(|s| clean_docstring(&ctx.text(&s)))
        .unwrap_or_default()
}

fn decorators(ctx: &FileContext<'_>, def: &Node<'_>) -> Vec<String> {
    let Some(parent) = def.parent().filter(|p| p.kind() == node_kinds::DECORATED_DEFINITION) else {
        return Vec::new();
    };
    let mut cursor = parent.walk();
    parent
        .children(&mut cursor)
        .filter(|c| c.kind() == node_kinds::DECORATOR)
        .map(|c| ctx.text(&c).trim().to_string())
        .collect()
}

fn with_decorators(decorators: &[String], signature: String) -> String {
    if decorators.is_empty() {
        signature
    } else {
        format!("{}\n{signature}", decorators.join("\n"))
    }
}

fn extract_module_docstring(ctx: &mut FileContext<'_>) -> Result<()> {
    let root = ctx.root;
    if let Some(string) = leading_string(&root) {
        let symbol = ParsedSymbol::new(MODULE_SYMBOL, SymbolKind::Module, "", ctx.span(&string))
            .with_docstring(clean_docstring(&ctx.text(&string)));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_imports(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = r"[
        (import_statement name: (dotted_name) @import.module)
        (import_statement name: (aliased_import name: (dotted_name) @import.module))
        (import_from_statement module_name: (dotted_name) @import.module)
        (import_from_statement module_name: (relative_import) @import.module)
    ]";
    for m in ctx.query(pattern)? {
        let Some(node) = m.node("import.module") else {
            continue;
        };
        let module = ctx.text(&node);
        let external = python_is_external(&module);
        ctx.add_import(module, external);
    }
    Ok(())
}

fn extract_functions(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query("(function_definition name: (identifier) @func.name) @func.def")? {
        let (Some(name), Some(def)) = (m.node("func.name"), m.node("func.def")) else {
            continue;
        };
        if has_ancestor_kind(&def, &[node_kinds::CLASS_DEFINITION]) {
            continue;
        }
        let kind = if has_child_kind(&def, node_kinds::ASYNC) {
            SymbolKind::AsyncFunction
        } else {
            SymbolKind::Function
        };
        let signature = with_decorators(&decorators(ctx, &def), colon_head_signature(&ctx.text(&def)));
        let symbol = ParsedSymbol::new(ctx.text(&name), kind, signature, ctx.span(&def))
            .with_docstring(body_docstring(ctx, &def));
        ctx.add_symbol(&def, symbol);
    }
    Ok(())
}

fn extract_classes(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query("(class_definition name: (identifier) @class.name) @class.def")? {
        let (Some(name), Some(def)) = (m.node("class.name"), m.node("class.def")) else {
            continue;
        };
        if has_ancestor_kind(&def, &[node_kinds::CLASS_DEFINITION]) {
            continue;
        }
        let name = ctx.text(&name);
        let bases = base_classes(ctx, &def);
        let head = if bases.is_empty() {
            format!("class {name}")
        } else {
            format!("class {name}({})", bases.join(", "))
        };
        let signature = with_decorators(&decorators(ctx, &def), head);
        let methods = class_methods(ctx, &def);
        let symbol = ParsedSymbol::new(&name, SymbolKind::Class, signature, ctx.span(&def))
            .with_docstring(body_docstring(ctx, &def))
            .with_children(methods);
        ctx.symbols.push(symbol);
        for base in bases {
            ctx.add_edge(DependencyKind::Extends, &name, base);
        }
    }
    Ok(())
}

fn base_classes(ctx: &FileContext<'_>, class: &Node<'_>) -> Vec<String> {
    let Some(args) = child_of_kind(class, node_kinds::ARGUMENT_LIST) else {
        return Vec::new();
    };
    let mut cursor = args.walk();
    args.named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), node_kinds::IDENTIFIER | node_kinds::ATTRIBUTE))
        .map(|c| ctx.text(&c))
        .collect()
}

fn class_methods(ctx: &mut FileContext<'_>, class: &Node<'_>) -> Vec<ParsedSymbol> {
    let Some(block) = child_of_kind(class, node_kinds::BLOCK) else {
        return Vec::new();
    };
    let mut methods = Vec::new();
    let mut cursor = block.walk();
    let statements: Vec<_> = block.named_children(&mut cursor).collect();
    for statement in statements {
        let def = match statement.kind() {
            node_kinds::FUNCTION_DEFINITION => statement,
            node_kinds::DECORATED_DEFINITION => {
                match statement.child_by_field_name("definition") {
                    Some(def) if def.kind() == node_kinds::FUNCTION_DEFINITION => def,
                    _ => continue,
                }
            }
            _ => continue,
        };
        let Some(name) = def.child_by_field_name("name") else {
            continue;
        };
        let decorators = decorators(ctx, &def);
        let has = |name: &str| decorators.iter().any(|d| d.contains(&format!("@{name}")));
        let kind = if has("staticmethod") {
            SymbolKind::StaticMethod
        } else if has("classmethod") {
            SymbolKind::ClassMethod
        } else if has_child_kind(&def, node_kinds::ASYNC) {
            SymbolKind::AsyncMethod
        } else {
            SymbolKind::Method
        };
        let signature = with_decorators(&decorators, colon_head_signature(&ctx.text(&def)));
        let name = ctx.text(&name);
        ctx.declare(&def, name.clone());
        methods.push(
            ParsedSymbol::new(name, kind, signature, ctx.span(&def))
                .with_docstring(body_docstring(ctx, &def)),
        );
    }
    methods
}

fn extract_calls(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query("(call function: [(identifier) (attribute)] @call.target)")? {
        let Some(target) = m.node("call.target") else {
            continue;
        };
        let Some(caller) = ctx.enclosing_declaration(&target, &[node_kinds::FUNCTION_DEFINITION]) else {
            continue;
        };
        let target = ctx.text(&target);
        ctx.add_edge(DependencyKind::Call, caller, target);
    }
    Ok(())
}

//! JavaScript and TypeScript extraction.
//!
//! One extractor serves both languages; TypeScript adds type-annotated
//! signatures, `implements` clauses, interfaces and type aliases. `.tsx`
//! files are parsed with the TSX dialect.

use tree_sitter::Node;

use super::imports::js_is_external;
use super::tree_sitter_utils::{child_of_kind, first_line, has_child_kind, strip_generics};
use super::{Extraction, Extractor, FileContext, Pass, resolve_language, run_passes};
use crate::error::Result;
use crate::syntax::SyntaxTreeProvider;
use crate::types::{DependencyKind, Language, ParsedSymbol, ScannedFile, SymbolKind};

mod node_kinds {
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const GENERATOR_FUNCTION_DECLARATION: &str = "generator_function_declaration";
    pub const FUNCTION_EXPRESSION: &str = "function_expression";
    pub const ARROW_FUNCTION: &str = "arrow_function";
    pub const METHOD_DEFINITION: &str = "method_definition";
    pub const CLASS_BODY: &str = "class_body";
    pub const CLASS_HERITAGE: &str = "class_heritage";
    pub const EXTENDS_CLAUSE: &str = "extends_clause";
    pub const IMPLEMENTS_CLAUSE: &str = "implements_clause";
    pub const EXPORT_STATEMENT: &str = "export_statement";
    pub const FIELD_DEFINITION: &str = "field_definition";
    pub const PUBLIC_FIELD_DEFINITION: &str = "public_field_definition";
    pub const PROPERTY_IDENTIFIER: &str = "property_identifier";
    pub const PRIVATE_PROPERTY_IDENTIFIER: &str = "private_property_identifier";
    pub const IDENTIFIER: &str = "identifier";
    pub const MEMBER_EXPRESSION: &str = "member_expression";
    pub const TYPE_ANNOTATION: &str = "type_annotation";
    pub const METHOD_SIGNATURE: &str = "method_signature";
    pub const PROPERTY_SIGNATURE: &str = "property_signature";
    pub const EXTENDS_TYPE_CLAUSE: &str = "extends_type_clause";
    pub const COMMENT: &str = "comment";
    pub const STATIC: &str = "static";
    pub const ASYNC: &str = "async";
}

const CALLERS: &[&str] = &[
    node_kinds::FUNCTION_DECLARATION,
    node_kinds::GENERATOR_FUNCTION_DECLARATION,
    node_kinds::FUNCTION_EXPRESSION,
    node_kinds::ARROW_FUNCTION,
    node_kinds::METHOD_DEFINITION,
];

const MAX_PROPERTY_SIGNATURE: usize = 100;

/// Extractor for JavaScript and TypeScript files.
pub struct JavaScriptExtractor {
    provider: SyntaxTreeProvider,
}

impl JavaScriptExtractor {
    /// Create an extractor with JavaScript, TypeScript and TSX parsers.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if a grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::JavaScript, Language::TypeScript])?,
        })
    }
}

impl Extractor for JavaScriptExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::JavaScript, Language::TypeScript]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        let language = resolve_language(file, self.languages(), Language::JavaScript);
        run_passes(
            &mut self.provider,
            file,
            language,
            &[
                Pass::new("imports", &extract_imports),
                Pass::new("exports", &extract_exports),
                Pass::new("functions", &extract_functions),
                Pass::new("arrow_functions", &extract_arrow_functions),
                Pass::new("classes", &extract_classes),
                Pass::new("interfaces", &extract_interfaces),
                Pass::new("type_aliases", &extract_type_aliases),
                Pass::new("calls", &extract_calls),
            ],
        )
    }
}

fn is_typescript(ctx: &FileContext<'_>) -> bool {
    ctx.language == Language::TypeScript
}

/// JSDoc before `node`, or before the `export` statement wrapping it.
fn jsdoc(ctx: &FileContext<'_>, node: &Node<'_>) -> String {
    let doc = ctx.doc(node, &[node_kinds::COMMENT]);
    if !doc.is_empty() {
        return doc;
    }
    node.parent()
        .filter(|p| p.kind() == node_kinds::EXPORT_STATEMENT)
        .map(|export| ctx.doc(&export, &[node_kinds::COMMENT]))
        .unwrap_or_default()
}

/// First line of `node`, plus any TypeScript annotation not already on it.
fn head(ctx: &FileContext<'_>, node: &Node<'_>) -> String {
    let mut signature = first_line(&ctx.text(node));
    if is_typescript(ctx) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == node_kinds::TYPE_ANNOTATION {
                let annotation = ctx.text(&child);
                if !signature.contains(&annotation) {
                    signature.push(' ');
                    signature.push_str(&annotation);
                }
            }
        }
    }
    signature
}

fn is_async(node: &Node<'_>) -> bool {
    has_child_kind(node, node_kinds::ASYNC)
        || node.parent().is_some_and(|p| has_child_kind(&p, node_kinds::ASYNC))
}

fn trim_module(text: &str) -> String {
    text.trim_matches(['"', '\'', '`']).to_string()
}

fn extract_imports(ctx: &mut FileContext<'_>) -> Result<()> {
    let es_modules = r"[
        (import_statement source: (string) @import.source)
        (export_statement source: (string) @import.source)
    ]";
    let require = r#"(call_expression
        function: (identifier) @func.name
        arguments: (arguments (string) @import.source)
        (#eq? @func.name "require"))"#;

    let mut matches = ctx.query(es_modules)?;
    matches.extend(ctx.query(require)?);
    for m in matches {
        let Some(source) = m.node("import.source") else {
            continue;
        };
        let module = trim_module(&ctx.text(&source));
        if module.is_empty() {
            continue;
        }
        let external = js_is_external(&module);
        ctx.add_import(module, external);
    }
    Ok(())
}

fn extract_exports(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query("(export_statement) @export")? {
        let Some(node) = m.node("export") else {
            continue;
        };
        let symbol = ParsedSymbol::new("export", SymbolKind::Export, first_line(&ctx.text(&node)), ctx.span(&node));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_functions(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = r"[
        (function_declaration name: (identifier) @func.name)
        (generator_function_declaration name: (identifier) @func.name)
    ] @func.def";
    for m in ctx.query(pattern)? {
        let (Some(name), Some(def)) = (m.node("func.name"), m.node("func.def")) else {
            continue;
        };
        let text = ctx.text(&def);
        let kind = if def.kind() == node_kinds::GENERATOR_FUNCTION_DECLARATION || text.contains("function*") {
            SymbolKind::GeneratorFunction
        } else if is_async(&def) {
            SymbolKind::AsyncFunction
        } else {
            SymbolKind::Function
        };
        let symbol = ParsedSymbol::new(ctx.text(&name), kind, head(ctx, &def), ctx.span(&def))
            .with_docstring(jsdoc(ctx, &def));
        ctx.add_symbol(&def, symbol);
    }

    let pattern = "(variable_declarator name: (identifier) @var.name value: (function_expression) @func.def)";
    for m in ctx.query(pattern)? {
        let (Some(name), Some(def)) = (m.node("var.name"), m.node("func.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let kind = if is_async(&def) {
            SymbolKind::AsyncFunction
        } else {
            SymbolKind::Function
        };
        let symbol = ParsedSymbol::new(&name, kind, format!("const {name} = {}", head(ctx, &def)), ctx.span(&def))
            .with_docstring(declaration_doc(ctx, &def));
        ctx.add_symbol(&def, symbol);
    }
    Ok(())
}

/// Doc of the `const`/`let`/`var` statement holding a bound function.
fn declaration_doc(ctx: &FileContext<'_>, value: &Node<'_>) -> String {
    value
        .parent()
        .and_then(|declarator| declarator.parent())
        .map(|declaration| jsdoc(ctx, &declaration))
        .unwrap_or_default()
}

fn extract_arrow_functions(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = "(variable_declarator name: (identifier) @var.name value: (arrow_function) @arrow.def)";
    for m in ctx.query(pattern)? {
        let (Some(name), Some(def)) = (m.node("var.name"), m.node("arrow.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let kind = if has_child_kind(&def, node_kinds::ASYNC) {
            SymbolKind::AsyncArrowFunction
        } else {
            SymbolKind::ArrowFunction
        };
        let symbol = ParsedSymbol::new(&name, kind, format!("const {name} = {}", head(ctx, &def)), ctx.span(&def))
            .with_docstring(declaration_doc(ctx, &def));
        ctx.add_symbol(&def, symbol);
    }
    Ok(())
}

fn extract_classes(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = if is_typescript(ctx) {
        r"[
            (class_declaration name: (type_identifier) @class.name)
            (abstract_class_declaration name: (type_identifier) @class.name)
        ] @class.def"
    } else {
        "(class_declaration name: (identifier) @class.name) @class.def"
    };
    for m in ctx.query(pattern)? {
        let (Some(name), Some(def)) = (m.node("class.name"), m.node("class.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let (extends, implements) = heritage(ctx, &def);
        let signature = match &extends {
            Some(base) => format!("class {name} extends {base}"),
            None => format!("class {name}"),
        };
        let mut children = class_methods(ctx, &def);
        children.extend(class_properties(ctx, &def));
        let symbol = ParsedSymbol::new(&name, SymbolKind::Class, signature, ctx.span(&def))
            .with_docstring(jsdoc(ctx, &def))
            .with_children(children);
        ctx.symbols.push(symbol);

        if let Some(base) = extends {
            ctx.add_edge(DependencyKind::Extends, &name, base);
        }
        for interface in implements {
            ctx.add_edge(DependencyKind::Implements, &name, interface);
        }
    }
    Ok(())
}

/// Base class and implemented interfaces.
///
/// JavaScript puts the base expression directly under `class_heritage`;
/// TypeScript wraps it in `extends_clause` next to an `implements_clause`.
fn heritage(ctx: &FileContext<'_>, class: &Node<'_>) -> (Option<String>, Vec<String>) {
    let mut extends = None;
    let mut implements = Vec::new();
    let Some(heritage) = child_of_kind(class, node_kinds::CLASS_HERITAGE) else {
        return (extends, implements);
    };
    let is_base = |n: &Node<'_>| matches!(n.kind(), node_kinds::IDENTIFIER | node_kinds::MEMBER_EXPRESSION);

    let mut cursor = heritage.walk();
    for child in heritage.named_children(&mut cursor) {
        match child.kind() {
            node_kinds::EXTENDS_CLAUSE => {
                let mut inner = child.walk();
                if let Some(base) = child.named_children(&mut inner).find(is_base) {
                    extends.get_or_insert_with(|| ctx.text(&base));
                }
            }
            node_kinds::IMPLEMENTS_CLAUSE => {
                let mut inner = child.walk();
                for ty in child.named_children(&mut inner) {
                    implements.push(strip_generics(&ctx.text(&ty)).to_string());
                }
            }
            _ if is_base(&child) => {
                extends.get_or_insert_with(|| ctx.text(&child));
            }
            _ => {}
        }
    }
    (extends, implements)
}

fn member_name(ctx: &FileContext<'_>, member: &Node<'_>) -> Option<String> {
    let mut cursor = member.walk();
    member
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), node_kinds::PROPERTY_IDENTIFIER | node_kinds::PRIVATE_PROPERTY_IDENTIFIER))
        .map(|c| ctx.text(&c))
}

fn class_methods(ctx: &mut FileContext<'_>, class: &Node<'_>) -> Vec<ParsedSymbol> {
    let Some(body) = child_of_kind(class, node_kinds::CLASS_BODY) else {
        return Vec::new();
    };
    let mut methods = Vec::new();
    let mut cursor = body.walk();
    let members: Vec<_> = body
        .named_children(&mut cursor)
        .filter(|c| c.kind() == node_kinds::METHOD_DEFINITION)
        .collect();
    for method in members {
        let Some(name) = member_name(ctx, &method) else {
            continue;
        };
        let kind = if has_child_kind(&method, node_kinds::ASYNC) {
            SymbolKind::AsyncMethod
        } else if has_child_kind(&method, node_kinds::STATIC) {
            SymbolKind::StaticMethod
        } else {
            SymbolKind::Method
        };
        ctx.declare(&method, name.clone());
        methods.push(
            ParsedSymbol::new(name, kind, head(ctx, &method), ctx.span(&method))
                .with_docstring(ctx.doc(&method, &[node_kinds::COMMENT])),
        );
    }
    methods
}

fn class_properties(ctx: &FileContext<'_>, class: &Node<'_>) -> Vec<ParsedSymbol> {
    let Some(body) = child_of_kind(class, node_kinds::CLASS_BODY) else {
        return Vec::new();
    };
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), node_kinds::FIELD_DEFINITION | node_kinds::PUBLIC_FIELD_DEFINITION))
        .filter_map(|field| {
            let name = member_name(ctx, &field)?;
            let kind = if has_child_kind(&field, node_kinds::STATIC) {
                SymbolKind::StaticProperty
            } else {
                SymbolKind::Property
            };
            let text = ctx.text(&field);
            let text = text.trim();
            let signature = if text.chars().count() > MAX_PROPERTY_SIGNATURE {
                format!("{}...", text.chars().take(MAX_PROPERTY_SIGNATURE).collect::<String>())
            } else {
                text.to_string()
            };
            Some(ParsedSymbol::new(name, kind, signature, ctx.span(&field)))
        })
        .collect()
}

fn extract_interfaces(ctx: &mut FileContext<'_>) -> Result<()> {
    if !is_typescript(ctx) {
        return Ok(());
    }
    for m in ctx.query("(interface_declaration name: (type_identifier) @iface.name) @iface.def")? {
        let (Some(name), Some(def)) = (m.node("iface.name"), m.node("iface.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let mut members = Vec::new();
        if let Some(body) = def.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                let kind = match member.kind() {
                    node_kinds::METHOD_SIGNATURE => SymbolKind::Method,
                    node_kinds::PROPERTY_SIGNATURE => SymbolKind::Property,
                    _ => continue,
                };
                let Some(member_name) = member.child_by_field_name("name") else {
                    continue;
                };
                let signature = ctx.text(&member).trim().trim_end_matches([';', ',']).to_string();
                members.push(ParsedSymbol::new(ctx.text(&member_name), kind, signature, ctx.span(&member)));
            }
        }
        if let Some(clause) = child_of_kind(&def, node_kinds::EXTENDS_TYPE_CLAUSE) {
            let mut cursor = clause.walk();
            for base in clause.named_children(&mut cursor) {
                ctx.add_edge(DependencyKind::Extends, &name, strip_generics(&ctx.text(&base)));
            }
        }
        let symbol = ParsedSymbol::new(&name, SymbolKind::Interface, format!("interface {name}"), ctx.span(&def))
            .with_docstring(jsdoc(ctx, &def))
            .with_children(members);
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_type_aliases(ctx: &mut FileContext<'_>) -> Result<()> {
    if !is_typescript(ctx) {
        return Ok(());
    }
    for m in ctx.query("(type_alias_declaration name: (type_identifier) @alias.name) @alias.def")? {
        let (Some(name), Some(def)) = (m.node("alias.name"), m.node("alias.def")) else {
            continue;
        };
        let symbol = ParsedSymbol::new(ctx.text(&name), SymbolKind::TypeAlias, first_line(&ctx.text(&def)), ctx.span(&def))
            .with_docstring(jsdoc(ctx, &def));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_calls(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = "(call_expression function: [(identifier) (member_expression)] @call.target)";
    for m in ctx.query(pattern)? {
        let Some(target) = m.node("call.target") else {
            continue;
        };
        let Some(caller) = ctx.enclosing_declaration(&target, CALLERS) else {
            continue;
        };
        let target = ctx.text(&target);
        ctx.add_edge(DependencyKind::Call, caller, target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::test_support::extract_clean;
    use crate::types::ParsedFile;

    fn extract_js(code: &str) -> ParsedFile {
        let mut extractor = JavaScriptExtractor::new().unwrap();
        extract_clean(&mut extractor, "src/app.js", "javascript", code)
    }

    fn extract_ts(path: &str, code: &str) -> ParsedFile {
        let mut extractor = JavaScriptExtractor::new().unwrap();
        extract_clean(&mut extractor, path, "typescript", code)
    }

    #[test]
    fn imports_cover_es6_require_and_reexports() {
        let parsed = extract_js(
            "import React from 'react';\nimport { api } from './api';\nconst fs = require(\"fs\");\nconst _ = require('lodash');\nexport { x } from '@/shared';\n",
        );
        let imports: Vec<_> = parsed
            .dependencies_of(DependencyKind::Import)
            .map(|d| (d.target.as_str(), d.is_external))
            .collect();
        assert_eq!(imports.len(), 5);
        assert!(imports.contains(&("react", true)));
        assert!(imports.contains(&("./api", false)));
        assert!(imports.contains(&("fs", false)));
        assert!(imports.contains(&("lodash", true)));
        assert!(imports.contains(&("@/shared", false)));
    }

    #[test]
    fn non_require_calls_are_not_imports() {
        let parsed = extract_js("load('config.json');\n");
        assert_eq!(parsed.dependencies_of(DependencyKind::Import).count(), 0);
    }

    #[test]
    fn function_kinds() {
        let parsed = extract_js(
            "/** Adds. */\nfunction add(a, b) { return a + b; }\nasync function load() {}\nfunction* ids() { yield 1; }\nconst handler = function (req) {\n  return req;\n};\n",
        );
        let add = parsed.find_symbol("add").unwrap();
        assert_eq!(add.kind, SymbolKind::Function);
        assert_eq!(add.docstring, "Adds.");
        assert_eq!(parsed.find_symbol("load").unwrap().kind, SymbolKind::AsyncFunction);
        assert_eq!(parsed.find_symbol("ids").unwrap().kind, SymbolKind::GeneratorFunction);
        let handler = parsed.find_symbol("handler").unwrap();
        assert_eq!(handler.signature, "const handler = function (req) {");
    }

    #[test]
    fn arrow_functions_bound_to_variables() {
        let parsed = extract_js(
            "// Formats a name.\nconst format = (name) => name.trim();\nconst fetchAll = async () => {\n  await get();\n};\n",
        );
        let format = parsed.find_symbol("format").unwrap();
        assert_eq!(format.kind, SymbolKind::ArrowFunction);
        assert_eq!(format.signature, "const format = (name) => name.trim()");
        assert_eq!(format.docstring, "Formats a name.");
        assert_eq!(parsed.find_symbol("fetchAll").unwrap().kind, SymbolKind::AsyncArrowFunction);
    }

    #[test]
    fn classes_with_members_and_heritage() {
        let parsed = extract_js(
            "class Dog extends Animal {\n  static count = 0;\n  name = 'rex';\n  constructor() { super(); }\n  static create() { return new Dog(); }\n  async fetch() {}\n  bark() { this.say('woof'); }\n}\n",
        );
        let dog = parsed.find_symbol("Dog").unwrap();
        assert_eq!(dog.signature, "class Dog extends Animal");
        let kinds: Vec<_> = dog.children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("constructor", SymbolKind::Method),
                ("create", SymbolKind::StaticMethod),
                ("fetch", SymbolKind::AsyncMethod),
                ("bark", SymbolKind::Method),
                ("count", SymbolKind::StaticProperty),
                ("name", SymbolKind::Property),
            ]
        );
        assert!(parsed.has_edge(DependencyKind::Extends, "Dog", "Animal"));
        assert!(parsed.has_edge(DependencyKind::Call, "bark", "this.say"));
    }

    #[test]
    fn long_property_signature_is_truncated() {
        let value = "x".repeat(150);
        let parsed = extract_js(&format!("class A {{\n  big = '{value}';\n}}\n"));
        let big = parsed.find_symbol("A").unwrap().child("big").unwrap();
        assert!(big.signature.ends_with("..."));
        assert_eq!(big.signature.chars().count(), MAX_PROPERTY_SIGNATURE + 3);
    }

    #[test]
    fn exports_are_symbols() {
        let parsed = extract_js("export default function main() {}\nexport const x = 1;\n");
        let exports: Vec<_> = parsed
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Export)
            .map(|s| s.signature.as_str())
            .collect();
        assert_eq!(exports, vec!["export default function main() {}", "export const x = 1;"]);
    }

    #[test]
    fn calls_inside_anonymous_callbacks_belong_to_named_function() {
        let parsed = extract_js("function main() {\n  items.forEach(function (i) {\n    render(i);\n  });\n}\n");
        assert!(parsed.has_edge(DependencyKind::Call, "main", "items.forEach"));
        assert!(parsed.has_edge(DependencyKind::Call, "main", "render"));
    }

    #[test]
    fn typescript_classes_implement_interfaces() {
        let parsed = extract_ts(
            "src/user.ts",
            "export class UserService extends Base implements Repo<User>, Disposable {\n  find(id: string): User {\n    return this.db.get(id);\n  }\n}\n",
        );
        let service = parsed.find_symbol("UserService").unwrap();
        assert_eq!(service.signature, "class UserService extends Base");
        assert!(parsed.has_edge(DependencyKind::Extends, "UserService", "Base"));
        assert!(parsed.has_edge(DependencyKind::Implements, "UserService", "Repo"));
        assert!(parsed.has_edge(DependencyKind::Implements, "UserService", "Disposable"));
        assert_eq!(service.child("find").unwrap().signature, "find(id: string): User {");
    }

    #[test]
    fn typescript_interfaces_and_aliases() {
        let parsed = extract_ts(
            "src/types.ts",
            "/** A user. */\ninterface User extends Entity {\n  id: string;\n  greet(other: User): string;\n}\n\ntype Id = string | number;\n",
        );
        let user = parsed.find_symbol("User").unwrap();
        assert_eq!(user.kind, SymbolKind::Interface);
        assert_eq!(user.docstring, "A user.");
        let members: Vec<_> = user.children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(members, vec![("id", SymbolKind::Property), ("greet", SymbolKind::Method)]);
        assert!(parsed.has_edge(DependencyKind::Extends, "User", "Entity"));

        let id = parsed.find_symbol("Id").unwrap();
        assert_eq!(id.kind, SymbolKind::TypeAlias);
        assert_eq!(id.signature, "type Id = string | number;");
    }

    #[test]
    fn tsx_files_parse_jsx() {
        let parsed = extract_ts(
            "ui/App.tsx",
            "export function App(): JSX.Element {\n  return <div>{greet()}</div>;\n}\n",
        );
        assert_eq!(parsed.language, Language::TypeScript);
        assert!(parsed.has_edge(DependencyKind::Call, "App", "greet"));
    }
}

//! Go extraction.
//!
//! Packages, imports (classified against the nearest `go.mod`), functions,
//! methods, structs, interfaces, other type definitions and calls.

use tree_sitter::Node;

use super::imports::{GoModules, go_is_external};
use super::tree_sitter_utils::{child_of_kind, collapse_whitespace};
use super::{Extraction, Extractor, FileContext, Pass, run_passes};
use crate::error::Result;
use crate::syntax::SyntaxTreeProvider;
use crate::types::{DependencyKind, Language, ParsedSymbol, ScannedFile, SymbolKind};

mod node_kinds {
    pub const PACKAGE_CLAUSE: &str = "package_clause";
    pub const PACKAGE_IDENTIFIER: &str = "package_identifier";
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const METHOD_DECLARATION: &str = "method_declaration";
    pub const TYPE_DECLARATION: &str = "type_declaration";
    pub const STRUCT_TYPE: &str = "struct_type";
    pub const INTERFACE_TYPE: &str = "interface_type";
    pub const FIELD_DECLARATION_LIST: &str = "field_declaration_list";
    pub const FIELD_DECLARATION: &str = "field_declaration";
    pub const FIELD_IDENTIFIER: &str = "field_identifier";
    pub const METHOD_ELEM: &str = "method_elem";
    pub const TYPE_ELEM: &str = "type_elem";
    pub const COMMENT: &str = "comment";
}

const CALLERS: &[&str] = &[node_kinds::FUNCTION_DECLARATION, node_kinds::METHOD_DECLARATION];

const TYPE_QUERY: &str = r"[
    (type_spec name: (type_identifier) @type.name type: (_) @type.body)
    (type_alias name: (type_identifier) @type.name type: (_) @type.body)
] @type.def";

/// Extractor for `.go` files.
pub struct GoExtractor {
    provider: SyntaxTreeProvider,
    modules: GoModules,
}

impl GoExtractor {
    /// Create an extractor with its own parser.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if the Go grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::Go])?,
            modules: GoModules::default(),
        })
    }
}

impl Extractor for GoExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::Go]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        let module = self.modules.module_for(&file.abs_path);
        run_passes(
            &mut self.provider,
            file,
            Language::Go,
            &[
                Pass::new("package", &extract_package),
                Pass::new("imports", &|ctx| extract_imports(ctx, module.as_deref())),
                Pass::new("functions", &extract_functions),
                Pass::new("methods", &extract_methods),
                Pass::new("structs", &extract_structs),
                Pass::new("interfaces", &extract_interfaces),
                Pass::new("types", &extract_types),
                Pass::new("calls", &extract_calls),
            ],
        )
    }
}

fn extract_package(ctx: &mut FileContext<'_>) -> Result<()> {
    let root = ctx.root;
    let Some(ident) = child_of_kind(&root, node_kinds::PACKAGE_CLAUSE)
        .and_then(|clause| child_of_kind(&clause, node_kinds::PACKAGE_IDENTIFIER))
    else {
        return Ok(());
    };
    let name = ctx.text(&ident);
    let symbol = ParsedSymbol::new(&name, SymbolKind::Package, format!("package {name}"), ctx.span(&ident));
    ctx.symbols.push(symbol);
    Ok(())
}

fn extract_imports(ctx: &mut FileContext<'_>, module: Option<&str>) -> Result<()> {
    for m in ctx.query("(import_spec path: (_) @import.path)")? {
        let Some(node) = m.node("import.path") else {
            continue;
        };
        let path = ctx.text(&node).trim_matches(['"', '`']).to_string();
        if path.is_empty() {
            continue;
        }
        let external = go_is_external(&path, module);
        ctx.add_import(path, external);
    }
    Ok(())
}

/// Declaration text up to the body, on one line.
///
/// Cut at the body node rather than the first `{`, which may belong to an
/// `interface{}` or `struct{}` parameter type.
fn func_signature(ctx: &FileContext<'_>, def: &Node<'_>) -> String {
    let end = def
        .child_by_field_name("body")
        .map_or(def.end_byte(), |body| body.start_byte());
    let head = ctx
        .source
        .get(def.start_byte()..end)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .unwrap_or_default();
    collapse_whitespace(head)
}

fn extract_functions(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query("(function_declaration name: (identifier) @func.name) @func.def")? {
        let (Some(name), Some(def)) = (m.node("func.name"), m.node("func.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let symbol = ParsedSymbol::new(&name, SymbolKind::Function, func_signature(ctx, &def), ctx.span(&def))
            .with_docstring(ctx.doc(&def, &[node_kinds::COMMENT]));
        ctx.add_symbol(&def, symbol);
    }
    Ok(())
}

fn extract_methods(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = "(method_declaration receiver: (parameter_list) name: (field_identifier) @method.name) @method.def";
    for m in ctx.query(pattern)? {
        let (Some(name), Some(def)) = (m.node("method.name"), m.node("method.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let symbol = ParsedSymbol::new(&name, SymbolKind::Method, func_signature(ctx, &def), ctx.span(&def))
            .with_docstring(ctx.doc(&def, &[node_kinds::COMMENT]));
        ctx.add_symbol(&def, symbol);
    }
    Ok(())
}

/// Doc of a type spec: comments before it inside a grouped `type ( ... )`,
/// else comments before the whole declaration.
fn type_doc(ctx: &FileContext<'_>, spec: &Node<'_>) -> String {
    let doc = ctx.doc(spec, &[node_kinds::COMMENT]);
    if !doc.is_empty() {
        return doc;
    }
    spec.parent()
        .filter(|p| p.kind() == node_kinds::TYPE_DECLARATION)
        .map(|decl| ctx.doc(&decl, &[node_kinds::COMMENT]))
        .unwrap_or_default()
}

fn extract_structs(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query(TYPE_QUERY)? {
        let (Some(name), Some(body), Some(spec)) = (m.node("type.name"), m.node("type.body"), m.node("type.def"))
        else {
            continue;
        };
        if body.kind() != node_kinds::STRUCT_TYPE {
            continue;
        }
        let name = ctx.text(&name);
        let fields = struct_fields(ctx, &name, &body);
        let symbol = ParsedSymbol::new(&name, SymbolKind::Struct, format!("type {name} struct"), ctx.span(&spec))
            .with_docstring(type_doc(ctx, &spec))
            .with_children(fields);
        ctx.symbols.push(symbol);
    }
    Ok(())
}

/// Named fields become children; embedded types become `extends` edges.
fn struct_fields(ctx: &mut FileContext<'_>, owner: &str, body: &Node<'_>) -> Vec<ParsedSymbol> {
    let Some(list) = child_of_kind(body, node_kinds::FIELD_DECLARATION_LIST) else {
        return Vec::new();
    };
    let mut fields = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        if decl.kind() != node_kinds::FIELD_DECLARATION {
            continue;
        }
        let type_text = decl
            .child_by_field_name("type")
            .map(|t| ctx.text(&t))
            .unwrap_or_default();
        let mut names = Vec::new();
        let mut inner = decl.walk();
        for child in decl.named_children(&mut inner) {
            if child.kind() == node_kinds::FIELD_IDENTIFIER {
                names.push(ctx.text(&child));
            }
        }
        if names.is_empty() {
            let embedded = type_text.trim_start_matches('*');
            if !embedded.is_empty() {
                ctx.add_edge(DependencyKind::Extends, owner, embedded);
            }
            continue;
        }
        for name in names {
            let signature = format!("{name} {type_text}");
            fields.push(ParsedSymbol::new(name, SymbolKind::Field, signature, ctx.span(&decl)));
        }
    }
    fields
}

fn extract_interfaces(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query(TYPE_QUERY)? {
        let (Some(name), Some(body), Some(spec)) = (m.node("type.name"), m.node("type.body"), m.node("type.def"))
        else {
            continue;
        };
        if body.kind() != node_kinds::INTERFACE_TYPE {
            continue;
        }
        let name = ctx.text(&name);
        let mut methods = Vec::new();
        let mut cursor = body.walk();
        for elem in body.named_children(&mut cursor) {
            match elem.kind() {
                node_kinds::METHOD_ELEM => {
                    let Some(method) = child_of_kind(&elem, node_kinds::FIELD_IDENTIFIER) else {
                        continue;
                    };
                    let signature = collapse_whitespace(&ctx.text(&elem));
                    methods.push(ParsedSymbol::new(ctx.text(&method), SymbolKind::Method, signature, ctx.span(&elem)));
                }
                node_kinds::TYPE_ELEM => {
                    let embedded = ctx.text(&elem);
                    ctx.add_edge(DependencyKind::Extends, &name, embedded.trim());
                }
                _ => {}
            }
        }
        let symbol = ParsedSymbol::new(&name, SymbolKind::Interface, format!("type {name} interface"), ctx.span(&spec))
            .with_docstring(type_doc(ctx, &spec))
            .with_children(methods);
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_types(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query(TYPE_QUERY)? {
        let (Some(name), Some(body), Some(spec)) = (m.node("type.name"), m.node("type.body"), m.node("type.def"))
        else {
            continue;
        };
        if matches!(body.kind(), node_kinds::STRUCT_TYPE | node_kinds::INTERFACE_TYPE) {
            continue;
        }
        let signature = format!("type {}", collapse_whitespace(&ctx.text(&spec)));
        let symbol = ParsedSymbol::new(ctx.text(&name), SymbolKind::Type, signature, ctx.span(&spec))
            .with_docstring(type_doc(ctx, &spec));
        ctx.symbols.push(symbol);
    }
    Ok(())
}

fn extract_calls(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = "(call_expression function: [(identifier) (selector_expression)] @call.target)";
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
    use crate::languages::test_support::{extract_clean, extract_code};
    use crate::types::ScannedFile;
    use tempfile::TempDir;

    fn extract(code: &str) -> crate::types::ParsedFile {
        let mut extractor = GoExtractor::new().unwrap();
        extract_clean(&mut extractor, "pkg/main.go", "go", code)
    }

    #[test]
    fn extracts_package() {
        let parsed = extract("package server\n");
        let pkg = parsed.find_symbol("server").expect("package symbol");
        assert_eq!(pkg.kind, SymbolKind::Package);
    }

    #[test]
    fn extracts_function_with_doc_and_signature() {
        let parsed = extract(
            "package a\n\n// Add sums two ints.\n// It never overflows.\nfunc Add(a, b int) int {\n\treturn a + b\n}\n",
        );
        let add = parsed.find_symbol("Add").unwrap();
        assert_eq!(add.kind, SymbolKind::Function);
        assert_eq!(add.signature, "func Add(a, b int) int");
        assert_eq!(add.docstring, "Add sums two ints.\nIt never overflows.");
        assert_eq!(add.span.start_line, 5);
    }

    #[test]
    fn signature_spans_wrapped_parameters_and_empty_interfaces() {
        let parsed = extract(
            "package a\n\nfunc Emit(\n\tname string,\n\tvalue interface{},\n) error {\n\treturn nil\n}\n",
        );
        let emit = parsed.find_symbol("Emit").unwrap();
        assert_eq!(emit.signature, "func Emit( name string, value interface{}, ) error");
    }

    #[test]
    fn extracts_method_under_plain_name() {
        let parsed = extract("package a\n\ntype S struct{}\n\nfunc (s *S) Run() error {\n\treturn nil\n}\n");
        let run = parsed.find_symbol("Run").unwrap();
        assert_eq!(run.kind, SymbolKind::Method);
        assert_eq!(run.signature, "func (s *S) Run() error");
    }

    #[test]
    fn extracts_struct_fields_and_embedding() {
        let parsed = extract(
            "package a\n\ntype Server struct {\n\tsync.Mutex\n\tAddr, Host string\n\tport int\n}\n",
        );
        let server = parsed.find_symbol("Server").unwrap();
        assert_eq!(server.kind, SymbolKind::Struct);
        assert_eq!(server.signature, "type Server struct");
        let names: Vec<_> = server.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Addr", "Host", "port"]);
        assert_eq!(server.child("port").unwrap().signature, "port int");
        assert!(parsed.has_edge(DependencyKind::Extends, "Server", "sync.Mutex"));
    }

    #[test]
    fn extracts_interface_methods() {
        let parsed = extract(
            "package a\n\n// Store persists things.\ntype Store interface {\n\tGet(key string) (string, error)\n\tPut(key, value string) error\n}\n",
        );
        let store = parsed.find_symbol("Store").unwrap();
        assert_eq!(store.kind, SymbolKind::Interface);
        assert_eq!(store.docstring, "Store persists things.");
        assert_eq!(store.children.len(), 2);
        assert_eq!(store.children[0].signature, "Get(key string) (string, error)");
    }

    #[test]
    fn extracts_plain_type_definitions_only_once() {
        let parsed = extract("package a\n\ntype ID int64\n\ntype Point struct{ X int }\n");
        let types: Vec<_> = parsed
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Type)
            .collect();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].name, "ID");
        assert_eq!(types[0].signature, "type ID int64");
    }

    #[test]
    fn attributes_calls_to_enclosing_function() {
        let parsed = extract(
            "package a\n\nimport \"fmt\"\n\nfunc helper() {}\n\nfunc caller() {\n\thelper()\n\tfmt.Println(\"x\")\n\tgo func() {\n\t\thelper()\n\t}()\n}\n",
        );
        assert!(parsed.has_edge(DependencyKind::Call, "caller", "helper"));
        assert!(parsed.has_edge(DependencyKind::Call, "caller", "fmt.Println"));
        let helper_calls = parsed
            .dependencies_of(DependencyKind::Call)
            .filter(|d| d.target == "helper")
            .count();
        assert_eq!(helper_calls, 2, "closure call is attributed to its named function");
    }

    #[test]
    fn top_level_calls_are_dropped() {
        let parsed = extract("package a\n\nvar x = compute()\n");
        assert_eq!(parsed.dependencies_of(DependencyKind::Call).count(), 0);
    }

    #[test]
    fn classifies_imports_against_go_mod() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module github.com/me/proj\n").unwrap();
        std::fs::create_dir_all(dir.path().join("cmd")).unwrap();
        std::fs::write(
            dir.path().join("cmd/main.go"),
            "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/me/proj/internal/db\"\n\t\"github.com/other/lib\"\n)\n",
        )
        .unwrap();
        let mut extractor = GoExtractor::new().unwrap();
        let file = ScannedFile::under(dir.path(), "cmd/main.go", "go");

        let parsed = extractor.extract(&file).file().cloned().unwrap();
        let imports: Vec<_> = parsed
            .dependencies_of(DependencyKind::Import)
            .map(|d| (d.target.as_str(), d.is_external))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("fmt", false),
                ("github.com/me/proj/internal/db", false),
                ("github.com/other/lib", true),
            ]
        );
    }

    #[test]
    fn broken_file_keeps_earlier_symbols() {
        let mut extractor = GoExtractor::new().unwrap();
        let (parsed, error) = extract_code(
            &mut extractor,
            "broken.go",
            "go",
            "package a\n\nfunc Good() {}\n\nfunc Bad( {\n",
        );
        assert!(error.is_some());
        assert!(parsed.find_symbol("Good").is_some());
    }
}

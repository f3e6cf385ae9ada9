//! Java extraction.
//!
//! Type names are package-qualified (`com.example.User`); members and edge
//! endpoints use simple names.

use std::collections::HashSet;
use std::path::Path;

use tree_sitter::Node;

use super::imports::java_is_external;
use super::tree_sitter_utils::{child_of_kind, collapse_whitespace, head_signature, strip_generics};
use super::{Extraction, Extractor, FileContext, Pass, run_passes};
use crate::error::Result;
use crate::syntax::SyntaxTreeProvider;
use crate::types::{
    DependencyKind, Language, ParsedDependency, ParsedSymbol, ScannedFile, Span, SymbolKind,
};

mod node_kinds {
    pub const CLASS_DECLARATION: &str = "class_declaration";
    pub const INTERFACE_DECLARATION: &str = "interface_declaration";
    pub const ENUM_DECLARATION: &str = "enum_declaration";
    pub const RECORD_DECLARATION: &str = "record_declaration";
    pub const FORMAL_PARAMETER: &str = "formal_parameter";
    pub const METHOD_DECLARATION: &str = "method_declaration";
    pub const CONSTRUCTOR_DECLARATION: &str = "constructor_declaration";
    pub const FIELD_DECLARATION: &str = "field_declaration";
    pub const VARIABLE_DECLARATOR: &str = "variable_declarator";
    pub const CLASS_BODY: &str = "class_body";
    pub const INTERFACE_BODY: &str = "interface_body";
    pub const ENUM_BODY: &str = "enum_body";
    pub const ENUM_BODY_DECLARATIONS: &str = "enum_body_declarations";
    pub const ENUM_CONSTANT: &str = "enum_constant";
    pub const SUPERCLASS: &str = "superclass";
    pub const SUPER_INTERFACES: &str = "super_interfaces";
    pub const EXTENDS_INTERFACES: &str = "extends_interfaces";
    pub const TYPE_LIST: &str = "type_list";
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
    pub const GENERIC_TYPE: &str = "generic_type";
    pub const SCOPED_TYPE_IDENTIFIER: &str = "scoped_type_identifier";
    pub const BLOCK_COMMENT: &str = "block_comment";
    pub const LINE_COMMENT: &str = "line_comment";
}

const COMMENTS: &[&str] = &[node_kinds::BLOCK_COMMENT, node_kinds::LINE_COMMENT];
const CALLERS: &[&str] = &[node_kinds::METHOD_DECLARATION, node_kinds::CONSTRUCTOR_DECLARATION];

/// Source-root markers used to infer a package from a file path.
pub(crate) const JAVA_SOURCE_ROOTS: &[&str] = &["src/main/java/", "src/test/java/", "src/", "java/"];

/// Package implied by a file's location under a source root.
///
/// `src/main/java/com/example/User.java` gives `com.example`. A file sitting
/// directly under the root, or outside every root, is in the default package.
/// Roots only match whole path segments, so `mysrc/` is not `src/`.
pub(crate) fn infer_package(path: &Path, roots: &[&str]) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    for root in roots {
        let at_segment = path
            .match_indices(root)
            .map(|(index, _)| index)
            .find(|&index| index == 0 || path[..index].ends_with('/'));
        if let Some(index) = at_segment {
            let rest = &path[index + root.len()..];
            return match rest.rfind('/') {
                Some(slash) => rest[..slash].replace('/', "."),
                None => String::new(),
            };
        }
    }
    String::new()
}

/// `package.Name`, or `Name` in the default package.
pub(crate) fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

/// Extractor for `.java` files.
pub struct JavaExtractor {
    provider: SyntaxTreeProvider,
}

impl JavaExtractor {
    /// Create an extractor with its own parser.
    ///
    /// # Errors
    ///
    /// Returns `Error::Grammar` if the Java grammar fails to load.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: SyntaxTreeProvider::for_languages(&[Language::Java])?,
        })
    }
}

impl Extractor for JavaExtractor {
    fn languages(&self) -> &'static [Language] {
        &[Language::Java]
    }

    fn extract(&mut self, file: &ScannedFile) -> Extraction {
        run_passes(
            &mut self.provider,
            file,
            Language::Java,
            &[
                Pass::new("package", &extract_package),
                Pass::new("imports", &extract_imports),
                Pass::new("classes", &extract_classes),
                Pass::new("interfaces", &extract_interfaces),
                Pass::new("enums", &extract_enums),
                Pass::new("records", &extract_records),
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

fn extract_package(ctx: &mut FileContext<'_>) -> Result<()> {
    let matches = ctx.query("(package_declaration [(scoped_identifier) (identifier)] @package.name)")?;
    if let Some(node) = matches.first().and_then(|m| m.node("package.name")) {
        let name = ctx.text(&node);
        let symbol = ParsedSymbol::new(&name, SymbolKind::Package, format!("package {name}"), ctx.span(&node));
        ctx.symbols.push(symbol);
        return Ok(());
    }

    let inferred = infer_package(&ctx.file.path, JAVA_SOURCE_ROOTS);
    if !inferred.is_empty() {
        let signature = format!("package {inferred}");
        ctx.symbols
            .push(ParsedSymbol::new(inferred, SymbolKind::Package, signature, Span::default()));
    }
    Ok(())
}

/// Import path as written, without `import`, `static` or the semicolon.
fn import_path(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix("import").unwrap_or(text).trim_start();
    let text = text.strip_prefix("static ").unwrap_or(text);
    collapse_whitespace(text.trim_end_matches(';')).replace(' ', "")
}

fn extract_imports(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for m in ctx.query("(import_declaration) @import")? {
        let Some(node) = m.node("import") else {
            continue;
        };
        let path = import_path(&ctx.text(&node));
        if path.is_empty() {
            continue;
        }
        let external = java_is_external(&path, Some(&package));
        let mut dependency = ParsedDependency::import(path, external);
        dependency.source.clone_from(&package);
        ctx.dependencies.push(dependency);
    }
    Ok(())
}

fn type_names(ctx: &FileContext<'_>, list: &Node<'_>) -> Vec<String> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|n| {
            matches!(
                n.kind(),
                node_kinds::TYPE_IDENTIFIER | node_kinds::GENERIC_TYPE | node_kinds::SCOPED_TYPE_IDENTIFIER
            )
        })
        .map(|n| strip_generics(&ctx.text(&n)).to_string())
        .collect()
}

/// Types listed under `clause` (directly or inside its `type_list`).
fn clause_types(ctx: &FileContext<'_>, decl: &Node<'_>, clause: &str) -> Vec<String> {
    let Some(clause) = child_of_kind(decl, clause) else {
        return Vec::new();
    };
    match child_of_kind(&clause, node_kinds::TYPE_LIST) {
        Some(list) => type_names(ctx, &list),
        None => type_names(ctx, &clause),
    }
}

fn member_name(ctx: &FileContext<'_>, member: &Node<'_>) -> Option<String> {
    member.child_by_field_name("name").map(|n| ctx.text(&n))
}

/// Methods, constructors and fields of a type body, in that order.
fn body_members(ctx: &mut FileContext<'_>, body: &Node<'_>) -> Vec<ParsedSymbol> {
    let mut fields = Vec::new();
    let mut methods = Vec::new();
    let mut constructors = Vec::new();
    let mut cursor = body.walk();
    let members: Vec<_> = body.named_children(&mut cursor).collect();
    for member in members {
        match member.kind() {
            node_kinds::FIELD_DECLARATION => {
                let signature = head_signature(&ctx.text(&member), false);
                let docstring = ctx.doc(&member, COMMENTS);
                let mut inner = member.walk();
                for declarator in member.named_children(&mut inner) {
                    if declarator.kind() != node_kinds::VARIABLE_DECLARATOR {
                        continue;
                    }
                    if let Some(name) = member_name(ctx, &declarator) {
                        fields.push(
                            ParsedSymbol::new(name, SymbolKind::Field, signature.clone(), ctx.span(&member))
                                .with_docstring(docstring.clone()),
                        );
                    }
                }
            }
            node_kinds::METHOD_DECLARATION | node_kinds::CONSTRUCTOR_DECLARATION => {
                let Some(name) = member_name(ctx, &member) else {
                    continue;
                };
                let kind = if member.kind() == node_kinds::METHOD_DECLARATION {
                    SymbolKind::Method
                } else {
                    SymbolKind::Constructor
                };
                ctx.declare(&member, name.clone());
                let symbol = ParsedSymbol::new(name, kind, head_signature(&ctx.text(&member), false), ctx.span(&member))
                    .with_docstring(ctx.doc(&member, COMMENTS));
                if kind == SymbolKind::Method {
                    methods.push(symbol);
                } else {
                    constructors.push(symbol);
                }
            }
            _ => {}
        }
    }
    fields.extend(methods);
    fields.extend(constructors);
    fields
}

fn extract_classes(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for m in ctx.query("(class_declaration name: (identifier) @class.name) @class.def")? {
        let (Some(name), Some(def)) = (m.node("class.name"), m.node("class.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let children = child_of_kind(&def, node_kinds::CLASS_BODY)
            .map(|body| body_members(ctx, &body))
            .unwrap_or_default();
        let superclass = clause_types(ctx, &def, node_kinds::SUPERCLASS);
        let interfaces = clause_types(ctx, &def, node_kinds::SUPER_INTERFACES);

        let symbol = ParsedSymbol::new(qualify(&package, &name), SymbolKind::Class, head_signature(&ctx.text(&def), false), ctx.span(&def))
            .with_docstring(ctx.doc(&def, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        if let Some(base) = superclass.into_iter().next() {
            ctx.add_edge(DependencyKind::Extends, &name, base);
        }
        for interface in interfaces {
            ctx.add_edge(DependencyKind::Implements, &name, interface);
        }
    }
    Ok(())
}

fn extract_interfaces(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for m in ctx.query("(interface_declaration name: (identifier) @interface.name) @interface.def")? {
        let (Some(name), Some(def)) = (m.node("interface.name"), m.node("interface.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let methods: Vec<_> = child_of_kind(&def, node_kinds::INTERFACE_BODY)
            .map(|body| body_members(ctx, &body))
            .unwrap_or_default()
            .into_iter()
            .filter(|member| member.kind == SymbolKind::Method)
            .collect();
        let parents = clause_types(ctx, &def, node_kinds::EXTENDS_INTERFACES);

        let symbol = ParsedSymbol::new(qualify(&package, &name), SymbolKind::Interface, head_signature(&ctx.text(&def), false), ctx.span(&def))
            .with_docstring(ctx.doc(&def, COMMENTS))
            .with_children(methods);
        ctx.symbols.push(symbol);

        for parent in parents {
            ctx.add_edge(DependencyKind::Extends, &name, parent);
        }
    }
    Ok(())
}

fn extract_enums(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for m in ctx.query("(enum_declaration name: (identifier) @enum.name) @enum.def")? {
        let (Some(name), Some(def)) = (m.node("enum.name"), m.node("enum.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let mut children = Vec::new();
        if let Some(body) = child_of_kind(&def, node_kinds::ENUM_BODY) {
            let mut cursor = body.walk();
            let entries: Vec<_> = body.named_children(&mut cursor).collect();
            for entry in entries {
                match entry.kind() {
                    node_kinds::ENUM_CONSTANT => {
                        if let Some(constant) = member_name(ctx, &entry) {
                            children.push(
                                ParsedSymbol::new(constant, SymbolKind::EnumConstant, collapse_whitespace(&ctx.text(&entry)), ctx.span(&entry))
                                    .with_docstring(ctx.doc(&entry, COMMENTS)),
                            );
                        }
                    }
                    node_kinds::ENUM_BODY_DECLARATIONS => {
                        children.extend(body_members(ctx, &entry));
                    }
                    _ => {}
                }
            }
        }
        let interfaces = clause_types(ctx, &def, node_kinds::SUPER_INTERFACES);

        let symbol = ParsedSymbol::new(qualify(&package, &name), SymbolKind::Enum, head_signature(&ctx.text(&def), false), ctx.span(&def))
            .with_docstring(ctx.doc(&def, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        for interface in interfaces {
            ctx.add_edge(DependencyKind::Implements, &name, interface);
        }
    }
    Ok(())
}

/// Records: components become fields ahead of the body's own members.
fn extract_records(ctx: &mut FileContext<'_>) -> Result<()> {
    let package = package(ctx);
    for m in ctx.query("(record_declaration name: (identifier) @record.name) @record.def")? {
        let (Some(name), Some(def)) = (m.node("record.name"), m.node("record.def")) else {
            continue;
        };
        let name = ctx.text(&name);
        let mut children = Vec::new();
        if let Some(parameters) = def.child_by_field_name("parameters") {
            let mut cursor = parameters.walk();
            let components: Vec<_> = parameters
                .named_children(&mut cursor)
                .filter(|p| p.kind() == node_kinds::FORMAL_PARAMETER)
                .collect();
            for component in components {
                if let Some(field) = member_name(ctx, &component) {
                    children.push(ParsedSymbol::new(
                        field,
                        SymbolKind::Field,
                        collapse_whitespace(&ctx.text(&component)),
                        ctx.span(&component),
                    ));
                }
            }
        }
        if let Some(body) = child_of_kind(&def, node_kinds::CLASS_BODY) {
            children.extend(body_members(ctx, &body));
        }
        let interfaces = clause_types(ctx, &def, node_kinds::SUPER_INTERFACES);

        let symbol = ParsedSymbol::new(qualify(&package, &name), SymbolKind::Record, head_signature(&ctx.text(&def), false), ctx.span(&def))
            .with_docstring(ctx.doc(&def, COMMENTS))
            .with_children(children);
        ctx.symbols.push(symbol);

        for interface in interfaces {
            ctx.add_edge(DependencyKind::Implements, &name, interface);
        }
    }
    Ok(())
}

/// Name of the declaration an annotation is attached to.
fn annotation_target(ctx: &FileContext<'_>, annotation: &Node<'_>) -> Option<String> {
    let mut current = annotation.parent();
    while let Some(node) = current {
        match node.kind() {
            node_kinds::CLASS_DECLARATION
            | node_kinds::INTERFACE_DECLARATION
            | node_kinds::ENUM_DECLARATION
            | node_kinds::RECORD_DECLARATION
            | node_kinds::METHOD_DECLARATION
            | node_kinds::CONSTRUCTOR_DECLARATION
            | "annotation_type_declaration" => return member_name(ctx, &node),
            node_kinds::FIELD_DECLARATION => {
                return child_of_kind(&node, node_kinds::VARIABLE_DECLARATOR)
                    .and_then(|declarator| member_name(ctx, &declarator));
            }
            _ => current = node.parent(),
        }
    }
    None
}

fn extract_annotations(ctx: &mut FileContext<'_>) -> Result<()> {
    for m in ctx.query("(annotation_type_declaration name: (identifier) @annotation.name) @annotation.def")? {
        let (Some(name), Some(def)) = (m.node("annotation.name"), m.node("annotation.def")) else {
            continue;
        };
        let symbol = ParsedSymbol::new(ctx.text(&name), SymbolKind::Annotation, head_signature(&ctx.text(&def), false), ctx.span(&def))
            .with_docstring(ctx.doc(&def, COMMENTS));
        ctx.symbols.push(symbol);
    }

    let usages = r"[
        (marker_annotation name: (identifier) @annotation.usage)
        (annotation name: (identifier) @annotation.usage)
    ]";
    let mut seen = HashSet::new();
    for m in ctx.query(usages)? {
        let Some(usage) = m.node("annotation.usage") else {
            continue;
        };
        let annotation = ctx.text(&usage);
        let Some(target) = annotation_target(ctx, &usage) else {
            continue;
        };
        if seen.insert((target.clone(), annotation.clone())) {
            ctx.add_edge(DependencyKind::AnnotatedWith, target, annotation);
        }
    }
    Ok(())
}

fn extract_calls(ctx: &mut FileContext<'_>) -> Result<()> {
    let pattern = r"[
        (method_invocation name: (identifier) @call.target)
        (object_creation_expression type: [(type_identifier) (generic_type) (scoped_type_identifier)] @call.target)
    ]";
    for m in ctx.query(pattern)? {
        let Some(target) = m.node("call.target") else {
            continue;
        };
        let Some(caller) = ctx.enclosing_declaration(&target, CALLERS) else {
            continue;
        };
        let target = strip_generics(&ctx.text(&target)).to_string();
        ctx.add_edge(DependencyKind::Call, caller, target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::test_support::extract_clean;
    use crate::types::ParsedFile;
    use rstest::rstest;
    use std::path::PathBuf;

    fn extract_at(path: &str, code: &str) -> ParsedFile {
        let mut extractor = JavaExtractor::new().unwrap();
        extract_clean(&mut extractor, path, "java", code)
    }

    fn extract(code: &str) -> ParsedFile {
        extract_at("src/main/java/com/example/app/Main.java", code)
    }

    #[rstest]
    #[case("src/main/java/com/example/User.java", "com.example")]
    #[case("src/test/java/com/example/UserTest.java", "com.example")]
    #[case("module/src/org/acme/Tool.java", "org.acme")]
    #[case("src/main/java/Main.java", "")]
    #[case("scripts/Run.java", "")]
    #[case("tools/mysrc/org/acme/Tool.java", "")]
    #[case("mysrc/src/org/acme/Tool.java", "org.acme")]
    fn package_inference(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(infer_package(&PathBuf::from(path), JAVA_SOURCE_ROOTS), expected);
    }

    #[test]
    fn declared_package_qualifies_types() {
        let parsed = extract("package com.example.model;\n\npublic class User {}\n");
        assert_eq!(
            parsed.find_symbol("com.example.model").map(|s| s.kind),
            Some(SymbolKind::Package)
        );
        assert!(parsed.find_symbol("com.example.model.User").is_some());
    }

    #[test]
    fn package_inferred_from_path_when_missing() {
        let parsed = extract("class Helper {}\n");
        assert!(parsed.find_symbol("com.example.app").is_some());
        assert!(parsed.find_symbol("com.example.app.Helper").is_some());
    }

    #[test]
    fn records_list_components_then_members() {
        let parsed = extract(
            "package com.example.app;\n\n/** A point. */\n@Immutable\npublic record Point(int x, int y) implements Comparable<Point> {\n    public double norm() { return Math.hypot(x, y); }\n}\n",
        );
        let point = parsed.find_symbol("com.example.app.Point").unwrap();
        assert_eq!(point.kind, SymbolKind::Record);
        assert!(point.signature.ends_with("public record Point(int x, int y) implements Comparable<Point>"));
        assert_eq!(point.docstring, "A point.");
        let members: Vec<_> = point.children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            members,
            vec![
                ("x", SymbolKind::Field),
                ("y", SymbolKind::Field),
                ("norm", SymbolKind::Method),
            ]
        );
        assert!(parsed.has_edge(DependencyKind::Implements, "Point", "Comparable"));
        assert!(parsed.has_edge(DependencyKind::AnnotatedWith, "Point", "Immutable"));
        assert!(parsed.has_edge(DependencyKind::Call, "norm", "hypot"));
    }

    #[test]
    fn imports_are_classified_against_package() {
        let parsed = extract(
            "package com.example.app;\n\nimport java.util.List;\nimport java.util.*;\nimport com.example.model.User;\nimport static org.junit.Assert.assertEquals;\n",
        );
        let imports: Vec<_> = parsed
            .dependencies_of(DependencyKind::Import)
            .map(|d| (d.target.as_str(), d.is_external, d.source.as_str()))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("java.util.List", false, "com.example.app"),
                ("java.util.*", false, "com.example.app"),
                ("com.example.model.User", false, "com.example.app"),
                ("org.junit.Assert.assertEquals", true, "com.example.app"),
            ]
        );
    }

    #[test]
    fn class_members_and_inheritance() {
        let parsed = extract(
            "package com.example;\n\n/**\n * A user service.\n */\npublic class UserService extends BaseService<User> implements Repository<User>, Closeable {\n    private final Db db, cache;\n\n    public UserService(Db db) {\n        this.db = db;\n    }\n\n    /** Finds a user. */\n    public User find(String id) {\n        return db.load(id);\n    }\n}\n",
        );
        let service = parsed.find_symbol("com.example.UserService").unwrap();
        assert_eq!(service.docstring, "A user service.");
        assert_eq!(
            service.signature,
            "public class UserService extends BaseService<User> implements Repository<User>, Closeable"
        );
        let members: Vec<_> = service.children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            members,
            vec![
                ("db", SymbolKind::Field),
                ("cache", SymbolKind::Field),
                ("find", SymbolKind::Method),
                ("UserService", SymbolKind::Constructor),
            ]
        );
        assert_eq!(service.child("find").unwrap().docstring, "Finds a user.");

        assert!(parsed.has_edge(DependencyKind::Extends, "UserService", "BaseService"));
        assert!(parsed.has_edge(DependencyKind::Implements, "UserService", "Repository"));
        assert!(parsed.has_edge(DependencyKind::Implements, "UserService", "Closeable"));
        assert!(parsed.has_edge(DependencyKind::Call, "find", "load"));
    }

    #[test]
    fn interfaces_and_enums() {
        let parsed = extract(
            "package com.example;\n\ninterface Shape extends Comparable<Shape> {\n    double area();\n}\n\nenum Color implements Named {\n    RED, GREEN(\"g\");\n\n    String label() { return name(); }\n}\n",
        );
        let shape = parsed.find_symbol("com.example.Shape").unwrap();
        assert_eq!(shape.kind, SymbolKind::Interface);
        assert_eq!(shape.children[0].name, "area");
        assert!(parsed.has_edge(DependencyKind::Extends, "Shape", "Comparable"));

        let color = parsed.find_symbol("com.example.Color").unwrap();
        let constants: Vec<_> = color
            .children
            .iter()
            .filter(|c| c.kind == SymbolKind::EnumConstant)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(constants, vec!["RED", "GREEN"]);
        assert!(color.child("label").is_some());
        assert!(parsed.has_edge(DependencyKind::Implements, "Color", "Named"));
        assert!(parsed.has_edge(DependencyKind::Call, "label", "name"));
    }

    #[test]
    fn annotation_types_and_usages() {
        let parsed = extract(
            "package com.example;\n\npublic @interface Audited {}\n\n@Service\npublic class Billing {\n    @Inject\n    private Clock clock;\n\n    @Override\n    @SuppressWarnings(\"unchecked\")\n    public String toString() { return \"\"; }\n\n    @Override\n    public int hashCode() { return 1; }\n}\n",
        );
        assert_eq!(parsed.find_symbol("Audited").map(|s| s.kind), Some(SymbolKind::Annotation));
        assert!(parsed.has_edge(DependencyKind::AnnotatedWith, "Billing", "Service"));
        assert!(parsed.has_edge(DependencyKind::AnnotatedWith, "clock", "Inject"));
        assert!(parsed.has_edge(DependencyKind::AnnotatedWith, "toString", "Override"));
        assert!(parsed.has_edge(DependencyKind::AnnotatedWith, "toString", "SuppressWarnings"));
        assert!(parsed.has_edge(DependencyKind::AnnotatedWith, "hashCode", "Override"));
    }

    #[test]
    fn constructor_calls_strip_generics() {
        let parsed = extract(
            "class A {\n    void run() {\n        List<String> xs = new ArrayList<String>();\n        helper();\n    }\n}\n",
        );
        assert!(parsed.has_edge(DependencyKind::Call, "run", "ArrayList"));
        assert!(parsed.has_edge(DependencyKind::Call, "run", "helper"));
    }
}

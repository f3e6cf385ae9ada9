//! Domain types for extraction.
//!
//! These types are the shared vocabulary between the pool, the extractors and
//! downstream consumers:
//! - **Input**: `ScannedFile` (produced by an external scanner)
//! - **Output**: `ParsedFile`, `ParsedSymbol`, `ParsedDependency`
//! - **Classifiers**: `Language`, `SymbolKind`, `DependencyKind`
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Input language | String tag | Scanner tags are free-form and aliased ("kt", "c++") |
//! | Output language | `Language` enum | Only resolved tags produce a `ParsedFile` |
//! | Symbol kind | Closed enum | Every kind an extractor emits is listed here |
//! | Tree handle | Not stored | Trees never outlive a single `extract` call |
//! | Dependency endpoints | Plain names | Resolution is heuristic, not a link |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Strongly-typed ID wrappers
// ============================================================================

/// Identifier of a syntax node inside one parse.
///
/// Used as the key of the per-parse declaration table that attributes calls
/// to their enclosing function. Only meaningful while the tree that produced
/// it is alive, so it never appears in any output type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl From<&tree_sitter::Node<'_>> for NodeId {
    fn from(node: &tree_sitter::Node<'_>) -> Self {
        Self(node.id())
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Go (`.go`)
    Go,
    /// JavaScript (`.js`, `.jsx`, `.mjs`, `.cjs`)
    JavaScript,
    /// TypeScript (`.ts`, `.tsx`)
    TypeScript,
    /// Python (`.py`, `.pyi`)
    Python,
    /// Kotlin (`.kt`, `.kts`)
    Kotlin,
    /// Java (`.java`)
    Java,
    /// Swift (`.swift`)
    Swift,
    /// Objective-C (`.m`)
    ObjC,
    /// Objective-C++ (`.mm`)
    ObjCpp,
    /// C (`.c`, `.h`)
    C,
    /// C++ (`.cpp`, `.hpp`, ...)
    Cpp,
}

impl Language {
    /// Every supported language, in registry order.
    pub const ALL: [Self; 11] = [
        Self::Go,
        Self::JavaScript,
        Self::TypeScript,
        Self::Python,
        Self::Kotlin,
        Self::Java,
        Self::Swift,
        Self::ObjC,
        Self::ObjCpp,
        Self::C,
        Self::Cpp,
    ];

    /// Resolve a scanner language tag.
    ///
    /// Matching is case-insensitive and accepts the common aliases
    /// (`"kt"`, `"c++"`, `"tsx"`, ...).
    ///
    /// # Returns
    ///
    /// `None` if the tag is not recognized.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "go" | "golang" => Some(Self::Go),
            "javascript" | "js" | "jsx" => Some(Self::JavaScript),
            "typescript" | "ts" | "tsx" => Some(Self::TypeScript),
            "python" | "py" => Some(Self::Python),
            "kotlin" | "kt" => Some(Self::Kotlin),
            "java" => Some(Self::Java),
            "swift" => Some(Self::Swift),
            "objc" | "objective-c" | "objectivec" => Some(Self::ObjC),
            "objcpp" | "objective-c++" | "objc++" => Some(Self::ObjCpp),
            "c" => Some(Self::C),
            "cpp" | "c++" | "cc" | "cxx" => Some(Self::Cpp),
            _ => None,
        }
    }

    /// File extensions handled by this language.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Go => &["go"],
            Self::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Self::TypeScript => &["ts", "tsx", "mts", "cts"],
            Self::Python => &["py", "pyi"],
            Self::Kotlin => &["kt", "kts"],
            Self::Java => &["java"],
            Self::Swift => &["swift"],
            Self::ObjC => &["m"],
            Self::ObjCpp => &["mm"],
            Self::C => &["c", "h"],
            Self::Cpp => &["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx"],
        }
    }

    /// Detect language from file extension.
    ///
    /// `.h` maps to C; callers that know a header belongs to a C++ or
    /// Objective-C project should tag it explicitly.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Kotlin => "kotlin",
            Self::Java => "java",
            Self::Swift => "swift",
            Self::ObjC => "objc",
            Self::ObjCpp => "objcpp",
            Self::C => "c",
            Self::Cpp => "cpp",
        }
    }

    /// Whether declarations and definitions live in separate paired files.
    #[must_use]
    pub fn has_paired_files(&self) -> bool {
        matches!(self, Self::C | Self::Cpp | Self::ObjC | Self::ObjCpp)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbol kinds emitted by the extractors.
///
/// Kinds are not normalized across languages: a Kotlin `data class` stays
/// `DataClass` and a C++ prototype stays `FunctionDeclaration`, because the
/// resolver and downstream consumers key off those distinctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    // Modules and namespaces
    /// Package declaration (Go, Java, Kotlin)
    Package,
    /// Module-level docstring holder (Python)
    Module,
    /// C++ namespace
    Namespace,

    // Types
    /// Class
    Class,
    /// Kotlin `data class`
    DataClass,
    /// Java `record`
    Record,
    /// Kotlin `sealed class`
    SealedClass,
    /// Kotlin `enum class`
    EnumClass,
    /// Kotlin `object`
    Object,
    /// Struct
    Struct,
    /// Interface (Java, Kotlin, Go, TypeScript, Objective-C `@interface`)
    Interface,
    /// Swift or Objective-C protocol
    Protocol,
    /// Enum
    Enum,
    /// Swift enum case
    EnumCase,
    /// Java enum constant or C enumerator
    EnumConstant,
    /// C union
    Union,
    /// C typedef
    Typedef,
    /// Go type definition
    Type,
    /// TypeScript type alias
    TypeAlias,
    /// Objective-C category
    Category,
    /// Objective-C `@implementation`
    Implementation,
    /// Swift extension
    Extension,
    /// Java annotation type or Kotlin annotation usage
    Annotation,

    // Templates and macros
    /// C++ template of unknown shape
    Template,
    /// C++ class template
    ClassTemplate,
    /// C++ function template
    FunctionTemplate,
    /// Object-like preprocessor macro
    Macro,
    /// Function-like preprocessor macro
    FunctionMacro,

    // Callables
    /// Free function
    Function,
    /// JS/Python `async` function
    AsyncFunction,
    /// JS generator function
    GeneratorFunction,
    /// JS arrow function bound to a variable
    ArrowFunction,
    /// JS `async` arrow function
    AsyncArrowFunction,
    /// C/C++ `static` function
    StaticFunction,
    /// C/C++ `inline` function
    InlineFunction,
    /// C/C++ prototype without a body
    FunctionDeclaration,
    /// Kotlin extension function
    ExtensionFunction,
    /// Kotlin `suspend` function
    SuspendFunction,
    /// Method
    Method,
    /// Static method
    StaticMethod,
    /// `async` method
    AsyncMethod,
    /// Python `@classmethod`
    ClassMethod,
    /// C++ virtual method
    VirtualMethod,
    /// Kotlin `suspend` method
    SuspendMethod,
    /// Objective-C method body inside `@implementation`
    MethodImplementation,
    /// Java constructor
    Constructor,
    /// C++ operator overload
    Operator,

    // Members
    /// Field
    Field,
    /// Property
    Property,
    /// Static property (JS class field)
    StaticProperty,
    /// Swift property with `willSet`/`didSet`
    PropertyObserver,

    /// JS/TS export statement
    Export,
}

impl SymbolKind {
    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Module => "module",
            Self::Namespace => "namespace",
            Self::Class => "class",
            Self::DataClass => "data_class",
            Self::Record => "record",
            Self::SealedClass => "sealed_class",
            Self::EnumClass => "enum_class",
            Self::Object => "object",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Protocol => "protocol",
            Self::Enum => "enum",
            Self::EnumCase => "enum_case",
            Self::EnumConstant => "enum_constant",
            Self::Union => "union",
            Self::Typedef => "typedef",
            Self::Type => "type",
            Self::TypeAlias => "type_alias",
            Self::Category => "category",
            Self::Implementation => "implementation",
            Self::Extension => "extension",
            Self::Annotation => "annotation",
            Self::Template => "template",
            Self::ClassTemplate => "class_template",
            Self::FunctionTemplate => "function_template",
            Self::Macro => "macro",
            Self::FunctionMacro => "function_macro",
            Self::Function => "function",
            Self::AsyncFunction => "async_function",
            Self::GeneratorFunction => "generator_function",
            Self::ArrowFunction => "arrow_function",
            Self::AsyncArrowFunction => "async_arrow_function",
            Self::StaticFunction => "static_function",
            Self::InlineFunction => "inline_function",
            Self::FunctionDeclaration => "function_declaration",
            Self::ExtensionFunction => "extension_function",
            Self::SuspendFunction => "suspend_function",
            Self::Method => "method",
            Self::StaticMethod => "static_method",
            Self::AsyncMethod => "async_method",
            Self::ClassMethod => "class_method",
            Self::VirtualMethod => "virtual_method",
            Self::SuspendMethod => "suspend_method",
            Self::MethodImplementation => "method_implementation",
            Self::Constructor => "constructor",
            Self::Operator => "operator",
            Self::Field => "field",
            Self::Property => "property",
            Self::StaticProperty => "static_property",
            Self::PropertyObserver => "property_observer",
            Self::Export => "export",
        }
    }

    /// C/C++ kinds that carry a function body.
    #[must_use]
    pub fn is_function_definition(&self) -> bool {
        matches!(
            self,
            Self::Function | Self::StaticFunction | Self::InlineFunction
        )
    }

    /// Kinds that live inside a class body and can be called.
    #[must_use]
    pub fn is_method(&self) -> bool {
        matches!(
            self,
            Self::Method
                | Self::StaticMethod
                | Self::AsyncMethod
                | Self::ClassMethod
                | Self::VirtualMethod
                | Self::SuspendMethod
                | Self::MethodImplementation
                | Self::Constructor
        )
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship kinds between two symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Import/include/require of a module or header
    Import,
    /// Call from the enclosing function to a target name
    Call,
    /// Base class, superclass, embedded or extended type
    Extends,
    /// Implemented interface
    Implements,
    /// Swift/Objective-C protocol conformance
    Conforms,
    /// C++ `override` method
    Overrides,
    /// Java annotation usage
    AnnotatedWith,
    /// Definition linked to its declaration in a paired file
    ImplementsDeclaration,
    /// Implementation file linked to its header
    ImplementsHeader,
    /// C++ template instantiation inside a declaration
    Uses,
}

impl DependencyKind {
    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Call => "call",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::Conforms => "conforms",
            Self::Overrides => "overrides",
            Self::AnnotatedWith => "annotated_with",
            Self::ImplementsDeclaration => "implements_declaration",
            Self::ImplementsHeader => "implements_header",
            Self::Uses => "uses",
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Value types
// ============================================================================

/// Source location of a symbol.
///
/// Lines and columns are 1-indexed; byte offsets are 0-indexed with an
/// exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Starting line (1-indexed)
    pub start_line: u32,
    /// Starting column (1-indexed)
    pub start_column: u32,
    /// Ending line (1-indexed, inclusive)
    pub end_line: u32,
    /// Ending column (1-indexed, exclusive)
    pub end_column: u32,
    /// Byte offset of the first byte
    pub start_byte: usize,
    /// Byte offset one past the last byte
    pub end_byte: usize,
}

/// A file handed to the pool by the external scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Path relative to the repository root
    pub path: PathBuf,
    /// Absolute path used to read the file
    pub abs_path: PathBuf,
    /// Language tag, resolved with [`Language::from_tag`]
    pub language: String,
    /// File size in bytes as reported by the scanner
    pub size: u64,
}

impl ScannedFile {
    /// Describe a file with an unknown size.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, abs_path: impl Into<PathBuf>, language: &str) -> Self {
        Self {
            path: path.into(),
            abs_path: abs_path.into(),
            language: language.to_string(),
            size: 0,
        }
    }

    /// Describe a file under `root`, deriving the absolute path.
    #[must_use]
    pub fn under(root: &Path, path: impl Into<PathBuf>, language: &str) -> Self {
        let path = path.into();
        let abs_path = root.join(&path);
        Self::new(path, abs_path, language)
    }
}

/// A declared symbol.
///
/// Types own their members through `children`; everything else is top-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSymbol {
    /// Name, fully qualified for package-scoped languages
    pub name: String,
    /// Kind of declaration
    pub kind: SymbolKind,
    /// Single-line textual summary of the declaration head
    pub signature: String,
    /// Location of the whole declaration
    pub span: Span,
    /// Cleaned documentation comment, empty when absent
    pub docstring: String,
    /// Members (methods, fields, cases)
    pub children: Vec<ParsedSymbol>,
}

impl ParsedSymbol {
    /// Create a symbol without documentation or children.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SymbolKind, signature: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            signature: signature.into(),
            span,
            docstring: String::new(),
            children: Vec::new(),
        }
    }

    /// Attach a docstring.
    #[must_use]
    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = docstring.into();
        self
    }

    /// Attach member symbols.
    #[must_use]
    pub fn with_children(mut self, children: Vec<ParsedSymbol>) -> Self {
        self.children = children;
        self
    }

    /// Find a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&ParsedSymbol> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// A directed, typed relationship between two names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedDependency {
    /// Relationship type
    pub kind: DependencyKind,
    /// Originating symbol name (empty for file-level imports)
    pub source: String,
    /// Target symbol, module or path
    pub target: String,
    /// Module the target lives in, set for imports
    pub target_module: String,
    /// Whether the target belongs to a third-party ecosystem
    pub is_external: bool,
}

impl ParsedDependency {
    /// Create a symbol-to-symbol edge.
    #[must_use]
    pub fn edge(kind: DependencyKind, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            target: target.into(),
            target_module: String::new(),
            is_external: false,
        }
    }

    /// Create a file-level import.
    #[must_use]
    pub fn import(module: impl Into<String>, is_external: bool) -> Self {
        let module = module.into();
        Self {
            kind: DependencyKind::Import,
            source: String::new(),
            target: module.clone(),
            target_module: module,
            is_external,
        }
    }
}

/// Extraction result for a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFile {
    /// Path relative to the repository root
    pub path: PathBuf,
    /// Resolved language
    pub language: Language,
    /// Raw file bytes
    #[serde(skip)]
    pub content: Vec<u8>,
    /// Top-level symbols in discovery order
    pub symbols: Vec<ParsedSymbol>,
    /// Dependencies in discovery order
    pub dependencies: Vec<ParsedDependency>,
}

impl ParsedFile {
    /// Create an empty result carrying only the file's identity and bytes.
    #[must_use]
    pub fn new(path: PathBuf, language: Language, content: Vec<u8>) -> Self {
        Self {
            path,
            language,
            content,
            symbols: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Find a symbol by name, searching top-level symbols then their children.
    #[must_use]
    pub fn find_symbol(&self, name: &str) -> Option<&ParsedSymbol> {
        self.symbols
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.symbols.iter().find_map(|s| s.child(name)))
    }

    /// Iterate dependencies of one kind.
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = &ParsedDependency> {
        self.dependencies.iter().filter(move |d| d.kind == kind)
    }

    /// Whether an edge `source -> target` of `kind` exists.
    #[must_use]
    pub fn has_edge(&self, kind: DependencyKind, source: &str, target: &str) -> bool {
        self.dependencies_of(kind)
            .any(|d| d.source == source && d.target == target)
    }
}

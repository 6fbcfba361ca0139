use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Name recorded for functions that have no binding of their own.
pub const ANONYMOUS: &str = "<anonymous>";

/// Line range of an extracted entity (1-based).
///
/// `end_line` is `None` when the extent is unknown, which is always the
/// case for regex-derived entities: the line pattern sees where a block
/// starts, never where it ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

impl Span {
    pub fn exact(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line: Some(end_line),
        }
    }

    pub fn approximate(line: usize) -> Self {
        Self {
            start_line: line,
            end_line: None,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.end_line.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub name: String,
    pub span: Span,
    pub params: Vec<String>,
    pub is_async: bool,
    /// Module-level or explicitly exported, i.e. callable from other files.
    #[serde(default)]
    pub is_exported: bool,
}

impl FunctionDefinition {
    pub fn is_anonymous(&self) -> bool {
        self.name == ANONYMOUS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    pub name: String,
    pub span: Span,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    /// Module specifier exactly as written, e.g. `./utils` or `.models`.
    pub source: String,
    /// Names bound locally by the import.
    pub specifiers: Vec<String>,
    pub line: usize,
    pub is_default: bool,
}

impl ImportStatement {
    /// Only relative specifiers are resolvable inside a project.
    pub fn is_relative(&self) -> bool {
        self.source.starts_with('.')
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorHandlingKind {
    TryCatch,
    PromiseCatch,
    IfError,
    DeferPanic,
}

impl ErrorHandlingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorHandlingKind::TryCatch => "try-catch",
            ErrorHandlingKind::PromiseCatch => "promise-catch",
            ErrorHandlingKind::IfError => "if-error",
            ErrorHandlingKind::DeferPanic => "defer-panic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlingBlock {
    pub kind: ErrorHandlingKind,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caught_variable: Option<String>,
}

/// Relation carried by a [`FileDependency`] edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Import,
    FunctionCall,
    ApiEndpoint,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Import => "import",
            RelationKind::FunctionCall => "function_call",
            RelationKind::ApiEndpoint => "api_endpoint",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct FileDependency {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: RelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl FileDependency {
    pub fn new(from: PathBuf, to: PathBuf, kind: RelationKind) -> Self {
        Self {
            from,
            to,
            kind,
            entity: None,
            line: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Upper-case HTTP method, or `ANY` when the registration does not say.
    pub method: String,
    pub path: String,
    pub file: PathBuf,
    pub handler: String,
    pub line: usize,
}

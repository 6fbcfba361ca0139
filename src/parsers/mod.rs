pub mod cache;
pub mod common;
pub mod javascript;
pub mod patterns;
pub mod python;
pub mod regex_fallback;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::{ClassDefinition, ErrorHandlingBlock, FunctionDefinition, ImportStatement};
use javascript::{Dialect, JavaScriptParser};
use python::PythonParser;
use regex_fallback::RegexAnalyzer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Go,
    Java,
    Rust,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Unknown,
}

impl Language {
    /// Every language with an extension mapping, in display order.
    pub const KNOWN: [Language; 11] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Go,
        Language::Java,
        Language::Rust,
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Ruby,
        Language::Php,
    ];

    /// Maps a file extension (without the dot, any case) to a language.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "py" | "pyi" | "pyw" => Language::Python,
            "go" => Language::Go,
            "java" => Language::Java,
            "rs" => Language::Rust,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            _ => Language::Unknown,
        }
    }

    pub fn detect(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Language::from_extension)
            .unwrap_or(Language::Unknown)
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::Python => &["py", "pyi", "pyw"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::Rust => &["rs"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
            Language::CSharp => &["cs"],
            Language::Ruby => &["rb"],
            Language::Php => &["php"],
            Language::Unknown => &[],
        }
    }

    /// All extensions the analyzer can classify.
    pub fn all_extensions() -> Vec<&'static str> {
        Language::KNOWN
            .iter()
            .flat_map(|language| language.extensions().iter().copied())
            .collect()
    }

    /// Languages analyzed through a full-syntax tree-sitter parse.
    pub fn has_precise_parser(self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::TypeScript | Language::Python
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Java => "java",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural facts extracted from one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub functions: Vec<FunctionDefinition>,
    pub classes: Vec<ClassDefinition>,
    pub imports: Vec<ImportStatement>,
    pub error_handling: Vec<ErrorHandlingBlock>,
}

/// Outcome of analyzing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    /// Full-syntax parse succeeded; spans are exact.
    Ast(Structure),
    /// Line patterns were used; spans are approximate.
    Regex(Structure),
    /// No pattern table exists for the language.
    Unsupported,
    /// The file could not be read.
    Unreadable,
}

impl Analysis {
    pub fn parse_method(&self) -> ParseMethod {
        match self {
            Analysis::Ast(_) => ParseMethod::Ast,
            Analysis::Regex(_) => ParseMethod::Regex,
            Analysis::Unsupported | Analysis::Unreadable => ParseMethod::None,
        }
    }

    pub fn into_structure(self) -> Structure {
        match self {
            Analysis::Ast(structure) | Analysis::Regex(structure) => structure,
            Analysis::Unsupported | Analysis::Unreadable => Structure::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
    Ast,
    Regex,
    None,
}

impl ParseMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMethod::Ast => "ast",
            ParseMethod::Regex => "regex",
            ParseMethod::None => "none",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodeAnalysisResult {
    pub path: PathBuf,
    pub language: Language,
    pub functions: Vec<FunctionDefinition>,
    pub classes: Vec<ClassDefinition>,
    pub imports: Vec<ImportStatement>,
    pub error_handling: Vec<ErrorHandlingBlock>,
    pub parse_method: ParseMethod,
}

impl CodeAnalysisResult {
    pub fn from_analysis(path: &Path, language: Language, analysis: Analysis) -> Self {
        let parse_method = analysis.parse_method();
        let structure = analysis.into_structure();
        Self {
            path: path.to_path_buf(),
            language,
            functions: structure.functions,
            classes: structure.classes,
            imports: structure.imports,
            error_handling: structure.error_handling,
            parse_method,
        }
    }

    /// Names of functions that can be referenced from other files.
    pub fn named_functions(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .filter(|function| !function.is_anonymous())
            .map(|function| function.name.as_str())
    }

    /// Named functions visible outside the file: module-level or exported
    /// definitions, never methods or nested closures.
    pub fn exported_functions(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .filter(|function| function.is_exported && !function.is_anonymous())
            .map(|function| function.name.as_str())
    }
}

/// A precise, grammar-backed analysis strategy.
pub trait LanguageParser {
    fn parse_source(&self, source: &str) -> Result<Structure>;
    fn language_name(&self) -> &str;
}

/// Structural analyzer for single files.
///
/// Languages with a precise parser go through tree-sitter first; any
/// failure there (grammar unavailable, syntax errors in the tree) drops
/// the file to the regex strategy. `analyze_file` never fails.
#[derive(Debug, Default, Clone)]
pub struct CodeAnalyzer {
    regex: RegexAnalyzer,
}

impl CodeAnalyzer {
    pub fn new() -> Self {
        Self {
            regex: RegexAnalyzer::new(),
        }
    }

    pub fn detect_language(&self, path: &Path) -> Language {
        Language::detect(path)
    }

    pub fn analyze_file(&self, path: &Path) -> CodeAnalysisResult {
        let language = Language::detect(path);
        let analysis = match fs::read_to_string(path) {
            Ok(source) => self.analyze_source(path, &source),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable file");
                Analysis::Unreadable
            }
        };
        CodeAnalysisResult::from_analysis(path, language, analysis)
    }

    /// Analyzes already-loaded source; `path` selects the language and dialect.
    pub fn analyze_source(&self, path: &Path, source: &str) -> Analysis {
        let language = Language::detect(path);

        if language.has_precise_parser() {
            if let Some(parser) = Self::precise_parser(path, language) {
                match parser.parse_source(source) {
                    Ok(structure) => return Analysis::Ast(structure),
                    Err(err) => {
                        debug!(
                            path = %path.display(),
                            parser = parser.language_name(),
                            error = %err,
                            "precise parse failed, falling back to regex"
                        );
                    }
                }
            }
        }

        match self.regex.analyze(language, source) {
            Some(structure) => Analysis::Regex(structure),
            None => Analysis::Unsupported,
        }
    }

    fn precise_parser(path: &Path, language: Language) -> Option<Box<dyn LanguageParser>> {
        match language {
            Language::JavaScript => Some(Box::new(JavaScriptParser::new(Dialect::JavaScript))),
            Language::TypeScript => {
                let is_tsx = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("tsx"));
                let dialect = if is_tsx {
                    Dialect::Tsx
                } else {
                    Dialect::TypeScript
                };
                Some(Box::new(JavaScriptParser::new(dialect)))
            }
            Language::Python => Some(Box::new(PythonParser::new())),
            _ => None,
        }
    }
}

use regex::{Captures, Regex};

use super::patterns::{patterns_for, PatternSet, EXPORT_KEYWORDS, NON_FUNCTION_KEYWORDS};
use super::{Language, Structure};
use crate::core::{
    ClassDefinition, ErrorHandlingBlock, ErrorHandlingKind, FunctionDefinition, ImportStatement,
    Span, ANONYMOUS,
};

/// Line-granular analyzer used when no precise parser applies.
///
/// Each entity is reported with an approximate span: the line it starts
/// on is known, its end is not.
#[derive(Debug, Default, Clone)]
pub struct RegexAnalyzer;

impl RegexAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` when the language has no pattern table.
    pub fn analyze(&self, language: Language, source: &str) -> Option<Structure> {
        let patterns = patterns_for(language)?;
        let mut structure = Structure::default();
        let mut in_go_import_block = false;

        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            if is_comment(language, line) {
                continue;
            }

            if language == Language::Go {
                let trimmed = line.trim();
                if trimmed.starts_with("import (") || trimmed == "import(" {
                    in_go_import_block = true;
                    continue;
                }
                if in_go_import_block {
                    if trimmed.starts_with(')') {
                        in_go_import_block = false;
                    } else if let Some(import) = self.match_import(language, patterns, line, line_number) {
                        structure.imports.push(import);
                    }
                    continue;
                }
            }

            if let Some(function) = self.match_function(language, patterns, line, line_number) {
                structure.functions.push(function);
            }
            if let Some(class) = self.match_class(patterns, line, line_number) {
                structure.classes.push(class);
            }
            if let Some(import) = self.match_import(language, patterns, line, line_number) {
                structure.imports.push(import);
            }
            if let Some(block) = self.match_error_handling(language, patterns, line, line_number) {
                structure.error_handling.push(block);
            }
        }

        Some(structure)
    }

    fn match_function(
        &self,
        language: Language,
        patterns: &PatternSet,
        line: &str,
        line_number: usize,
    ) -> Option<FunctionDefinition> {
        let caps = first_match(&patterns.functions, line, |caps| {
            caps.name("name")
                .map(|name| !NON_FUNCTION_KEYWORDS.contains(&name.as_str()))
                .unwrap_or(true)
        })?;

        let name = caps
            .name("name")
            .map(|name| name.as_str().to_string())
            .unwrap_or_else(|| ANONYMOUS.to_string());
        let params = caps
            .name("params")
            .or_else(|| caps.name("param"))
            .map(|raw| parameter_names(language, raw.as_str()))
            .unwrap_or_default();
        let prefix_end = caps.name("name").map(|name| name.start()).unwrap_or(line.len());
        let prefix = &line[..prefix_end];
        let is_async = caps.name("async").is_some() || contains_word(prefix, "async");
        let is_exported = !line.starts_with(char::is_whitespace)
            || EXPORT_KEYWORDS.iter().any(|keyword| contains_word(prefix, keyword));

        Some(FunctionDefinition {
            name,
            span: Span::approximate(line_number),
            params,
            is_async,
            is_exported,
        })
    }

    fn match_class(
        &self,
        patterns: &PatternSet,
        line: &str,
        line_number: usize,
    ) -> Option<ClassDefinition> {
        let caps = first_match(&patterns.classes, line, |_| true)?;
        Some(ClassDefinition {
            name: caps.name("name")?.as_str().to_string(),
            span: Span::approximate(line_number),
            methods: Vec::new(),
        })
    }

    fn match_import(
        &self,
        language: Language,
        patterns: &PatternSet,
        line: &str,
        line_number: usize,
    ) -> Option<ImportStatement> {
        let caps = first_match(&patterns.imports, line, |_| true)?;
        let module = caps.name("module")?.as_str().to_string();
        let (specifiers, is_default) = caps
            .name("names")
            .map(|names| import_names(language, names.as_str()))
            .unwrap_or_default();

        Some(ImportStatement {
            source: module,
            specifiers,
            line: line_number,
            is_default,
        })
    }

    fn match_error_handling(
        &self,
        language: Language,
        patterns: &PatternSet,
        line: &str,
        line_number: usize,
    ) -> Option<ErrorHandlingBlock> {
        let caps = first_match(&patterns.error_handling, line, |_| true)?;
        let caught_variable = ["var", "avar", "fvar"]
            .iter()
            .find_map(|group| caps.name(group))
            .map(|var| var.as_str().to_string())
            .or_else(|| (language == Language::Go && line.contains("err")).then(|| "err".to_string()));

        Some(ErrorHandlingBlock {
            kind: error_kind(language, line),
            span: Span::approximate(line_number),
            caught_variable,
        })
    }
}

fn first_match<'l>(
    patterns: &[Regex],
    line: &'l str,
    accept: impl Fn(&Captures<'l>) -> bool,
) -> Option<Captures<'l>> {
    patterns
        .iter()
        .filter_map(|pattern| pattern.captures(line))
        .find(|caps| accept(caps))
}

/// Infers the error-handling subtype from the matched line.
pub fn error_kind(language: Language, line: &str) -> ErrorHandlingKind {
    if line.contains(".catch(") || line.contains(".catch (") {
        return ErrorHandlingKind::PromiseCatch;
    }
    if language == Language::Go {
        if line.contains("defer") || line.contains("recover(") || line.contains("panic(") {
            return ErrorHandlingKind::DeferPanic;
        }
        return ErrorHandlingKind::IfError;
    }
    ErrorHandlingKind::TryCatch
}

fn is_comment(language: Language, line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with("*/") {
        return true;
    }
    if trimmed.starts_with("* ") || trimmed == "*" {
        return true;
    }
    match language {
        Language::Python | Language::Ruby => trimmed.starts_with('#'),
        Language::Php => trimmed.starts_with('#') && !trimmed.starts_with("#["),
        _ => false,
    }
}

fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|token| token == word)
}

/// Splits a parameter list on top-level commas.
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (index, c) in raw.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth -= 1,
            ',' if depth <= 0 => {
                parts.push(&raw[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn parameter_names(language: Language, raw: &str) -> Vec<String> {
    split_top_level(raw)
        .into_iter()
        .filter_map(|param| parameter_name(language, param))
        .collect()
}

fn parameter_name(language: Language, param: &str) -> Option<String> {
    if param.starts_with('{') || param.starts_with('[') {
        return Some(param.to_string());
    }
    let trim_sigils = |token: &str| {
        token
            .trim_start_matches("...")
            .trim_matches(|c: char| matches!(c, '*' | '&' | '[' | ']' | '$' | '?'))
            .to_string()
    };
    let before_default = param.split('=').next().unwrap_or(param);

    let name = match language {
        Language::Go => param.split_whitespace().next().map(trim_sigils),
        Language::Php => before_default
            .split_whitespace()
            .find(|token| token.trim_start_matches(['&', '.']).starts_with('$'))
            .map(trim_sigils),
        Language::Java | Language::C | Language::Cpp | Language::CSharp => {
            before_default.split_whitespace().last().map(trim_sigils)
        }
        _ => before_default
            .split(':')
            .next()
            .and_then(|head| head.split_whitespace().last())
            .map(trim_sigils),
    };

    name.filter(|name| !name.is_empty() && name != "void")
}

/// Parses the locally bound names of an import line.
///
/// Returns the names and whether a default binding is present.
fn import_names(language: Language, raw: &str) -> (Vec<String>, bool) {
    let raw = raw.trim().trim_end_matches(';');
    match language {
        Language::JavaScript | Language::TypeScript => {
            let mut names = Vec::new();
            let mut is_default = false;
            let (head, braces) = match (raw.find('{'), raw.rfind('}')) {
                (Some(open), Some(close)) if close > open => (
                    format!("{}{}", &raw[..open], &raw[close + 1..]),
                    Some(&raw[open + 1..close]),
                ),
                _ => (raw.to_string(), None),
            };
            for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                if let Some(alias) = part.strip_prefix('*') {
                    if let Some(alias) = alias.trim().strip_prefix("as") {
                        names.push(alias.trim().to_string());
                    }
                } else {
                    is_default = true;
                    names.push(part.to_string());
                }
            }
            if let Some(braces) = braces {
                names.extend(aliased_list(braces));
            }
            (names, is_default)
        }
        Language::Python => {
            let inner = raw.trim_start_matches('(').trim_end_matches(')');
            (aliased_list(inner), false)
        }
        Language::Rust => (aliased_list(raw), false),
        _ => (vec![raw.to_string()], false),
    }
}

/// `a, b as c, type d` -> `[a, c, d]`
fn aliased_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let local = match part.split_once(" as ") {
                Some((_, alias)) => alias,
                None => part.strip_prefix("type ").unwrap_or(part),
            };
            let local = local.trim();
            (!local.is_empty()).then(|| local.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_generic_parameters_at_top_level() {
        let names = parameter_names(Language::TypeScript, "a: Map<string, number>, b = 2, ...rest");
        assert_eq!(names, vec!["a", "b", "rest"]);
    }

    #[test]
    fn typed_languages_take_trailing_identifier() {
        assert_eq!(
            parameter_names(Language::Java, "final String name, int[] counts"),
            vec!["name", "counts"]
        );
        assert_eq!(
            parameter_names(Language::Go, "ctx context.Context, id int"),
            vec!["ctx", "id"]
        );
        assert_eq!(parameter_names(Language::Php, "?string $name = null"), vec!["name"]);
    }

    #[test]
    fn javascript_import_names_split_default_and_named() {
        let (names, is_default) = import_names(Language::JavaScript, "React, { useState, useEffect as ue }");
        assert!(is_default);
        assert_eq!(names, vec!["React", "useState", "ue"]);

        let (names, is_default) = import_names(Language::JavaScript, "* as path");
        assert!(!is_default);
        assert_eq!(names, vec!["path"]);
    }
}

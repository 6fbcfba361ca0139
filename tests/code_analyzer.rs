use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracelens::core::{ErrorHandlingKind, ANONYMOUS};
use tracelens::parsers::{Analysis, CodeAnalysisResult, CodeAnalyzer, Language, ParseMethod};

fn analyze(dir: &TempDir, name: &str, source: &str) -> CodeAnalysisResult {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    CodeAnalyzer::new().analyze_file(&path)
}

fn function_names(result: &CodeAnalysisResult) -> Vec<&str> {
    result.functions.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn detects_language_from_extension_case_insensitively() {
    let analyzer = CodeAnalyzer::new();
    assert_eq!(analyzer.detect_language(Path::new("a/b.jsx")), Language::JavaScript);
    assert_eq!(analyzer.detect_language(Path::new("View.TSX")), Language::TypeScript);
    assert_eq!(analyzer.detect_language(Path::new("tool.py")), Language::Python);
    assert_eq!(analyzer.detect_language(Path::new("main.go")), Language::Go);
    assert_eq!(analyzer.detect_language(Path::new("lib.hpp")), Language::Cpp);
    assert_eq!(analyzer.detect_language(Path::new("Makefile")), Language::Unknown);
    assert_eq!(analyzer.detect_language(Path::new("notes.txt")), Language::Unknown);
}

#[test]
fn every_known_extension_maps_in_any_case() {
    let analyzer = CodeAnalyzer::new();
    for language in Language::KNOWN {
        for extension in language.extensions() {
            for variant in [extension.to_string(), extension.to_ascii_uppercase()] {
                let path = format!("src/file.{variant}");
                assert_eq!(analyzer.detect_language(Path::new(&path)), language, "{path}");
            }
        }
    }
}

#[test]
fn deeply_nested_sources_are_analyzed_without_recursion() {
    let dir = TempDir::new().unwrap();
    let depth = 10_000;

    let nested = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    let js = analyze(
        &dir,
        "deep.js",
        &format!("export function build() {{\n  return {nested};\n}}\n"),
    );
    assert_ne!(js.parse_method, ParseMethod::None);
    assert!(function_names(&js).contains(&"build"));

    let py = analyze(
        &dir,
        "deep.py",
        &format!("def build():\n    return {nested}\n"),
    );
    assert_ne!(py.parse_method, ParseMethod::None);
    assert!(function_names(&py).contains(&"build"));
}

#[test]
fn only_module_level_and_exported_functions_are_exported() {
    let dir = TempDir::new().unwrap();
    let js = analyze(
        &dir,
        "store.js",
        r#"export function save(item) { return item; }
const load = () => 1;
function helper() {
  const inner = () => 2;
  return inner();
}
class Store {
  get(key) { return key; }
}
module.exports.reset = function () {};
"#,
    );
    let exported: Vec<&str> = js
        .functions
        .iter()
        .filter(|f| f.is_exported)
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(exported, vec!["save", "load", "helper", "reset"]);

    let py = analyze(
        &dir,
        "store.py",
        "import functools\n\n@functools.cache\ndef lookup(key):\n    def inner():\n        return key\n    return inner()\n\nclass Store:\n    def get(self, key):\n        return key\n",
    );
    let exported: Vec<&str> = py
        .functions
        .iter()
        .filter(|f| f.is_exported)
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(exported, vec!["lookup"]);
}

#[test]
fn only_javascript_typescript_and_python_use_the_precise_parser() {
    for language in Language::KNOWN {
        let expected = matches!(
            language,
            Language::JavaScript | Language::TypeScript | Language::Python
        );
        assert_eq!(language.has_precise_parser(), expected, "{language}");
    }
}

#[test]
fn javascript_structure_comes_from_the_syntax_tree() {
    let dir = TempDir::new().unwrap();
    let result = analyze(
        &dir,
        "user.js",
        r#"import fs from 'fs';
import { readFile, writeFile as wf } from './io';
const helper = require('./helper');

export async function loadUser(id, options = {}) {
  try {
    return await fetch(`/api/users/${id}`);
  } catch (err) {
    console.error(err);
  }
}

const add = (a, b) => a + b;

class UserService {
  constructor(repo) {
    this.repo = repo;
  }

  find(id) {
    return this.repo.get(id).catch(e => null);
  }
}
"#,
    );

    assert_eq!(result.parse_method, ParseMethod::Ast);
    assert_eq!(result.language, Language::JavaScript);

    let names = function_names(&result);
    for expected in ["loadUser", "add", "constructor", "find"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
    assert!(names.contains(&ANONYMOUS));

    let load_user = result.functions.iter().find(|f| f.name == "loadUser").unwrap();
    assert!(load_user.is_async);
    assert_eq!(load_user.params, vec!["id", "options"]);
    assert_eq!(load_user.span.start_line, 5);
    assert_eq!(load_user.span.end_line, Some(11));

    let add = result.functions.iter().find(|f| f.name == "add").unwrap();
    assert!(!add.is_async);
    assert_eq!(add.params, vec!["a", "b"]);

    assert_eq!(result.classes.len(), 1);
    assert_eq!(result.classes[0].name, "UserService");
    assert_eq!(result.classes[0].methods, vec!["constructor", "find"]);

    let sources: Vec<&str> = result.imports.iter().map(|i| i.source.as_str()).collect();
    assert_eq!(sources, vec!["fs", "./io", "./helper"]);
    assert!(result.imports[0].is_default);
    assert_eq!(result.imports[1].specifiers, vec!["readFile", "wf"]);
    assert!(!result.imports[1].is_default);
    assert_eq!(result.imports[2].specifiers, vec!["helper"]);
    assert_eq!(result.imports[2].line, 3);

    let try_catch = result
        .error_handling
        .iter()
        .find(|b| b.kind == ErrorHandlingKind::TryCatch)
        .unwrap();
    assert_eq!(try_catch.caught_variable.as_deref(), Some("err"));
    assert!(try_catch.span.is_exact());

    let promise_catch = result
        .error_handling
        .iter()
        .find(|b| b.kind == ErrorHandlingKind::PromiseCatch)
        .unwrap();
    assert_eq!(promise_catch.caught_variable.as_deref(), Some("e"));
}

#[test]
fn typescript_parameters_drop_type_annotations() {
    let dir = TempDir::new().unwrap();
    let result = analyze(
        &dir,
        "greet.ts",
        r#"interface User {
  id: number;
}

export function greet(user: User, loud?: boolean): string {
  return loud ? `HI ${user.id}` : `hi ${user.id}`;
}
"#,
    );

    assert_eq!(result.parse_method, ParseMethod::Ast);
    assert_eq!(result.language, Language::TypeScript);
    assert_eq!(result.classes[0].name, "User");
    let greet = result.functions.iter().find(|f| f.name == "greet").unwrap();
    assert_eq!(greet.params, vec!["user", "loud"]);
}

#[test]
fn python_structure_comes_from_the_syntax_tree() {
    let dir = TempDir::new().unwrap();
    let result = analyze(
        &dir,
        "repo.py",
        r#"import os
from .models import User, Order as O
from . import utils


class Repo:
    def __init__(self, db):
        self.db = db

    @property
    def name(self):
        return "repo"


async def fetch_user(user_id, retries=3):
    try:
        return await load(user_id)
    except ValueError as exc:
        raise
"#,
    );

    assert_eq!(result.parse_method, ParseMethod::Ast);
    assert_eq!(function_names(&result), vec!["__init__", "name", "fetch_user"]);

    let fetch_user = &result.functions[2];
    assert!(fetch_user.is_async);
    assert_eq!(fetch_user.params, vec!["user_id", "retries"]);

    assert_eq!(result.classes[0].name, "Repo");
    assert_eq!(result.classes[0].methods, vec!["__init__", "name"]);

    assert_eq!(result.imports.len(), 3);
    assert_eq!(result.imports[0].source, "os");
    assert_eq!(result.imports[1].source, ".models");
    assert_eq!(result.imports[1].specifiers, vec!["User", "O"]);
    assert!(result.imports[1].is_relative());
    assert_eq!(result.imports[2].source, ".");
    assert_eq!(result.imports[2].specifiers, vec!["utils"]);

    assert_eq!(result.error_handling.len(), 1);
    assert_eq!(result.error_handling[0].caught_variable.as_deref(), Some("exc"));
}

#[test]
fn go_is_analyzed_with_line_patterns() {
    let dir = TempDir::new().unwrap();
    let result = analyze(
        &dir,
        "server.go",
        r#"package main

import (
	"fmt"
	"net/http"
)

type Server struct {
	addr string
}

func (s *Server) Start(port int) error {
	if err := listen(port); err != nil {
		return err
	}
	return nil
}
"#,
    );

    assert_eq!(result.parse_method, ParseMethod::Regex);
    assert_eq!(result.language, Language::Go);

    assert_eq!(function_names(&result), vec!["Start"]);
    assert_eq!(result.functions[0].params, vec!["port"]);
    assert_eq!(result.functions[0].span.start_line, 12);
    assert!(!result.functions[0].span.is_exact());

    let modules: Vec<&str> = result.imports.iter().map(|i| i.source.as_str()).collect();
    assert_eq!(modules, vec!["fmt", "net/http"]);

    assert_eq!(result.classes[0].name, "Server");

    assert_eq!(result.error_handling.len(), 1);
    assert_eq!(result.error_handling[0].kind, ErrorHandlingKind::IfError);
    assert_eq!(result.error_handling[0].caught_variable.as_deref(), Some("err"));
}

#[test]
fn syntax_errors_fall_back_to_line_patterns() {
    let dir = TempDir::new().unwrap();
    let result = analyze(
        &dir,
        "broken.js",
        "function broken(a, b) {\n  return a +;\n}\n",
    );

    assert_eq!(result.parse_method, ParseMethod::Regex);
    assert_eq!(function_names(&result), vec!["broken"]);
    assert_eq!(result.functions[0].params, vec!["a", "b"]);
    assert_eq!(result.functions[0].span.end_line, None);
}

#[test]
fn unknown_and_unreadable_files_yield_empty_results() {
    let dir = TempDir::new().unwrap();
    let unknown = analyze(&dir, "notes.txt", "def looks_like_python():\n    pass\n");
    assert_eq!(unknown.parse_method, ParseMethod::None);
    assert!(unknown.functions.is_empty());

    let missing = CodeAnalyzer::new().analyze_file(&dir.path().join("missing.py"));
    assert_eq!(missing.parse_method, ParseMethod::None);
    assert_eq!(missing.language, Language::Python);
    assert!(missing.imports.is_empty());
}

#[test]
fn analyze_source_reports_the_strategy_used() {
    let analyzer = CodeAnalyzer::new();
    let ast = analyzer.analyze_source(Path::new("a.py"), "def f(x):\n    return x\n");
    assert!(matches!(ast, Analysis::Ast(_)));

    let regex = analyzer.analyze_source(Path::new("a.rb"), "def greet(name)\n  puts name\nend\n");
    match regex {
        Analysis::Regex(structure) => assert_eq!(structure.functions[0].name, "greet"),
        other => panic!("expected regex analysis, got {other:?}"),
    }

    assert_eq!(
        analyzer.analyze_source(Path::new("a.txt"), "hello"),
        Analysis::Unsupported
    );
}

#[test]
fn analysis_result_serializes_with_camel_case_fields() {
    let dir = TempDir::new().unwrap();
    let result = analyze(&dir, "a.py", "try:\n    pass\nexcept Exception as e:\n    pass\n");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["parseMethod"], "ast");
    assert_eq!(json["language"], "python");
    assert!(json["errorHandling"].is_array());
}

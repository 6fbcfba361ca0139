use anyhow::Result;
use tree_sitter::Node as TSNode;

use super::common::{
    extract_text, find_child_by_kind, has_async_keyword, named_children, span_of, walk_named,
    TreeSitterParser,
};
use super::{LanguageParser, Structure};
use crate::core::{
    ClassDefinition, ErrorHandlingBlock, ErrorHandlingKind, FunctionDefinition, ImportStatement,
    ANONYMOUS,
};

pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }

    /// Records `node` if it is one of the extracted kinds; children are
    /// reached through [`walk_named`].
    fn record(&self, node: TSNode, source: &[u8], out: &mut Structure) {
        match node.kind() {
            "function_definition" => {
                out.functions.push(FunctionDefinition {
                    name: node
                        .child_by_field_name("name")
                        .map(|name| extract_text(&name, source).to_string())
                        .unwrap_or_else(|| ANONYMOUS.to_string()),
                    span: span_of(&node),
                    params: self.parameter_names(&node, source),
                    is_async: has_async_keyword(&node),
                    is_exported: self.is_module_level(&node),
                });
            }
            "lambda" => {
                out.functions.push(FunctionDefinition {
                    name: ANONYMOUS.to_string(),
                    span: span_of(&node),
                    params: self.parameter_names(&node, source),
                    is_async: false,
                    is_exported: false,
                });
            }
            "class_definition" => out.classes.push(self.class_definition(&node, source)),
            "import_statement" => self.import_statement(&node, source, out),
            "import_from_statement" => self.import_from_statement(&node, source, out),
            "try_statement" => {
                out.error_handling.push(ErrorHandlingBlock {
                    kind: ErrorHandlingKind::TryCatch,
                    span: span_of(&node),
                    caught_variable: self.caught_variable(&node, source),
                });
            }
            _ => {}
        }
    }

    /// Defined directly in the module body, decorated or not.
    fn is_module_level(&self, node: &TSNode) -> bool {
        let parent = match node.parent() {
            Some(parent) if parent.kind() == "decorated_definition" => parent.parent(),
            parent => parent,
        };
        parent.is_some_and(|parent| parent.kind() == "module")
    }

    fn parameter_names(&self, node: &TSNode, source: &[u8]) -> Vec<String> {
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(&params)
            .iter()
            .filter_map(|param| self.parameter_name(param, source))
            .collect()
    }

    fn parameter_name(&self, param: &TSNode, source: &[u8]) -> Option<String> {
        match param.kind() {
            "identifier" => Some(extract_text(param, source).to_string()),
            "default_parameter" | "typed_default_parameter" => param
                .child_by_field_name("name")
                .map(|name| extract_text(&name, source).to_string()),
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => param
                .named_child(0)
                .and_then(|inner| self.parameter_name(&inner, source)),
            "keyword_separator" | "positional_separator" | "comment" => None,
            _ => Some(extract_text(param, source).to_string()),
        }
    }

    fn class_definition(&self, node: &TSNode, source: &[u8]) -> ClassDefinition {
        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for statement in named_children(&body) {
                let definition = match statement.kind() {
                    "decorated_definition" => statement.child_by_field_name("definition"),
                    _ => Some(statement),
                };
                if let Some(definition) = definition.filter(|d| d.kind() == "function_definition") {
                    if let Some(name) = definition.child_by_field_name("name") {
                        methods.push(extract_text(&name, source).to_string());
                    }
                }
            }
        }

        ClassDefinition {
            name: node
                .child_by_field_name("name")
                .map(|name| extract_text(&name, source).to_string())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            span: span_of(node),
            methods,
        }
    }

    /// `import a.b as c, d` yields one statement per module.
    fn import_statement(&self, node: &TSNode, source: &[u8], out: &mut Structure) {
        let line = node.start_position().row + 1;
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let (module, local) = self.aliased_name(&name, source);
            out.imports.push(ImportStatement {
                source: module,
                specifiers: vec![local],
                line,
                is_default: false,
            });
        }
    }

    fn import_from_statement(&self, node: &TSNode, source: &[u8], out: &mut Structure) {
        let Some(module) = node.child_by_field_name("module_name") else {
            return;
        };

        let mut specifiers = Vec::new();
        if find_child_by_kind(node, "wildcard_import").is_some() {
            specifiers.push("*".to_string());
        }
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            specifiers.push(self.aliased_name(&name, source).1);
        }

        out.imports.push(ImportStatement {
            source: extract_text(&module, source).to_string(),
            specifiers,
            line: node.start_position().row + 1,
            is_default: false,
        });
    }

    /// Returns `(module, locally bound name)` for `dotted_name` or `aliased_import`.
    fn aliased_name(&self, node: &TSNode, source: &[u8]) -> (String, String) {
        if node.kind() == "aliased_import" {
            let module = node
                .child_by_field_name("name")
                .map(|name| extract_text(&name, source).to_string())
                .unwrap_or_default();
            let alias = node
                .child_by_field_name("alias")
                .map(|alias| extract_text(&alias, source).to_string())
                .unwrap_or_else(|| module.clone());
            return (module, alias);
        }
        let module = extract_text(node, source).to_string();
        (module.clone(), module)
    }

    /// First `except ... as name` binding of a try statement.
    fn caught_variable(&self, try_node: &TSNode, source: &[u8]) -> Option<String> {
        for clause in named_children(try_node) {
            if clause.kind() != "except_clause" {
                continue;
            }
            let mut after_as = false;
            let mut cursor = clause.walk();
            for child in clause.children(&mut cursor) {
                match child.kind() {
                    "as" => after_as = true,
                    "as_pattern" => {
                        let target = child
                            .child_by_field_name("alias")
                            .or_else(|| child.named_child(child.named_child_count().saturating_sub(1)));
                        if let Some(target) = target {
                            return Some(extract_text(&target, source).to_string());
                        }
                    }
                    _ if after_as && child.is_named() => {
                        return Some(extract_text(&child, source).to_string());
                    }
                    _ => {}
                }
            }
        }
        None
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for PythonParser {
    fn parse_source(&self, source: &str) -> Result<Structure> {
        let mut parser = TreeSitterParser::new(tree_sitter_python::language())?;
        let tree = parser.parse_source(source)?;
        let source = source.as_bytes();
        let mut structure = Structure::default();
        walk_named(tree.root_node(), |node| self.record(node, source, &mut structure));
        Ok(structure)
    }

    fn language_name(&self) -> &str {
        "python"
    }
}

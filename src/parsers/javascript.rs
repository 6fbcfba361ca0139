use anyhow::Result;
use tree_sitter::{Language as Grammar, Node as TSNode};

use super::common::{
    extract_text, find_child_by_kind, has_async_keyword, named_children, span_of, strip_quotes,
    walk_named, TreeSitterParser,
};
use super::{LanguageParser, Structure};
use crate::core::{
    ClassDefinition, ErrorHandlingBlock, ErrorHandlingKind, FunctionDefinition, ImportStatement,
    ANONYMOUS,
};

/// Grammar flavour used for a file. JSX is part of the JavaScript grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Dialect {
    fn grammar(self) -> Grammar {
        match self {
            Dialect::JavaScript => tree_sitter_javascript::language(),
            Dialect::TypeScript => tree_sitter_typescript::language_typescript(),
            Dialect::Tsx => tree_sitter_typescript::language_tsx(),
        }
    }
}

pub struct JavaScriptParser {
    dialect: Dialect,
}

impl JavaScriptParser {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Records `node` if it is one of the extracted kinds; children are
    /// reached through [`walk_named`].
    fn record(&self, node: TSNode, source: &[u8], out: &mut Structure) {
        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function"
            | "function_expression"
            | "generator_function"
            | "arrow_function"
            | "method_definition" => {
                out.functions.push(self.function_definition(&node, source));
            }
            "class_declaration"
            | "abstract_class_declaration"
            | "class"
            | "interface_declaration" => {
                out.classes.push(self.class_definition(&node, source));
            }
            "import_statement" => {
                if let Some(import) = self.import_statement(&node, source) {
                    out.imports.push(import);
                }
            }
            "call_expression" => self.process_call(&node, source, out),
            "try_statement" => {
                let caught_variable = node
                    .child_by_field_name("handler")
                    .and_then(|handler| handler.child_by_field_name("parameter"))
                    .map(|param| extract_text(&param, source).to_string());
                out.error_handling.push(ErrorHandlingBlock {
                    kind: ErrorHandlingKind::TryCatch,
                    span: span_of(&node),
                    caught_variable,
                });
            }
            _ => {}
        }
    }

    fn function_definition(&self, node: &TSNode, source: &[u8]) -> FunctionDefinition {
        FunctionDefinition {
            name: self.function_name(node, source),
            span: span_of(node),
            params: self.parameter_names(node, source),
            is_async: has_async_keyword(node),
            is_exported: self.is_exported(node, source),
        }
    }

    /// Module-level definitions, `export`ed ones and members of an object
    /// assigned to `module.exports`. Class members never qualify.
    fn is_exported(&self, node: &TSNode, source: &[u8]) -> bool {
        let mut current = *node;
        let mut in_object = false;
        while let Some(parent) = current.parent() {
            match parent.kind() {
                "program" => return !in_object,
                "export_statement" => return true,
                "variable_declarator"
                | "lexical_declaration"
                | "variable_declaration"
                | "expression_statement"
                | "parenthesized_expression" => {}
                "pair" | "object" => in_object = true,
                "assignment_expression" => {
                    let target = parent
                        .child_by_field_name("left")
                        .map(|left| extract_text(&left, source))
                        .unwrap_or_default();
                    let exports = target == "exports"
                        || target == "module.exports"
                        || target.starts_with("exports.")
                        || target.starts_with("module.exports.");
                    if exports {
                        return true;
                    }
                    if in_object {
                        return false;
                    }
                }
                _ => return false,
            }
            current = parent;
        }
        false
    }

    /// Declarations carry their own name; expressions borrow the name of
    /// whatever binds them (variable, object key, class field, assignment).
    fn function_name(&self, node: &TSNode, source: &[u8]) -> String {
        if let Some(name) = node.child_by_field_name("name") {
            return extract_text(&name, source).to_string();
        }

        let Some(parent) = node.parent() else {
            return ANONYMOUS.to_string();
        };
        let binding = match parent.kind() {
            "variable_declarator" => parent.child_by_field_name("name"),
            "pair" => parent.child_by_field_name("key"),
            "assignment_expression" => parent.child_by_field_name("left"),
            "public_field_definition" => parent.child_by_field_name("name"),
            "field_definition" => parent.child_by_field_name("property"),
            _ => None,
        };

        match binding {
            Some(binding) if binding.kind() == "member_expression" => binding
                .child_by_field_name("property")
                .map(|property| extract_text(&property, source).to_string())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            Some(binding) if binding.kind() != "object_pattern" && binding.kind() != "array_pattern" => {
                strip_quotes(extract_text(&binding, source)).to_string()
            }
            _ => ANONYMOUS.to_string(),
        }
    }

    fn parameter_names(&self, node: &TSNode, source: &[u8]) -> Vec<String> {
        if let Some(params) = node.child_by_field_name("parameters") {
            return named_children(&params)
                .iter()
                .filter(|param| param.kind() != "comment")
                .map(|param| self.parameter_name(param, source))
                .filter(|name| !name.is_empty())
                .collect();
        }
        // Single unparenthesized arrow parameter: `x => x + 1`.
        node.child_by_field_name("parameter")
            .map(|param| vec![extract_text(&param, source).to_string()])
            .unwrap_or_default()
    }

    fn parameter_name(&self, param: &TSNode, source: &[u8]) -> String {
        let inner = match param.kind() {
            "assignment_pattern" => param.child_by_field_name("left"),
            "required_parameter" | "optional_parameter" => param.child_by_field_name("pattern"),
            "rest_pattern" => param.named_child(0),
            _ => None,
        };
        match inner {
            Some(inner) => self.parameter_name(&inner, source),
            None => extract_text(param, source).to_string(),
        }
    }

    fn class_definition(&self, node: &TSNode, source: &[u8]) -> ClassDefinition {
        let name = node
            .child_by_field_name("name")
            .map(|name| extract_text(&name, source).to_string())
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(&body) {
                match member.kind() {
                    "method_definition" | "method_signature" | "abstract_method_signature" => {
                        if let Some(method_name) = member.child_by_field_name("name") {
                            methods.push(extract_text(&method_name, source).to_string());
                        }
                    }
                    "public_field_definition" | "field_definition" => {
                        let holds_function = member
                            .child_by_field_name("value")
                            .is_some_and(|value| {
                                matches!(value.kind(), "arrow_function" | "function" | "function_expression")
                            });
                        let field_name = member
                            .child_by_field_name("name")
                            .or_else(|| member.child_by_field_name("property"));
                        if let (true, Some(field_name)) = (holds_function, field_name) {
                            methods.push(extract_text(&field_name, source).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }

        ClassDefinition {
            name,
            span: span_of(node),
            methods,
        }
    }

    fn import_statement(&self, node: &TSNode, source: &[u8]) -> Option<ImportStatement> {
        let module = node.child_by_field_name("source")?;
        let mut specifiers = Vec::new();
        let mut is_default = false;

        if let Some(clause) = find_child_by_kind(node, "import_clause") {
            for part in named_children(&clause) {
                match part.kind() {
                    "identifier" => {
                        is_default = true;
                        specifiers.push(extract_text(&part, source).to_string());
                    }
                    "namespace_import" => {
                        if let Some(alias) = find_child_by_kind(&part, "identifier") {
                            specifiers.push(extract_text(&alias, source).to_string());
                        }
                    }
                    "named_imports" => {
                        for specifier in named_children(&part) {
                            if specifier.kind() != "import_specifier" {
                                continue;
                            }
                            let local = specifier
                                .child_by_field_name("alias")
                                .or_else(|| specifier.child_by_field_name("name"));
                            if let Some(local) = local {
                                specifiers.push(extract_text(&local, source).to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Some(ImportStatement {
            source: strip_quotes(extract_text(&module, source)).to_string(),
            specifiers,
            line: node.start_position().row + 1,
            is_default,
        })
    }

    /// `require('x')` and `import('x')` count as imports; `.catch(...)` on a
    /// promise counts as error handling.
    fn process_call(&self, node: &TSNode, source: &[u8], out: &mut Structure) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let arguments = node.child_by_field_name("arguments");

        match function.kind() {
            "identifier" | "import" => {
                let callee = extract_text(&function, source);
                if callee != "require" && callee != "import" {
                    return;
                }
                let Some(first) = arguments.and_then(|args| args.named_child(0)) else {
                    return;
                };
                if first.kind() != "string" {
                    return;
                }
                out.imports.push(ImportStatement {
                    source: strip_quotes(extract_text(&first, source)).to_string(),
                    specifiers: self.require_bindings(node, source),
                    line: node.start_position().row + 1,
                    is_default: true,
                });
            }
            "member_expression" => {
                let is_catch = function
                    .child_by_field_name("property")
                    .is_some_and(|property| extract_text(&property, source) == "catch");
                if !is_catch {
                    return;
                }
                let caught_variable = arguments
                    .and_then(|args| args.named_child(0))
                    .and_then(|callback| self.parameter_names(&callback, source).into_iter().next());
                out.error_handling.push(ErrorHandlingBlock {
                    kind: ErrorHandlingKind::PromiseCatch,
                    span: span_of(node),
                    caught_variable,
                });
            }
            _ => {}
        }
    }

    fn require_bindings(&self, call: &TSNode, source: &[u8]) -> Vec<String> {
        let Some(declarator) = call
            .parent()
            .filter(|parent| parent.kind() == "variable_declarator")
        else {
            return Vec::new();
        };
        let Some(name) = declarator.child_by_field_name("name") else {
            return Vec::new();
        };
        match name.kind() {
            "object_pattern" => named_children(&name)
                .iter()
                .map(|binding| match binding.kind() {
                    "pair_pattern" => binding
                        .child_by_field_name("value")
                        .map(|value| extract_text(&value, source).to_string())
                        .unwrap_or_default(),
                    _ => extract_text(binding, source).to_string(),
                })
                .filter(|binding| !binding.is_empty())
                .collect(),
            _ => vec![extract_text(&name, source).to_string()],
        }
    }
}

impl LanguageParser for JavaScriptParser {
    fn parse_source(&self, source: &str) -> Result<Structure> {
        let mut parser = TreeSitterParser::new(self.dialect.grammar())?;
        let tree = parser.parse_source(source)?;
        let source = source.as_bytes();
        let mut structure = Structure::default();
        walk_named(tree.root_node(), |node| self.record(node, source, &mut structure));
        Ok(structure)
    }

    fn language_name(&self) -> &str {
        match self.dialect {
            Dialect::JavaScript => "javascript",
            Dialect::TypeScript | Dialect::Tsx => "typescript",
        }
    }
}

use anyhow::Result;
use tree_sitter::{Language, Node as TSNode, Parser, Tree};

use crate::core::Span;

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    /// Parses `source`, rejecting trees that contain syntax errors so the
    /// caller can fall back to a more forgiving strategy.
    pub fn parse_source(&mut self, source: &str) -> Result<Tree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("parser produced no tree"))?;
        let root = tree.root_node();
        if root.has_error() {
            anyhow::bail!(
                "syntax error near line {}",
                first_error_line(&root).unwrap_or(root.start_position().row + 1)
            );
        }
        Ok(tree)
    }
}

fn first_error_line(root: &TSNode) -> Option<usize> {
    let mut cursor = root.walk();
    'walk: loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    None
}

/// Pre-order walk over `root` and every named node below it, in source order.
/// Uses a cursor rather than recursion so nesting depth is bounded only by
/// the tree, not by the thread stack.
pub fn walk_named<'tree>(root: TSNode<'tree>, mut visit: impl FnMut(TSNode<'tree>)) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_named() {
            visit(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

pub fn span_of(node: &TSNode) -> Span {
    Span::exact(node.start_position().row + 1, node.end_position().row + 1)
}

pub fn find_child_by_kind<'a>(node: &TSNode<'a>, kind: &str) -> Option<TSNode<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

pub fn named_children<'a>(node: &TSNode<'a>) -> Vec<TSNode<'a>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

/// True when an anonymous `async` keyword is a direct child of `node`.
pub fn has_async_keyword(node: &TSNode) -> bool {
    find_child_by_kind(node, "async").is_some()
}

pub fn strip_quotes(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracelens::core::graph::summarize;
use tracelens::core::RelationKind;
use tracelens::DependencyGraph;

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    math: PathBuf,
    calc: PathBuf,
    app: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    let math = write(&root, "lib/math.js", "export function add(a, b) {\n  return a + b;\n}\n");
    let calc = write(
        &root,
        "src/calc.js",
        "import { add } from '../lib/math';\n\nexport function total(items) {\n  return items.reduce((acc, x) => add(acc, x), 0);\n}\n",
    );
    let app = write(
        &root,
        "src/app.js",
        "import { total } from './calc';\nconsole.log(total([1, 2, 3]));\n",
    );
    // Defines a function with the same name but never calls it.
    write(&root, "other/dupe.js", "export function add(x) {\n  return x;\n}\n");
    Fixture {
        _dir: dir,
        root,
        math,
        calc,
        app,
    }
}

#[test]
fn trace_follows_callers_up_the_chain() {
    let fx = fixture();
    let mut graph = DependencyGraph::for_project(&fx.root);

    let edges = graph.trace_function_calls("add", &fx.math, None);
    assert_eq!(edges.len(), 2);

    assert_eq!(edges[0].from, fx.calc);
    assert_eq!(edges[0].to, fx.math);
    assert_eq!(edges[0].kind, RelationKind::FunctionCall);
    assert_eq!(edges[0].entity.as_deref(), Some("add"));
    assert_eq!(edges[0].line, Some(4));

    assert_eq!(edges[1].from, fx.app);
    assert_eq!(edges[1].to, fx.calc);
    assert_eq!(edges[1].entity.as_deref(), Some("total"));
    assert_eq!(edges[1].line, Some(2));
}

#[test]
fn trace_depth_limits_the_levels_followed() {
    let fx = fixture();
    let mut graph = DependencyGraph::for_project(&fx.root);

    let edges = graph.trace_function_calls("add", &fx.math, Some(1));
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].from, fx.calc);

    assert!(graph.trace_function_calls("add", &fx.math, Some(0)).is_empty());
}

#[test]
fn definitions_are_not_call_sites() {
    let fx = fixture();
    let mut graph = DependencyGraph::for_project(&fx.root);

    let edges = graph.trace_function_calls("add", &fx.math, Some(1));
    assert!(edges.iter().all(|edge| !edge.from.ends_with("other/dupe.js")));
}

#[test]
fn unknown_function_has_no_callers() {
    let fx = fixture();
    let mut graph = DependencyGraph::for_project(&fx.root);
    assert!(graph
        .trace_function_calls("doesNotExist", &fx.math, None)
        .is_empty());
}

#[test]
fn trace_edges_build_a_file_graph() {
    let fx = fixture();
    let mut graph = DependencyGraph::for_project(&fx.root);
    let edges = graph.trace_function_calls("add", &fx.math, None);

    let edge_graph = DependencyGraph::edge_graph(&edges);
    assert_eq!(edge_graph.node_count(), 3);
    assert_eq!(edge_graph.edge_count(), 2);

    let summary = summarize(&edge_graph);
    assert_eq!(summary.files, 3);
    assert_eq!(summary.edges, 2);
    let (hub, incoming) = summary.hub.unwrap();
    assert_eq!(incoming, 1);
    assert!(hub == fx.math || hub == fx.calc);
}

use std::path::PathBuf;
use tracelens::core::graph::{summarize, GraphBuilder};
use tracelens::core::{ApiEndpoint, FileDependency, RelationKind};
use tracelens::formatters::{JsonFormatter, Report, TextFormatter};

fn edge(from: &str, to: &str, line: usize) -> FileDependency {
    FileDependency::new(PathBuf::from(from), PathBuf::from(to), RelationKind::FunctionCall)
        .with_entity("save")
        .with_line(line)
}

#[test]
fn graph_builder_deduplicates_files() {
    let mut builder = GraphBuilder::new();
    builder.extend([
        edge("/p/a.js", "/p/store.js", 3),
        edge("/p/b.js", "/p/store.js", 8),
        edge("/p/a.js", "/p/store.js", 9),
    ]);
    assert!(builder.node_index(std::path::Path::new("/p/store.js")).is_some());

    let graph = builder.build();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 3);

    let summary = summarize(&graph);
    assert_eq!(summary.hub, Some((PathBuf::from("/p/store.js"), 3)));
}

#[test]
fn text_output_shows_paths_relative_to_the_root() {
    let edges = vec![edge("/p/src/a.js", "/p/src/store.js", 3)];
    let summary = summarize(&tracelens::DependencyGraph::edge_graph(&edges));
    let text = TextFormatter::new().with_root("/p").format(&Report::Trace {
        function: "save",
        edges: &edges,
        summary: &summary,
    });

    assert!(text.starts_with("1 call site(s) leading to save\n"));
    assert!(text.contains("  src/a.js:3 -> src/store.js [function_call save]\n"));
    assert!(text.contains("graph: 2 file(s), 1 edge(s)\n"));
}

#[test]
fn json_output_keeps_camel_case_fields() {
    let endpoints = vec![ApiEndpoint {
        method: "GET".to_string(),
        path: "/api/users".to_string(),
        file: PathBuf::from("/p/routes.js"),
        handler: "listUsers".to_string(),
        line: 3,
    }];
    let rendered = JsonFormatter::compact()
        .format(&Report::Endpoints(&endpoints))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["count"], 1);
    assert_eq!(value["endpoints"][0]["handler"], "listUsers");
    assert!(!rendered.contains('\n'));

    let related = vec![PathBuf::from("/p/b.js")];
    let rendered = JsonFormatter::new()
        .format(&Report::RelatedFiles {
            origin: std::path::Path::new("/p/a.js"),
            files: &related,
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["related"][0], "/p/b.js");
}

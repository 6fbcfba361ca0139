use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::{Path, PathBuf};
use tracelens::DependencyGraph;

const MODULES: usize = 40;

/// A layered project: each module imports the next one and calls its
/// exported function, and every tenth module registers a route.
fn generate_project(root: &Path) -> PathBuf {
    fs::create_dir_all(root.join("src")).unwrap();
    for i in 0..MODULES {
        let next = (i + 1) % MODULES;
        let route = if i % 10 == 0 {
            format!("router.get('/api/items/{i}', handler{i});\n")
        } else {
            String::new()
        };
        let content = format!(
            r#"import {{ handler{next} }} from './module_{next}';

export async function handler{i}(req, res) {{
    try {{
        const data = await fetch('/api/items/{next}');
        return handler{next}(data);
    }} catch (err) {{
        res.status(500).send(err.message);
    }}
}}
{route}"#
        );
        fs::write(root.join("src").join(format!("module_{i}.js")), content).unwrap();
    }
    root.join("src").join("module_0.js")
}

fn benchmark_queries(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let origin = generate_project(dir.path());

    let mut group = c.benchmark_group("dependency_graph");

    group.bench_function("get_related_files", |b| {
        b.iter(|| {
            let mut graph = DependencyGraph::for_project(dir.path());
            black_box(graph.get_related_files(black_box(&origin)))
        })
    });

    group.bench_function("get_related_files_warm_cache", |b| {
        let mut graph = DependencyGraph::for_project(dir.path());
        b.iter(|| black_box(graph.get_related_files(black_box(&origin))))
    });

    group.bench_function("identify_api_endpoints", |b| {
        let graph = DependencyGraph::for_project(dir.path());
        b.iter(|| black_box(graph.identify_api_endpoints()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_queries);
criterion_main!(benches);

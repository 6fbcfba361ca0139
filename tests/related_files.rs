use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracelens::{DependencyGraph, GraphConfig};

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// m1 -> m2 -> m3 -> m4 -> m5, linked by imports only.
fn import_chain(root: &Path) -> Vec<PathBuf> {
    (1..=5)
        .map(|i| {
            let contents = if i < 5 {
                format!("import {{ v{next} }} from './m{next}';\nexport const v{i} = v{next} + 1;\n", next = i + 1)
            } else {
                "export const v5 = 5;\n".to_string()
            };
            write(root, &format!("m{i}.js"), &contents)
        })
        .collect()
}

#[test]
fn isolated_file_has_no_related_files() {
    let dir = TempDir::new().unwrap();
    let lonely = write(dir.path(), "lonely.js", "export const x = 1;\n");
    write(dir.path(), "other.js", "export const y = 2;\n");

    let mut graph = DependencyGraph::for_project(dir.path());
    assert!(graph.get_related_files(&lonely).is_empty());
}

#[test]
fn import_cycles_terminate_and_exclude_the_origin() {
    let dir = TempDir::new().unwrap();
    let x = write(dir.path(), "x.js", "import { y } from './y';\nexport const x = y;\n");
    let y = write(dir.path(), "y.js", "import { x } from './x';\nexport const y = x;\n");

    let mut graph = DependencyGraph::for_project(dir.path());
    assert_eq!(graph.get_related_files(&x), vec![y]);
}

#[test]
fn max_depth_bounds_the_traversal() {
    let dir = TempDir::new().unwrap();
    let chain = import_chain(dir.path());

    let mut shallow = DependencyGraph::new(GraphConfig::new(dir.path()).with_max_depth(2));
    assert_eq!(shallow.get_related_files(&chain[0]), chain[1..3].to_vec());

    let mut deep = DependencyGraph::new(GraphConfig::new(dir.path()).with_max_depth(4));
    assert_eq!(deep.get_related_files(&chain[0]), chain[1..5].to_vec());
}

#[test]
fn importers_are_related_in_reverse() {
    let dir = TempDir::new().unwrap();
    let chain = import_chain(dir.path());

    let mut graph = DependencyGraph::for_project(dir.path());
    let related = graph.get_related_files(&chain[4]);
    assert_eq!(related, chain[..4].to_vec());
}

#[test]
fn excluded_directories_never_appear() {
    let dir = TempDir::new().unwrap();
    let app = write(
        dir.path(),
        "app.js",
        "import pkg from './node_modules/pkg/index.js';\nexport const app = pkg;\n",
    );
    write(
        dir.path(),
        "node_modules/pkg/index.js",
        "import app from '../../app.js';\nexport default app;\n",
    );

    let mut graph = DependencyGraph::for_project(dir.path());
    assert!(graph.get_related_files(&app).is_empty());
}

#[test]
fn same_directory_files_come_first() {
    let dir = TempDir::new().unwrap();
    let handler = write(
        dir.path(),
        "src/api/handler.js",
        "import { format } from '../util/format.js';\nimport { validate } from './validate.js';\nexport const handler = 1;\n",
    );
    let format = write(dir.path(), "src/util/format.js", "export const format = 1;\n");
    let validate = write(dir.path(), "src/api/validate.js", "export const validate = 1;\n");
    let main = write(dir.path(), "main.js", "import { handler } from './src/api/handler.js';\n");

    let mut graph = DependencyGraph::for_project(dir.path());
    assert_eq!(graph.get_related_files(&handler), vec![validate, format, main]);
}

#[test]
fn call_sites_relate_files_without_imports() {
    let dir = TempDir::new().unwrap();
    let lib = write(dir.path(), "lib.py", "def compute_total(items):\n    return sum(items)\n");
    let script = write(dir.path(), "script.py", "print(compute_total([1, 2]))\n");
    write(dir.path(), "unrelated.py", "def compute_total_v2():\n    pass\n");

    let mut graph = DependencyGraph::for_project(dir.path());
    assert_eq!(graph.get_related_files(&lib), vec![script]);
}

#[test]
fn class_methods_do_not_relate_unrelated_callers() {
    let dir = TempDir::new().unwrap();
    let store = write(
        dir.path(),
        "store.js",
        "export class Store {\n  get(key) {\n    return key;\n  }\n}\n\nexport function createStore() {\n  return new Store();\n}\n",
    );
    write(dir.path(), "unrelated.js", "const m = new Map();\nm.get(1);\n");
    let app = write(dir.path(), "app.js", "const store = createStore();\n");

    let mut graph = DependencyGraph::for_project(dir.path());
    assert_eq!(graph.get_related_files(&store), vec![app]);
}

#[test]
fn python_relative_imports_resolve_to_modules() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    let service = write(dir.path(), "pkg/service.py", "from .models import User\n\nUSER = User\n");
    let models = write(dir.path(), "pkg/models.py", "class User:\n    pass\n");

    let mut graph = DependencyGraph::for_project(dir.path());
    assert_eq!(graph.get_related_files(&service), vec![models]);
}

#[test]
fn analyses_are_cached_per_instance() {
    let dir = TempDir::new().unwrap();
    let chain = import_chain(dir.path());

    let mut graph = DependencyGraph::for_project(dir.path());
    let first = graph.analyze(&chain[0]);
    let second = graph.analyze(&chain[0]);
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let stats = graph.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

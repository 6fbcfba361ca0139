use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracelens::core::resolver::ImportResolver;
use tracelens::core::scanner::{absolute_path, normalize_path, resolve_path, FileScanner};
use tracelens::core::ImportStatement;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

#[test]
fn scan_prunes_excluded_directories_and_filters_extensions() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "src/b.ts");
    touch(dir.path(), "src/a.JS");
    touch(dir.path(), "README.md");
    touch(dir.path(), "node_modules/lib/index.js");
    touch(dir.path(), "src/__pycache__/mod.py");

    let scanner = FileScanner::new(["js", ".ts", "py"], ["node_modules", "__pycache__"]);
    let files = scanner.scan_directory(dir.path());
    assert_eq!(files, vec![dir.path().join("src/a.JS"), dir.path().join("src/b.ts")]);
}

#[test]
fn exclusion_checks_directories_only() {
    let scanner = FileScanner::new(["js"], ["build"]);
    let root = Path::new("/project");
    assert!(scanner.is_excluded(root, Path::new("/project/build/out.js")));
    assert!(!scanner.is_excluded(root, Path::new("/project/src/build")));
    assert!(!scanner.is_excluded(root, Path::new("/project/src/app.js")));
}

#[test]
fn paths_normalize_lexically() {
    assert_eq!(normalize_path(Path::new("/a/b/../c/./d.js")), Path::new("/a/c/d.js"));
}

#[test]
fn resolver_tries_extensions_index_files_and_packages() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(root, "src/app.ts");
    touch(root, "src/util.ts");
    touch(root, "src/components/index.tsx");
    touch(root, "src/esm.ts");
    touch(root, "pkg/__init__.py");
    touch(root, "pkg/sub/worker.py");
    touch(root, "pkg/helpers.py");

    let extensions: Vec<String> = ["ts", "tsx", "js", "py"].iter().map(|e| e.to_string()).collect();
    let scanner = FileScanner::new(&extensions, ["node_modules"]);
    let resolver = ImportResolver::new(root, &extensions, scanner);
    let app = root.join("src/app.ts");

    assert_eq!(resolver.resolve(&app, "./util"), Some(root.join("src/util.ts")));
    assert_eq!(
        resolver.resolve(&app, "./components"),
        Some(root.join("src/components/index.tsx"))
    );
    assert_eq!(resolver.resolve(&app, "./esm.js"), Some(root.join("src/esm.ts")));
    assert_eq!(resolver.resolve(&app, "react"), None);
    assert_eq!(resolver.resolve(&app, "./missing"), None);
    assert_eq!(resolver.resolve(&app, "../../outside"), None);

    let worker = root.join("pkg/sub/worker.py");
    assert_eq!(resolver.resolve(&worker, ".."), Some(root.join("pkg/__init__.py")));
    assert_eq!(resolver.resolve(&worker, "..helpers"), Some(root.join("pkg/helpers.py")));

    let sibling_import = ImportStatement {
        source: "..".to_string(),
        specifiers: vec!["helpers".to_string()],
        line: 1,
        is_default: false,
    };
    let resolved = resolver.resolve_import(&worker, &sibling_import);
    assert_eq!(
        resolved,
        vec![root.join("pkg/__init__.py"), root.join("pkg/helpers.py")]
    );
}

#[test]
fn missing_paths_resolve_lexically() {
    let missing = Path::new("/no/such/dir/../file.js");
    assert_eq!(resolve_path(missing), absolute_path(missing));
    assert_eq!(resolve_path(missing), Path::new("/no/such/file.js"));
}

#[cfg(unix)]
#[test]
fn symlinked_paths_resolve_inside_the_canonical_root() {
    let dir = TempDir::new().unwrap();
    let real = dir.path().join("real");
    touch(&real, "a.js");
    fs::write(real.join("a.js"), "import { b } from './b';\nexport const a = b;\n").unwrap();
    touch(&real, "b.js");
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let root = real.canonicalize().unwrap();
    let origin = resolve_path(&link.join("a.js"));
    assert_eq!(origin, root.join("a.js"));

    let mut graph = tracelens::DependencyGraph::for_project(&root);
    assert_eq!(graph.get_related_files(&origin), vec![root.join("b.js")]);
}

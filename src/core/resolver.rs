use std::path::{Path, PathBuf};

use super::model::ImportStatement;
use super::scanner::{normalize_path, FileScanner};

/// File names tried when a specifier points at a directory.
const INDEX_STEMS: &[&str] = &["index"];
const PYTHON_PACKAGE_INIT: &str = "__init__.py";

/// Resolves relative import specifiers to files inside one project.
///
/// Package (bare) specifiers resolve to nothing: finding them needs
/// ecosystem-specific lookup rules this resolver does not implement.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    root: PathBuf,
    extensions: Vec<String>,
    scanner: FileScanner,
}

impl ImportResolver {
    pub fn new(root: &Path, extensions: &[String], scanner: FileScanner) -> Self {
        Self {
            root: normalize_path(root),
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            scanner,
        }
    }

    /// All project files an import statement of `from_file` refers to.
    ///
    /// `from . import a, b` in Python names sibling modules rather than a
    /// package, so each specifier is tried as its own module too.
    pub fn resolve_import(&self, from_file: &Path, import: &ImportStatement) -> Vec<PathBuf> {
        if !import.is_relative() {
            return Vec::new();
        }

        let mut resolved = Vec::new();
        if let Some(path) = self.resolve(from_file, &import.source) {
            resolved.push(path);
        }

        let is_python = from_file
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "py" | "pyi" | "pyw"));
        if is_python && import.source.chars().all(|c| c == '.') {
            for name in &import.specifiers {
                if name == "*" {
                    continue;
                }
                let specifier = format!("{}{}", import.source, name);
                if let Some(path) = self.resolve(from_file, &specifier) {
                    if !resolved.contains(&path) {
                        resolved.push(path);
                    }
                }
            }
        }

        resolved
    }

    /// Resolves one relative specifier against the directory of `from_file`.
    pub fn resolve(&self, from_file: &Path, specifier: &str) -> Option<PathBuf> {
        if !specifier.starts_with('.') {
            return None;
        }
        let base_dir = from_file.parent()?;
        let target = normalize_path(&base_dir.join(relative_target(specifier)));

        self.candidates(&target)
            .into_iter()
            .find(|candidate| candidate.is_file() && self.accepts(candidate))
    }

    fn candidates(&self, target: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![target.to_path_buf()];

        for ext in &self.extensions {
            candidates.push(append_extension(target, ext));
        }

        // ESM-style TypeScript imports spell the emitted `.js` extension.
        if let Some(stem_target) = strip_script_extension(target) {
            for ext in &self.extensions {
                candidates.push(append_extension(&stem_target, ext));
            }
        }

        for stem in INDEX_STEMS {
            for ext in &self.extensions {
                candidates.push(target.join(format!("{stem}.{ext}")));
            }
        }
        candidates.push(target.join(PYTHON_PACKAGE_INIT));
        candidates
    }

    /// Files outside the project or inside excluded directories never count.
    fn accepts(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && self.scanner.has_allowed_extension(path)
            && !self.scanner.is_excluded(&self.root, path)
    }
}

/// Turns a specifier into a path relative to the importing file's directory.
///
/// Slash-style (`./a/b`, `../c`, `.`) is used as is; dotted Python style
/// (`.a.b`, `..c`) climbs one directory per dot after the first.
fn relative_target(specifier: &str) -> PathBuf {
    if specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
    {
        return PathBuf::from(specifier);
    }

    let dots = specifier.chars().take_while(|c| *c == '.').count();
    let mut path = PathBuf::new();
    for _ in 1..dots {
        path.push("..");
    }
    for part in specifier[dots..].split('.').filter(|part| !part.is_empty()) {
        path.push(part);
    }
    path
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

fn strip_script_extension(path: &Path) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?;
    matches!(ext, "js" | "jsx" | "mjs" | "cjs").then(|| path.with_extension(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_python_specifiers_climb_per_extra_dot() {
        assert_eq!(relative_target(".models"), PathBuf::from("models"));
        assert_eq!(relative_target("..pkg.util"), PathBuf::from("../pkg/util"));
        assert_eq!(relative_target("./lib/x"), PathBuf::from("./lib/x"));
    }
}

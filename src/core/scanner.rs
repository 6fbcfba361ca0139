use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Walks a project tree, yielding source files with an allowed extension and
/// pruning excluded directories by name.
#[derive(Debug, Clone)]
pub struct FileScanner {
    extensions: HashSet<String>,
    excluded_dirs: HashSet<String>,
}

impl FileScanner {
    pub fn new<E, X>(extensions: E, excluded_dirs: X) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        X: IntoIterator,
        X::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
            excluded_dirs: excluded_dirs
                .into_iter()
                .map(|dir| dir.as_ref().to_string())
                .collect(),
        }
    }

    /// Every matching file under `root`, sorted for stable output.
    pub fn scan_directory(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded_entry(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(DirEntry::into_path)
            .filter(|path| self.has_allowed_extension(path))
            .collect();
        files.sort();
        files
    }

    pub fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }

    /// True when any directory component of `path` below `root` is excluded.
    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let mut components = relative.components().peekable();
        while let Some(component) = components.next() {
            // The final component is the file itself.
            if components.peek().is_none() {
                break;
            }
            if let Component::Normal(name) = component {
                if name
                    .to_str()
                    .is_some_and(|name| self.excluded_dirs.contains(name))
                {
                    return true;
                }
            }
        }
        false
    }

    fn is_excluded_entry(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.excluded_dirs.contains(name))
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Lexically normalizes a path: resolves `.` and `..` without touching the
/// filesystem, so symlinked roots keep the spelling the caller used.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Absolute, normalized form of `path`, relative paths being taken from the
/// current directory.
/// Symlink-free form of `path` when it exists, so it lines up with a
/// canonicalized project root; otherwise the lexical absolute path.
pub fn resolve_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| absolute_path(path))
}

pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize_path(&cwd.join(path)),
        Err(_) => normalize_path(path),
    }
}

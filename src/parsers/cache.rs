use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::CodeAnalysisResult;

/// Memoized structural analyses keyed by absolute path.
///
/// The cache belongs to exactly one owner and is never invalidated; a file
/// edited after its first analysis keeps its old entry until the owner is
/// dropped or calls [`AnalysisCache::clear`].
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<PathBuf, Arc<CodeAnalysisResult>>,
    hits: usize,
    misses: usize,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached analysis, or computes and stores it with `analyze`.
    pub fn get_or_insert_with(
        &mut self,
        path: &Path,
        analyze: impl FnOnce() -> CodeAnalysisResult,
    ) -> Arc<CodeAnalysisResult> {
        if let Some(entry) = self.entries.get(path) {
            self.hits += 1;
            debug!(path = %path.display(), "analysis cache hit");
            return Arc::clone(entry);
        }
        self.misses += 1;
        let entry = Arc::new(analyze());
        self.entries.insert(path.to_path_buf(), Arc::clone(&entry));
        entry
    }

    pub fn get(&self, path: &Path) -> Option<Arc<CodeAnalysisResult>> {
        self.entries.get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{Analysis, Language};

    fn unreadable(path: &Path) -> CodeAnalysisResult {
        CodeAnalysisResult::from_analysis(path, Language::JavaScript, Analysis::Unreadable)
    }

    #[test]
    fn second_lookup_is_a_hit() {
        let mut cache = AnalysisCache::new();
        let path = Path::new("/project/a.js");

        let first = cache.get_or_insert_with(path, || unreadable(path));
        let second = cache.get_or_insert_with(path, || panic!("analyzed twice"));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains(path));
        assert!(cache.get(Path::new("/project/b.js")).is_none());
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 0);
    }
}

use regex::Regex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::graph::{EdgeGraph, GraphBuilder};
use super::model::{ApiEndpoint, FileDependency, RelationKind};
use super::resolver::ImportResolver;
use super::routes::{normalize_route, scan_callers, scan_endpoints};
use super::scanner::{absolute_path, FileScanner};
use crate::parsers::cache::{AnalysisCache, CacheStats};
use crate::parsers::{CodeAnalysisResult, CodeAnalyzer, Language};

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_TRACE_DEPTH: usize = 3;

pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    ".next",
    ".nuxt",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".cache",
    "vendor",
];

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub project_root: PathBuf,
    /// Extensions without the leading dot, tried in this order.
    pub extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
    pub max_depth: usize,
}

impl GraphConfig {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: absolute_path(project_root.as_ref()),
            extensions: Language::all_extensions()
                .into_iter()
                .map(str::to_string)
                .collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS
                .iter()
                .map(|dir| dir.to_string())
                .collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_excluded_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Project-wide relationship queries around one file.
///
/// Holds a structural-analysis cache that is owned by this instance and
/// mutated by every query, hence the `&mut self` receivers. Use one
/// instance per worker.
pub struct DependencyGraph {
    config: GraphConfig,
    analyzer: CodeAnalyzer,
    scanner: FileScanner,
    resolver: ImportResolver,
    cache: AnalysisCache,
    resolved_imports: HashMap<PathBuf, Arc<Vec<PathBuf>>>,
}

impl DependencyGraph {
    pub fn new(config: GraphConfig) -> Self {
        let scanner = FileScanner::new(&config.extensions, &config.excluded_dirs);
        let resolver = ImportResolver::new(&config.project_root, &config.extensions, scanner.clone());
        Self {
            config,
            analyzer: CodeAnalyzer::new(),
            scanner,
            resolver,
            cache: AnalysisCache::new(),
            resolved_imports: HashMap::new(),
        }
    }

    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        Self::new(GraphConfig::new(project_root))
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cached structural analysis of `path`.
    pub fn analyze(&mut self, path: &Path) -> Arc<CodeAnalysisResult> {
        let path = absolute_path(path);
        let analyzer = &self.analyzer;
        self.cache
            .get_or_insert_with(&path, || analyzer.analyze_file(&path))
    }

    /// Every analyzable file of the project, excluded directories pruned.
    pub fn project_files(&self) -> Vec<PathBuf> {
        self.scanner.scan_directory(&self.config.project_root)
    }

    /// Files `file` imports through relative specifiers.
    pub fn forward_imports(&mut self, file: &Path) -> Arc<Vec<PathBuf>> {
        let file = absolute_path(file);
        if let Some(resolved) = self.resolved_imports.get(&file) {
            return Arc::clone(resolved);
        }

        let analysis = self.analyze(&file);
        let mut resolved = Vec::new();
        for import in &analysis.imports {
            for target in self.resolver.resolve_import(&file, import) {
                if target != file && !resolved.contains(&target) {
                    resolved.push(target);
                }
            }
        }

        let resolved = Arc::new(resolved);
        self.resolved_imports.insert(file, Arc::clone(&resolved));
        resolved
    }

    /// Project files whose own imports resolve to `file`.
    pub fn reverse_imports(&mut self, file: &Path, project_files: &[PathBuf]) -> Vec<PathBuf> {
        let file = absolute_path(file);
        let mut importers = Vec::new();
        for candidate in project_files {
            if *candidate == file {
                continue;
            }
            if self.forward_imports(candidate).contains(&file) {
                importers.push(candidate.clone());
            }
        }
        importers
    }

    /// Project files containing a call site of any function `file` exports.
    pub fn call_dependents(&mut self, file: &Path, project_files: &[PathBuf]) -> Vec<PathBuf> {
        let file = absolute_path(file);
        let analysis = self.analyze(&file);
        let names: Vec<&str> = analysis.exported_functions().collect();
        let Some(matcher) = CallMatcher::new(&names) else {
            return Vec::new();
        };

        project_files
            .iter()
            .filter(|candidate| **candidate != file)
            .filter(|candidate| {
                read_source(candidate)
                    .map(|source| source.lines().any(|line| matcher.is_call(line)))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Files related to `path` through imports, importers and call sites,
    /// closest directories first. The queried file itself is never included.
    ///
    /// Expansion is breadth-first so each file is reached at its shortest
    /// distance; files at `max_depth` are reported but not expanded.
    pub fn get_related_files(&mut self, path: &Path) -> Vec<PathBuf> {
        let origin = absolute_path(path);
        let project_files = self.project_files();
        let max_depth = self.config.max_depth;

        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        visited.insert(origin.clone());
        queue.push_back((origin.clone(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            let mut neighbours: Vec<PathBuf> = self.forward_imports(&current).to_vec();
            neighbours.extend(self.reverse_imports(&current, &project_files));
            neighbours.extend(self.call_dependents(&current, &project_files));

            for neighbour in neighbours {
                if self.scanner.is_excluded(&self.config.project_root, &neighbour) {
                    continue;
                }
                if visited.insert(neighbour.clone()) {
                    debug!(file = %neighbour.display(), depth = depth + 1, "related file");
                    queue.push_back((neighbour, depth + 1));
                }
            }
        }

        visited.remove(&origin);
        let mut related: Vec<PathBuf> = visited.into_iter().collect();
        sort_by_relevance(&origin, &mut related);
        debug!(
            origin = %origin.display(),
            related = related.len(),
            cached = self.cache.len(),
            "related files resolved"
        );
        related
    }

    /// Call chains leading to `function_name`, defined in `start_file`.
    ///
    /// Every caller line becomes an edge `caller -> definition file`; each
    /// caller's own named functions are then traced in turn until
    /// `max_depth` levels (default 3). A file is scanned at most once per
    /// trace, which keeps cyclic call graphs finite.
    pub fn trace_function_calls(
        &mut self,
        function_name: &str,
        start_file: &Path,
        max_depth: Option<usize>,
    ) -> Vec<FileDependency> {
        let start_file = absolute_path(start_file);
        let max_depth = max_depth.unwrap_or(DEFAULT_TRACE_DEPTH);
        let project_files = self.project_files();

        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(start_file.clone());
        let mut edges = Vec::new();
        let mut queue: VecDeque<(String, PathBuf, usize)> = VecDeque::new();
        queue.push_back((function_name.to_string(), start_file, 0));

        while let Some((name, definition_file, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let Some(matcher) = CallMatcher::new(&[name.as_str()]) else {
                continue;
            };

            for caller in &project_files {
                if *caller == definition_file || visited.contains(caller) {
                    continue;
                }
                let Some(source) = read_source(caller) else {
                    continue;
                };
                let call_lines: Vec<usize> = source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| matcher.is_call(line))
                    .map(|(index, _)| index + 1)
                    .collect();
                if call_lines.is_empty() {
                    continue;
                }

                visited.insert(caller.clone());
                for line in call_lines {
                    edges.push(
                        FileDependency::new(
                            caller.clone(),
                            definition_file.clone(),
                            RelationKind::FunctionCall,
                        )
                        .with_entity(name.clone())
                        .with_line(line),
                    );
                }

                let analysis = self.analyze(caller);
                for next in analysis.named_functions() {
                    queue.push_back((next.to_string(), caller.clone(), depth + 1));
                }
            }
        }

        edges
    }

    /// Route registrations across the whole project.
    pub fn identify_api_endpoints(&self) -> Vec<ApiEndpoint> {
        self.project_files()
            .iter()
            .filter_map(|file| read_source(file).map(|source| scan_endpoints(file, &source)))
            .flatten()
            .collect()
    }

    /// Files calling `route` through an HTTP client. Quoting style and a
    /// missing leading slash do not matter.
    ///
    /// Edges point at the handler file of a matching endpoint when the
    /// project defines one, otherwise at the normalized route itself.
    pub fn find_api_callers(&self, route: &str) -> Vec<FileDependency> {
        let route = normalize_route(route);
        let target = self
            .identify_api_endpoints()
            .into_iter()
            .find(|endpoint| normalize_route(&endpoint.path) == route)
            .map(|endpoint| endpoint.file)
            .unwrap_or_else(|| PathBuf::from(&route));

        let mut edges = Vec::new();
        for file in self.project_files() {
            let Some(source) = read_source(&file) else {
                continue;
            };
            for line in scan_callers(&source, &route) {
                edges.push(
                    FileDependency::new(file.clone(), target.clone(), RelationKind::ApiEndpoint)
                        .with_entity(route.clone())
                        .with_line(line),
                );
            }
        }
        edges
    }

    /// Collects dependency edges into a petgraph graph keyed by file.
    pub fn edge_graph(edges: &[FileDependency]) -> EdgeGraph {
        let mut builder = GraphBuilder::new();
        builder.extend(edges.iter().cloned());
        builder.build()
    }
}

/// Matches call sites of a fixed set of names while ignoring the lines
/// that define them.
struct CallMatcher {
    call: Regex,
    definition: Regex,
}

impl CallMatcher {
    fn new(names: &[&str]) -> Option<Self> {
        if names.is_empty() {
            return None;
        }
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let call = Regex::new(&format!(r"\b(?:{alternation})\s*\(")).ok()?;
        let definition =
            Regex::new(&format!(r"\b(?:function|def|func|fn)\s+\*?\s*(?:{alternation})\b")).ok()?;
        Some(Self { call, definition })
    }

    fn is_call(&self, line: &str) -> bool {
        self.call.is_match(line) && !self.definition.is_match(line)
    }
}

fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping unreadable file");
            None
        }
    }
}

/// Same directory as `origin` first, then anything under the origin's
/// parent directory, then the rest; alphabetical within each tier.
pub fn sort_by_relevance(origin: &Path, files: &mut [PathBuf]) {
    let origin_dir = origin.parent().unwrap_or(origin);
    let origin_parent = origin_dir.parent().unwrap_or(origin_dir);

    let tier = |file: &Path| -> u8 {
        let dir = file.parent().unwrap_or(file);
        if dir == origin_dir {
            0
        } else if dir.starts_with(origin_parent) {
            1
        } else {
            2
        }
    };

    files.sort_by(|a, b| match tier(a).cmp(&tier(b)) {
        Ordering::Equal => a.cmp(b),
        other => other,
    });
}

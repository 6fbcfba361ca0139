use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::Report;
use crate::core::{FileDependency, Span};
use crate::session::SessionState;

/// Human-readable output. Paths under the project root are shown relative
/// to it.
pub struct TextFormatter {
    root: Option<PathBuf>,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn format(&self, report: &Report) -> String {
        let mut out = String::new();
        match *report {
            Report::Analysis(analysis) => {
                let _ = writeln!(
                    out,
                    "{} [{}, parsed via {}]",
                    self.display(&analysis.path),
                    analysis.language,
                    analysis.parse_method.as_str()
                );
                section(&mut out, "functions", analysis.functions.len());
                for function in &analysis.functions {
                    let prefix = if function.is_async { "async " } else { "" };
                    let _ = writeln!(
                        out,
                        "  {prefix}{}({}) {}",
                        function.name,
                        function.params.join(", "),
                        span(&function.span)
                    );
                }
                section(&mut out, "classes", analysis.classes.len());
                for class in &analysis.classes {
                    let _ = write!(out, "  {} {}", class.name, span(&class.span));
                    if !class.methods.is_empty() {
                        let _ = write!(out, " [{}]", class.methods.join(", "));
                    }
                    out.push('\n');
                }
                section(&mut out, "imports", analysis.imports.len());
                for import in &analysis.imports {
                    let _ = write!(out, "  {} L{}", import.source, import.line);
                    if !import.specifiers.is_empty() {
                        let _ = write!(out, " {{{}}}", import.specifiers.join(", "));
                    }
                    out.push('\n');
                }
                section(&mut out, "error handling", analysis.error_handling.len());
                for block in &analysis.error_handling {
                    let _ = write!(out, "  {} {}", block.kind.as_str(), span(&block.span));
                    if let Some(variable) = &block.caught_variable {
                        let _ = write!(out, " ({variable})");
                    }
                    out.push('\n');
                }
            }
            Report::RelatedFiles { origin, files } => {
                let _ = writeln!(
                    out,
                    "{} related file(s) for {}",
                    files.len(),
                    self.display(origin)
                );
                for file in files {
                    let _ = writeln!(out, "  {}", self.display(file));
                }
            }
            Report::Trace {
                function,
                edges,
                summary,
            } => {
                let _ = writeln!(out, "{} call site(s) leading to {function}", edges.len());
                self.write_edges(&mut out, edges);
                let _ = writeln!(out, "graph: {} file(s), {} edge(s)", summary.files, summary.edges);
                if let Some((file, incoming)) = &summary.hub {
                    let _ = writeln!(out, "most called: {} ({incoming})", self.display(file));
                }
            }
            Report::Endpoints(endpoints) => {
                let _ = writeln!(out, "{} endpoint(s)", endpoints.len());
                for endpoint in endpoints {
                    let _ = writeln!(
                        out,
                        "  {:<7} {} -> {} ({}:{})",
                        endpoint.method,
                        endpoint.path,
                        endpoint.handler,
                        self.display(&endpoint.file),
                        endpoint.line
                    );
                }
            }
            Report::Callers { route, edges } => {
                let _ = writeln!(out, "{} caller(s) of {route}", edges.len());
                self.write_edges(&mut out, edges);
            }
            Report::Session(session) => self.write_session(&mut out, session),
            Report::Sessions(sessions) => {
                if sessions.is_empty() {
                    out.push_str("no sessions\n");
                }
                for session in sessions {
                    let _ = writeln!(
                        out,
                        "{}  {:<11} cycle {}  {}",
                        session.session_id(),
                        session.status,
                        session.cycle,
                        first_line(&session.issue)
                    );
                }
            }
        }
        out
    }

    fn write_edges(&self, out: &mut String, edges: &[FileDependency]) {
        for edge in edges {
            let _ = write!(out, "  {}", self.display(&edge.from));
            if let Some(line) = edge.line {
                let _ = write!(out, ":{line}");
            }
            let _ = write!(out, " -> {} [{}", self.display(&edge.to), edge.kind);
            if let Some(entity) = &edge.entity {
                let _ = write!(out, " {entity}");
            }
            out.push_str("]\n");
        }
    }

    fn write_session(&self, out: &mut String, session: &SessionState) {
        let _ = writeln!(out, "session  {}", session.session_id());
        let _ = writeln!(out, "status   {} (cycle {})", session.status, session.cycle);
        let _ = writeln!(out, "issue    {}", first_line(&session.issue));
        let _ = writeln!(out, "started  {}", session.started_at.to_rfc3339());
        let _ = writeln!(out, "updated  {}", session.last_updated.to_rfc3339());
        if let Some(branch) = &session.initial_branch {
            let _ = writeln!(out, "branch   {branch}");
        }
        if let Some(commit) = &session.initial_commit {
            let _ = writeln!(out, "commit   {commit}");
        }
        let _ = writeln!(
            out,
            "records  {} hypotheses, {} logs, {} findings, {} fixes, {} instrumented files",
            session.hypotheses.len(),
            session.logs.len(),
            session.research.len(),
            session.fixes.len(),
            session.instrumented_files.len()
        );
    }

    fn display(&self, path: &Path) -> String {
        let shown = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        shown.display().to_string()
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn section(out: &mut String, title: &str, count: usize) {
    if count > 0 {
        let _ = writeln!(out, "{title} ({count}):");
    }
}

fn span(span: &Span) -> String {
    match span.end_line {
        Some(end) if end != span.start_line => format!("L{}-{}", span.start_line, end),
        Some(_) => format!("L{}", span.start_line),
        None => format!("L{}~", span.start_line),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

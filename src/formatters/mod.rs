pub mod json;
pub mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use std::path::{Path, PathBuf};

use crate::core::graph::GraphSummary;
use crate::core::{ApiEndpoint, FileDependency};
use crate::parsers::CodeAnalysisResult;
use crate::session::SessionState;

/// One command's result, ready for rendering.
#[derive(Debug, Clone, Copy)]
pub enum Report<'a> {
    Analysis(&'a CodeAnalysisResult),
    RelatedFiles {
        origin: &'a Path,
        files: &'a [PathBuf],
    },
    Trace {
        function: &'a str,
        edges: &'a [FileDependency],
        summary: &'a GraphSummary,
    },
    Endpoints(&'a [ApiEndpoint]),
    Callers {
        route: &'a str,
        edges: &'a [FileDependency],
    },
    Session(&'a SessionState),
    Sessions(&'a [SessionState]),
}

use anyhow::Result;
use serde_json::{json, Value};

use super::Report;

/// Machine-readable output; analysis and session records keep their
/// camelCase schema.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn format(&self, report: &Report) -> Result<String> {
        let value = Self::to_value(report)?;
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(rendered)
    }

    fn to_value(report: &Report) -> Result<Value> {
        let value = match *report {
            Report::Analysis(analysis) => serde_json::to_value(analysis)?,
            Report::RelatedFiles { origin, files } => json!({
                "file": origin,
                "related": files,
                "count": files.len(),
            }),
            Report::Trace {
                function,
                edges,
                summary,
            } => json!({
                "function": function,
                "edges": edges,
                "graph": {
                    "files": summary.files,
                    "edges": summary.edges,
                    "hub": summary.hub.as_ref().map(|(file, incoming)| json!({
                        "file": file,
                        "incoming": incoming,
                    })),
                },
            }),
            Report::Endpoints(endpoints) => json!({
                "endpoints": endpoints,
                "count": endpoints.len(),
            }),
            Report::Callers { route, edges } => json!({
                "route": route,
                "callers": edges,
                "count": edges.len(),
            }),
            Report::Session(session) => serde_json::to_value(session)?,
            Report::Sessions(sessions) => serde_json::to_value(sessions)?,
        };
        Ok(value)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

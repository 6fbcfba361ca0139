//! Line matchers for HTTP route registrations and HTTP client calls.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

use super::model::{ApiEndpoint, ANONYMOUS};
use crate::parsers::patterns::NON_FUNCTION_KEYWORDS;

/// How far below a decorator or annotation the handler may start.
const HANDLER_LOOKAHEAD: usize = 6;

/// Method reported when a registration does not name one.
pub const ANY_METHOD: &str = "ANY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerSource {
    /// Handler identifier is captured on the registration line.
    Inline,
    /// Handler is the next `def` line (Python decorators).
    NextFunction,
    /// Handler is the next method signature (Java/TypeScript annotations).
    NextMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodSource {
    Captured,
    Any,
}

struct RouteMatcher {
    pattern: Regex,
    method: MethodSource,
    handler: HandlerSource,
}

impl RouteMatcher {
    fn new(pattern: &str, method: MethodSource, handler: HandlerSource) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(pattern) => Some(Self {
                pattern,
                method,
                handler,
            }),
            Err(err) => {
                tracing::warn!(pattern, error = %err, "dropping invalid route pattern");
                None
            }
        }
    }

    fn apply(&self, lines: &[&str], index: usize, file: &Path) -> Option<ApiEndpoint> {
        let caps = self.pattern.captures(lines[index])?;
        let path = caps.name("path")?.as_str().to_string();
        // Class-level mappings only prefix their methods' routes.
        if self.handler == HandlerSource::NextMethod && annotates_type(lines, index) {
            return None;
        }

        let handler = match self.handler {
            HandlerSource::Inline => caps
                .name("handler")
                .map(|handler| handler.as_str().to_string())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            HandlerSource::NextFunction => next_handler(lines, index, &NEXT_FUNCTION),
            HandlerSource::NextMethod => next_handler(lines, index, &NEXT_METHOD),
        };

        let method = match self.method {
            MethodSource::Any => ANY_METHOD.to_string(),
            MethodSource::Captured => resolve_method(&caps),
        };

        Some(ApiEndpoint {
            method,
            path,
            file: file.to_path_buf(),
            handler,
            line: index + 1,
        })
    }
}

/// Maps the captured verb to an HTTP method. Generic registrations
/// (`route`, `RequestMapping`, `all`) use an explicit method list when the
/// line has one.
fn resolve_method(caps: &Captures) -> String {
    let verb = caps
        .name("method")
        .map(|verb| verb.as_str().to_ascii_uppercase())
        .unwrap_or_default();
    let explicit = caps
        .name("rest")
        .and_then(|rest| EXPLICIT_METHOD.captures(rest.as_str()))
        .and_then(|m| m.name("verb"))
        .map(|verb| verb.as_str().to_ascii_uppercase());

    match verb.as_str() {
        "ROUTE" | "API_ROUTE" => explicit.unwrap_or_else(|| "GET".to_string()),
        "REQUEST" => explicit.unwrap_or_else(|| ANY_METHOD.to_string()),
        "ALL" | "" => ANY_METHOD.to_string(),
        _ => verb,
    }
}

fn next_handler(lines: &[&str], index: usize, pattern: &Regex) -> String {
    lines
        .iter()
        .skip(index + 1)
        .take(HANDLER_LOOKAHEAD)
        .filter(|line| !line.trim_start().starts_with('@'))
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.name("name").map(|name| name.as_str()))
        .find(|name| !NON_FUNCTION_KEYWORDS.contains(name))
        .map(str::to_string)
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

/// True when the first non-annotation line after `index` declares a type.
fn annotates_type(lines: &[&str], index: usize) -> bool {
    lines
        .iter()
        .skip(index + 1)
        .take(HANDLER_LOOKAHEAD)
        .map(|line| line.trim_start())
        .find(|line| !line.is_empty() && !line.starts_with('@'))
        .is_some_and(|line| TYPE_DECLARATION.is_match(line))
}

static TYPE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:(?:public|private|protected|abstract|final|static|sealed|export|default)\s+)*(?:class|interface|enum|record)\b"#,
    )
    .expect("valid type declaration pattern")
});

static EXPLICIT_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)methods?\s*=\s*\[?\s*(?:RequestMethod\.)?['"]?(?P<verb>get|post|put|patch|delete|head|options)\b"#)
        .expect("valid explicit-method pattern")
});

static NEXT_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?:async\s+)?def\s+(?P<name>\w+)"#).expect("valid def pattern"));

static NEXT_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*(?:(?:public|private|protected|static|final|async|synchronized|override)\s+)*(?:[\w<>\[\],.?]+\s+)?(?P<name>[A-Za-z_]\w*)\s*\("#,
    )
    .expect("valid method signature pattern")
});

/// Route registration matchers in priority order; the first hit on a line
/// wins.
static ROUTE_MATCHERS: Lazy<Vec<RouteMatcher>> = Lazy::new(|| {
    [
        // Express-style: app.get('/users', listUsers)
        (
            r#"^\s*[^@\s]*?\b(?:app|router|server|routes|\w*[Rr]outer)\.(?P<method>get|post|put|patch|delete|options|head|all)\s*\(\s*['"`](?P<path>[^'"`]+)['"`]\s*,\s*(?:[\w$.]+\s*,\s*)*(?P<handler>[A-Za-z_$][\w$.]*)\s*\)"#,
            MethodSource::Captured,
            HandlerSource::Inline,
        ),
        // Express-style with an inline callback
        (
            r#"^\s*[^@\s]*?\b(?:app|router|server|routes|\w*[Rr]outer)\.(?P<method>get|post|put|patch|delete|options|head|all)\s*\(\s*['"`](?P<path>[^'"`]+)['"`]\s*,"#,
            MethodSource::Captured,
            HandlerSource::Inline,
        ),
        // Gin/Echo-style: r.GET("/users", listUsers)
        (
            r#"\b\w+\.(?P<method>GET|POST|PUT|PATCH|DELETE|OPTIONS|HEAD|Any)\s*\(\s*"(?P<path>[^"]+)"\s*,\s*(?:[\w.]+\s*,\s*)*(?P<handler>[\w.]+)?"#,
            MethodSource::Captured,
            HandlerSource::Inline,
        ),
        // Decorators: @app.get("/users"), @bp.route("/x", methods=["POST"])
        (
            r#"^\s*@\w+(?:\.\w+)*\.(?P<method>route|api_route|get|post|put|patch|delete|options|head)\s*\(\s*['"](?P<path>[^'"]*)['"](?P<rest>.*)"#,
            MethodSource::Captured,
            HandlerSource::NextFunction,
        ),
        // net/http: http.HandleFunc("/users", usersHandler)
        (
            r#"\b\w+\.Handle(?:Func)?\s*\(\s*"(?P<path>[^"]+)"\s*,\s*(?P<handler>[\w.]+)?"#,
            MethodSource::Any,
            HandlerSource::Inline,
        ),
        // Spring annotations: @GetMapping("/users"), @RequestMapping(value = "/x", method = RequestMethod.POST)
        (
            r#"^\s*@(?P<method>Get|Post|Put|Patch|Delete|Request)Mapping\s*\(\s*(?:(?:value|path)\s*=\s*)?\{?\s*"(?P<path>[^"]*)"(?P<rest>.*)"#,
            MethodSource::Captured,
            HandlerSource::NextMethod,
        ),
        // NestJS decorators: @Get('users')
        (
            r#"^\s*@(?P<method>Get|Post|Put|Patch|Delete|Options|Head|All)\s*\(\s*['"`](?P<path>[^'"`]*)['"`]\s*\)"#,
            MethodSource::Captured,
            HandlerSource::NextMethod,
        ),
    ]
    .into_iter()
    .filter_map(|(pattern, method, handler)| RouteMatcher::new(pattern, method, handler))
    .collect()
});

/// Scans one file's source for route registrations.
pub fn scan_endpoints(file: &Path, source: &str) -> Vec<ApiEndpoint> {
    let lines: Vec<&str> = source.lines().collect();
    let mut endpoints = Vec::new();
    for index in 0..lines.len() {
        if let Some(endpoint) = ROUTE_MATCHERS
            .iter()
            .find_map(|matcher| matcher.apply(&lines, index, file))
        {
            endpoints.push(endpoint);
        }
    }
    endpoints
}

/// HTTP client idioms whose first literal argument is a URL.
static CALLER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"\bfetch\s*\(\s*['"`](?P<url>[^'"`]+)['"`]"#,
        r#"\baxios(?:\.(?:get|post|put|patch|delete|head|options|request))?\s*\(\s*['"`](?P<url>[^'"`]+)['"`]"#,
        r#"\b(?:http|https|api|client|apiClient|httpClient|request|requests|session|\$http|superagent|ky|got)\.(?:get|post|put|patch|delete|head|options)\s*\(\s*['"`](?P<url>[^'"`]+)['"`]"#,
        r#"\bhttp\.(?:Get|Post|Head|PostForm)\s*\(\s*"(?P<url>[^"]+)""#,
        r#"\bhttp\.NewRequest(?:WithContext)?\s*\([^"]*"\w+"\s*,\s*"(?P<url>[^"]+)""#,
    ]
    .into_iter()
    .filter_map(|pattern| match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "dropping invalid caller pattern");
            None
        }
    })
    .collect()
});

/// Lines of `source` that call `route` (already normalized) over HTTP.
pub fn scan_callers(source: &str, route: &str) -> Vec<usize> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            CALLER_PATTERNS.iter().any(|pattern| {
                pattern
                    .captures_iter(line)
                    .filter_map(|caps| caps.name("url"))
                    .any(|url| normalize_route(url.as_str()) == route)
            })
        })
        .map(|(index, _)| index + 1)
        .collect()
}

/// Canonical form of a route or URL literal for comparison: template
/// prefixes, scheme and host, query and fragment are dropped, a leading
/// slash is enforced and a trailing slash removed.
pub fn normalize_route(raw: &str) -> String {
    let mut route = raw.trim();

    while let Some(rest) = route.strip_prefix("${") {
        match rest.find('}') {
            Some(close) => route = &rest[close + 1..],
            None => break,
        }
    }

    if let Some(scheme_end) = route.find("://") {
        let after_scheme = &route[scheme_end + 3..];
        route = match after_scheme.find('/') {
            Some(slash) => &after_scheme[slash..],
            None => "",
        };
    }

    if let Some(cut) = route.find(['?', '#']) {
        route = &route[..cut];
    }

    let trimmed = route.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

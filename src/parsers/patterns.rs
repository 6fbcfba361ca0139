//! Line patterns used by the regex strategy.
//!
//! Every language gets four pattern groups. Capture group names are shared
//! across the table:
//!
//! - functions: `name`, `params` (or `param` for a bare arrow parameter),
//!   `async`
//! - classes: `name`
//! - imports: `module`, `names`
//! - error handling: `var` (any group whose name ends in `var`)

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

use super::Language;

#[derive(Debug)]
pub struct PatternSet {
    pub functions: Vec<Regex>,
    pub classes: Vec<Regex>,
    pub imports: Vec<Regex>,
    pub error_handling: Vec<Regex>,
}

const JS_FUNCTIONS: &[&str] = &[
    r#"^\s*(?:export\s+)?(?:default\s+)?(?P<async>async\s+)?function\b\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)?\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)"#,
    r#"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?P<async>async\s+)?function\b\s*\*?\s*[\w$]*\s*\((?P<params>[^)]*)"#,
    r#"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?P<async>async\s+)?(?:\((?P<params>[^)]*)\)|(?P<param>[A-Za-z_$][\w$]*))\s*(?::[^=]+)?=>"#,
    r#"^\s*(?:(?:public|private|protected|static|readonly|override|abstract|get|set)\s+)*(?P<async>async\s+)?\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)\s*(?::\s*[^{;]+)?\{\s*\}?\s*$"#,
];
const JS_CLASSES: &[&str] = &[
    r#"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:class|interface)\s+(?P<name>[A-Za-z_$][\w$]*)"#,
];
const JS_IMPORTS: &[&str] = &[
    r#"^\s*import\s+(?:type\s+)?(?P<names>[^'"]+?)\s+from\s+['"](?P<module>[^'"]+)['"]"#,
    r#"^\s*import\s+['"](?P<module>[^'"]+)['"]"#,
    r#"\b(?:const|let|var)\s+(?P<names>[^=]+?)\s*=\s*require\s*\(\s*['"](?P<module>[^'"]+)['"]\s*\)"#,
    r#"^\s*export\s+(?:\*|\{[^}]*\})\s+from\s+['"](?P<module>[^'"]+)['"]"#,
];
const JS_ERRORS: &[&str] = &[
    r#"\.catch\s*\(\s*(?:async\s+)?(?:function\s*\(\s*(?P<fvar>[A-Za-z_$][\w$]*)|\(\s*(?P<avar>[A-Za-z_$][\w$]*)|(?P<var>[A-Za-z_$][\w$]*)\s*=>)?"#,
    r#"\bcatch\b\s*(?:\(\s*(?P<var>[A-Za-z_$][\w$]*)?[^)]*\))?\s*\{"#,
];

const PY_FUNCTIONS: &[&str] = &[r#"^\s*(?P<async>async\s+)?def\s+(?P<name>\w+)\s*\((?P<params>[^)]*)"#];
const PY_CLASSES: &[&str] = &[r#"^\s*class\s+(?P<name>\w+)"#];
const PY_IMPORTS: &[&str] = &[
    r#"^\s*from\s+(?P<module>\.+[\w.]*|[\w.]+)\s+import\s+(?P<names>[^#]+)"#,
    r#"^\s*import\s+(?P<module>[\w.]+)(?:\s+as\s+(?P<names>\w+))?"#,
];
const PY_ERRORS: &[&str] = &[r#"^\s*except\b(?:[^:#]*?\bas\s+(?P<var>\w+))?"#];

const GO_FUNCTIONS: &[&str] = &[
    r#"^\s*func\s+(?:\([^)]*\)\s*)?(?P<name>\w+)\s*(?:\[[^\]]*\])?\s*\((?P<params>[^)]*)"#,
    r#"\bfunc\s*\((?P<params>[^)]*)\)[^{]*\{"#,
];
const GO_CLASSES: &[&str] = &[r#"^\s*type\s+(?P<name>\w+)\s+(?:struct|interface)\b"#];
const GO_IMPORTS: &[&str] = &[
    r#"^\s*import\s+(?:(?P<names>[\w.]+)\s+)?"(?P<module>[^"]+)""#,
    r#"^\s*(?:(?P<names>[\w.]+)\s+)?"(?P<module>[^"]+)"\s*$"#,
];
const GO_ERRORS: &[&str] = &[
    r#"\bif\s+(?:[^;{]*;\s*)?(?P<var>err\w*|\w*Err)\s*!=\s*nil"#,
    r#"\bdefer\s+func\b|(?P<var>\w+)\s*:?=\s*recover\s*\(\s*\)|\bpanic\s*\("#,
];

const JAVA_FUNCTIONS: &[&str] = &[
    r#"^\s*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|private|protected|static|final|abstract|synchronized|native|default)\s+)+(?:<[^>]+>\s+)?[\w<>\[\],.?]+\s+(?P<name>\w+)\s*\((?P<params>[^)]*)"#,
    r#"^\s*(?:public|private|protected)\s+(?P<name>[A-Z]\w*)\s*\((?P<params>[^)]*)\)\s*(?:throws\s+[\w.,\s]+)?\{"#,
];
const JAVA_CLASSES: &[&str] = &[
    r#"^\s*(?:(?:public|private|protected|abstract|final|static|sealed)\s+)*(?:class|interface|enum|record|@interface)\s+(?P<name>\w+)"#,
];
const JAVA_IMPORTS: &[&str] = &[r#"^\s*import\s+(?:static\s+)?(?P<module>[\w.]+(?:\.\*)?)\s*;"#];
const JAVA_ERRORS: &[&str] = &[r#"\bcatch\s*\(\s*(?:final\s+)?[\w.|\s]+?\s+(?P<var>\w+)\s*\)"#];

const RUST_FUNCTIONS: &[&str] = &[
    r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?P<async>async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(?P<name>\w+)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)"#,
];
const RUST_CLASSES: &[&str] = &[r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|union)\s+(?P<name>\w+)"#];
const RUST_IMPORTS: &[&str] = &[
    r#"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+(?P<module>[\w:]+?)(?:::\{(?P<names>[^}]*)\}|::\*)?\s*;"#,
    r#"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(?P<module>\w+)\s*;"#,
];
const RUST_ERRORS: &[&str] = &[
    r#"\bif\s+let\s+Err\s*\(\s*(?P<var>\w+)\s*\)"#,
    r#"\bErr\s*\(\s*(?P<var>\w+)\s*\)\s*=>"#,
    r#"\.(?:map_err|unwrap_or_else|or_else)\s*\(\s*\|(?P<var>\w+)\|"#,
];

const C_FUNCTIONS: &[&str] = &[
    r#"^\s*(?:(?:static|inline|extern|const|unsigned|signed|struct|virtual)\s+)*[A-Za-z_][\w:<>]*[\s*&]+(?P<name>[A-Za-z_~]\w*(?:::~?[A-Za-z_]\w*)*)\s*\((?P<params>[^;]*?)\)?\s*(?:const\s*)?\{?\s*$"#,
];
const C_CLASSES: &[&str] = &[r#"^\s*(?:typedef\s+)?(?:struct|union|enum)\s+(?P<name>\w+)\s*\{?\s*$"#];
const CPP_CLASSES: &[&str] = &[r#"^\s*(?:template\s*<[^>]*>\s*)?(?:class|struct)\s+(?P<name>\w+)"#];
const C_IMPORTS: &[&str] = &[r#"^\s*#\s*include\s*[<"](?P<module>[^>"]+)[>"]"#];
const CPP_ERRORS: &[&str] = &[r#"\bcatch\s*\(\s*(?:[^)]*?[\s&*](?P<var>\w+)|\.\.\.)?\s*\)"#];

const CSHARP_FUNCTIONS: &[&str] = &[
    r#"^\s*(?:\[[^\]]*\]\s*)*(?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|async|partial|extern|unsafe|new)\s+)+(?:[\w<>\[\],.?]+\s+)?(?P<name>\w+)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)"#,
];
const CSHARP_CLASSES: &[&str] = &[
    r#"^\s*(?:\[[^\]]*\]\s*)*(?:(?:public|private|protected|internal|static|abstract|sealed|partial)\s+)*(?:class|interface|struct|record|enum)\s+(?P<name>\w+)"#,
];
const CSHARP_IMPORTS: &[&str] = &[r#"^\s*using\s+(?:static\s+)?(?:\w+\s*=\s*)?(?P<module>[\w.]+)\s*;"#];
const CSHARP_ERRORS: &[&str] = &[r#"\bcatch\b\s*(?:\(\s*[\w.]+(?:\s+(?P<var>\w+))?\s*\))?"#];

const RUBY_FUNCTIONS: &[&str] = &[
    r#"^\s*def\s+(?:self\.)?(?P<name>[\w?!=]+)\s*(?:\((?P<params>[^)]*)\)|\s+(?P<param>[^#]+))?"#,
];
const RUBY_CLASSES: &[&str] = &[r#"^\s*(?:class|module)\s+(?P<name>[A-Z][\w:]*)"#];
const RUBY_IMPORTS: &[&str] = &[r#"^\s*(?:require|require_relative|load)\s*\(?\s*['"](?P<module>[^'"]+)['"]"#];
const RUBY_ERRORS: &[&str] = &[r#"^\s*rescue\b(?:[^#]*?=>\s*(?P<var>\w+))?"#];

const PHP_FUNCTIONS: &[&str] = &[
    r#"^\s*(?:(?:public|private|protected|static|abstract|final)\s+)*function\s+&?(?P<name>\w+)\s*\((?P<params>[^)]*)"#,
];
const PHP_CLASSES: &[&str] = &[r#"^\s*(?:(?:abstract|final|readonly)\s+)*(?:class|interface|trait|enum)\s+(?P<name>\w+)"#];
const PHP_IMPORTS: &[&str] = &[
    r#"^\s*use\s+(?P<module>[\w\\]+)(?:\s+as\s+(?P<names>\w+))?\s*;"#,
    r#"^\s*(?:require|include)(?:_once)?\s*\(?\s*['"](?P<module>[^'"]+)['"]"#,
];
const PHP_ERRORS: &[&str] = &[r#"\bcatch\s*\(\s*[\w\\|\s]+?\s*\$(?P<var>\w+)\s*\)"#];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(pattern, error = %err, "dropping invalid line pattern");
                None
            }
        })
        .collect()
}

fn set(
    functions: &[&str],
    classes: &[&str],
    imports: &[&str],
    error_handling: &[&str],
) -> PatternSet {
    PatternSet {
        functions: compile(functions),
        classes: compile(classes),
        imports: compile(imports),
        error_handling: compile(error_handling),
    }
}

static TABLE: Lazy<HashMap<Language, PatternSet>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(Language::KNOWN.len());
    table.insert(Language::JavaScript, set(JS_FUNCTIONS, JS_CLASSES, JS_IMPORTS, JS_ERRORS));
    table.insert(Language::TypeScript, set(JS_FUNCTIONS, JS_CLASSES, JS_IMPORTS, JS_ERRORS));
    table.insert(Language::Python, set(PY_FUNCTIONS, PY_CLASSES, PY_IMPORTS, PY_ERRORS));
    table.insert(Language::Go, set(GO_FUNCTIONS, GO_CLASSES, GO_IMPORTS, GO_ERRORS));
    table.insert(Language::Java, set(JAVA_FUNCTIONS, JAVA_CLASSES, JAVA_IMPORTS, JAVA_ERRORS));
    table.insert(Language::Rust, set(RUST_FUNCTIONS, RUST_CLASSES, RUST_IMPORTS, RUST_ERRORS));
    table.insert(Language::C, set(C_FUNCTIONS, C_CLASSES, C_IMPORTS, &[]));
    table.insert(Language::Cpp, set(C_FUNCTIONS, CPP_CLASSES, C_IMPORTS, CPP_ERRORS));
    table.insert(
        Language::CSharp,
        set(CSHARP_FUNCTIONS, CSHARP_CLASSES, CSHARP_IMPORTS, CSHARP_ERRORS),
    );
    table.insert(Language::Ruby, set(RUBY_FUNCTIONS, RUBY_CLASSES, RUBY_IMPORTS, RUBY_ERRORS));
    table.insert(Language::Php, set(PHP_FUNCTIONS, PHP_CLASSES, PHP_IMPORTS, PHP_ERRORS));
    table
});

pub fn patterns_for(language: Language) -> Option<&'static PatternSet> {
    TABLE.get(&language)
}

/// Words that look like calls or declarations to a line pattern but never
/// name a function.
pub const NON_FUNCTION_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "with", "else", "do", "try",
    "typeof", "new", "await", "super", "elif", "except", "sizeof", "throw", "case", "foreach",
    "using", "lock", "match", "loop", "defer", "go", "select",
];

/// Modifiers that make an indented definition visible outside its file.
pub const EXPORT_KEYWORDS: &[&str] = &["export", "pub", "public"];

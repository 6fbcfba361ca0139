//! # TRACELENS
//!
//! Source relationship analysis for debugging workflows.
//!
//! - **Structural analysis**: functions, classes, imports and error-handling
//!   blocks per file, through tree-sitter where a grammar is bundled and
//!   line patterns otherwise.
//! - **Relationship queries**: related files, call chains, HTTP endpoints
//!   and the client code calling them, across a whole project.
//! - **Sessions**: durable JSON records of one investigation, keyed by
//!   validated identifiers.
//!
//! ## Supported Languages
//!
//! JavaScript, TypeScript and Python (tree-sitter); Go, Java, Rust, C, C++,
//! C#, Ruby and PHP (patterns)

pub mod core;
pub mod formatters;
pub mod logging;
pub mod parsers;
pub mod session;

pub use crate::core::{DependencyGraph, GraphConfig};
pub use crate::parsers::{Analysis, CodeAnalysisResult, CodeAnalyzer, Language, ParseMethod};
pub use crate::session::{CreateSessionParams, SessionError, SessionManager, SessionState};

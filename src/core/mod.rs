pub mod dependency_graph;
pub mod graph;
pub mod model;
pub mod resolver;
pub mod routes;
pub mod scanner;

pub use dependency_graph::{DependencyGraph, GraphConfig};
pub use graph::{EdgeGraph, GraphBuilder};
pub use model::{
    ApiEndpoint, ClassDefinition, ErrorHandlingBlock, ErrorHandlingKind, FileDependency,
    FunctionDefinition, ImportStatement, RelationKind, Span, ANONYMOUS,
};
pub use resolver::ImportResolver;
pub use scanner::FileScanner;

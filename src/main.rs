use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use tracelens::core::graph::summarize;
use tracelens::core::scanner::resolve_path;
use tracelens::formatters::{JsonFormatter, Report, TextFormatter};
use tracelens::logging::init_logging;
use tracelens::session::{CreateSessionParams, SessionManager, SessionStatus};
use tracelens::{CodeAnalyzer, DependencyGraph, GraphConfig};

#[derive(Debug, Parser)]
#[command(
    name = "tracelens",
    version,
    author = "tracelens developers",
    about = "Source relationship analysis and debug-session persistence"
)]
struct Cli {
    /// Project root
    #[arg(short, long, value_name = "PATH", default_value = ".", global = true)]
    root: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Only scan files with these extensions
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Directory names to skip (replaces the defaults)
    #[arg(long = "exclude", value_name = "DIR", value_delimiter = ',')]
    excluded_dirs: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Structural analysis of one file
    Analyze { file: PathBuf },
    /// Files related to a file through imports and calls
    Related {
        file: PathBuf,
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Call chains leading to a function
    Trace {
        function: String,
        file: PathBuf,
        #[arg(long, value_name = "N")]
        depth: Option<usize>,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// HTTP route registrations in the project
    Endpoints {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Files calling an HTTP route
    Callers {
        route: String,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Debug-session records
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// Start a session for an issue
    Create {
        issue: String,
        #[arg(long)]
        reproduction: Option<String>,
        #[arg(long)]
        commit: Option<String>,
        #[arg(long)]
        branch: Option<String>,
    },
    Show { id: String },
    List,
    /// Sessions opened for the same issue text
    Find { issue: String },
    Delete { id: String },
    /// Set the status of a session
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: SessionStatus,
    },
}

fn parse_status(value: &str) -> Result<SessionStatus, String> {
    value.parse()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        root,
        format,
        verbose: _,
        command,
    } = cli;

    let start_time = Instant::now();
    let root = root
        .canonicalize()
        .with_context(|| format!("project root {} is not accessible", root.display()))?;
    let printer = Printer::new(format, &root);

    match command {
        Command::Analyze { file } => {
            let analysis = CodeAnalyzer::new().analyze_file(&file);
            printer.print(&Report::Analysis(&analysis))?;
        }
        Command::Related {
            file,
            max_depth,
            scan,
        } => {
            let mut config = graph_config(&root, scan);
            if let Some(max_depth) = max_depth {
                config = config.with_max_depth(max_depth);
            }
            let file = resolve_path(&file);
            let mut graph = DependencyGraph::new(config);
            let files = graph.get_related_files(&file);
            printer.print(&Report::RelatedFiles {
                origin: &file,
                files: &files,
            })?;
        }
        Command::Trace {
            function,
            file,
            depth,
            scan,
        } => {
            let file = resolve_path(&file);
            let mut graph = DependencyGraph::new(graph_config(&root, scan));
            let edges = graph.trace_function_calls(&function, &file, depth);
            let summary = summarize(&DependencyGraph::edge_graph(&edges));
            printer.print(&Report::Trace {
                function: &function,
                edges: &edges,
                summary: &summary,
            })?;
        }
        Command::Endpoints { scan } => {
            let graph = DependencyGraph::new(graph_config(&root, scan));
            let endpoints = graph.identify_api_endpoints();
            printer.print(&Report::Endpoints(&endpoints))?;
        }
        Command::Callers { route, scan } => {
            let graph = DependencyGraph::new(graph_config(&root, scan));
            let edges = graph.find_api_callers(&route);
            printer.print(&Report::Callers {
                route: &route,
                edges: &edges,
            })?;
        }
        Command::Session(command) => run_session(&root, command, &printer)?,
    }

    info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "command finished");
    Ok(())
}

fn run_session(root: &Path, command: SessionCommand, printer: &Printer) -> Result<()> {
    let manager = SessionManager::new(root).context("failed to open the session store")?;

    match command {
        SessionCommand::Create {
            issue,
            reproduction,
            commit,
            branch,
        } => {
            let params = CreateSessionParams {
                issue,
                reproduction,
                commit,
                branch,
            };
            let session = manager.create_session(params)?;
            printer.print(&Report::Session(&session))?;
        }
        SessionCommand::Show { id } => {
            let session = manager
                .load_session(&id)
                .with_context(|| format!("cannot load session {id}"))?;
            printer.print(&Report::Session(&session))?;
        }
        SessionCommand::List => {
            let sessions = manager.list_sessions()?;
            printer.print(&Report::Sessions(&sessions))?;
        }
        SessionCommand::Find { issue } => {
            let sessions = manager.find_sessions_by_issue(&issue)?;
            printer.print(&Report::Sessions(&sessions))?;
        }
        SessionCommand::Delete { id } => {
            manager
                .delete_session(&id)
                .with_context(|| format!("cannot delete session {id}"))?;
            info!(session = %id, "deleted");
        }
        SessionCommand::Status { id, status } => {
            let session = manager
                .set_status(&id, status)
                .with_context(|| format!("cannot update session {id}"))?;
            printer.print(&Report::Session(&session))?;
        }
    }
    Ok(())
}

fn graph_config(root: &Path, scan: ScanArgs) -> GraphConfig {
    let mut config = GraphConfig::new(root);
    if !scan.extensions.is_empty() {
        config = config.with_extensions(scan.extensions);
    }
    if !scan.excluded_dirs.is_empty() {
        config = config.with_excluded_dirs(scan.excluded_dirs);
    }
    config
}

enum Printer {
    Text(TextFormatter),
    Json(JsonFormatter),
}

impl Printer {
    fn new(format: OutputFormat, root: &Path) -> Self {
        match format {
            OutputFormat::Text => Printer::Text(TextFormatter::new().with_root(root)),
            OutputFormat::Json => Printer::Json(JsonFormatter::new()),
        }
    }

    fn print(&self, report: &Report) -> Result<()> {
        let rendered = match self {
            Printer::Text(formatter) => formatter.format(report),
            Printer::Json(formatter) => formatter.format(report)?,
        };
        print!("{rendered}");
        if !rendered.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}

mod cmd;
mod output;
mod root;
mod tools;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "aci",
    about = "Agent-computer interface: file editor, linter and code viewer for coding agents",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .aci/ or .git/)
    #[arg(long, global = true, env = "ACI_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a file with line numbers, or list a directory two levels deep
    View {
        /// Absolute path
        path: PathBuf,
        /// Line range to show; END may be -1 for the end of the file
        #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
        range: Option<Vec<i64>>,
    },

    /// Create a new file
    Create {
        /// Absolute path of the file to create
        path: PathBuf,
        /// File content
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Read the content from this file instead
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Replace exactly one occurrence of a string
    StrReplace {
        path: PathBuf,
        /// Text to replace; must occur exactly once
        #[arg(long)]
        old: String,
        /// Replacement (empty when omitted)
        #[arg(long)]
        new: Option<String>,
        /// Report lint issues the edit introduced
        #[arg(long)]
        lint: bool,
    },

    /// Insert text after a line (0 inserts at the top)
    Insert {
        path: PathBuf,
        #[arg(long)]
        line: i64,
        #[arg(long)]
        text: String,
        #[arg(long)]
        lint: bool,
    },

    /// Revert the last edit made to a file
    Undo { path: PathBuf },

    /// Run one editor request given as JSON and print the result envelope
    Call {
        /// Request JSON (read from stdin when omitted)
        #[arg(long)]
        input: Option<String>,
    },

    /// Lint a file, or only the issues introduced relative to an older version
    Lint {
        file: PathBuf,
        /// Previous version of the file; only new issues are reported
        #[arg(long)]
        against: Option<PathBuf>,
    },

    /// Show the directory tree of the workspace or a subdirectory
    Explore {
        path: Option<PathBuf>,
        /// Maximum depth below PATH
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Show a page of a file with line numbers
    Show {
        file: PathBuf,
        /// First line (0-based)
        #[arg(short = 's', long)]
        start: Option<usize>,
        /// Last line, exclusive
        #[arg(short = 'e', long)]
        end: Option<usize>,
    },

    /// Jump to the definition of a symbol used in FILE
    FindDef { file: PathBuf, symbol: String },

    /// List references to a symbol defined or imported in FILE
    FindRefs { file: PathBuf, symbol: String },

    /// Type, documentation, definition and references of a symbol
    SymbolInfo { file: PathBuf, symbol: String },

    /// Callers and callees of a function
    Calls { file: PathBuf, function: String },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run as an MCP stdio server
    Mcp,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Mcp => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    init_tracing(default_level);

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::View { path, range } => {
            let mut req = cmd::edit::request("view", &path);
            if let Some(range) = range {
                req = req.view_range(range);
            }
            cmd::edit::run(&root, req, cli.json)
        }
        Commands::Create { path, text, file } => {
            cmd::edit::create(&root, &path, text, file.as_deref(), cli.json)
        }
        Commands::StrReplace {
            path,
            old,
            new,
            lint,
        } => {
            let mut req = cmd::edit::request("str_replace", &path).old_str(old).lint(lint);
            if let Some(new) = new {
                req = req.new_str(new);
            }
            cmd::edit::run(&root, req, cli.json)
        }
        Commands::Insert {
            path,
            line,
            text,
            lint,
        } => {
            let req = cmd::edit::request("insert", &path)
                .insert_line(line)
                .new_str(text)
                .lint(lint);
            cmd::edit::run(&root, req, cli.json)
        }
        Commands::Undo { path } => {
            cmd::edit::run(&root, cmd::edit::request("undo_edit", &path), cli.json)
        }
        Commands::Call { input } => cmd::call::run(&root, input.as_deref()),
        Commands::Lint { file, against } => {
            cmd::lint::run(&root, &file, against.as_deref(), cli.json)
        }
        Commands::Explore { path, depth } => {
            cmd::viewer::explore(&root, path.as_deref(), depth, cli.json)
        }
        Commands::Show { file, start, end } => {
            cmd::viewer::show(&root, &file, start, end, cli.json)
        }
        Commands::FindDef { file, symbol } => {
            cmd::viewer::find_def(&root, &file, &symbol, cli.json)
        }
        Commands::FindRefs { file, symbol } => {
            cmd::viewer::find_refs(&root, &file, &symbol, cli.json)
        }
        Commands::SymbolInfo { file, symbol } => cmd::viewer::symbol_info(&root, &file, &symbol),
        Commands::Calls { file, function } => {
            cmd::viewer::calls(&root, &file, &function, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Mcp => cmd::mcp::run(&root),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

struct MinuteClock;

impl tracing_subscriber::fmt::time::FormatTime for MinuteClock {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M"))
    }
}

/// `RUST_LOG` wins; otherwise `LOG_LEVEL`, with `DEBUG` forcing debug output.
fn init_tracing(default_level: tracing::Level) {
    use tracing_subscriber::EnvFilter;

    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => {
            let level = if debug_forced() {
                "debug".to_string()
            } else {
                std::env::var("LOG_LEVEL")
                    .map(|l| l.to_lowercase())
                    .unwrap_or_else(|_| default_level.to_string().to_lowercase())
            };
            EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(MinuteClock)
        .with_writer(std::io::stderr)
        .init();
}

fn debug_forced() -> bool {
    std::env::var("DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

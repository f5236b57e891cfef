// memtrace: symbolic memory tracer for a tiny C subset

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use memtrace::ui::App;
use memtrace::{trace_with_config, TracerConfig};

/// Show how simple C statements lay out memory, step by step
#[derive(Parser, Debug)]
#[command(name = "memtrace")]
#[command(about = "Symbolic stack and heap tracer for beginner C programs", version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (repeat for more: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Trace a program and print the result as JSON
    Trace(TraceArgs),
    /// Trace a program and browse the steps in the terminal
    View(ViewArgs),
}

#[derive(Parser, Debug)]
struct TraceArgs {
    /// C source file, or `-` for standard input
    file: PathBuf,

    /// File passed through as the program's standard input
    #[arg(long)]
    stdin: Option<PathBuf>,

    /// TOML file overriding the memory layout and limits
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

#[derive(Parser, Debug)]
struct ViewArgs {
    /// C source file
    file: PathBuf,

    /// TOML file overriding the memory layout and limits
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let interactive = matches!(args.command, Commands::View(_));
    init_logging(args.verbose, args.quiet, interactive);

    match args.command {
        Commands::Trace(trace_args) => run_trace(trace_args),
        Commands::View(view_args) => run_view(view_args),
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the flags; the viewer logs nothing
/// unless `RUST_LOG` is set.
fn init_logging(verbose: u8, quiet: bool, interactive: bool) {
    let level = match (quiet, interactive, verbose) {
        (true, _, _) => "error",
        (false, true, _) => "off",
        (false, false, 0) => "warn",
        (false, false, 1) => "info",
        (false, false, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<TracerConfig> {
    match path {
        Some(path) => TracerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(TracerConfig::default()),
    }
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("reading source from standard input")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn run_trace(args: TraceArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let source = read_source(&args.file)?;
    let stdin = args
        .stdin
        .as_deref()
        .map(|path| fs::read_to_string(path).with_context(|| format!("reading {}", path.display())))
        .transpose()?;

    let result = trace_with_config(&source, stdin.as_deref(), &config);

    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", json);

    Ok(())
}

fn run_view(args: ViewArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let source = read_source(&args.file)?;
    let result = trace_with_config(&source, None, &config);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(result);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("terminal viewer failed")
}

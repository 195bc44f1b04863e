//! voxdraw CLI - draw voxel sculptures with scripts

mod demos;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use voxdraw_engine::{MemoryScene, RunError, RunReport, ScriptEngine, Session, Settings};
use voxdraw_script::{Interpreter, ScriptChange, ScriptWatcher};

type HeadlessSession = Session<ScriptEngine, MemoryScene>;

#[derive(Parser)]
#[command(name = "voxdraw")]
#[command(about = "Draw voxel sculptures with a per-cell script", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a script once and report the result
    Run {
        /// Script file
        script: PathBuf,

        /// Grid edge length
        #[arg(short, long)]
        size: Option<usize>,

        /// Export the mesh to an OBJ file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a script without running it
    Check {
        /// Script file
        script: PathBuf,
    },

    /// Re-run a script whenever it changes
    Watch {
        /// Script file
        script: PathBuf,

        /// Grid edge length
        #[arg(short, long)]
        size: Option<usize>,
    },

    /// Run a bundled demo sculpture
    Demo {
        /// Demo name
        #[arg(default_value = demos::DEFAULT_DEMO)]
        name: String,

        /// Grid edge length
        #[arg(short, long)]
        size: Option<usize>,

        /// Export the mesh to an OBJ file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// List bundled demos
        #[arg(long)]
        list: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            script,
            size,
            output,
        } => {
            let source = read_script(&script)?;
            run_once(&source, with_size(settings, size), output.as_deref())?;
        }
        Commands::Check { script } => {
            check_script(&script, &settings)?;
        }
        Commands::Watch { script, size } => {
            run_watch(&script, with_size(settings, size))?;
        }
        Commands::Demo {
            name,
            size,
            output,
            list,
        } => {
            if list {
                for name in demos::names() {
                    println!("{name}");
                }
                return Ok(());
            }
            let Some(source) = demos::find(&name) else {
                bail!(
                    "Unknown demo '{name}' (available: {})",
                    demos::names().collect::<Vec<_>>().join(", ")
                );
            };
            println!("Running demo: {name}");
            run_once(source, with_size(settings, size), output.as_deref())?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Settings::load_default().context("Failed to load settings"),
    }
}

fn with_size(mut settings: Settings, size: Option<usize>) -> Settings {
    if let Some(size) = size {
        settings.grid_size = size;
    }
    settings
}

fn read_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read script {}", path.display()))
}

fn open_session(settings: Settings) -> Result<HeadlessSession> {
    Session::headless(settings).context("Invalid session settings")
}

fn run_once(source: &str, settings: Settings, output: Option<&Path>) -> Result<()> {
    let session = open_session(settings)?;
    let report = session.run(source).context("Run failed")?;
    print_report(&report);

    if let Some(output) = output {
        export_mesh(&session, output)?;
    }

    session.shutdown();
    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "Grid {}^3: {} cells filled, {} faces ({:.1} ms)",
        report.grid_size,
        report.occupied_cells,
        report.faces,
        report.elapsed.as_secs_f64() * 1000.0
    );

    if report.has_warnings() {
        println!("{} cell(s) failed:", report.warnings.len());
        for warning in report.warnings.iter().take(10) {
            println!("  {warning}");
        }
        if report.warnings.len() > 10 {
            println!("  ... and {} more", report.warnings.len() - 10);
        }
    }
}

fn export_mesh(session: &HeadlessSession, output: &Path) -> Result<()> {
    let scene = session.scene()?;
    let Some(mesh) = scene.first_attached() else {
        println!("Nothing to export: the grid is empty");
        return Ok(());
    };

    mesh.geometry
        .write_obj(output)
        .with_context(|| format!("Failed to export {}", output.display()))?;

    println!(
        "Exported {} vertices, {} triangles to: {}",
        mesh.geometry.vertex_count(),
        mesh.geometry.triangle_count(),
        output.display()
    );
    Ok(())
}

fn check_script(path: &Path, settings: &Settings) -> Result<()> {
    let source = read_script(path)?;
    let engine = ScriptEngine::with_limits(settings.script_limits());

    match engine.compile(&source) {
        Ok(_) => {
            println!("{}: ok", path.display());
            Ok(())
        }
        Err(err) => {
            match err.line {
                Some(line) => println!("{}:{line}: {}", path.display(), err.message),
                None => println!("{}: {}", path.display(), err.message),
            }
            bail!("Script has errors")
        }
    }
}

fn run_watch(script: &Path, settings: Settings) -> Result<()> {
    if !script.exists() {
        bail!("Script file not found: {}", script.display());
    }

    let session = open_session(settings)?;
    let mut watcher = ScriptWatcher::new(None).context("Failed to start file watcher")?;
    watcher
        .watch(script)
        .with_context(|| format!("Failed to watch {}", script.display()))?;

    println!("Watching {}", script.display());
    println!("Press Ctrl+C to stop\n");

    run_and_report(&session, script);

    loop {
        match watcher.recv_timeout(Duration::from_millis(250)) {
            Some(ScriptChange::Modified(path)) => {
                tracing::debug!(path = %path.display(), "script changed");
                run_and_report(&session, script);
            }
            Some(ScriptChange::Error(message)) => {
                tracing::warn!("watcher error: {message}");
            }
            None => {}
        }
    }
}

/// One watch iteration; errors are reported and watching continues
fn run_and_report(session: &HeadlessSession, script: &Path) {
    let source = match read_script(script) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{err:#}");
            return;
        }
    };

    match session.run(&source) {
        Ok(report) => print_report(&report),
        Err(RunError::Compile(err)) => eprintln!("Compile error: {err}"),
        Err(err) => eprintln!("Run failed: {err}"),
    }
}

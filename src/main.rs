use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;

use taskgraph::config::Config;
use taskgraph::graph::{GraphState, Topology};
use taskgraph::render::{JsonRenderer, RenderAdapter, TextRenderer};
use taskgraph::source::{load_tasks, TaskFileWatcher};
use taskgraph::view::{snapshot_channel, GraphView};
use taskgraph::{tglog, tglog_error, tglog_warn, Result};

/// How often the watch loop checks for shutdown while idle.
const IDLE_POLL: Duration = Duration::from_millis(500);

/// taskgraph - task dependency graph builder with stable layout
#[derive(Parser, Debug)]
#[command(name = "taskgraph")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    TASKGRAPH_DEBUG=1     Enable debug logging (alternative to --debug)\n    TASKGRAPH_DEBUG=trace Also log per-task detail"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.taskgraph/taskgraph.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Config file (defaults to ~/.taskgraph/taskgraph.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Build the graph for a task file and print it
    Build {
        /// JSON task file
        tasks: PathBuf,

        /// Previously rendered state (JSON) whose positions should be kept
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Write the resulting state here as JSON
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Rebuild and print the graph every time the task file changes
    ///
    /// When stdin is a terminal, Ctrl-D stops watching. Otherwise (pipes,
    /// /dev/null, service managers) the watch runs until the process is
    /// terminated.
    Watch {
        /// JSON task file
        tasks: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Report cycles, self-loops and dangling edges in a task file
    Inspect {
        /// JSON task file
        tasks: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    taskgraph::log::init_with_debug(cli.debug);

    if let Err(e) = run(cli) {
        tglog_error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Build {
            tasks,
            previous,
            output,
            json,
        } => run_build(&config, &tasks, previous.as_deref(), output.as_deref(), json),
        Command::Watch { tasks, json } => run_watch(&config, &tasks, json),
        Command::Inspect { tasks } => run_inspect(&config, &tasks),
    }
}

fn renderer(json: bool) -> Box<dyn RenderAdapter> {
    if json {
        Box::new(JsonRenderer::new(io::stdout()))
    } else {
        Box::new(TextRenderer::new(io::stdout()))
    }
}

/// Build once, optionally continuing from a saved state.
fn run_build(
    config: &Config,
    tasks_path: &Path,
    previous: Option<&Path>,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    tglog!("build tasks={}", tasks_path.display());

    let previous_state = match previous {
        Some(path) => serde_json::from_str::<GraphState>(&fs::read_to_string(path)?)?,
        None => GraphState::default(),
    };
    let mut view = GraphView::with_state(config.layout.clone(), previous_state);
    view.apply(&load_tasks(tasks_path)?)?;

    renderer(json).render(view.state())?;

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(view.state())?)?;
        tglog!("state written to {}", path.display());
    }
    Ok(())
}

/// Re-render on every change until stopped.
///
/// An interactive stdin stops the watch at end of input; a non-terminal
/// stdin is ignored so the watch survives `< /dev/null` and nohup.
///
/// Snapshots are picked up at most once per debounce interval; only the
/// newest pending one is rendered.
fn run_watch(config: &Config, tasks_path: &Path, json: bool) -> Result<()> {
    let (tx, rx) = snapshot_channel();
    let _watcher = TaskFileWatcher::start(tasks_path, tx)?;
    let mut view = GraphView::new(config.layout.clone());
    let mut out = renderer(json);

    let shutdown = Arc::new(AtomicBool::new(false));
    if io::stdin().is_terminal() {
        let shutdown_clone = shutdown.clone();
        std::thread::spawn(move || {
            let _ = io::copy(&mut io::stdin().lock(), &mut io::sink());
            shutdown_clone.store(true, Ordering::SeqCst);
        });
        eprintln!("watching {} (Ctrl-D to stop)", tasks_path.display());
    } else {
        eprintln!("watching {}", tasks_path.display());
    }
    let debounce = config.watch.debounce();

    while !shutdown.load(Ordering::SeqCst) {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(first) => {
                std::thread::sleep(debounce);
                let newest = rx
                    .try_iter()
                    .chain(std::iter::once(first))
                    .max_by_key(|s| s.version);
                let Some(snapshot) = newest else { continue };
                match view.apply_snapshot(snapshot) {
                    Ok(Some(delta)) => {
                        eprintln!("update: {}", delta);
                        out.render(view.state())?;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tglog_warn!("update rejected: {}", e);
                        eprintln!("update rejected, keeping last graph: {}", e);
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tglog!("watch stopped");
    Ok(())
}

fn run_inspect(config: &Config, tasks_path: &Path) -> Result<()> {
    let mut view = GraphView::new(config.layout.clone());
    view.apply(&load_tasks(tasks_path)?)?;
    let state = view.state();
    let topology = Topology::from_state(state);

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} tasks, {} edges ({} resolved, {} dangling)",
        state.nodes.len(),
        state.edges.len(),
        topology.edge_count(),
        topology.dangling().len()
    )?;
    writeln!(
        out,
        "acyclic: {}",
        if topology.is_acyclic() { "yes" } else { "no" }
    )?;

    for group in topology.cycles() {
        let ids: Vec<String> = group.iter().map(|id| id.to_string()).collect();
        writeln!(out, "cycle: {}", ids.join(", "))?;
    }
    for edge in topology.self_loops() {
        writeln!(out, "self-loop: {} [{}]", edge.source, edge.id)?;
    }
    for edge in topology.dangling() {
        writeln!(
            out,
            "dangling: {} -> {} [{}]",
            edge.source, edge.target, edge.id
        )?;
    }
    Ok(())
}

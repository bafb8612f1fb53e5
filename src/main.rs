use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pathfinder::engine::{ReindexOutcome, SearchEngine};
use pathfinder::index::stats::print_stats;
use pathfinder::output::{format_summary, print_no_matches, print_paths, print_scored};
use pathfinder::server::daemon::{self, error_log_path};
use pathfinder::server::{get_socket_path, is_daemon_running, IndexClient};
use pathfinder::utils::{progress, resolve_data_dir, AppConfig, DATA_DIR_ENV};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pathfinder")]
#[command(about = "Fuzzy file-path search over a persistent trigram index")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Query word (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    /// Directory holding the path log, snapshot and config
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Open the index directly even if the daemon is running
    #[arg(long, global = true)]
    direct: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from every root
    Index,
    /// Add a directory to the root set and rebuild
    AddRoot {
        /// Directory to index
        path: PathBuf,
    },
    /// List the root set
    Roots,
    /// Fuzzy-match paths
    Query {
        /// Query word, e.g. `report` or `report/finance`
        word: String,

        /// Show the score of each match (direct mode only)
        #[arg(short, long)]
        scores: bool,
    },
    /// Show index statistics
    Stats,
    /// Drop every indexed path (roots are kept)
    Clear,
    /// Print the effective configuration
    Config {
        /// Write it to config.json in the data directory
        #[arg(long)]
        init: bool,
    },
    /// Manage the index server daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon in background
    Start,
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
    /// Run daemon in foreground (for debugging)
    Foreground,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Some(Commands::Daemon {
            action: DaemonAction::Foreground,
        }) => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let ctx = Session {
        data_dir: cli.data_dir,
        direct: cli.direct,
        color: !cli.no_color,
    };

    match cli.command {
        Some(Commands::Index) => ctx.index(),
        Some(Commands::AddRoot { path }) => ctx.add_root(&path),
        Some(Commands::Roots) => ctx.roots(),
        Some(Commands::Query { word, scores }) => ctx.query(&word, scores),
        Some(Commands::Stats) => ctx.stats(),
        Some(Commands::Clear) => ctx.clear(),
        Some(Commands::Config { init }) => ctx.config(init),
        Some(Commands::Daemon { action }) => handle_daemon_command(action, ctx.data_dir.as_deref()),
        None => {
            if cli.query.is_empty() {
                use clap::CommandFactory;
                Cli::command().print_help()?;
                Ok(())
            } else {
                ctx.query(&cli.query.join(" "), false)
            }
        }
    }
}

/// Global options shared by every command
struct Session {
    data_dir: Option<PathBuf>,
    direct: bool,
    color: bool,
}

impl Session {
    fn client(&self) -> Option<IndexClient> {
        if self.direct {
            None
        } else {
            IndexClient::connect()
        }
    }

    fn engine(&self) -> Result<SearchEngine> {
        SearchEngine::open_default(self.data_dir.as_deref())
    }

    /// Open the engine and build the first index if there is none yet
    fn warm_engine(&self) -> Result<SearchEngine> {
        let engine = self.engine()?;
        if engine.needs_index() {
            let spinner = progress::spinner("Building index...", false);
            let summary = engine.ensure_indexed();
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            if let Some(summary) = summary? {
                eprintln!("{}", format_summary(&summary));
            }
        }
        Ok(engine)
    }

    fn index(&self) -> Result<()> {
        if let Some(mut client) = self.client() {
            match client.index()? {
                Some(summary) => println!("{}", format_summary(&summary)),
                None => println!("A rebuild is already running"),
            }
            return Ok(());
        }

        let engine = self.engine()?;
        if engine.roots().is_empty() {
            println!("No roots configured. Add one with 'pathfinder add-root <dir>'");
            return Ok(());
        }
        let summary = with_spinner("Indexing...", || match engine.reindex_now()? {
            ReindexOutcome::Completed(summary) => Ok(summary),
            ReindexOutcome::AlreadyRunning => anyhow::bail!("A rebuild is already running"),
        })?;
        println!("{}", format_summary(&summary));
        Ok(())
    }

    fn add_root(&self, path: &Path) -> Result<()> {
        let root = path
            .canonicalize()
            .with_context(|| format!("Cannot access {}", path.display()))?;
        if !root.is_dir() {
            anyhow::bail!("Not a directory: {}", root.display());
        }

        let summary = match self.client() {
            Some(mut client) => client.add_root(&root)?,
            None => {
                let engine = self.engine()?;
                with_spinner("Indexing...", || engine.add_root(&root))?
            }
        };
        println!("Added {}", root.display());
        println!("{}", format_summary(&summary));
        Ok(())
    }

    fn roots(&self) -> Result<()> {
        let roots = match self.client() {
            Some(mut client) => client.roots()?,
            None => self.engine()?.roots(),
        };
        if roots.is_empty() {
            println!("No roots configured.");
        }
        for root in roots {
            println!("{}", root.display());
        }
        Ok(())
    }

    fn query(&self, word: &str, scores: bool) -> Result<()> {
        if !scores {
            if let Some(mut client) = self.client() {
                let matches = client.query(word)?;
                log::debug!(
                    "{} matches in {:.2}ms (cached: {})",
                    matches.paths.len(),
                    matches.duration_ms,
                    matches.cached
                );
                if matches.paths.is_empty() {
                    print_no_matches(word);
                }
                print_paths(&matches.paths, self.color)?;
                return Ok(());
            }
        }

        let engine = self.warm_engine()?;
        let results = engine.search(word);
        if results.is_empty() {
            print_no_matches(word);
        }
        if scores {
            print_scored(&results, self.color)?;
        } else {
            let paths: Vec<String> = results.into_iter().map(|r| r.path).collect();
            print_paths(&paths, self.color)?;
        }
        Ok(())
    }

    fn stats(&self) -> Result<()> {
        let stats = match self.client() {
            Some(mut client) => client.status()?.stats,
            None => self.engine()?.stats(),
        };
        print_stats(&stats);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.client() {
            Some(mut client) => client.clear()?,
            None => self.engine()?.clear()?,
        }
        println!("Index cleared. Run 'pathfinder index' to rebuild.");
        Ok(())
    }

    fn config(&self, init: bool) -> Result<()> {
        let data_dir = resolve_data_dir(self.data_dir.as_deref())?;
        let config = AppConfig::load(&data_dir)?;
        if init {
            config.save(&data_dir)?;
            eprintln!("Wrote {}", data_dir.join("config.json").display());
        }
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
    }
}

fn with_spinner<T>(message: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = progress::spinner(message, false);
    let result = work();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    result
}

fn handle_daemon_command(action: DaemonAction, data_dir: Option<&Path>) -> Result<()> {
    match action {
        DaemonAction::Start => {
            if is_daemon_running() {
                println!("Daemon is already running");
                return Ok(());
            }

            println!("Starting pathfinder daemon...");
            daemon::daemonize(data_dir.map(Path::to_path_buf))?;

            // Wait a moment for daemon to start
            thread::sleep(Duration::from_millis(500));

            if is_daemon_running() {
                println!("Daemon started (socket: {})", get_socket_path().display());
            } else {
                println!(
                    "Daemon may have failed to start. Check {}",
                    error_log_path().display()
                );
            }
        }

        DaemonAction::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            println!("Stopping daemon...");

            // Try graceful shutdown via client first
            if let Some(mut client) = IndexClient::connect() {
                let _ = client.shutdown();
                thread::sleep(Duration::from_millis(500));
            }

            // Force stop if still running
            if is_daemon_running() {
                daemon::stop_daemon()?;
            }

            println!("Daemon stopped");
        }

        DaemonAction::Status => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            match IndexClient::connect() {
                Some(mut client) => match client.status() {
                    Ok(status) => {
                        println!("pathfinder daemon status:");
                        println!("  Uptime: {}s", status.uptime_secs);
                        println!("  Queries served: {}", status.queries_served);
                        println!("  Cache hit rate: {:.1}%", status.cache_hit_rate * 100.0);
                        match status.reindex_interval_secs {
                            0 => println!("  Scheduled reindex: off"),
                            secs => println!("  Scheduled reindex: every {}s", secs),
                        }
                        println!("  Indexed paths: {}", status.stats.indexed_paths);
                        println!("  Generation: {}", status.stats.generation);
                        if !status.stats.roots.is_empty() {
                            println!("  Roots:");
                            for root in &status.stats.roots {
                                println!("    - {}", root.display());
                            }
                        }
                    }
                    Err(e) => {
                        println!("Failed to get status: {}", e);
                    }
                },
                None => {
                    println!("Daemon is running but not responding");
                }
            }
        }

        DaemonAction::Foreground => {
            if is_daemon_running() {
                println!("Daemon is already running in background.");
                println!("Stop it first with 'pathfinder daemon stop'");
                return Ok(());
            }

            println!("Running daemon in foreground (Ctrl+C to stop)...");
            daemon::run_foreground(data_dir)?;
        }
    }

    Ok(())
}


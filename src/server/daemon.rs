//! Unix index server daemon
//!
//! Keeps the engine open and serves requests over a Unix socket. Query
//! results are cached per snapshot generation, so a rebuild invalidates them
//! without any explicit flush.

use crate::engine::{ReindexOutcome, SearchEngine};
use crate::server::protocol::{
    read_message, write_message, MatchesResponse, Request, Response, StatusResponse,
};
use crate::server::scheduler::ReindexScheduler;
use crate::server::{get_pid_path, get_socket_path};
use anyhow::{Context, Result};
use log::{error, info, warn};
use lru::LruCache;
use parking_lot::Mutex;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// LRU cache size for query results
const CACHE_SIZE: usize = 256;

/// Connection timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Statistics for the server
struct ServerStats {
    start_time: Instant,
    queries_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            queries_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}

/// The index server daemon
pub struct IndexServer {
    engine: Arc<SearchEngine>,
    /// Keyed by (snapshot generation, query word)
    query_cache: Mutex<LruCache<(u64, String), Vec<String>>>,
    stats: ServerStats,
    shutdown: AtomicBool,
    socket_path: PathBuf,
    pid_path: Option<PathBuf>,
}

impl IndexServer {
    /// Create a server for `engine` listening on `socket_path`
    pub fn new(
        engine: Arc<SearchEngine>,
        socket_path: PathBuf,
        pid_path: Option<PathBuf>,
    ) -> Arc<Self> {
        let capacity = NonZeroUsize::new(CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Arc::new(Self {
            engine,
            query_cache: Mutex::new(LruCache::new(capacity)),
            stats: ServerStats::new(),
            shutdown: AtomicBool::new(false),
            socket_path,
            pid_path,
        })
    }

    /// Bind the socket and serve until a shutdown request (blocking)
    pub fn run(self: &Arc<Self>) -> Result<()> {
        let listener = self.bind()?;

        // Build the first index without holding up the socket
        let engine = Arc::clone(&self.engine);
        thread::spawn(move || {
            if let Err(e) = engine.ensure_indexed() {
                error!("initial index failed: {:#}", e);
            }
        });

        self.serve(listener)
    }

    /// Bind the socket and write the PID file
    pub fn bind(&self) -> Result<UnixListener> {
        // Ensure parent directory exists
        if let Some(parent) = self.socket_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Remove stale socket file
        if self.socket_path.exists() {
            fs::remove_file(&self.socket_path)?;
        }

        if let Some(pid_path) = &self.pid_path {
            fs::write(pid_path, format!("{}", std::process::id()))?;
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind to {}", self.socket_path.display()))?;

        // Set socket permissions (user only)
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.socket_path, fs::Permissions::from_mode(0o600))?;
        }

        info!("listening on {}", self.socket_path.display());
        Ok(listener)
    }

    /// Accept connections on `listener` until shutdown
    pub fn serve(self: &Arc<Self>, listener: UnixListener) -> Result<()> {
        let interval = self.engine.config().reindex_interval_secs;
        let mut scheduler = (interval > 0).then(|| {
            ReindexScheduler::start(Arc::clone(&self.engine), Duration::from_secs(interval))
        });

        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let _ = stream.set_read_timeout(Some(CONNECTION_TIMEOUT));

                    // Handle in new thread
                    let server = Arc::clone(self);
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream) {
                            warn!("connection error: {:#}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("accept error: {}", e);
                }
            }
        }

        if let Some(scheduler) = scheduler.as_mut() {
            scheduler.stop();
        }

        // Cleanup
        let _ = fs::remove_file(&self.socket_path);
        if let Some(pid_path) = &self.pid_path {
            let _ = fs::remove_file(pid_path);
        }
        info!("stopped");
        Ok(())
    }

    /// Handle a single client connection
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        loop {
            let request: Request = match read_message(&mut reader) {
                Ok(req) => req,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Client disconnected
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    let resp = Response::Error {
                        message: format!("Invalid request: {}", e),
                    };
                    write_message(&mut writer, &resp)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let response = self.handle_request(request);
            write_message(&mut writer, &response)?;

            if matches!(response, Response::ShuttingDown) {
                // Unblock the accept loop so it sees the flag
                let _ = UnixStream::connect(&self.socket_path);
                break;
            }
        }

        Ok(())
    }

    /// Handle a single request
    fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::Query { word } => self.handle_query(word),

            Request::Index => match self.engine.reindex_now() {
                Ok(ReindexOutcome::Completed(summary)) => Response::Indexed {
                    summary: Some(summary),
                },
                Ok(ReindexOutcome::AlreadyRunning) => Response::Indexed { summary: None },
                Err(e) => error_response("Reindex failed", e),
            },

            Request::AddRoot { root } => self.handle_add_root(root),

            Request::Roots => Response::Roots {
                roots: self.engine.roots(),
            },

            Request::Status => self.handle_status(),

            Request::Clear => match self.engine.clear() {
                Ok(()) => {
                    self.query_cache.lock().clear();
                    Response::Cleared
                }
                Err(e) => error_response("Clear failed", e),
            },

            Request::Shutdown => {
                self.shutdown.store(true, Ordering::Relaxed);
                Response::ShuttingDown
            }

            Request::Ping => Response::Pong,
        }
    }

    fn handle_query(&self, word: String) -> Response {
        let start = Instant::now();
        self.stats.queries_served.fetch_add(1, Ordering::Relaxed);

        let key = (self.engine.generation(), word);
        if let Some(paths) = self.query_cache.lock().get(&key) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Response::Matches(MatchesResponse {
                paths: paths.clone(),
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                cached: true,
            });
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let paths = self.engine.query(&key.1);
        self.query_cache.lock().put(key, paths.clone());

        Response::Matches(MatchesResponse {
            paths,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            cached: false,
        })
    }

    fn handle_add_root(&self, root: PathBuf) -> Response {
        if !root.is_dir() {
            return Response::Error {
                message: format!("Not a directory: {}", root.display()),
            };
        }
        match self.engine.add_root(&root) {
            Ok(summary) => Response::Indexed {
                summary: Some(summary),
            },
            Err(e) => error_response("Add root failed", e),
        }
    }

    /// Handle status request
    fn handle_status(&self) -> Response {
        Response::Status(StatusResponse {
            uptime_secs: self.stats.start_time.elapsed().as_secs(),
            queries_served: self.stats.queries_served.load(Ordering::Relaxed),
            cache_hit_rate: self.stats.cache_hit_rate(),
            reindex_interval_secs: self.engine.config().reindex_interval_secs,
            stats: self.engine.stats(),
        })
    }
}

fn error_response(what: &str, e: anyhow::Error) -> Response {
    error!("{}: {:#}", what, e);
    Response::Error {
        message: format!("{}: {:#}", what, e),
    }
}

fn open_server(data_dir: Option<&Path>) -> Result<Arc<IndexServer>> {
    let engine = Arc::new(SearchEngine::open_default(data_dir)?);
    Ok(IndexServer::new(engine, get_socket_path(), Some(get_pid_path())))
}

/// Daemonize the current process
pub fn daemonize(data_dir: Option<PathBuf>) -> Result<()> {
    // Fork using double-fork technique for proper daemonization
    match unsafe { libc::fork() } {
        -1 => anyhow::bail!("First fork failed"),
        0 => {
            // Child process
            // Create new session
            if unsafe { libc::setsid() } == -1 {
                anyhow::bail!("setsid failed");
            }

            // Second fork to prevent acquiring a controlling terminal
            match unsafe { libc::fork() } {
                -1 => anyhow::bail!("Second fork failed"),
                0 => {
                    // Grandchild - this becomes the daemon
                    unsafe {
                        libc::close(0);
                        libc::close(1);
                        libc::close(2);

                        // Redirect to /dev/null
                        let null = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
                        if null != -1 {
                            libc::dup2(null, 0);
                            libc::dup2(null, 1);
                            libc::dup2(null, 2);
                            if null > 2 {
                                libc::close(null);
                            }
                        }
                    }

                    // Change to root directory to avoid holding mounts
                    let _ = std::env::set_current_dir("/");

                    let result = open_server(data_dir.as_deref()).and_then(|server| server.run());
                    if let Err(e) = result {
                        // Can't really report this since stderr is closed
                        let _ = fs::write(error_log_path(), format!("{:#}", e));
                    }
                    std::process::exit(0);
                }
                _ => {
                    // First child exits immediately
                    std::process::exit(0);
                }
            }
        }
        _ => {
            // Parent process - wait for first child then exit
            unsafe {
                let mut status: libc::c_int = 0;
                libc::wait(&mut status);
            }
            Ok(())
        }
    }
}

/// Where a daemonized server reports a fatal startup error
pub fn error_log_path() -> PathBuf {
    let uid = unsafe { libc::getuid() };
    std::env::temp_dir().join(format!("pathfinder-{}-error.log", uid))
}

/// Start the daemon in foreground (for debugging)
pub fn run_foreground(data_dir: Option<&Path>) -> Result<()> {
    open_server(data_dir)?.run()
}

/// Stop the running daemon
pub fn stop_daemon() -> Result<bool> {
    let pid_path = get_pid_path();

    if !pid_path.exists() {
        return Ok(false);
    }

    let pid_str = fs::read_to_string(&pid_path)?;
    let pid: i32 = pid_str.trim().parse().context("Corrupt PID file")?;

    // Send SIGTERM
    unsafe {
        if libc::kill(pid, libc::SIGTERM) == 0 {
            // Wait a bit for graceful shutdown
            thread::sleep(Duration::from_millis(500));

            // Check if still running, send SIGKILL if needed
            if libc::kill(pid, 0) == 0 {
                thread::sleep(Duration::from_secs(1));
                if libc::kill(pid, 0) == 0 {
                    libc::kill(pid, libc::SIGKILL);
                }
            }
        }
    }

    // Clean up socket and pid files
    let _ = fs::remove_file(get_socket_path());
    let _ = fs::remove_file(&pid_path);

    Ok(true)
}

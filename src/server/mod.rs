//! Persistent index server
//!
//! A daemon keeps the engine warm and answers requests over a Unix socket.
//! The CLI connects when the daemon is up and opens the engine directly
//! otherwise.

pub mod client;
pub mod daemon;
pub mod protocol;
pub mod scheduler;

pub use client::{ClientError, IndexClient};

use crate::utils::APP_NAME;
use std::path::PathBuf;

fn runtime_file(ext: &str) -> PathBuf {
    // Try XDG_RUNTIME_DIR first (most secure, tmpfs-backed)
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(format!("{}.{}", APP_NAME, ext));
    }

    if let Some(home) = dirs::home_dir() {
        return home
            .join(".local")
            .join("run")
            .join(format!("{}.{}", APP_NAME, ext));
    }

    // Last resort: /tmp with user ID
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/{}-{}.{}", APP_NAME, uid, ext))
}

/// Socket the daemon listens on
pub fn get_socket_path() -> PathBuf {
    runtime_file("sock")
}

/// PID file written by the daemon
pub fn get_pid_path() -> PathBuf {
    runtime_file("pid")
}

/// Check if the daemon is running
pub fn is_daemon_running() -> bool {
    let Ok(pid_str) = std::fs::read_to_string(get_pid_path()) else {
        return false;
    };
    match pid_str.trim().parse::<i32>() {
        // kill(pid, 0) only probes for existence
        Ok(pid) => unsafe { libc::kill(pid, 0) == 0 },
        Err(_) => false,
    }
}

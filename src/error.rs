//! Errors raised while running a poll cycle
//!
//! Setup problems (bad config, missing secrets) surface as `anyhow` errors from
//! [`crate::config`]. Everything that can go wrong once the watcher is running
//! is a [`WatchError`], and the loop driver uses [`WatchError::is_fatal`] to
//! decide whether to keep polling.

use std::path::PathBuf;
use thiserror::Error;

/// Hint printed when the downloader cannot be found
pub const DOWNLOADER_INSTALL_HINT: &str = "pip install ctfd-downloader";

#[derive(Debug, Error)]
pub enum WatchError {
    /// The downloader executable does not exist or is not on PATH
    #[error("command '{program}' not found. Install it with: {hint}", hint = DOWNLOADER_INSTALL_HINT)]
    DownloaderMissing { program: String },

    /// The downloader ran but exited unsuccessfully
    #[error("downloader failed (exit code: {}): {stderr}", exit_code_label(.code))]
    DownloaderFailed { code: Option<i32>, stderr: String },

    /// The downloader could not be started or waited on
    #[error("failed to run downloader: {0}")]
    DownloaderIo(#[source] std::io::Error),

    #[error("failed to create content directory {}: {source}", .path.display())]
    ContentDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("alert sound file not found: {}", .0.display())]
    SoundMissing(PathBuf),

    #[error("could not play alert sound with {player}: {reason}")]
    Playback { player: String, reason: String },

    /// The push service answered with something other than 200
    #[error("push notification rejected (status: {status}): {body}")]
    NotifyStatus { status: u16, body: String },

    #[error("connection error while sending push notification: {0}")]
    NotifyRequest(#[from] reqwest::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl WatchError {
    /// Whether the watcher must stop instead of moving on to the next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchError::DownloaderMissing { .. })
    }
}

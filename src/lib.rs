//! ctfwatch - New Challenge Watcher for CTF Platforms
//!
//! ctfwatch runs `ctfd-downloader` on a fixed interval and compares the
//! challenge directory before and after every run. Whenever new files or
//! directories appear it plays a local alert sound and sends a Pushover
//! notification listing them.
//!
//! ## Modules
//!
//! - [`config`]: Settings file, CLI overrides and environment secrets
//! - [`snapshot`]: Directory snapshots and change detection
//! - [`downloader`]: External downloader invocation
//! - [`alert`]: Platform sound players
//! - [`notify`]: Pushover notifications
//! - [`watcher`]: The poll loop tying everything together

pub mod alert;
pub mod config;
pub mod downloader;
pub mod error;
pub mod notify;
pub mod snapshot;
pub mod watcher;

pub use config::{Config, Secrets, Settings};
pub use error::WatchError;
pub use snapshot::Snapshot;
pub use watcher::{CycleOutcome, Watcher};

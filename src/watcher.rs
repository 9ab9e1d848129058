//! Poll loop - periodic check for new CTF content
//!
//! Each cycle snapshots the challenge directory, runs the downloader, snapshots
//! again and reports whatever appeared in between. The loop keeps going after
//! recoverable errors and stops on interrupt or on a fatal [`WatchError`].

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::alert::{self, AlertPlayer};
use crate::config::Config;
use crate::downloader::{CtfdDownloader, Downloader};
use crate::error::WatchError;
use crate::notify::{Notifier, PushoverNotifier};
use crate::snapshot::Snapshot;

/// What a single poll cycle found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NoNewContent,
    NewContent(Vec<String>),
}

/// Watcher state and collaborators
pub struct Watcher {
    config: Arc<Config>,
    downloader: Box<dyn Downloader>,
    player: Box<dyn AlertPlayer>,
    notifier: Box<dyn Notifier>,
}

impl Watcher {
    pub fn new(
        config: Arc<Config>,
        downloader: Box<dyn Downloader>,
        player: Box<dyn AlertPlayer>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            downloader,
            player,
            notifier,
        }
    }

    /// Watcher wired to `ctfd-downloader`, the platform sound player and Pushover
    pub fn with_defaults(config: Arc<Config>) -> Result<Self> {
        let downloader = Box::new(CtfdDownloader::new(config.clone()));
        let player = alert::platform_player();
        let notifier = Box::new(PushoverNotifier::new(config.clone())?);

        debug!("Using sound player: {}", player.name());
        Ok(Self::new(config, downloader, player, notifier))
    }

    /// Poll until Ctrl+C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Poll until `shutdown` completes or a fatal error occurs
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Watcher loop started with interval: {:?}",
            self.config.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Watcher stopped by user, exiting");
                    return Ok(());
                }

                result = self.cycle_then_wait() => {
                    result?;
                }
            }
        }
    }

    /// One check followed by the interval sleep
    async fn cycle_then_wait(&self) -> Result<(), WatchError> {
        match self.check_once().await {
            Ok(CycleOutcome::NoNewContent) => info!("No new content found"),
            Ok(CycleOutcome::NewContent(items)) => {
                debug!("Cycle reported {} new items", items.len())
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => error!("Check skipped: {}", e),
        }

        tokio::time::sleep(self.config.interval).await;
        Ok(())
    }

    /// Run a single sync-diff-alert-notify cycle
    pub async fn check_once(&self) -> Result<CycleOutcome, WatchError> {
        let content_dir = self.config.content_dir();
        tokio::fs::create_dir_all(&content_dir)
            .await
            .map_err(|source| WatchError::ContentDir {
                path: content_dir.clone(),
                source,
            })?;

        let before = Snapshot::capture(&content_dir);

        info!(
            "Checking {} at {}...",
            self.config.url,
            chrono::Local::now().format("%H:%M:%S")
        );
        self.downloader.sync().await?;

        let after = Snapshot::capture(&content_dir);
        let new_items = after.new_since(&before);

        if new_items.is_empty() {
            return Ok(CycleOutcome::NoNewContent);
        }

        // sound_alert already warned; the notification goes out regardless
        if let Err(e) = alert::sound_alert(self.player.as_ref(), &self.config.alert_sound).await {
            debug!("Alert not played: {}", e);
        }

        info!("New content found:");
        for item in &new_items {
            info!("  - {}", item);
        }

        if let Err(e) = self.notifier.notify(&new_items).await {
            error!("Failed to send notification: {}", e);
        }

        Ok(CycleOutcome::NewContent(new_items))
    }
}

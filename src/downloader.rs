use async_trait::async_trait;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::config::Config;
use crate::error::WatchError;

/// Something that refreshes the local copy of the CTF content
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Run one synchronization, returning once the content directory is up to date
    async fn sync(&self) -> Result<(), WatchError>;
}

/// Runs `ctfd-downloader` (or a compatible executable) in update mode
pub struct CtfdDownloader {
    config: Arc<Config>,
}

impl CtfdDownloader {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Arguments passed to the downloader, in order
    pub fn args(&self) -> Vec<String> {
        vec![
            "-u".to_string(),
            self.config.url.clone(),
            "-n".to_string(),
            self.config.ctf_name.clone(),
            "-o".to_string(),
            self.config.output_dir.to_string_lossy().into_owned(),
            "-t".to_string(),
            self.config.secrets.ctf_token.clone(),
            "--update".to_string(),
        ]
    }
}

#[async_trait]
impl Downloader for CtfdDownloader {
    async fn sync(&self) -> Result<(), WatchError> {
        let program = &self.config.downloader;
        debug!("Running {} for {}", program, self.config.ctf_name);

        let output = AsyncCommand::new(program)
            .args(self.args())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => WatchError::DownloaderMissing {
                    program: program.clone(),
                },
                _ => WatchError::DownloaderIo(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(WatchError::DownloaderFailed {
                code: output.status.code(),
                stderr,
            });
        }

        debug!(
            "Downloader finished: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}

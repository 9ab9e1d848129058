//! Common test utilities and helpers for ctfwatch tests

use async_trait::async_trait;
use ctfwatch::alert::AlertPlayer;
use ctfwatch::{Config, Secrets, Settings, WatchError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_CTF_NAME: &str = "quals";

/// Temporary output directory with a config pointing into it
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub sound_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let sound_path = temp_dir.path().join("alert.wav");
        std::fs::write(&sound_path, b"RIFF").expect("Failed to write sound file");

        Self {
            temp_dir,
            sound_path,
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn content_dir(&self) -> PathBuf {
        self.output_dir().join(TEST_CTF_NAME)
    }

    pub fn write_content(&self, relative: &str, body: &str) {
        let path = self.content_dir().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create content parent");
        }
        std::fs::write(path, body).expect("Failed to write content file");
    }

    /// Config for this environment with a short interval and the given push endpoint
    pub fn config(&self, pushover_api_url: &str) -> Arc<Config> {
        let settings = Settings {
            url: "https://ctf.example.org".to_string(),
            ctf_name: TEST_CTF_NAME.to_string(),
            output_dir: self.output_dir().to_string_lossy().into_owned(),
            alert_sound: self.sound_path.to_string_lossy().into_owned(),
            pushover_api_url: pushover_api_url.to_string(),
            ..Settings::default()
        };

        let mut config = Config::new(settings, test_secrets()).expect("valid test settings");
        config.interval = Duration::from_millis(20);
        Arc::new(config)
    }
}

pub fn test_secrets() -> Secrets {
    Secrets {
        ctf_token: "ctfd_test_token".to_string(),
        pushover_api_token: "app-token".to_string(),
        pushover_user_key: "user-key".to_string(),
    }
}

/// Shared, ordered record of what the watcher did
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Downloader that writes a scripted set of files on each call
pub struct FakeDownloader {
    content_dir: PathBuf,
    batches: Mutex<Vec<Vec<&'static str>>>,
    result: fn() -> Result<(), WatchError>,
    pub calls: Arc<AtomicUsize>,
    log: EventLog,
}

impl FakeDownloader {
    pub fn new(content_dir: PathBuf, log: EventLog) -> Self {
        Self {
            content_dir,
            batches: Mutex::new(Vec::new()),
            result: || Ok(()),
            calls: Arc::new(AtomicUsize::new(0)),
            log,
        }
    }

    /// Files to create on the next call; later calls create nothing
    pub fn then_write(self, files: Vec<&'static str>) -> Self {
        self.batches.lock().unwrap().push(files);
        self
    }

    pub fn failing_with(mut self, result: fn() -> Result<(), WatchError>) -> Self {
        self.result = result;
        self
    }
}

#[async_trait]
impl ctfwatch::downloader::Downloader for FakeDownloader {
    async fn sync(&self) -> Result<(), WatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.push("sync");

        let batch = {
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.remove(0)
            }
        };

        for file in batch {
            let path = self.content_dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "flag{...}").unwrap();
        }

        (self.result)()
    }
}

/// Player that only records that it was asked to play
pub struct RecordingPlayer {
    log: EventLog,
}

impl RecordingPlayer {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl AlertPlayer for RecordingPlayer {
    async fn play(&self, _sound: &Path) -> Result<(), WatchError> {
        self.log.push("play");
        Ok(())
    }

    fn name(&self) -> String {
        "recording".to_string()
    }
}

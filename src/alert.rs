//! Local sound alerts
//!
//! Each platform plays sounds differently, so playback sits behind the
//! [`AlertPlayer`] trait and the implementation is chosen once at startup by
//! [`platform_player`].

use async_trait::async_trait;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use tokio::process::Command as AsyncCommand;
use tracing::{info, warn};

use crate::error::WatchError;

/// Plays a sound file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertPlayer: Send + Sync {
    /// Play `sound` to completion
    async fn play(&self, sound: &Path) -> Result<(), WatchError>;

    /// Short name used in log messages
    fn name(&self) -> String;
}

/// Plays sounds by running an external command with the file as last argument
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// ALSA player shipped with most Linux distributions
    pub fn aplay() -> Self {
        Self::new("aplay", vec!["-q".to_string()])
    }

    /// Built-in macOS player
    pub fn afplay() -> Self {
        Self::new("afplay", Vec::new())
    }
}

#[async_trait]
impl AlertPlayer for CommandPlayer {
    async fn play(&self, sound: &Path) -> Result<(), WatchError> {
        let args = self
            .args
            .iter()
            .map(OsStr::new)
            .chain(std::iter::once(sound.as_os_str()));
        run_player(&self.program, args).await
    }

    fn name(&self) -> String {
        self.program.clone()
    }
}

/// Plays sounds on Windows through the .NET `SoundPlayer`
#[derive(Debug, Clone, Default)]
pub struct PowerShellPlayer;

#[async_trait]
impl AlertPlayer for PowerShellPlayer {
    async fn play(&self, sound: &Path) -> Result<(), WatchError> {
        let script = format!(
            "(New-Object Media.SoundPlayer '{}').PlaySync()",
            sound.to_string_lossy().replace('\'', "''")
        );
        run_player("powershell", ["-NoProfile", "-Command", script.as_str()]).await
    }

    fn name(&self) -> String {
        "powershell".to_string()
    }
}

async fn run_player<I, S>(program: &str, args: I) -> Result<(), WatchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = AsyncCommand::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| WatchError::Playback {
            player: program.to_string(),
            reason: match e.kind() {
                ErrorKind::NotFound => format!("'{}' is not installed", program),
                _ => e.to_string(),
            },
        })?;

    if !output.status.success() {
        return Err(WatchError::Playback {
            player: program.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// Used on platforms without a known player; only logs
#[derive(Debug, Clone, Default)]
pub struct SilentPlayer {
    os: String,
}

#[async_trait]
impl AlertPlayer for SilentPlayer {
    async fn play(&self, _sound: &Path) -> Result<(), WatchError> {
        info!("No default sound player configured for {}", self.os);
        Ok(())
    }

    fn name(&self) -> String {
        "none".to_string()
    }
}

/// Pick the player for an OS identifier as reported by `std::env::consts::OS`
pub fn player_for_os(os: &str) -> Box<dyn AlertPlayer> {
    match os {
        "linux" => Box::new(CommandPlayer::aplay()),
        "macos" => Box::new(CommandPlayer::afplay()),
        "windows" => Box::new(PowerShellPlayer),
        other => Box::new(SilentPlayer {
            os: other.to_string(),
        }),
    }
}

/// Player for the platform this process runs on
pub fn platform_player() -> Box<dyn AlertPlayer> {
    player_for_os(std::env::consts::OS)
}

/// Print the alert banner and play `sound`
///
/// Missing files and playback failures are logged and returned; they never stop
/// the watcher.
pub async fn sound_alert(player: &dyn AlertPlayer, sound: &Path) -> Result<(), WatchError> {
    println!();
    println!("!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
    println!("!!!   NEW CONTENT DETECTED!    !!!");
    println!("!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
    println!();

    if !sound.exists() {
        let err = WatchError::SoundMissing(sound.to_path_buf());
        warn!("{}", err);
        return Err(err);
    }

    if let Err(e) = player.play(sound).await {
        warn!(
            "{}. Check that '{}' is installed and can play {}",
            e,
            player.name(),
            sound.display()
        );
        return Err(e);
    }

    Ok(())
}

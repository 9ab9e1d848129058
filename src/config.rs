use anyhow::{bail, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the CTF platform access token
pub const CTF_TOKEN_VAR: &str = "CTF_TOKEN";
/// Environment variable holding the Pushover application token
pub const PUSHOVER_API_TOKEN_VAR: &str = "PUSHOVER_API_TOKEN";
/// Environment variable holding the Pushover user key
pub const PUSHOVER_USER_KEY_VAR: &str = "PUSHOVER_USER_KEY";

/// Pushover message endpoint
pub const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Non-secret settings, loadable from a YAML file and overridable from the CLI
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// CTF platform URL
    #[serde(default = "default_url")]
    pub url: String,

    /// CTF name, also the name of the challenge directory
    #[serde(default = "default_ctf_name")]
    pub ctf_name: String,

    /// Base directory the downloader writes into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Time between checks
    #[serde(default = "default_interval")]
    pub interval: String, // "15", "30s", "2m"

    /// Sound played when new content shows up
    #[serde(default = "default_alert_sound")]
    pub alert_sound: String,

    /// Downloader executable
    #[serde(default = "default_downloader")]
    pub downloader: String,

    /// Push notification endpoint
    #[serde(default = "default_pushover_api_url")]
    pub pushover_api_url: String,
}

// Default value functions
fn default_url() -> String {
    "https://ctf.donotecho.dev".to_string()
}
fn default_ctf_name() -> String {
    "ctf_name".to_string()
}
fn default_output_dir() -> String {
    ".".to_string()
}
fn default_interval() -> String {
    "15".to_string()
}
fn default_alert_sound() -> String {
    "alert.wav".to_string()
}
fn default_downloader() -> String {
    "ctfd-downloader".to_string()
}
fn default_pushover_api_url() -> String {
    PUSHOVER_API_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: default_url(),
            ctf_name: default_ctf_name(),
            output_dir: default_output_dir(),
            interval: default_interval(),
            alert_sound: default_alert_sound(),
            downloader: default_downloader(),
            pushover_api_url: default_pushover_api_url(),
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to built-in defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load settings from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(settings)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("ctfwatch").join("config.yml"))
    }

    /// Expand `~` and environment variables in path settings
    pub fn expand_paths(&mut self) -> Result<()> {
        self.output_dir = shellexpand::full(&self.output_dir)
            .context("Failed to expand output_dir path")?
            .into_owned();

        self.alert_sound = shellexpand::full(&self.alert_sound)
            .context("Failed to expand alert_sound path")?
            .into_owned();

        Ok(())
    }
}

/// Parse durations like "15", "30s", "2m", "1h", "1d" into seconds
pub fn parse_interval(interval: &str) -> Result<u64> {
    let interval = interval.trim().to_lowercase();

    let (value, unit, invalid) = if let Some(value) = interval.strip_suffix('s') {
        (value, 1, "Invalid seconds value")
    } else if let Some(value) = interval.strip_suffix('m') {
        (value, 60, "Invalid minutes value")
    } else if let Some(value) = interval.strip_suffix('h') {
        (value, 3600, "Invalid hours value")
    } else if let Some(value) = interval.strip_suffix('d') {
        (value, 86400, "Invalid days value")
    } else {
        (
            interval.as_str(),
            1,
            "Invalid interval format. Use seconds or a format like '30s', '2m', '1h'",
        )
    };

    let count = value.parse::<u64>().context(invalid)?;

    let Some(seconds) = count.checked_mul(unit) else {
        bail!("Check interval is too large: {}", interval);
    };

    if seconds == 0 {
        bail!("Check interval must be at least one second");
    }

    Ok(seconds)
}

/// Credentials read from the environment
#[derive(Clone)]
pub struct Secrets {
    pub ctf_token: String,
    pub pushover_api_token: String,
    pub pushover_user_key: String,
}

impl Secrets {
    /// Read all credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read all credentials through `lookup`, reporting every missing one at once
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let ctf_token = fetch(CTF_TOKEN_VAR);
        let pushover_api_token = fetch(PUSHOVER_API_TOKEN_VAR);
        let pushover_user_key = fetch(PUSHOVER_USER_KEY_VAR);

        match (ctf_token, pushover_api_token, pushover_user_key) {
            (Some(ctf_token), Some(pushover_api_token), Some(pushover_user_key)) => Ok(Self {
                ctf_token,
                pushover_api_token,
                pushover_user_key,
            }),
            (ctf_token, api_token, user_key) => {
                let missing: Vec<&str> = [
                    (CTF_TOKEN_VAR, ctf_token.is_none()),
                    (PUSHOVER_API_TOKEN_VAR, api_token.is_none()),
                    (PUSHOVER_USER_KEY_VAR, user_key.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, is_missing)| is_missing.then_some(name))
                .collect();

                bail!(
                    "Environment variables not set: {}. Make sure to define {}, {} and {}",
                    missing.join(", "),
                    CTF_TOKEN_VAR,
                    PUSHOVER_API_TOKEN_VAR,
                    PUSHOVER_USER_KEY_VAR
                )
            }
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("ctf_token", &"<redacted>")
            .field("pushover_api_token", &"<redacted>")
            .field("pushover_user_key", &"<redacted>")
            .finish()
    }
}

/// Immutable runtime configuration shared by every component
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub ctf_name: String,
    pub output_dir: PathBuf,
    pub interval: Duration,
    pub alert_sound: PathBuf,
    pub downloader: String,
    pub pushover_api_url: String,
    pub secrets: Secrets,
}

impl Config {
    /// Build the runtime configuration from resolved settings and secrets
    pub fn new(mut settings: Settings, secrets: Secrets) -> Result<Self> {
        settings.expand_paths()?;

        if settings.ctf_name.trim().is_empty() {
            bail!("CTF name must not be empty");
        }

        let interval_secs = parse_interval(&settings.interval)
            .with_context(|| format!("Invalid check interval: {:?}", settings.interval))?;

        Ok(Self {
            url: settings.url,
            ctf_name: settings.ctf_name,
            output_dir: PathBuf::from(settings.output_dir),
            interval: Duration::from_secs(interval_secs),
            alert_sound: PathBuf::from(settings.alert_sound),
            downloader: settings.downloader,
            pushover_api_url: settings.pushover_api_url,
            secrets,
        })
    }

    /// Directory the downloader populates for this CTF
    pub fn content_dir(&self) -> PathBuf {
        self.output_dir.join(&self.ctf_name)
    }
}

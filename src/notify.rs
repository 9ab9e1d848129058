use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::WatchError;

/// Request timeout for the push service
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Notification title
pub const NOTIFY_TITLE: &str = "New CTF Challenge Detected!";

/// Pushover sound played on the receiving devices
pub const NOTIFY_SOUND: &str = "persistent";

/// Delivers a message about new content to the user
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, new_items: &[String]) -> Result<(), WatchError>;
}

/// Build the notification body listing every new path
pub fn compose_message(ctf_name: &str, new_items: &[String]) -> String {
    let mut message = format!("New content for '{}':\n", ctf_name);
    for item in new_items {
        message.push_str("\n- ");
        message.push_str(item);
    }
    message
}

/// Sends notifications through the Pushover message API
pub struct PushoverNotifier {
    client: Client,
    config: Arc<Config>,
}

impl PushoverNotifier {
    pub fn new(config: Arc<Config>) -> Result<Self, WatchError> {
        let client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .user_agent(concat!("ctfwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, new_items: &[String]) -> Result<(), WatchError> {
        info!("Sending Pushover notification...");

        let message = compose_message(&self.config.ctf_name, new_items);
        let form = [
            ("token", self.config.secrets.pushover_api_token.as_str()),
            ("user", self.config.secrets.pushover_user_key.as_str()),
            ("title", NOTIFY_TITLE),
            ("message", message.as_str()),
            ("sound", NOTIFY_SOUND),
        ];

        let response = self
            .client
            .post(&self.config.pushover_api_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::NotifyStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Pushover accepted notification for {} items", new_items.len());
        info!("Pushover notification sent");
        Ok(())
    }
}

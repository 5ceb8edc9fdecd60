//! Configuration loaded from `skland.toml` and the environment.
//!
//! [`AppConfig`] holds every tunable. Values missing from the file fall back
//! to defaults; environment variables override the file, and CLI flags
//! override both (applied in `main`).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::attendance::RetrySettings;
use crate::error::AppError;
use crate::notify::{Channel, NotifierOptions};
use crate::orchestrator::AccountJob;

pub const DEFAULT_CONFIG_FILE: &str = "skland.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Skland account tokens, one per account.
    #[serde(default)]
    pub tokens: Vec<String>,

    #[serde(default)]
    pub channels: ChannelTargets,

    /// Failed attempts allowed per character.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts of the same character, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Reject plain-http webhook URLs.
    #[serde(default = "default_require_https")]
    pub require_https: bool,
}

/// Notification destinations; each one is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChannelTargets {
    pub serverchan_sendkey: Option<String>,
    pub bark_url: Option<String>,
    pub message_pusher_url: Option<String>,
    pub wechatwork_url: Option<String>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_require_https() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            channels: ChannelTargets::default(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            require_https: default_require_https(),
        }
    }
}

impl AppConfig {
    /// Loads `path` (or `skland.toml` in the working directory) if present,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<AppConfig>(&contents)?)
    }

    /// Applies overrides from `lookup` (the process environment in
    /// production). Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(tokens) = get("SKLAND_TOKEN") {
            self.tokens = split_tokens(&tokens);
        }
        if let Some(key) = get("SERVERCHAN_SENDKEY").or_else(|| get("SERVER_CHAN_KEY")) {
            self.channels.serverchan_sendkey = Some(key);
        }
        if let Some(url) = get("BARK_URL") {
            self.channels.bark_url = Some(url);
        }
        if let Some(url) = get("MESSAGE_PUSHER_URL") {
            self.channels.message_pusher_url = Some(url);
        }
        if let Some(url) = get("WECHATWORK_URL") {
            self.channels.wechatwork_url = Some(url);
        }
        // Unparseable or zero values keep the current setting.
        let max_retries = get("MAX_RETRIES")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|n| *n > 0);
        if let Some(n) = max_retries {
            self.max_retries = n;
        }
    }

    /// Checks the settings needed to run check-ins.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tokens.is_empty() {
            return Err(AppError::NoAccounts);
        }
        if self.max_retries == 0 {
            return Err(AppError::Config("max_retries must be at least 1".into()));
        }
        Ok(())
    }

    /// Configured channels in delivery order; blank entries are skipped.
    pub fn channels(&self) -> Vec<Channel> {
        let pick = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let targets = &self.channels;
        let mut out = Vec::new();
        if let Some(send_key) = pick(&targets.serverchan_sendkey) {
            out.push(Channel::ServerChan { send_key });
        }
        if let Some(url) = pick(&targets.bark_url) {
            out.push(Channel::Bark { url });
        }
        if let Some(url) = pick(&targets.message_pusher_url) {
            out.push(Channel::MessagePusher { url });
        }
        if let Some(url) = pick(&targets.wechatwork_url) {
            out.push(Channel::WeChatWork { url });
        }
        out
    }

    pub fn account_jobs(&self) -> Vec<AccountJob> {
        let channels = self.channels();
        self.tokens
            .iter()
            .map(|token| AccountJob::new(token.clone(), channels.clone()))
            .collect()
    }

    pub fn retry_settings(&self) -> RetrySettings {
        RetrySettings {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notifier_options(&self) -> NotifierOptions {
        NotifierOptions {
            require_https: self.require_https,
            request_timeout: self.request_timeout(),
            ..Default::default()
        }
    }
}

fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

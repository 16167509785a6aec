use crate::error::{CheckinError, Result};
use crate::models::DelayConfig;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://neworld.cloud";
const DEFAULT_SLOT: &str = "UNKNOWN";
const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";
const DEFAULT_LOG_FILE: &str = "run.log";

/// Portal login pair for one slot.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &crate::mask::mask_email(&self.email))
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything one run needs, read from the environment.
#[derive(Clone)]
pub struct Settings {
    pub slot: String,
    pub username: String,
    pub password: String,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub base_url: String,
    /// Directory holding the `SIGNED_<slot>.txt` marker files.
    pub signed_dir: PathBuf,
    /// `None` disables page snapshots.
    pub snapshot_dir: Option<PathBuf>,
    /// `None` logs to stderr only.
    pub log_file: Option<PathBuf>,
    /// Number of times the login/check-in sequence is tried, at least 1.
    pub attempts: u32,
    pub retry_delay: Duration,
    pub delay: DelayConfig,
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let non_empty = |key: &str| text(key).filter(|v| !v.is_empty());
        let path_or = |key: &str, default: &str| match text(key) {
            Some(v) if v.is_empty() => None,
            Some(v) => Some(PathBuf::from(v)),
            None => Some(PathBuf::from(default)),
        };

        let attempts: u32 = parse_or(&lookup, "CHECKIN_ATTEMPTS", 1)?;
        if attempts == 0 {
            return Err(CheckinError::ConfigError(
                "CHECKIN_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let defaults = DelayConfig::default();
        let min_delay_ms = parse_or(&lookup, "PAGE_DELAY_MIN_MS", defaults.min_delay_ms)?;
        let max_delay_ms = parse_or(&lookup, "PAGE_DELAY_MAX_MS", defaults.max_delay_ms)?;

        Ok(Self {
            slot: non_empty("SLOT_NAME").unwrap_or_else(|| DEFAULT_SLOT.to_string()),
            // Credentials are kept verbatim; `credentials()` decides whether they are usable.
            username: lookup("USERNAME").unwrap_or_default(),
            password: lookup("PASSWORD").unwrap_or_default(),
            telegram_token: non_empty("TG_BOT_TOKEN"),
            telegram_chat_id: non_empty("TG_CHAT_ID"),
            base_url: non_empty("NEWORLD_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            signed_dir: non_empty("SIGNED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            snapshot_dir: path_or("SNAPSHOT_DIR", DEFAULT_SNAPSHOT_DIR),
            log_file: path_or("LOG_FILE", DEFAULT_LOG_FILE),
            attempts,
            retry_delay: Duration::from_secs(parse_or(&lookup, "CHECKIN_RETRY_DELAY_SECS", 5)?),
            delay: DelayConfig {
                min_delay_ms,
                max_delay_ms,
                enabled: max_delay_ms > 0,
            },
        })
    }

    /// The login pair, if both halves are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        let email = self.username.trim();
        if email.is_empty() || self.password.trim().is_empty() {
            return None;
        }
        Some(Credentials {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }

    /// The account e-mail in its redacted form.
    pub fn masked_email(&self) -> String {
        crate::mask::mask_email(&self.username)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("slot", &self.slot)
            .field("username", &self.masked_email())
            .field("password", &"<redacted>")
            .field("telegram", &self.telegram_token.is_some())
            .field("base_url", &self.base_url)
            .field("signed_dir", &self.signed_dir)
            .field("snapshot_dir", &self.snapshot_dir)
            .field("log_file", &self.log_file)
            .field("attempts", &self.attempts)
            .field("retry_delay", &self.retry_delay)
            .field("delay", &self.delay)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| CheckinError::ConfigError(format!("{} is not a valid number: {}", key, v))),
    }
}

use crate::error::{CheckinError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Placeholder written for any value that could not be obtained.
pub const MISSING: &str = "-";

const FIELD_SEPARATOR: &str = " | ";

/// Outcome of one run for a slot, as written to the marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The check-in control was triggered during this run.
    Success,
    /// The portal reported the check-in as already done today.
    AlreadyDone,
    /// The run aborted with an error.
    Failed,
    /// No credentials were configured for the slot.
    CheckNoConfig,
}

impl Status {
    /// Whether a record with this status settles the day for its slot.
    ///
    /// Only `Failed` leaves the day open for another attempt.
    pub fn is_final(&self) -> bool {
        !matches!(self, Status::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::AlreadyDone => "ALREADY_DONE",
            Status::Failed => "FAILED",
            Status::CheckNoConfig => "CHECK_NO_CONFIG",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CheckinError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "SUCCESS" => Ok(Status::Success),
            "ALREADY_DONE" => Ok(Status::AlreadyDone),
            "FAILED" => Ok(Status::Failed),
            "CHECK_NO_CONFIG" => Ok(Status::CheckNoConfig),
            other => Err(CheckinError::ParsingError(format!(
                "Unknown status: {}",
                other
            ))),
        }
    }
}

/// One line of the per-slot marker file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedRecord {
    /// `YYYY-MM-DD HH:MM:SS` in the portal's time zone.
    pub timestamp: String,
    /// The slot this run belonged to.
    pub slot: String,
    /// The account e-mail, already masked.
    pub email: String,
    pub status: Status,
    /// Remaining quota as displayed by the portal (e.g. `"120.5 GB"`).
    pub remaining: String,
    /// Latest traffic usage in GB, taken from the history series.
    pub used_gb: Option<f64>,
    /// Plan expiry as displayed by the portal.
    pub expire: String,
    /// Raw comma-separated traffic history series.
    pub history: String,
    /// Free text, typically the error message of a failed run.
    pub detail: String,
}

impl SignedRecord {
    /// A record with every optional field set to [`MISSING`].
    pub fn new(timestamp: String, slot: &str, email: &str, status: Status) -> Self {
        Self {
            timestamp,
            slot: slot.to_string(),
            email: email.to_string(),
            status,
            remaining: MISSING.to_string(),
            used_gb: None,
            expire: MISSING.to_string(),
            history: MISSING.to_string(),
            detail: MISSING.to_string(),
        }
    }

    /// Fills quota, expiry and history from a scraped user page.
    pub fn with_account(mut self, account: &AccountSnapshot) -> Self {
        self.remaining = or_missing(account.remaining.as_deref());
        self.expire = or_missing(account.expire.as_deref());
        self.history = or_missing(account.history.as_deref());
        self.used_gb = account.last_used_gb();
        self
    }

    pub fn with_detail(mut self, detail: &str) -> Self {
        self.detail = flatten(detail);
        self
    }

    /// `YYYY-MM-DD` part of the timestamp.
    pub fn day(&self) -> &str {
        self.timestamp.split(' ').next().unwrap_or_default()
    }

    pub fn used_text(&self) -> String {
        match self.used_gb {
            Some(used) => format!("{:.2}GB", used),
            None => MISSING.to_string(),
        }
    }

    /// Renders the record as a single marker-file line, without the newline.
    pub fn to_line(&self) -> String {
        format!(
            "{ts} | {slot} | {email} | {status} | remaining={remaining} | used={used} | expire={expire} | history={history} | detail={detail}",
            ts = self.timestamp,
            slot = flatten(&self.slot),
            email = flatten(&self.email),
            status = self.status,
            remaining = flatten(&self.remaining),
            used = self.used_text(),
            expire = flatten(&self.expire),
            history = flatten(&self.history),
            detail = flatten(&self.detail),
        )
    }

    /// Parses a marker-file line.
    ///
    /// The first four fields are positional. Every later field is `key=value`
    /// and may be absent, since older lines carried neither `used` nor
    /// `history`. `detail` is always the last field.
    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.splitn(4, FIELD_SEPARATOR);

        let mut next = |name: &'static str| {
            fields.next().map(str::trim).ok_or_else(|| {
                CheckinError::ParsingError(format!("Missing {} in: {}", name, line))
            })
        };
        let timestamp = next("timestamp")?.to_string();
        let slot = next("slot")?.to_string();
        let email = next("email")?.to_string();
        let rest = next("status")?;

        let (status_text, tail) = rest.split_once(FIELD_SEPARATOR).unwrap_or((rest, ""));
        let mut record = SignedRecord::new(timestamp, &slot, &email, status_text.parse()?);

        // Everything after `detail=` belongs to the detail, separators included.
        let (keyed, detail) = match tail.find("detail=") {
            Some(pos) => (&tail[..pos], Some(&tail[pos + "detail=".len()..])),
            None => (tail, None),
        };
        if let Some(detail) = detail {
            record.detail = detail.trim().to_string();
        }

        for field in keyed.split(FIELD_SEPARATOR) {
            let Some((key, value)) = field.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key {
                "remaining" => record.remaining = value,
                "expire" => record.expire = value,
                "history" => record.history = value,
                "used" => {
                    record.used_gb = value.trim_end_matches("GB").parse::<f64>().ok();
                }
                _ => {}
            }
        }

        Ok(record)
    }
}

impl fmt::Display for SignedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// State of the account as scraped from the user-center page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Text of the check-in control.
    pub checkin_label: String,
    /// Remaining quota including its unit, e.g. `"120.5 GB"`.
    pub remaining: Option<String>,
    /// Plan expiry, `YYYY-MM-DD HH:MM:SS`.
    pub expire: Option<String>,
    /// Daily traffic usage series in GB, comma separated, oldest first.
    pub history: Option<String>,
}

impl AccountSnapshot {
    /// The portal relabels the control ("已签到", "签到成功") once triggered.
    pub fn already_checked_in(&self) -> bool {
        is_already_done_text(&self.checkin_label)
    }

    /// Usage of the most recent day in the history series.
    pub fn last_used_gb(&self) -> Option<f64> {
        self.history
            .as_deref()
            .and_then(crate::parsers::user_center::last_used_from_history)
    }
}

/// Whether a portal label or message says the check-in already happened.
pub fn is_already_done_text(text: &str) -> bool {
    text.contains('已') || text.contains("成功")
}

/// JSON body the portal answers AJAX form posts with.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalReply {
    /// `1` on success.
    pub ret: i64,
    #[serde(default)]
    pub msg: String,
}

impl PortalReply {
    pub fn is_ok(&self) -> bool {
        self.ret == 1
    }
}

/// Configuration for the settle pause between page loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Minimum sleep duration in milliseconds between requests.
    pub min_delay_ms: u64,
    /// Maximum sleep duration in milliseconds between requests.
    pub max_delay_ms: u64,
    /// Whether the pause is active.
    pub enabled: bool,
}

impl DelayConfig {
    /// Sleeps for a random duration within the configured window.
    pub async fn pause(&self) {
        if !self.enabled {
            return;
        }
        let (low, high) = if self.min_delay_ms <= self.max_delay_ms {
            (self.min_delay_ms, self.max_delay_ms)
        } else {
            (self.max_delay_ms, self.min_delay_ms)
        };
        let millis = rand::rng().random_range(low..=high);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

impl Default for DelayConfig {
    /// Default configuration: 2500ms - 3500ms, enabled.
    fn default() -> Self {
        Self {
            min_delay_ms: 2500,
            max_delay_ms: 3500,
            enabled: true,
        }
    }
}

fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => MISSING.to_string(),
    }
}

/// Keeps a value on one line and free of the field separator.
fn flatten(value: &str) -> String {
    let single_line = value
        .split(['\r', '\n'])
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = single_line.replace(FIELD_SEPARATOR, " / ");
    if cleaned.trim().is_empty() {
        MISSING.to_string()
    } else {
        cleaned.trim().to_string()
    }
}

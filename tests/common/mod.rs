// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use neworld_checkin::{CheckinError, Credentials, Notifier, Portal, Result, Settings};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

pub const PENDING_PAGE: &str = include_str!("../fixtures/user_center_pending.html");
pub const DONE_PAGE: &str = include_str!("../fixtures/user_center_done.html");
pub const NO_BUTTON_PAGE: &str = include_str!("../fixtures/user_center_no_button.html");
pub const LOGIN_PAGE: &str = include_str!("../fixtures/login.html");

/// How the fake portal answers the check-in POST.
#[derive(Clone)]
pub enum CheckinReply {
    Accepted(&'static str),
    Rejected(&'static str),
}

/// Scripted stand-in for the portal.
pub struct FakePortal {
    failing_logins: Mutex<u32>,
    pages: Mutex<VecDeque<&'static str>>,
    checkin: CheckinReply,
    last: Mutex<Option<String>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakePortal {
    /// Serves `pages` from `user_center()` in order; the last page repeats.
    pub fn new(pages: &[&'static str], checkin: CheckinReply) -> Self {
        Self {
            failing_logins: Mutex::new(0),
            pages: Mutex::new(pages.iter().copied().collect()),
            checkin,
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes the first `n` logins fail.
    pub fn failing_logins(self, n: u32) -> Self {
        *self.failing_logins.lock().unwrap() = n;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn called(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Portal for FakePortal {
    async fn login(&self, _credentials: &Credentials) -> Result<()> {
        self.called("login");
        *self.last.lock().unwrap() = Some(LOGIN_PAGE.to_string());

        let mut failing = self.failing_logins.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(CheckinError::AuthenticationFailed("wrong password".to_string()));
        }
        Ok(())
    }

    async fn user_center(&self) -> Result<String> {
        self.called("user_center");
        let mut pages = self.pages.lock().unwrap();
        let page = if pages.len() > 1 {
            pages.pop_front()
        } else {
            pages.front().copied()
        }
        .ok_or(CheckinError::SessionExpired)?;

        *self.last.lock().unwrap() = Some(page.to_string());
        Ok(page.to_string())
    }

    async fn check_in(&self) -> Result<String> {
        self.called("check_in");
        let (ret, msg) = match &self.checkin {
            CheckinReply::Accepted(msg) => (1, *msg),
            CheckinReply::Rejected(msg) => (0, *msg),
        };
        *self.last.lock().unwrap() = Some(format!(r#"{{"ret":{},"msg":"{}"}}"#, ret, msg));

        if ret == 1 {
            Ok(msg.to_string())
        } else {
            Err(CheckinError::CheckInRejected(msg.to_string()))
        }
    }

    fn last_page(&self) -> Option<String> {
        self.last.lock().unwrap().clone()
    }
}

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) {
        self.sent.lock().unwrap().push(text.to_string());
    }
}

/// Settings for a fast, offline run writing its marker file into `dir`.
pub fn settings(dir: &Path, extra: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = [
        ("SLOT_NAME", "A1"),
        ("USERNAME", "alice@example.com"),
        ("PASSWORD", "secret"),
        ("SNAPSHOT_DIR", ""),
        ("LOG_FILE", ""),
        ("PAGE_DELAY_MIN_MS", "0"),
        ("PAGE_DELAY_MAX_MS", "0"),
        ("CHECKIN_RETRY_DELAY_SECS", "0"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.insert("SIGNED_DIR".to_string(), dir.display().to_string());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    Settings::from_lookup(|key| vars.get(key).cloned()).expect("test settings are valid")
}

use crate::config::Credentials;
use crate::error::{CheckinError, Result};
use crate::models::{DelayConfig, PortalReply};
use crate::parsers;
use crate::snapshot::SnapshotWriter;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Response, Url};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const LOGIN_PATH: &str = "/auth/login";
const USER_CENTER_PATH: &str = "/user";
const CHECKIN_PATH: &str = "/user/checkin";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// The operations the check-in sequence needs from the portal.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Establishes an authenticated session.
    async fn login(&self, credentials: &Credentials) -> Result<()>;
    /// HTML of the user-center page.
    async fn user_center(&self) -> Result<String>;
    /// Triggers the daily check-in and returns the portal's message.
    async fn check_in(&self) -> Result<String>;
    /// The most recent page body received, for failure snapshots.
    fn last_page(&self) -> Option<String>;
}

/// Cookie-carrying HTTP session against an SSPanel-style portal.
pub struct NeworldClient {
    client: reqwest::Client,
    base_url: String,
    delay: DelayConfig,
    snapshots: SnapshotWriter,
    last_page: Mutex<Option<String>>,
}

impl NeworldClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DelayConfig::default())
    }

    pub fn with_config(base_url: &str, delay: DelayConfig) -> Result<Self> {
        let cookie_jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .cookie_provider(cookie_jar)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            delay,
            snapshots: SnapshotWriter::disabled(),
            last_page: Mutex::new(None),
        })
    }

    /// Saves the login page whenever `login` fetches it.
    pub fn with_snapshots(mut self, snapshots: SnapshotWriter) -> Self {
        self.snapshots = snapshots;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn remember(&self, body: &str) {
        if let Ok(mut last) = self.last_page.lock() {
            *last = Some(body.to_string());
        }
    }

    async fn read_body(&self, response: Response) -> Result<(Url, String)> {
        let final_url = response.url().clone();
        let body = response.error_for_status()?.text().await?;
        self.remember(&body);
        Ok((final_url, body))
    }

    /// GETs a page after the settle pause, returning the final URL and body.
    async fn fetch(&self, path: &str) -> Result<(Url, String)> {
        self.delay.pause().await;
        let response = self.client.get(self.url(path)).send().await?;
        self.read_body(response).await
    }

    async fn get_html(&self, path: &str) -> Result<String> {
        let (final_url, body) = self.fetch(path).await?;

        if !final_url.path().starts_with(path) {
            debug!(requested = path, landed = final_url.path(), "redirected away");
            return Err(CheckinError::SessionExpired);
        }

        Ok(body)
    }

    async fn post_form(&self, path: &str, params: &[(String, String)]) -> Result<(Url, String)> {
        let response = self
            .client
            .post(self.url(path))
            .header("X-Requested-With", "XMLHttpRequest")
            .form(params)
            .send()
            .await?;
        self.read_body(response).await
    }
}

#[async_trait]
impl Portal for NeworldClient {
    async fn login(&self, credentials: &Credentials) -> Result<()> {
        // --- STEP 1: GET the login page ---
        let (landed, page) = self.fetch(LOGIN_PATH).await?;
        self.snapshots.save("login_page", &page).await;

        // A live session cookie bounces the login page to the user center.
        if landed.path().starts_with(USER_CENTER_PATH) {
            info!("session already authenticated");
            return Ok(());
        }

        let mut params = parsers::login::parse_login_form(&page)?;

        // --- STEP 2: POST credentials along with the hidden fields ---
        params.push(("email".to_string(), credentials.email.clone()));
        params.push(("passwd".to_string(), credentials.password.clone()));
        params.push(("code".to_string(), String::new()));

        let (landed, body) = self.post_form(LOGIN_PATH, &params).await?;

        // --- STEP 3: Verify the outcome ---
        if let Ok(reply) = serde_json::from_str::<PortalReply>(&body) {
            if !reply.is_ok() {
                return Err(CheckinError::AuthenticationFailed(reply.msg));
            }
            info!(message = %reply.msg, "login accepted");
            return Ok(());
        }

        if landed.path().starts_with(LOGIN_PATH) || parsers::login::is_login_page(&body) {
            return Err(CheckinError::AuthenticationFailed(
                "the portal returned the login form again".to_string(),
            ));
        }

        info!(landed = landed.path(), "login accepted");
        Ok(())
    }

    async fn user_center(&self) -> Result<String> {
        self.get_html(USER_CENTER_PATH).await
    }

    async fn check_in(&self) -> Result<String> {
        let (_, body) = self.post_form(CHECKIN_PATH, &[]).await?;

        let reply: PortalReply = serde_json::from_str(&body).map_err(|e| {
            CheckinError::ParsingError(format!("Unexpected check-in response: {}", e))
        })?;

        if reply.is_ok() {
            Ok(reply.msg)
        } else {
            Err(CheckinError::CheckInRejected(reply.msg))
        }
    }

    fn last_page(&self) -> Option<String> {
        self.last_page.lock().ok().and_then(|last| last.clone())
    }
}

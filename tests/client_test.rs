// tests/client_test.rs

use neworld_checkin::{
    CheckinError, Credentials, DelayConfig, NeworldClient, Notifier, Portal, Result,
    SnapshotWriter, TelegramNotifier,
};
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = include_str!("fixtures/login.html");
const PENDING_PAGE: &str = include_str!("fixtures/user_center_pending.html");

fn client(server: &MockServer) -> NeworldClient {
    let delay = DelayConfig {
        enabled: false,
        ..Default::default()
    };
    NeworldClient::with_config(&server.uri(), delay).unwrap()
}

fn credentials() -> Credentials {
    Credentials {
        email: "alice@example.com".to_string(),
        password: "secret".to_string(),
    }
}

async fn serve_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn live_session_skips_the_credential_post() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/user"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PENDING_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client(&server).login(&credentials()).await?;
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn login_echoes_hidden_fields_with_the_credentials() -> Result<()> {
    let server = MockServer::start().await;
    serve_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(body_string_contains("csrf=f00d"))
        .and(body_string_contains("email=alice%40example.com"))
        .and(body_string_contains("passwd=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ret":1,"msg":"登录成功"}"#))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).login(&credentials()).await?;
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn login_rejected_by_json_reply() {
    let server = MockServer::start().await;
    serve_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ret":0,"msg":"邮箱或者密码错误"}"#))
        .mount(&server)
        .await;

    let result = client(&server).login(&credentials()).await;
    assert!(
        matches!(&result, Err(CheckinError::AuthenticationFailed(msg)) if msg == "邮箱或者密码错误"),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn login_form_served_again_means_bad_credentials() {
    let server = MockServer::start().await;
    serve_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    let result = client(&server).login(&credentials()).await;
    assert!(
        matches!(result, Err(CheckinError::AuthenticationFailed(_))),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn login_page_is_snapshotted() -> Result<()> {
    let dir = tempdir()?;
    let server = MockServer::start().await;
    serve_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ret":1,"msg":"ok"}"#))
        .mount(&server)
        .await;

    client(&server)
        .with_snapshots(SnapshotWriter::new(dir.path()))
        .login(&credentials())
        .await?;

    let saved: Vec<String> = std::fs::read_dir(dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    assert!(saved.iter().any(|name| name.ends_with("_login_page.html")), "saved: {:?}", saved);
    Ok(())
}

#[tokio::test]
async fn user_center_redirect_is_an_expired_session() {
    let server = MockServer::start().await;
    serve_login_page(&server).await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/auth/login"))
        .mount(&server)
        .await;

    let result = client(&server).user_center().await;
    assert!(
        matches!(result, Err(CheckinError::SessionExpired)),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn user_center_returns_the_page() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PENDING_PAGE))
        .mount(&server)
        .await;

    let client = client(&server);
    let page = client.user_center().await?;
    assert_eq!(page, PENDING_PAGE);
    assert_eq!(client.last_page().as_deref(), Some(PENDING_PAGE));
    Ok(())
}

#[tokio::test]
async fn accepted_check_in_returns_the_message() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/checkin"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ret":1,"msg":"获得了 500MB 流量"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let message = client(&server).check_in().await?;
    assert_eq!(message, "获得了 500MB 流量");
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn refused_check_in_carries_the_portal_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/checkin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ret":0,"msg":"您似乎已经签到过了..."}"#))
        .mount(&server)
        .await;

    let result = client(&server).check_in().await;
    assert!(
        matches!(&result, Err(CheckinError::CheckInRejected(msg)) if msg == "您似乎已经签到过了..."),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn non_json_check_in_reply_is_a_parsing_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/checkin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>502 Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = client(&server).check_in().await;
    assert!(
        matches!(result, Err(CheckinError::ParsingError(_))),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn telegram_message_is_posted_as_markdown_form() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123abc/sendMessage"))
        .and(body_string_contains("chat_id=42"))
        .and(body_string_contains("text=hello"))
        .and(body_string_contains("parse_mode=Markdown"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::with_api_base(&server.uri(), "123abc", "42")?;
    notifier.send("hello").await;

    server.verify().await;
    Ok(())
}

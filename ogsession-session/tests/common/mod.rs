//! Mock lobby and universe shared by the session integration tests.

#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, Utc};
use ogsession_core::Credentials;
use ogsession_session::{Endpoints, SessionSettings};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BEARER: &str = "f1d2c3b4-bearer";
pub const CHALLENGE_ID: &str = "c434aa65-5fd0-4e1e-bb9f-2d4e1c3a6f10";
pub const SESSION_MARKER: &str = "3c442273a6de4c8f79549e78f4c3ca50e7ea7580";
pub const PAGE_TOKEN: &str = "5e8f1c0b9a7d4e21b3c6f0a9d8e7c6b5";
pub const PLANET_ID: i64 = 33_677_371;
pub const ACCOUNT_ID: i64 = 106_734;

pub const SESSIONS_PATH: &str = "/api/v1/auth/thin/sessions";
pub const UNIVERSE_PATH: &str = "/s180-en/game/index.php";
pub const LOGIN_LINK_PATH: &str = "/api/users/me/loginLink";

pub const LOGGED_OUT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>OGame</title></head>
<body id="lobby"><a href="https://lobby.ogame.gameforge.com/">Play</a></body>
</html>"#;

pub fn settings(server: &MockServer) -> SessionSettings {
    SessionSettings::new("Zibal", "en")
        .with_endpoints(Endpoints::single_host(&server.uri()))
        .without_chat()
}

pub fn credentials() -> Credentials {
    Credentials::new("commander@example.com", "hunter2")
}

/// Logged-in page whose clock runs two hours ahead of UTC.
pub fn game_page(token: &str) -> String {
    let clock = (Utc::now() + ChronoDuration::hours(2)).format("%d.%m.%Y <span>%H:%M:%S</span>");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta name="ogame-session" content="{SESSION_MARKER}"/>
    <meta name="ogame-version" content="12.1.0"/>
    <meta name="ogame-language" content="en"/>
    <meta name="ogame-planet-id" content="{PLANET_ID}"/>
    <script type="text/javascript">
        var token = "{token}";
        reloadResources({{"resources":{{"metal":{{"amount":182345.51}},"crystal":{{"amount":91234}},"deuterium":{{"amount":40210.9}},"energy":{{"amount":-145}},"darkmatter":{{"amount":23450}}}}}});
    </script>
</head>
<body id="ingamepage">
    <li class="OGameClock">{clock}</li>
    <a href="/game/index.php?page=ingame&amp;component=lfbuildings">Lifeform</a>
</body>
</html>"#
    )
}

/// Logged-in page without any anti-forgery token.
pub fn tokenless_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head>
    <meta name="ogame-session" content="{SESSION_MARKER}"/>
    <meta name="ogame-planet-id" content="{PLANET_ID}"/>
</head><body></body></html>"#
    )
}

/// Mounts configuration, directory, binding, and landing page.
///
/// The credentials endpoint is left to each test.
pub async fn mount_lobby(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/config/configuration.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"window.config={"gameEnvironmentId":"0a31d605-ffaf-43e7-aa02-d06df7116fc8","platformGameId":"1dfd8e7e-6e1a-4eb1-8c64-03c3b62efd2f"};"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me/accounts"))
        .and(header("authorization", format!("Bearer {BEARER}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "server": { "language": "en", "number": 180 },
            "id": ACCOUNT_ID,
            "name": "Commander Nova",
            "lastPlayed": "2024-05-24T13:00:00+0000",
            "blocked": false
        }])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me/accounts"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "language": "en", "number": 179, "name": "Yildun", "playerCount": 900 },
            { "language": "en", "number": 180, "name": "Zibal", "playerCount": 1200, "playersOnline": 210 }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s180-en/api/serverData.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<serverData><name>Zibal</name><number>180</number><language>en</language>\
             <version>12.1.0</version><speed>8</speed><galaxies>6</galaxies><systems>499</systems></serverData>",
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN_LINK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_link(server)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s180-en/game/lobbylogin.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(game_page(PAGE_TOKEN)))
        .mount(server)
        .await;

    mount_page(server, "preferences", game_page(PAGE_TOKEN)).await;
}

/// Answers every credential submission with a fresh bearer token.
pub async fn mount_session_created(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(SESSIONS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": BEARER,
            "isPlatformLogin": false,
            "isGameAccountMigrated": false
        })))
        .mount(server)
        .await;
}

/// Serves an in-game component.
pub async fn mount_page(server: &MockServer, component: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("component", component))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Challenge services that accept every answer.
pub async fn mount_challenge(server: &MockServer, answer_status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/challenge/{CHALLENGE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": CHALLENGE_ID })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/challenge/{CHALLENGE_ID}/en-GB")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "presented" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/challenge/{CHALLENGE_ID}/en-GB/text")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG-question".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/challenge/{CHALLENGE_ID}/en-GB/drag-icons")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG-icons".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/challenge/{CHALLENGE_ID}/en-GB")))
        .respond_with(ResponseTemplate::new(answer_status))
        .mount(server)
        .await;
}

pub fn challenge_response() -> ResponseTemplate {
    ResponseTemplate::new(409)
        .insert_header(
            "gf-challenge-id",
            format!("{CHALLENGE_ID};https://challenge.gameforge.com").as_str(),
        )
        .set_body_json(json!({}))
}

/// Body of a successful login-link response.
pub fn login_link(server: &MockServer) -> serde_json::Value {
    json!({
        "url": format!("{}/s180-en/game/lobbylogin.php?id={ACCOUNT_ID}&token=one-shot", server.uri())
    })
}

/// Number of requests the server has seen on `request_path`.
pub async fn count_requests(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

pub fn short_timeout() -> Duration {
    Duration::from_millis(200)
}

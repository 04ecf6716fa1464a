//! Page fetching, actions, and arbitrated access against a mock universe.

mod common;

use common::*;
use ogsession_core::{PageKind, Priority, SessionError};
use ogsession_session::{ActionSpec, FetchOptions, SessionController, SessionHandle};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn logged_in(server: &MockServer) -> SessionController {
    mount_lobby(server).await;
    mount_session_created(server).await;
    let mut controller = SessionController::new(settings(server), credentials()).unwrap();
    controller.login(&CancellationToken::new()).await.unwrap();
    controller
}

#[tokio::test]
async fn test_landing_page_is_cached() {
    let server = MockServer::start().await;
    let mut controller = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("component", "overview"))
        .respond_with(ResponseTemplate::new(200).set_body_string(game_page(PAGE_TOKEN)))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let cached = controller
        .fetch_page(PageKind::Overview, FetchOptions::default(), &cancel)
        .await
        .unwrap();
    assert!(cached.from_cache);

    let fresh = controller
        .fetch_page(PageKind::Overview, FetchOptions::fresh(), &cancel)
        .await
        .unwrap();
    assert!(!fresh.from_cache);
    assert_eq!(fresh.planet_id, Some(PLANET_ID));
}

#[tokio::test]
async fn test_planet_pages_are_cached_separately() {
    let server = MockServer::start().await;
    let mut controller = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("component", "supplies"))
        .and(query_param("cp", "33677372"))
        .respond_with(ResponseTemplate::new(200).set_body_string(game_page(PAGE_TOKEN)))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let opts = FetchOptions::default().with_planet(33_677_372);
    let first = controller.fetch_page(PageKind::Supplies, opts, &cancel).await.unwrap();
    let second = controller.fetch_page(PageKind::Supplies, opts, &cancel).await.unwrap();
    assert!(!first.from_cache);
    assert!(second.from_cache);
}

#[tokio::test]
async fn test_auth_loss_relogs_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("component", "overview"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGGED_OUT_PAGE))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "overview", game_page(PAGE_TOKEN)).await;
    let mut controller = logged_in(&server).await;

    let page = controller
        .fetch_page(PageKind::Overview, FetchOptions::fresh(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(page.body.contains(SESSION_MARKER));
    assert!(controller.is_logged_in());

    // The second login reused the bearer token.
    assert_eq!(count_requests(&server, SESSIONS_PATH).await, 1);
    // One initial bind plus one re-bind.
    assert_eq!(count_requests(&server, LOGIN_LINK_PATH).await, 2);
}

#[tokio::test]
async fn test_persistent_auth_loss_is_not_authenticated() {
    let server = MockServer::start().await;
    mount_page(&server, "overview", LOGGED_OUT_PAGE.to_string()).await;
    let mut controller = logged_in(&server).await;

    let err = controller
        .fetch_page(PageKind::Overview, FetchOptions::fresh(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NotAuthenticated);
    assert!(!controller.is_logged_in());
    assert_eq!(count_requests(&server, LOGIN_LINK_PATH).await, 2);
}

#[tokio::test]
async fn test_auth_loss_without_retry() {
    let server = MockServer::start().await;
    mount_page(&server, "overview", LOGGED_OUT_PAGE.to_string()).await;
    let mut controller = logged_in(&server).await;

    let err = controller
        .fetch_page(
            PageKind::Overview,
            FetchOptions::fresh().without_retry(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NotAuthenticated);
    assert_eq!(count_requests(&server, LOGIN_LINK_PATH).await, 1);
}

#[tokio::test]
async fn test_relogin_is_bounded_by_login_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_LINK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_link(&server)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN_LINK_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_link(&server))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "overview", LOGGED_OUT_PAGE.to_string()).await;
    mount_lobby(&server).await;
    mount_session_created(&server).await;

    let mut controller = SessionController::new(
        settings(&server).with_login_timeout(Duration::from_millis(800)),
        credentials(),
    )
    .unwrap();
    let cancel = CancellationToken::new();
    controller.login(&cancel).await.unwrap();

    let err = controller
        .fetch_page(PageKind::Overview, FetchOptions::fresh(), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::DeadlineExceeded);
    assert!(!controller.is_logged_in());
    assert!(!controller.snapshot().logged_in);
}

#[tokio::test]
async fn test_action_uses_cached_token_and_rotates_it() {
    let server = MockServer::start().await;
    let mut controller = logged_in(&server).await;

    Mock::given(method("POST"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("component", "overview"))
        .and(body_string_contains(format!("token={PAGE_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "newAjaxToken": "a1b2c3d4e5f60718293a4b5c6d7e8f90"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(UNIVERSE_PATH))
        .and(body_string_contains("token=a1b2c3d4e5f60718293a4b5c6d7e8f90"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let action = ActionSpec::new("rename", PageKind::Overview)
        .with_query("action", "planetRename")
        .with_field("newPlanetName", "Homeworld");

    let first = controller.perform_action(action.clone(), &cancel).await.unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(first.json.as_ref().and_then(|j| j["status"].as_str()), Some("success"));

    let second = controller.perform_action(action, &cancel).await.unwrap();
    assert_eq!(second.status, 200);
}

#[tokio::test]
async fn test_action_query_is_encoded() {
    let server = MockServer::start().await;
    let mut controller = logged_in(&server).await;

    Mock::given(method("POST"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("component", "overview"))
        .and(query_param("message", "hi & bye=1"))
        .and(query_param("cp", PLANET_ID.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let action = ActionSpec::new("buddy", PageKind::Overview)
        .with_query("message", "hi & bye=1")
        .with_planet(PLANET_ID);
    let result = controller
        .perform_action(action, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.status, 200);
}

#[tokio::test]
async fn test_action_without_token_fails() {
    let server = MockServer::start().await;
    mount_page(&server, "supplies", tokenless_page()).await;
    let mut controller = logged_in(&server).await;

    let err = controller
        .perform_action(
            ActionSpec::new("build", PageKind::Supplies).with_field("technologyId", "1"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::MissingToken("supplies".to_string()));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let server = MockServer::start().await;
    let mut controller = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("page", "logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    controller.logout(&cancel).await.unwrap();
    assert!(!controller.is_logged_in());
    assert!(controller.bearer_token().is_empty());
    assert_eq!(
        controller
            .fetch_page(PageKind::Overview, FetchOptions::default(), &cancel)
            .await
            .unwrap_err(),
        SessionError::NotAuthenticated
    );
}

#[tokio::test]
async fn test_handle_login_publishes_snapshot() {
    let server = MockServer::start().await;
    mount_lobby(&server).await;
    mount_session_created(&server).await;

    let controller = SessionController::new(settings(&server), credentials()).unwrap();
    let handle = SessionHandle::new(controller);
    assert!(!handle.snapshot().logged_in);

    let cancel = CancellationToken::new();
    handle.login(&cancel).await.unwrap();
    let snapshot = handle.snapshot();
    assert!(snapshot.logged_in);
    assert_eq!(snapshot.planet_id, Some(PLANET_ID));
    assert!(!handle.arbiter().is_busy());
}

#[tokio::test]
async fn test_handle_login_timeout() {
    let server = MockServer::start().await;
    mount_lobby(&server).await;
    Mock::given(method("POST"))
        .and(path(SESSIONS_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "token": BEARER }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let controller = SessionController::new(
        settings(&server).with_login_timeout(short_timeout()),
        credentials(),
    )
    .unwrap();
    let handle = SessionHandle::new(controller);

    let err = handle.login(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, SessionError::DeadlineExceeded);
    assert!(!handle.arbiter().is_busy());
}

#[tokio::test]
async fn test_login_timeout_after_bind_leaves_session_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(UNIVERSE_PATH))
        .and(query_param("component", "preferences"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(game_page(PAGE_TOKEN))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    mount_lobby(&server).await;
    mount_session_created(&server).await;

    let controller = SessionController::new(
        settings(&server).with_login_timeout(Duration::from_millis(800)),
        credentials(),
    )
    .unwrap();
    let handle = SessionHandle::new(controller);
    let cancel = CancellationToken::new();

    let err = handle.login(&cancel).await.unwrap_err();
    assert_eq!(err, SessionError::DeadlineExceeded);
    assert_eq!(count_requests(&server, LOGIN_LINK_PATH).await, 1);
    assert!(!handle.snapshot().logged_in);

    let (logged_in, chat) = handle
        .submit("inspect", Priority::Normal, &cancel, |controller, _| {
            Box::pin(async move {
                Ok::<_, SessionError>((controller.is_logged_in(), controller.chat_connected()))
            })
        })
        .await
        .unwrap();
    assert!(!logged_in);
    assert!(!chat);
    // The bearer token survives for the next attempt.
    assert_eq!(handle.snapshot().bearer_token, BEARER);
}

#[tokio::test]
async fn test_manual_session_runs_sequence() {
    let server = MockServer::start().await;
    mount_page(&server, "supplies", game_page(PAGE_TOKEN)).await;
    mount_lobby(&server).await;
    mount_session_created(&server).await;

    let handle = SessionHandle::new(SessionController::new(settings(&server), credentials()).unwrap());
    let cancel = CancellationToken::new();
    handle.login(&cancel).await.unwrap();

    let manual = handle.begin_named("planner", &cancel).await.unwrap();
    assert_eq!(handle.arbiter().current_holder().as_deref(), Some("planner"));

    let overview = manual
        .fetch_page(PageKind::Overview, FetchOptions::default(), &cancel)
        .await
        .unwrap();
    let supplies = manual
        .fetch_page(PageKind::Supplies, FetchOptions::fresh(), &cancel)
        .await
        .unwrap();
    assert!(overview.from_cache);
    assert!(!supplies.from_cache);

    // Normal work queues behind the manual holder.
    let queued = {
        let handle = handle.clone();
        tokio::spawn(async move {
            handle
                .submit("probe", Priority::Normal, &CancellationToken::new(), |c, _| {
                    Box::pin(async move { Ok::<_, SessionError>(c.is_logged_in()) })
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.arbiter().queue_len(), 1);

    manual.done();
    assert_eq!(queued.await.unwrap(), Ok(true));
}

#[tokio::test]
async fn test_hold_timeout_expires_manual_session() {
    let server = MockServer::start().await;
    mount_lobby(&server).await;
    mount_session_created(&server).await;

    let controller = SessionController::new(
        settings(&server).with_hold_timeout(Duration::from_millis(50)),
        credentials(),
    )
    .unwrap();
    let handle = SessionHandle::new(controller);
    let cancel = CancellationToken::new();

    let manual = handle.begin_named("forgotten", &cancel).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(manual.is_expired());

    let err = manual
        .fetch_page(PageKind::Overview, FetchOptions::default(), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::HoldExpired("forgotten".to_string()));

    // The slot is free again.
    handle.login(&cancel).await.unwrap();
}

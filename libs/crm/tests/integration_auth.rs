//! Integration tests: session lifecycle and role-based routing

mod common;

use chrono::Duration;
use common::{app, fixtures, logged_in_app, FakeWebhook};
use crm::application::{AuthError, CrmError};
use crm::infrastructure::ManualClock;
use crm::Route;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_login_installs_token_and_routes_by_role() {
    for (role, expected) in [
        ("admin", Route::AdminDashboard),
        ("manager", Route::ManagerDashboard),
        ("employee", Route::EmployeeDashboard),
    ] {
        let webhook = FakeWebhook::new();
        webhook.respond("login", fixtures::login_response(role));
        let clock = ManualClock::default();
        let app = app(Arc::clone(&webhook), &clock);

        assert_eq!(app.auth.route(Route::AdminDashboard), Route::Login);

        let session = app.auth.login(fixtures::EMAIL, "secret").await.unwrap();
        assert_eq!(session.landing_route(), expected);
        assert_eq!(app.auth.route(Route::Login), expected);
        assert_eq!(webhook.token().as_deref(), Some("tok-1"));

        verbose_println!("{} -> {}", role, expected.path());
    }
}

#[tokio::test]
async fn test_rejected_credentials() {
    let webhook = FakeWebhook::new();
    webhook.fail("login", 401);
    let clock = ManualClock::default();
    let app = app(Arc::clone(&webhook), &clock);

    let err = app.auth.login(fixtures::EMAIL, "wrong").await.unwrap_err();
    assert!(matches!(err, CrmError::Auth(AuthError::InvalidCredentials)));
    assert!(app.auth.current().is_none());
}

#[tokio::test]
async fn test_login_without_token_is_rejected() {
    let webhook = FakeWebhook::new();
    webhook.respond("login", json!({ "token": "", "user": { "emp_id": 1 } }));
    let clock = ManualClock::default();
    let app = app(Arc::clone(&webhook), &clock);

    let err = app.auth.login(fixtures::EMAIL, "secret").await.unwrap_err();
    assert!(matches!(err, CrmError::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_malformed_email_never_reaches_backend() {
    let webhook = FakeWebhook::new();
    let clock = ManualClock::default();
    let app = app(Arc::clone(&webhook), &clock);

    let err = app.auth.login("not-an-email", "secret").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(webhook.total_calls(), 0);
}

#[tokio::test]
async fn test_services_require_a_session() {
    let webhook = FakeWebhook::new();
    let clock = ManualClock::default();
    let app = app(Arc::clone(&webhook), &clock);

    let err = app.leads.list(false).await.unwrap_err();
    assert!(matches!(err, CrmError::Auth(AuthError::NotAuthenticated)));
    assert!(app.tasks.all(false).await.is_err());
    assert!(app.reports.incentives(false).await.is_err());
    assert_eq!(webhook.total_calls(), 0);
}

#[tokio::test]
async fn test_logout_wipes_cache_and_token() {
    let webhook = FakeWebhook::new();
    webhook.respond("Lead", fixtures::three_leads());
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.leads.list(false).await.unwrap();
    assert!(app.cache_stats().total > 0);

    app.logout();
    assert_eq!(app.cache_stats().total, 0);
    assert!(webhook.token().is_none());
    assert!(app.auth.restore().is_none());
    assert_eq!(app.auth.route(Route::EmployeeDashboard), Route::Login);
}

#[tokio::test]
async fn test_session_expires_after_profile_ttl() {
    let webhook = FakeWebhook::new();
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    clock.advance(Duration::hours(24));

    let err = app.auth.require().unwrap_err();
    assert!(matches!(err, CrmError::Auth(AuthError::SessionExpired)));
    assert!(app.auth.restore().is_none());
}

#[tokio::test]
async fn test_refresh_replaces_token_and_restamps() {
    let webhook = FakeWebhook::new();
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    clock.advance(Duration::hours(23));
    let mut renewed = fixtures::login_response("employee");
    renewed["token"] = json!("tok-2");
    webhook.respond("login", renewed);

    let session = app.auth.refresh(fixtures::EMAIL, "secret").await.unwrap();
    assert_eq!(session.token, "tok-2");
    assert_eq!(webhook.token().as_deref(), Some("tok-2"));

    // The re-stamped session outlives the original 24h window
    clock.advance(Duration::hours(2));
    assert!(app.auth.require().is_ok());
}

#[tokio::test]
async fn test_refresh_as_another_account_drops_cached_data() {
    let webhook = FakeWebhook::new();
    webhook.respond("Lead", fixtures::three_leads());
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;
    app.leads.list(false).await.unwrap();

    webhook.respond(
        "login",
        json!({ "token": "tok-9", "user": { "emp_id": "emp999", "email": "z@b.com" } }),
    );
    let session = app.auth.refresh("z@b.com", "secret").await.unwrap();
    assert_eq!(session.user.emp_id, "emp999");

    // Only the new auth profile is left
    assert_eq!(app.cache_stats().total, 1);
}

#[tokio::test]
async fn test_restore_or_login_prefers_saved_session() {
    let webhook = FakeWebhook::new();
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;
    let logins = webhook.count("login");

    let session = app.restore_or_login(None).await.unwrap();
    assert_eq!(session.user.emp_id, fixtures::EMP_ID);
    assert_eq!(webhook.count("login"), logins);
}

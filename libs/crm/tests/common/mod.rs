//! Common test utilities for CRM integration tests
//!
//! Provides an in-process `Webhook` fake that records every request and
//! answers from canned JSON, plus fixtures for records and config.

#![allow(dead_code)]

use async_trait::async_trait;
use crm::application::DashboardApp;
use crm::infrastructure::client::webhook::client::Result as WebhookResult;
use crm::infrastructure::{CrmConfig, ManualClock, ResponseCache, Webhook, WebhookError, WebhookRequest};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Webhook fake keyed by `source`
#[derive(Default)]
pub struct FakeWebhook {
    responses: Mutex<HashMap<&'static str, Value>>,
    failures: Mutex<HashMap<&'static str, u16>>,
    calls: Mutex<Vec<WebhookRequest>>,
    token: Mutex<Option<String>>,
}

impl FakeWebhook {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request with this `source` with `value`
    pub fn respond(&self, source: &'static str, value: Value) {
        self.failures.lock().remove(source);
        self.responses.lock().insert(source, value);
    }

    /// Fail every request with this `source` with an HTTP status
    pub fn fail(&self, source: &'static str, status: u16) {
        self.failures.lock().insert(source, status);
    }

    pub fn calls(&self) -> Vec<WebhookRequest> {
        self.calls.lock().clone()
    }

    pub fn count(&self, source: &str) -> usize {
        self.calls.lock().iter().filter(|r| r.source() == source).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

#[async_trait]
impl Webhook for FakeWebhook {
    async fn call(&self, request: &WebhookRequest) -> WebhookResult<Value> {
        self.calls.lock().push(request.clone());

        let source = request.source();
        if let Some(status) = self.failures.lock().get(source) {
            return Err(WebhookError::ApiError {
                status: *status,
                body: "fake failure".to_string(),
            });
        }
        Ok(self
            .responses
            .lock()
            .get(source)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.lock() = token;
    }
}

pub fn config() -> CrmConfig {
    CrmConfig::from_yaml(
        r#"
webhook:
  base_url: "https://hooks.example.com"
polling:
  leads_interval_secs: 30
  tasks_interval_secs: 60
  highlight_secs: 5
  refresh_cooldown_secs: 30
"#,
    )
    .expect("test config is valid")
}

/// App wired to `webhook` with an in-memory cache on `clock`
pub fn app(webhook: Arc<FakeWebhook>, clock: &ManualClock) -> DashboardApp {
    let clock = Arc::new(clock.clone());
    DashboardApp::with_parts(
        config(),
        webhook,
        ResponseCache::in_memory(clock.clone()),
        clock,
    )
}

/// App already logged in as `fixtures::EMP_ID`
pub async fn logged_in_app(webhook: Arc<FakeWebhook>, clock: &ManualClock) -> DashboardApp {
    webhook.respond("login", fixtures::login_response("employee"));
    let app = app(webhook, clock);
    app.auth
        .login(fixtures::EMAIL, "secret")
        .await
        .expect("login succeeds");
    app
}

pub mod fixtures {
    //! Canned backend payloads

    use serde_json::{json, Value};

    pub const EMP_ID: &str = "emp123";
    pub const EMAIL: &str = "a@b.com";

    pub fn login_response(role: &str) -> Value {
        json!({
            "token": "tok-1",
            "user": {
                "emp_id": EMP_ID,
                "name": "Asha",
                "email": EMAIL,
                "role": role
            }
        })
    }

    /// Three leads as the backend sends them (numeric ids included)
    pub fn three_leads() -> Value {
        json!([
            { "id": 1, "name": "Ravi", "phone": "9876543210", "status": "New" },
            { "id": "2", "name": "Meera", "phone": "9123456780", "status": "Contacted" },
            { "id": 3, "name": "Kiran", "phone": "9988776655", "status": "Follow Up" }
        ])
    }

    pub fn two_tasks() -> Value {
        json!([
            { "id": 10, "lead_id": 1, "title": "Call back", "status": "pending" },
            { "id": 11, "title": "Send brochure", "status": "completed" }
        ])
    }
}

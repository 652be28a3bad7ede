//! Integration tests: writes, cache invalidation, validation and the
//! manual refresh cooldown

mod common;

use chrono::Duration;
use common::{fixtures, logged_in_app, FakeWebhook};
use crm::application::CrmError;
use crm::domain::ValidationError;
use crm::infrastructure::{ManualClock, WebhookRequest};
use crm::{Lead, LeadStatus, Referral, Task};
use serde_json::json;
use std::sync::Arc;

fn lead(id: &str, phone: &str) -> Lead {
    Lead {
        id: id.to_string(),
        name: "Ravi".to_string(),
        phone: phone.to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Invalidation
// ============================================================================

#[tokio::test]
async fn test_update_lead_invalidates_list_and_details() {
    let webhook = FakeWebhook::new();
    webhook.respond("Lead", fixtures::three_leads());
    webhook.respond("leaddetails", json!([{ "id": 1, "name": "Ravi", "phone": "9876543210" }]));
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.leads.list(false).await.unwrap();
    let details = app.leads.details("1").await.unwrap();
    assert_eq!(details.name, "Ravi");
    app.leads.details("1").await.unwrap();
    assert_eq!(webhook.count("leaddetails"), 1);

    app.leads.update(lead("1", "9876543210")).await.unwrap();
    assert_eq!(webhook.count("Update Lead"), 1);

    app.leads.list(false).await.unwrap();
    app.leads.details("1").await.unwrap();
    assert_eq!(webhook.count("Lead"), 2);
    assert_eq!(webhook.count("leaddetails"), 2);
}

#[tokio::test]
async fn test_status_change_sends_employee_and_invalidates() {
    let webhook = FakeWebhook::new();
    webhook.respond("Lead", fixtures::three_leads());
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.leads.list(false).await.unwrap();
    app.leads
        .change_status("2", LeadStatus::Converted)
        .await
        .unwrap();

    let sent = webhook
        .calls()
        .into_iter()
        .find(|r| r.source() == "Statuschange")
        .unwrap();
    assert_eq!(
        sent,
        WebhookRequest::StatusChange {
            lead_id: "2".to_string(),
            status: LeadStatus::Converted,
            emp_id: fixtures::EMP_ID.to_string(),
        }
    );

    app.leads.list(false).await.unwrap();
    assert_eq!(webhook.count("Lead"), 2);
}

#[tokio::test]
async fn test_post_comment_invalidates_comments_only() {
    let webhook = FakeWebhook::new();
    webhook.respond("Lead", fixtures::three_leads());
    webhook.respond(
        "getcomments",
        json!([{ "id": 1, "lead_id": 1, "author": "Asha", "text": "Called" }]),
    );
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.leads.list(false).await.unwrap();
    assert_eq!(app.leads.comments("1").await.unwrap().len(), 1);

    app.leads.post_comment("1", "  Visit on Monday ").await.unwrap();
    match webhook.calls().last().unwrap() {
        WebhookRequest::PostComment { comment, emp_id, .. } => {
            assert_eq!(comment, "Visit on Monday");
            assert_eq!(emp_id, fixtures::EMP_ID);
        }
        other => panic!("unexpected request: {:?}", other),
    }

    app.leads.comments("1").await.unwrap();
    app.leads.list(false).await.unwrap();
    assert_eq!(webhook.count("getcomments"), 2);
    assert_eq!(webhook.count("Lead"), 1);
}

#[tokio::test]
async fn test_add_task_invalidates_task_lists() {
    let webhook = FakeWebhook::new();
    webhook.respond("gettasks", fixtures::two_tasks());
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.tasks.all(false).await.unwrap();
    app.tasks.for_lead("1").await.unwrap();
    app.tasks.all(false).await.unwrap();
    app.tasks.for_lead("1").await.unwrap();
    assert_eq!(webhook.count("gettasks"), 2);

    let task = Task {
        lead_id: Some("1".to_string()),
        title: "Follow up call".to_string(),
        ..Default::default()
    };
    app.tasks.add(task).await.unwrap();

    match webhook.calls().last().unwrap() {
        WebhookRequest::AddTask(sent) => {
            assert_eq!(sent.assigned_to.as_deref(), Some(fixtures::EMP_ID));
        }
        other => panic!("unexpected request: {:?}", other),
    }

    app.tasks.all(false).await.unwrap();
    app.tasks.for_lead("1").await.unwrap();
    assert_eq!(webhook.count("gettasks"), 4);
}

#[tokio::test]
async fn test_referral_is_stamped_with_referrer() {
    let webhook = FakeWebhook::new();
    webhook.respond("referrals", json!([]));
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.reports.referrals(false).await.unwrap();
    app.reports
        .add_referral(Referral {
            candidate_name: "Nisha".to_string(),
            candidate_phone: "9876501234".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    match webhook.calls().last().unwrap() {
        WebhookRequest::AddReferral(sent) => assert_eq!(sent.referrer_emp_id, fixtures::EMP_ID),
        other => panic!("unexpected request: {:?}", other),
    }

    app.reports.referrals(false).await.unwrap();
    assert_eq!(webhook.count("referrals"), 2);
}

#[tokio::test]
async fn test_incentive_amounts_decode() {
    let webhook = FakeWebhook::new();
    webhook.respond(
        "incentive",
        json!([{ "emp_id": 123, "month": "2024-05", "lead_count": "12", "amount": "1500.50" }]),
    );
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    let rows = app.reports.incentives(false).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].lead_count, 12);
    assert!((rows[0].amount - 1500.5).abs() < f64::EPSILON);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_invalid_phone_blocks_update() {
    let webhook = FakeWebhook::new();
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;
    let before = webhook.total_calls();

    let err = app.leads.update(lead("1", "12345")).await.unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        CrmError::Validation(ValidationError::InvalidPhone(_))
    ));
    assert_eq!(webhook.total_calls(), before);
}

#[tokio::test]
async fn test_empty_inputs_are_rejected_locally() {
    let webhook = FakeWebhook::new();
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;
    let before = webhook.total_calls();

    assert!(app.leads.post_comment("1", "   ").await.unwrap_err().is_validation());
    assert!(app.tasks.add(Task::default()).await.unwrap_err().is_validation());
    assert!(app
        .reports
        .add_referral(Referral {
            candidate_name: "Nisha".to_string(),
            candidate_phone: "555".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err()
        .is_validation());

    assert_eq!(webhook.total_calls(), before);
}

// ============================================================================
// Manual refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_is_throttled() {
    let webhook = FakeWebhook::new();
    webhook.respond("Lead", fixtures::three_leads());
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.leads.list(false).await.unwrap();
    assert_eq!(app.leads.refresh().await.unwrap().len(), 3);
    assert_eq!(webhook.count("Lead"), 2);

    clock.advance(Duration::seconds(10));
    match app.leads.refresh().await {
        Err(CrmError::CooldownActive(secs)) => assert_eq!(secs, 20),
        other => panic!("expected cooldown, got {:?}", other.map(|l| l.len())),
    }
    assert_eq!(webhook.count("Lead"), 2);

    clock.advance(Duration::seconds(20));
    app.leads.refresh().await.unwrap();
    assert_eq!(webhook.count("Lead"), 3);
}

#[tokio::test]
async fn test_refresh_drops_per_lead_entries() {
    let webhook = FakeWebhook::new();
    webhook.respond("Lead", fixtures::three_leads());
    webhook.respond("getcomments", json!([]));
    let clock = ManualClock::default();
    let app = logged_in_app(Arc::clone(&webhook), &clock).await;

    app.leads.comments("3").await.unwrap();
    app.leads.refresh().await.unwrap();
    app.leads.comments("3").await.unwrap();

    assert_eq!(webhook.count("getcomments"), 2);
    // Session survives a manual refresh
    assert!(app.auth.current().is_some());
}

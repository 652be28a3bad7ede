//! Typed contract of the webhook backend
//!
//! Every call is a POST whose JSON body carries a `source` field naming the
//! operation. The variants below pin down the body of each `source` value
//! and the endpoint that serves it.

use crate::domain::models::{Lead, LeadStatus, Referral, Task, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend endpoint group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Auth,
    Leads,
    Tasks,
    Reports,
}

/// Request body, discriminated by `source`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source")]
pub enum WebhookRequest {
    #[serde(rename = "login")]
    Login { email: String, password: String },

    #[serde(rename = "Lead")]
    Leads { emp_id: String, email: String },

    #[serde(rename = "leaddetails")]
    LeadDetails { lead_id: String },

    #[serde(rename = "Update Lead")]
    UpdateLead(Lead),

    #[serde(rename = "Statuschange")]
    StatusChange {
        lead_id: String,
        status: LeadStatus,
        emp_id: String,
    },

    #[serde(rename = "getcomments")]
    GetComments { lead_id: String },

    #[serde(rename = "postcomments")]
    PostComment {
        lead_id: String,
        emp_id: String,
        comment: String,
    },

    #[serde(rename = "gettasks")]
    GetTasks {
        emp_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        lead_id: Option<String>,
    },

    #[serde(rename = "addtask")]
    AddTask(Task),

    #[serde(rename = "Update Task")]
    UpdateTask(Task),

    #[serde(rename = "incentive")]
    Incentives { emp_id: String },

    #[serde(rename = "referrals")]
    Referrals { emp_id: String },

    #[serde(rename = "addreferral")]
    AddReferral(Referral),
}

impl WebhookRequest {
    /// The `source` discriminator sent on the wire
    pub fn source(&self) -> &'static str {
        match self {
            WebhookRequest::Login { .. } => "login",
            WebhookRequest::Leads { .. } => "Lead",
            WebhookRequest::LeadDetails { .. } => "leaddetails",
            WebhookRequest::UpdateLead(_) => "Update Lead",
            WebhookRequest::StatusChange { .. } => "Statuschange",
            WebhookRequest::GetComments { .. } => "getcomments",
            WebhookRequest::PostComment { .. } => "postcomments",
            WebhookRequest::GetTasks { .. } => "gettasks",
            WebhookRequest::AddTask(_) => "addtask",
            WebhookRequest::UpdateTask(_) => "Update Task",
            WebhookRequest::Incentives { .. } => "incentive",
            WebhookRequest::Referrals { .. } => "referrals",
            WebhookRequest::AddReferral(_) => "addreferral",
        }
    }

    /// Endpoint serving this request
    pub fn endpoint(&self) -> Endpoint {
        match self {
            WebhookRequest::Login { .. } => Endpoint::Auth,
            WebhookRequest::Leads { .. }
            | WebhookRequest::LeadDetails { .. }
            | WebhookRequest::UpdateLead(_)
            | WebhookRequest::StatusChange { .. }
            | WebhookRequest::GetComments { .. }
            | WebhookRequest::PostComment { .. } => Endpoint::Leads,
            WebhookRequest::GetTasks { .. }
            | WebhookRequest::AddTask(_)
            | WebhookRequest::UpdateTask(_) => Endpoint::Tasks,
            WebhookRequest::Incentives { .. }
            | WebhookRequest::Referrals { .. }
            | WebhookRequest::AddReferral(_) => Endpoint::Reports,
        }
    }

    /// Whether the request changes backend state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            WebhookRequest::UpdateLead(_)
                | WebhookRequest::StatusChange { .. }
                | WebhookRequest::PostComment { .. }
                | WebhookRequest::AddTask(_)
                | WebhookRequest::UpdateTask(_)
                | WebhookRequest::AddReferral(_)
        )
    }
}

/// Successful login payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,

    #[serde(alias = "profile")]
    pub user: User,
}

/// Normalise a list response
///
/// The backend answers list queries with an array, but an empty result may
/// come back as `null` or `{}` and a single row as a bare object.
pub fn normalize_list(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        Value::Null => Value::Array(Vec::new()),
        Value::Object(ref map) if map.is_empty() => Value::Array(Vec::new()),
        other => Value::Array(vec![other]),
    }
}

/// Normalise a single-record response, unwrapping a one-element array
pub fn normalize_single(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}

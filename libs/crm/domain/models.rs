//! Records mirrored from the webhook backend.
//!
//! Every field the backend may omit carries a default, ids arrive as either
//! JSON numbers or strings and are normalised to `String`, and unknown
//! fields are ignored. Records are replaced wholesale on every fetch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CRM prospect record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub status: LeadStatus,

    /// Acquisition channel (walk-in, referral, ads...)
    ///
    /// Kept apart from the request `source` discriminator.
    #[serde(default)]
    pub lead_source: Option<String>,

    /// Employee id the lead is assigned to
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub assigned_to: Option<String>,

    #[serde(default)]
    pub assigned_name: Option<String>,

    #[serde(default)]
    pub follow_up_date: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub remarks: Option<String>,
}

/// Pipeline status of a lead
///
/// The backend stores free text; known values map to variants and anything
/// else is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Interested,
    FollowUp,
    NotInterested,
    Converted,
    Lost,
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Interested => "Interested",
            LeadStatus::FollowUp => "Follow Up",
            LeadStatus::NotInterested => "Not Interested",
            LeadStatus::Converted => "Converted",
            LeadStatus::Lost => "Lost",
            LeadStatus::Other(s) => s,
        }
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "" | "new" => LeadStatus::New,
            "contacted" => LeadStatus::Contacted,
            "interested" => LeadStatus::Interested,
            "followup" => LeadStatus::FollowUp,
            "notinterested" => LeadStatus::NotInterested,
            "converted" => LeadStatus::Converted,
            "lost" => LeadStatus::Lost,
            _ => LeadStatus::Other(s),
        }
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        match status {
            LeadStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up task, optionally attached to a lead
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub lead_id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub assigned_to: Option<String>,

    #[serde(default)]
    pub due_date: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Other(s) => s,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Completed)
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "" | "pending" | "open" => TaskStatus::Pending,
            "inprogress" => TaskStatus::InProgress,
            "completed" | "done" => TaskStatus::Completed,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comment left on a lead
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default, deserialize_with = "deserialize_id")]
    pub lead_id: String,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// Authenticated employee profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub emp_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub phone: Option<String>,
}

/// Role on the authenticated profile; selects the landing route
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Employee,
    Other(String),
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" | "superadmin" | "hr" => Role::Admin,
            "manager" | "teamlead" | "team lead" => Role::Manager,
            "" | "employee" | "executive" => Role::Employee,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "admin".to_string(),
            Role::Manager => "manager".to_string(),
            Role::Employee => "employee".to_string(),
            Role::Other(s) => s,
        }
    }
}

/// Monthly incentive row for an employee
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Incentive {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub emp_id: String,

    #[serde(default)]
    pub month: String,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub lead_count: u32,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub converted_count: u32,

    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
}

/// Candidate referred by an employee
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Referral {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default, deserialize_with = "deserialize_id")]
    pub referrer_emp_id: String,

    #[serde(default)]
    pub candidate_name: String,

    #[serde(default)]
    pub candidate_phone: String,

    #[serde(default)]
    pub position: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// Deserialize id - accepts string, number or null, returns String
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: serde_json::Value = serde::Deserialize::deserialize(deserializer)?;

    match value {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        _ => Err(serde::de::Error::custom("expected string or number for id")),
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let id = deserialize_id(deserializer)?;
    Ok(if id.is_empty() { None } else { Some(id) })
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: serde_json::Value = serde::Deserialize::deserialize(deserializer)?;

    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("amount out of range")),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0.0),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {}", s))),
        serde_json::Value::Null => Ok(0.0),
        _ => Err(serde::de::Error::custom("expected string or number for amount")),
    }
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let amount = deserialize_amount(deserializer)?;
    if amount < 0.0 || amount > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!("invalid count: {}", amount)));
    }
    Ok(amount as u32)
}

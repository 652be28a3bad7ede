//! Client-side form checks, run before any mutation is sent

use super::models::{Lead, Referral, Task};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    // 10-digit mobile number, optionally prefixed with +91, 91 or 0
    PHONE.get_or_init(|| Regex::new(r"^(?:\+?91|0)?[6-9]\d{9}$").expect("valid phone regex"))
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
    })
}

/// Check a phone number, ignoring spaces and dashes
pub fn validate_phone(phone: &str) -> Result<()> {
    let compact: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if compact.is_empty() {
        return Err(ValidationError::MissingField("phone"));
    }
    if !phone_regex().is_match(&compact) {
        return Err(ValidationError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if !email_regex().is_match(email.trim()) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

fn require(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

pub fn validate_lead(lead: &Lead) -> Result<()> {
    require(&lead.id, "lead id")?;
    require(&lead.name, "name")?;
    validate_phone(&lead.phone)?;
    if let Some(email) = lead.email.as_deref().filter(|e| !e.trim().is_empty()) {
        validate_email(email)?;
    }
    Ok(())
}

pub fn validate_task(task: &Task) -> Result<()> {
    require(&task.title, "title")?;
    Ok(())
}

pub fn validate_comment(text: &str) -> Result<()> {
    require(text, "comment")
}

pub fn validate_referral(referral: &Referral) -> Result<()> {
    require(&referral.candidate_name, "candidate name")?;
    validate_phone(&referral.candidate_phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_numbers() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765 43210").is_ok());
        assert!(validate_phone("098765-43210").is_ok());

        assert!(matches!(
            validate_phone("12345"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone("5876543210"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert_eq!(validate_phone("  "), Err(ValidationError::MissingField("phone")));
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_lead_requires_name_and_valid_phone() {
        let mut lead = Lead {
            id: "1".to_string(),
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            ..Default::default()
        };
        assert!(validate_lead(&lead).is_ok());

        lead.email = Some(String::new());
        assert!(validate_lead(&lead).is_ok());

        lead.email = Some("broken".to_string());
        assert!(matches!(validate_lead(&lead), Err(ValidationError::InvalidEmail(_))));

        lead.email = None;
        lead.name = String::new();
        assert_eq!(validate_lead(&lead), Err(ValidationError::MissingField("name")));
    }
}

//! Client-side form validation
//!
//! Validation failures are reported per field and never reach the network.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use super::models::{BloodGroup, DonationRequestDraft, VolunteerApplication};
use crate::error::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Field name -> message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`; the first message per field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex pattern - this is a bug in the codebase")
    })
}

/// Shape check shared by the forms and the local identity provider
pub(crate) fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").expect("Invalid regex pattern - this is a bug in the codebase")
    })
}

fn require(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required");
    }
}

fn check_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    require(errors, field, value);
    if !value.trim().is_empty() && !is_valid_email(value) {
        errors.add(field, "Enter a valid email address");
    }
}

fn check_blood_group(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.parse::<BloodGroup>().is_err() {
        errors.add(field, "Select a valid blood group");
    }
}

/// Password rules for new accounts
pub fn check_password(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Some("Password must be at least 6 characters")
    } else if !password.chars().any(|c| c.is_uppercase()) {
        Some("Password must contain an uppercase letter")
    } else if !password.chars().any(|c| c.is_lowercase()) {
        Some("Password must contain a lowercase letter")
    } else {
        None
    }
}

/// Donor sign-up form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub blood_group: String,
    pub district: String,
    pub upazila: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        require(&mut errors, "name", &self.name);
        check_email(&mut errors, "email", &self.email);
        if let Some(message) = check_password(&self.password) {
            errors.add("password", message);
        }
        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        check_blood_group(&mut errors, "blood_group", &self.blood_group);
        require(&mut errors, "district", &self.district);
        require(&mut errors, "upazila", &self.upazila);

        errors.into_result()
    }
}

impl DonationRequestDraft {
    /// Check the draft; `today` bounds the donation date
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        let mut errors = ValidationErrors::new();

        require(&mut errors, "requester_name", &self.requester_name);
        check_email(&mut errors, "requester_email", &self.requester_email);
        require(&mut errors, "recipient_name", &self.recipient_name);
        require(&mut errors, "district", &self.district);
        require(&mut errors, "upazila", &self.upazila);
        require(&mut errors, "hospital_name", &self.hospital_name);
        require(&mut errors, "full_address", &self.full_address);
        check_blood_group(&mut errors, "blood_group", &self.blood_group);

        if self.donation_date < today {
            errors.add("donation_date", "Donation date cannot be in the past");
        }
        if NaiveTime::parse_from_str(self.donation_time.trim(), "%H:%M").is_err() {
            errors.add("donation_time", "Enter a time as HH:MM");
        }

        errors.into_result()
    }
}

impl VolunteerApplication {
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        require(&mut errors, "name", &self.name);
        check_email(&mut errors, "email", &self.email);
        if !phone_regex().is_match(self.phone.trim()) {
            errors.add("phone", "Enter a valid phone number");
        }
        require(&mut errors, "district", &self.district);

        errors.into_result()
    }
}

/// Amount of a funding payment
pub fn validate_amount(amount: f64) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if !amount.is_finite() || amount <= 0.0 {
        errors.add("amount", "Amount must be greater than zero");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "Tania".to_string(),
            email: "tania@example.org".to_string(),
            password: "Secret1".to_string(),
            confirm_password: "Secret1".to_string(),
            avatar: None,
            blood_group: "B+".to_string(),
            district: "Chattogram".to_string(),
            upazila: "Patiya".to_string(),
        }
    }

    fn errors_of(result: Result<()>) -> ValidationErrors {
        match result {
            Err(Error::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(check_password("Ab1"), Some("Password must be at least 6 characters"));
        assert_eq!(check_password("secret1"), Some("Password must contain an uppercase letter"));
        assert_eq!(check_password("SECRET1"), Some("Password must contain a lowercase letter"));
        assert_eq!(check_password("Secret"), None);
    }

    #[test]
    fn test_registration_reports_every_field() {
        let bad = RegistrationForm {
            email: "nope".to_string(),
            confirm_password: "Other1".to_string(),
            blood_group: "Z".to_string(),
            district: " ".to_string(),
            ..form()
        };
        let errors = errors_of(bad.validate());
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
        assert_eq!(errors.get("blood_group"), Some("Select a valid blood group"));
        assert_eq!(errors.get("district"), Some("This field is required"));
        assert_eq!(errors.get("name"), None);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_empty_email_reports_required_only() {
        let bad = RegistrationForm {
            email: String::new(),
            ..form()
        };
        let errors = errors_of(bad.validate());
        assert_eq!(errors.get("email"), Some("This field is required"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email(" donor@example.org "));
        assert!(is_valid_email("a#b@example.org"));
        assert!(!is_valid_email("donor@example"));
        assert!(!is_valid_email("do nor@example.org"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(25.0).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
    }

    #[test]
    fn test_display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("b", "second");
        errors.add("a", "first");
        errors.add("a", "ignored");
        assert_eq!(errors.to_string(), "a: first; b: second");
    }
}

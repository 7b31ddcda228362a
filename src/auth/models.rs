//! Authentication models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization roles served by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator - manages users, all requests and content
    Admin,
    /// Donor - creates and answers donation requests
    Donor,
    /// Volunteer - helps moderate requests and content
    Volunteer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Donor => write!(f, "donor"),
            Role::Volunteer => write!(f, "volunteer"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "donor" => Ok(Role::Donor),
            "volunteer" => Ok(Role::Volunteer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// How an identity signed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignInMethod {
    Password,
    Federated,
}

/// Identity handle issued by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user id
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub method: SignInMethod,
}

impl Identity {
    pub fn new(email: &str, method: SignInMethod) -> Self {
        Self {
            uid: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            display_name: None,
            photo_url: None,
            method,
        }
    }

    /// Apply a partial profile update
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.display_name {
            self.display_name = Some(name.clone());
        }
        if let Some(photo) = &update.photo_url {
            self.photo_url = Some(photo.clone());
        }
    }
}

/// Partial profile information forwarded to the identity provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    pub fn new(display_name: impl Into<String>, photo_url: Option<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            photo_url,
        }
    }
}

/// The client-side view of who is signed in
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub current_user: Option<Identity>,
    /// True only until the first session notification has been processed
    pub is_loading: bool,
}

impl Session {
    /// State at application start
    pub fn initial() -> Self {
        Self {
            current_user: None,
            is_loading: true,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.current_user.as_ref().and_then(|u| u.email.as_deref())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initial()
    }
}

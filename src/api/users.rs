//! User, role and donor search endpoints

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::client::{resource_path, ApiClient};
use super::models::{DonorSearch, Page, UserFilter, UserRecord, UserStatus};
use crate::auth::models::Role;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct RolePayload {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: UserStatus,
}

#[derive(Debug, Serialize)]
struct RoleBody {
    role: Role,
}

/// Role carried by a lookup payload; unknown values count as no role
fn role_from_payload(payload: RolePayload) -> Option<Role> {
    let raw = payload.role?;
    match raw.parse::<Role>() {
        Ok(role) => Some(role),
        Err(e) => {
            warn!("Ignoring role from API: {}", e);
            None
        }
    }
}

impl ApiClient {
    /// Look up the role of the account registered under `email`
    pub async fn get_role(&self, email: &str) -> Result<Option<Role>> {
        let payload: RolePayload = self.get_json(&resource_path(&["users", "role", email])).await?;
        Ok(role_from_payload(payload))
    }

    /// Create the platform record of a freshly registered user
    pub async fn save_user(&self, user: &UserRecord) -> Result<()> {
        self.send(self.request(Method::POST, "users").json(user)).await?;
        Ok(())
    }

    pub async fn list_users(&self, filter: &UserFilter) -> Result<Page<UserRecord>> {
        self.get_json_with_query("users", filter).await
    }

    /// Block or unblock a user
    pub async fn set_user_status(&self, id: &str, status: UserStatus) -> Result<()> {
        self.send(
            self.request(Method::PATCH, &resource_path(&["users", id, "status"]))
                .json(&StatusBody { status }),
        )
        .await?;
        Ok(())
    }

    pub async fn set_user_role(&self, id: &str, role: Role) -> Result<()> {
        self.send(
            self.request(Method::PATCH, &resource_path(&["users", id, "role"]))
                .json(&RoleBody { role }),
        )
        .await?;
        Ok(())
    }

    /// Public donor search by blood group and location
    pub async fn search_donors(&self, search: &DonorSearch) -> Result<Vec<UserRecord>> {
        self.get_json_with_query("donors/search", search).await
    }
}

//! Donation request endpoints

use chrono::NaiveDate;
use reqwest::Method;
use tracing::info;

use super::client::{resource_path, ApiClient};
use super::models::{DonationFilter, DonationRequest, DonationRequestDraft, DonationStatus, Donor, Page, StatusUpdate};
use crate::error::{Error, Result};

impl ApiClient {
    /// All requests, newest first, filtered by status
    pub async fn list_donation_requests(&self, filter: &DonationFilter) -> Result<Page<DonationRequest>> {
        self.get_json_with_query("donation-requests", filter).await
    }

    /// Requests created by `email`
    pub async fn my_donation_requests(&self, email: &str, filter: &DonationFilter) -> Result<Page<DonationRequest>> {
        self.get_json_with_query(&resource_path(&["donation-requests", "mine", email]), filter)
            .await
    }

    pub async fn get_donation_request(&self, id: &str) -> Result<DonationRequest> {
        self.get_json(&resource_path(&["donation-requests", id])).await
    }

    /// Validate and submit a new request; invalid drafts never leave the client
    pub async fn create_donation_request(
        &self,
        draft: &DonationRequestDraft,
        today: NaiveDate,
    ) -> Result<DonationRequest> {
        draft.validate(today)?;
        let created: DonationRequest = self.post_json("donation-requests", draft).await?;
        info!("Created donation request {}", created.id);
        Ok(created)
    }

    pub async fn delete_donation_request(&self, id: &str) -> Result<()> {
        self.delete(&resource_path(&["donation-requests", id])).await
    }

    /// Move a request to `next`, checking the transition against `current` first.
    ///
    /// Moving to in-progress requires the donor taking the request.
    pub async fn update_donation_status(
        &self,
        id: &str,
        current: DonationStatus,
        next: DonationStatus,
        donor: Option<Donor>,
    ) -> Result<()> {
        if !current.can_transition_to(next) || (next == DonationStatus::InProgress && donor.is_none()) {
            return Err(Error::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        let body = StatusUpdate { status: next, donor };
        self.send(
            self.request(Method::PATCH, &resource_path(&["donation-requests", id, "status"]))
                .json(&body),
        )
        .await?;
        info!("Donation request {} moved {} -> {}", id, current, next);
        Ok(())
    }
}

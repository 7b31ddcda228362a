//! Funding, payments, volunteer applications and dashboard statistics

use reqwest::Method;
use serde::Serialize;

use super::client::ApiClient;
use super::models::{AdminStats, Funding, Page, PaymentIntent, PaymentRecord, VolunteerApplication, DEFAULT_PER_PAGE};
use super::validation::validate_amount;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page: u32,
    per_page: u32,
}

#[derive(Debug, Serialize)]
struct IntentBody {
    /// Smallest currency unit
    amount: u64,
}

impl ApiClient {
    pub async fn list_funding(&self, page: u32) -> Result<Page<Funding>> {
        let query = PageQuery {
            page: page.max(1),
            per_page: DEFAULT_PER_PAGE,
        };
        self.get_json_with_query("funding", &query).await
    }

    /// Start a card payment of `amount`
    pub async fn create_payment_intent(&self, amount: f64) -> Result<PaymentIntent> {
        validate_amount(amount)?;
        let body = IntentBody {
            amount: (amount * 100.0).round() as u64,
        };
        self.post_json("create-payment-intent", &body).await
    }

    /// Record a confirmed payment as funding
    pub async fn save_payment(&self, payment: &PaymentRecord) -> Result<()> {
        validate_amount(payment.amount)?;
        self.send(self.request(Method::POST, "payments").json(payment)).await?;
        Ok(())
    }

    pub async fn submit_volunteer_application(&self, application: &VolunteerApplication) -> Result<()> {
        application.validate()?;
        self.send(
            self.request(Method::POST, "volunteer-applications")
                .json(application),
        )
        .await?;
        Ok(())
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        self.get_json("admin-stats").await
    }
}

//! Resource types exchanged with the REST API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        BloodGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == wanted)
            .ok_or_else(|| format!("unknown blood group '{}'", s))
    }
}

/// Lifecycle of a donation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    #[serde(rename = "inprogress")]
    InProgress,
    Done,
    Canceled,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::InProgress => "inprogress",
            DonationStatus::Done => "done",
            DonationStatus::Canceled => "canceled",
        }
    }

    /// Transitions the client is allowed to request
    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        use DonationStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Canceled) | (InProgress, Done) | (InProgress, Canceled)
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(self, DonationStatus::Done | DonationStatus::Canceled)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "pending" => Ok(DonationStatus::Pending),
            "inprogress" => Ok(DonationStatus::InProgress),
            "done" => Ok(DonationStatus::Done),
            "canceled" | "cancelled" => Ok(DonationStatus::Canceled),
            _ => Err(format!("unknown donation status '{}'", s)),
        }
    }
}

/// A donor who claimed a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    #[serde(alias = "_id")]
    pub id: String,
    pub requester_name: String,
    pub requester_email: String,
    pub recipient_name: String,
    pub district: String,
    pub upazila: String,
    pub hospital_name: String,
    pub full_address: String,
    pub blood_group: BloodGroup,
    pub donation_date: NaiveDate,
    /// 24h "HH:MM"
    pub donation_time: String,
    #[serde(default)]
    pub request_message: String,
    pub status: DonationStatus,
    #[serde(default)]
    pub donor: Option<Donor>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Form data for a new donation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequestDraft {
    pub requester_name: String,
    pub requester_email: String,
    pub recipient_name: String,
    pub district: String,
    pub upazila: String,
    pub hospital_name: String,
    pub full_address: String,
    pub blood_group: String,
    pub donation_date: NaiveDate,
    pub donation_time: String,
    #[serde(default)]
    pub request_message: String,
}

/// Body of a status change
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: DonationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor: Option<Donor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Blocked,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "blocked" => Ok(UserStatus::Blocked),
            other => Err(format!("unknown user status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub blood_group: BloodGroup,
    pub district: String,
    pub upazila: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default = "default_status")]
    pub status: UserStatus,
}

fn default_role() -> Role {
    Role::Donor
}

fn default_status() -> UserStatus {
    UserStatus::Active
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Funding {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub amount: f64,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub date: DateTime<Utc>,
}

/// A completed payment, saved after the payment processor confirms it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub name: String,
    pub email: String,
    pub amount: f64,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerApplication {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub district: String,
    #[serde(default)]
    pub motivation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_funding: f64,
    #[serde(default)]
    pub total_requests: u64,
}

/// Criteria of the public donor search
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<BloodGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upazila: Option<String>,
}

/// One page of a listing; pages are 1-based
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Page and filter parameters of a listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery<S> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<S>,
    pub page: u32,
    pub per_page: u32,
}

pub const DEFAULT_PER_PAGE: u32 = 10;

impl<S> Default for ListQuery<S> {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl<S> ListQuery<S> {
    pub fn page(page: u32) -> Self {
        Self {
            page: page.max(1),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: Option<S>) -> Self {
        self.status = status;
        self
    }
}

pub type DonationFilter = ListQuery<DonationStatus>;
pub type UserFilter = ListQuery<UserStatus>;

impl DonationFilter {
    pub fn matches(&self, request: &DonationRequest) -> bool {
        self.status.map_or(true, |status| status == request.status)
    }
}

/// Client-side pagination of an already fetched list
pub fn paginate<T: Clone>(items: &[T], page: u32, per_page: u32) -> Page<T> {
    let page = page.max(1);
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let slice = if per_page == 0 || start >= items.len() {
        Vec::new()
    } else {
        let end = (start + per_page as usize).min(items.len());
        items[start..end].to_vec()
    };

    Page {
        items: slice,
        total: items.len() as u64,
        page,
        per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_group_parsing() {
        assert_eq!("ab+".parse::<BloodGroup>(), Ok(BloodGroup::AbPositive));
        assert_eq!(" O- ".parse::<BloodGroup>(), Ok(BloodGroup::ONegative));
        assert!("C+".parse::<BloodGroup>().is_err());
        assert_eq!(serde_json::to_string(&BloodGroup::BNegative).unwrap(), "\"B-\"");
    }

    #[test]
    fn test_status_transitions() {
        use DonationStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Canceled));
        assert!(InProgress.can_transition_to(Done));
        assert!(InProgress.can_transition_to(Canceled));
        assert!(!Pending.can_transition_to(Done));
        assert!(!Done.can_transition_to(Pending));
        assert!(!Canceled.can_transition_to(InProgress));
        assert!(Done.is_final() && Canceled.is_final());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&DonationStatus::InProgress).unwrap(), "\"inprogress\"");
        assert_eq!("in-progress".parse::<DonationStatus>(), Ok(DonationStatus::InProgress));
        assert_eq!("cancelled".parse::<DonationStatus>(), Ok(DonationStatus::Canceled));
    }

    #[test]
    fn test_donation_request_accepts_mongo_id() {
        let json = r#"{
            "_id": "665f1c",
            "requesterName": "Karim",
            "requesterEmail": "karim@example.org",
            "recipientName": "Salma",
            "district": "Dhaka",
            "upazila": "Dhanmondi",
            "hospitalName": "Dhaka Medical College Hospital",
            "fullAddress": "Zahir Raihan Rd",
            "bloodGroup": "O+",
            "donationDate": "2026-11-02",
            "donationTime": "10:30",
            "status": "pending"
        }"#;
        let request: DonationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.id, "665f1c");
        assert_eq!(request.blood_group, BloodGroup::OPositive);
        assert!(request.donor.is_none());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=23).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages(), 3);
        assert!(first.has_next());

        let last = paginate(&items, 3, 10);
        assert_eq!(last.items, vec![21, 22, 23]);
        assert!(!last.has_next());

        assert!(paginate(&items, 4, 10).items.is_empty());
        assert_eq!(paginate(&items, 0, 10).page, 1);
    }

    #[test]
    fn test_list_query_serialization() {
        let query = DonationFilter::page(2).with_status(Some(DonationStatus::Pending));
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["page"], 2);
        assert_eq!(json["perPage"], 10);

        let unfiltered = serde_json::to_value(DonationFilter::default()).unwrap();
        assert!(unfiltered.get("status").is_none());
    }
}

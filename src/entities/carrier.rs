use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A carrier's profile as supplied by the external profile store. Read-only
/// to this core: the evaluator consumes the compliance fields, the shipper
/// bid views consume the summary fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CarrierProfile {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub rating: Option<f64>,
    pub accident_count: u32,
    pub theft_complaint_count: u32,
    /// Truck manufacturing year; age is derived against the current year.
    pub truck_year: i32,
    pub license_issue_date: DateTime<Utc>,
}

/// The subset of a carrier profile a shipper sees next to a bid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CarrierSummary {
    pub company_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub rating: Option<f64>,
}

impl CarrierProfile {
    pub fn summary(&self) -> CarrierSummary {
        CarrierSummary {
            company_name: self.company_name.clone(),
            contact_name: self.contact_name.clone(),
            contact_phone: self.contact_phone.clone(),
            rating: self.rating,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::eligibility::EligibilityCriteria;
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Load {
    pub id: Uuid,
    pub status: Status,
    pub shipper_id: Uuid,
    pub title: String,
    pub description: String,
    pub cargo_type: CargoType,
    pub weight: Weight,
    pub dimensions: Option<Dimensions>,
    pub pickup: Stop,
    pub delivery: Stop,
    pub schedule: Schedule,
    pub budget: Budget,
    pub required_truck_type: TruckType,
    #[serde(default)]
    pub special_requirements: Vec<String>,
    #[serde(default)]
    pub eligibility_criteria: EligibilityCriteria,
    pub assigned_carrier_id: Option<Uuid>,
    pub winning_bid_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Posted,
    Bidding,
    Assigned,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Posted => "Posted",
            Self::Bidding => "Bidding",
            Self::Assigned => "Assigned",
            Self::InTransit => "InTransit",
            Self::Delivered => "Delivered",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// The single transition table every mutator consults.
    pub fn can_transition(self, next: Self) -> bool {
        use Status::*;

        matches!(
            (self, next),
            (Posted, Bidding)
                | (Posted, Assigned)
                | (Bidding, Assigned)
                | (Posted, Cancelled)
                | (Bidding, Cancelled)
                | (Assigned, InTransit)
                | (InTransit, Delivered)
                | (Delivered, Completed)
        )
    }

    /// Loads accept new bids (and field edits) only while Posted or Bidding.
    pub fn allows_bidding(self) -> bool {
        matches!(self, Self::Posted | Self::Bidding)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CargoType {
    General,
    Hazardous,
    Perishable,
    Fragile,
    HeavyMachinery,
    Livestock,
    Vehicles,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruckType {
    Flatbed,
    Refrigerated,
    Container,
    Tanker,
    Any,
    Other,
}

impl Default for TruckType {
    fn default() -> Self {
        Self::Any
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Tons,
    Lb,
}

impl Default for WeightUnit {
    fn default() -> Self {
        Self::Tons
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Weight {
    pub value: f64,
    #[serde(default)]
    pub unit: WeightUnit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionUnit {
    Cm,
    M,
    In,
    Ft,
}

impl Default for DimensionUnit {
    fn default() -> Self {
        Self::M
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: DimensionUnit,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schedule {
    pub pickup_date: DateTime<Utc>,
    pub pickup_window: Option<TimeWindow>,
    pub delivery_date: DateTime<Utc>,
    pub delivery_window: Option<TimeWindow>,
    #[serde(default)]
    pub flexible_dates: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Budget {
    pub amount: f64,
    pub currency: String,
    #[serde(default = "default_negotiable")]
    pub negotiable: bool,
}

fn default_negotiable() -> bool {
    true
}

/// Everything a shipper supplies when posting a load; identity, status and
/// assignment refs are owned by the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadDraft {
    pub title: String,
    pub description: String,
    pub cargo_type: CargoType,
    pub weight: Weight,
    pub dimensions: Option<Dimensions>,
    pub pickup: Stop,
    pub delivery: Stop,
    pub schedule: Schedule,
    pub budget: Budget,
    #[serde(default)]
    pub required_truck_type: TruckType,
    #[serde(default)]
    pub special_requirements: Vec<String>,
    #[serde(default)]
    pub eligibility_criteria: EligibilityCriteria,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update; absent fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoadPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cargo_type: Option<CargoType>,
    pub weight: Option<Weight>,
    pub dimensions: Option<Dimensions>,
    pub pickup: Option<Stop>,
    pub delivery: Option<Stop>,
    pub schedule: Option<Schedule>,
    pub budget: Option<Budget>,
    pub required_truck_type: Option<TruckType>,
    pub special_requirements: Option<Vec<String>>,
    pub eligibility_criteria: Option<EligibilityCriteria>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Load {
    pub fn create(shipper_id: Uuid, draft: LoadDraft, now: DateTime<Utc>) -> Result<Self, Error> {
        validate_draft(&draft)?;

        Ok(Self {
            id: Uuid::new_v4(),
            status: Status::Posted,
            shipper_id,
            title: draft.title,
            description: draft.description,
            cargo_type: draft.cargo_type,
            weight: draft.weight,
            dimensions: draft.dimensions,
            pickup: draft.pickup,
            delivery: draft.delivery,
            schedule: draft.schedule,
            budget: draft.budget,
            required_truck_type: draft.required_truck_type,
            special_requirements: draft.special_requirements,
            eligibility_criteria: draft.eligibility_criteria,
            assigned_carrier_id: None,
            winning_bid_id: None,
            created_at: now,
            expires_at: draft.expires_at,
        })
    }

    fn transition(&mut self, next: Status, action: &'static str) -> Result<(), Error> {
        if !self.status.can_transition(next) {
            return Err(Error::invalid_state(action, self.status.name()));
        }

        self.status = next;
        Ok(())
    }

    pub fn is_open_for_bidding(&self) -> bool {
        self.status.allows_bidding()
    }

    /// Automatic Posted -> Bidding flip on the load's first bid.
    pub fn begin_bidding(&mut self) -> Result<(), Error> {
        self.transition(Status::Bidding, "open bidding on a load")
    }

    /// Entry into Assigned; the carrier and winning-bid refs are set together
    /// with the status, never independently.
    pub fn assign(&mut self, carrier_id: Uuid, winning_bid_id: Uuid) -> Result<(), Error> {
        self.transition(Status::Assigned, "accept bids for a load")?;
        self.assigned_carrier_id = Some(carrier_id);
        self.winning_bid_id = Some(winning_bid_id);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), Error> {
        self.transition(Status::Cancelled, "cancel a load")
    }

    // Fulfillment transitions are driven by tracking collaborators; the
    // table still guards them so an out-of-order call cannot corrupt state.
    pub fn start_transit(&mut self) -> Result<(), Error> {
        self.transition(Status::InTransit, "start transit for a load")
    }

    pub fn mark_delivered(&mut self) -> Result<(), Error> {
        self.transition(Status::Delivered, "mark a load delivered")
    }

    pub fn complete(&mut self) -> Result<(), Error> {
        self.transition(Status::Completed, "complete a load")
    }

    pub fn ensure_editable(&self, action: &'static str) -> Result<(), Error> {
        if !self.status.allows_bidding() {
            return Err(Error::invalid_state(action, self.status.name()));
        }

        Ok(())
    }

    pub fn apply(&mut self, patch: LoadPatch) -> Result<(), Error> {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(cargo_type) = patch.cargo_type {
            self.cargo_type = cargo_type;
        }
        if let Some(weight) = patch.weight {
            self.weight = weight;
        }
        if let Some(dimensions) = patch.dimensions {
            self.dimensions = Some(dimensions);
        }
        if let Some(pickup) = patch.pickup {
            self.pickup = pickup;
        }
        if let Some(delivery) = patch.delivery {
            self.delivery = delivery;
        }
        if let Some(schedule) = patch.schedule {
            self.schedule = schedule;
        }
        if let Some(budget) = patch.budget {
            self.budget = budget;
        }
        if let Some(required_truck_type) = patch.required_truck_type {
            self.required_truck_type = required_truck_type;
        }
        if let Some(special_requirements) = patch.special_requirements {
            self.special_requirements = special_requirements;
        }
        if let Some(eligibility_criteria) = patch.eligibility_criteria {
            self.eligibility_criteria = eligibility_criteria;
        }
        if let Some(expires_at) = patch.expires_at {
            self.expires_at = Some(expires_at);
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), Error> {
        let draft = LoadDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            cargo_type: self.cargo_type,
            weight: self.weight,
            dimensions: self.dimensions,
            pickup: self.pickup.clone(),
            delivery: self.delivery.clone(),
            schedule: self.schedule.clone(),
            budget: self.budget.clone(),
            required_truck_type: self.required_truck_type,
            special_requirements: self.special_requirements.clone(),
            eligibility_criteria: self.eligibility_criteria.clone(),
            expires_at: self.expires_at,
        };

        validate_draft(&draft)
    }

    /// The summary attached to a carrier's bid listing.
    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            id: self.id,
            title: self.title.clone(),
            status: self.status,
            pickup_city: self.pickup.city.clone(),
            pickup_state: self.pickup.state.clone(),
            delivery_city: self.delivery.city.clone(),
            delivery_state: self.delivery.state.clone(),
            pickup_date: self.schedule.pickup_date,
            delivery_date: self.schedule.delivery_date,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadSummary {
    pub id: Uuid,
    pub title: String,
    pub status: Status,
    pub pickup_city: String,
    pub pickup_state: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub pickup_date: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
}

fn validate_draft(draft: &LoadDraft) -> Result<(), Error> {
    let mut messages = Vec::new();

    if draft.title.trim().is_empty() {
        messages.push("Please provide a title for the load".to_string());
    } else if draft.title.len() > 100 {
        messages.push("Title cannot be more than 100 characters".to_string());
    }

    if draft.description.trim().is_empty() {
        messages.push("Please provide a description".to_string());
    } else if draft.description.len() > 500 {
        messages.push("Description cannot be more than 500 characters".to_string());
    }

    if draft.weight.value <= 0.0 {
        messages.push("Please specify the weight".to_string());
    }

    if draft.budget.amount <= 0.0 {
        messages.push("Please provide a budget amount".to_string());
    }

    if draft.pickup.address.trim().is_empty() {
        messages.push("Please provide a pickup address".to_string());
    }

    if draft.delivery.address.trim().is_empty() {
        messages.push("Please provide a delivery address".to_string());
    }

    if draft.schedule.delivery_date < draft.schedule.pickup_date {
        messages.push("Delivery date cannot be before the pickup date".to_string());
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { messages })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn stop(address: &str) -> Stop {
        Stop {
            address: address.into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            country: "USA".into(),
            coordinates: None,
        }
    }

    fn draft() -> LoadDraft {
        LoadDraft {
            title: "Steel coils to Chicago".into(),
            description: "Three coils, tarped".into(),
            cargo_type: CargoType::HeavyMachinery,
            weight: Weight {
                value: 22.0,
                unit: WeightUnit::Tons,
            },
            dimensions: None,
            pickup: stop("100 Mill Rd"),
            delivery: stop("55 Dock St"),
            schedule: Schedule {
                pickup_date: now() + Duration::days(3),
                pickup_window: None,
                delivery_date: now() + Duration::days(5),
                delivery_window: None,
                flexible_dates: false,
            },
            budget: Budget {
                amount: 1000.0,
                currency: "USD".into(),
                negotiable: true,
            },
            required_truck_type: TruckType::Flatbed,
            special_requirements: vec![],
            eligibility_criteria: EligibilityCriteria::default(),
            expires_at: None,
        }
    }

    pub(crate) fn posted_load() -> Load {
        Load::create(Uuid::new_v4(), draft(), now()).unwrap()
    }

    #[test]
    fn create_starts_posted_with_no_assignment() {
        let load = posted_load();
        assert_eq!(load.status, Status::Posted);
        assert!(load.assigned_carrier_id.is_none());
        assert!(load.winning_bid_id.is_none());
    }

    #[test]
    fn create_collects_all_validation_messages() {
        let mut bad = draft();
        bad.title = "".into();
        bad.budget.amount = 0.0;
        bad.schedule.delivery_date = bad.schedule.pickup_date - Duration::days(1);

        let err = Load::create(Uuid::new_v4(), bad, now()).unwrap_err();
        match err {
            Error::Validation { messages } => assert_eq!(messages.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn assign_sets_both_refs_with_the_status() {
        let mut load = posted_load();
        let carrier = Uuid::new_v4();
        let bid = Uuid::new_v4();

        load.assign(carrier, bid).unwrap();

        assert_eq!(load.status, Status::Assigned);
        assert_eq!(load.assigned_carrier_id, Some(carrier));
        assert_eq!(load.winning_bid_id, Some(bid));
    }

    #[test]
    fn assign_works_from_bidding_too() {
        let mut load = posted_load();
        load.begin_bidding().unwrap();
        assert!(load.assign(Uuid::new_v4(), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn assign_twice_names_current_status() {
        let mut load = posted_load();
        load.assign(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        let err = load.assign(Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
        assert!(format!("{err}").contains("'Assigned'"));
    }

    #[test]
    fn cancel_only_before_assignment() {
        let mut load = posted_load();
        load.assign(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert!(load.cancel().is_err());

        let mut load = posted_load();
        load.begin_bidding().unwrap();
        assert!(load.cancel().is_ok());
    }

    #[test]
    fn terminal_states_permit_nothing() {
        let mut load = posted_load();
        load.cancel().unwrap();

        assert!(load.begin_bidding().is_err());
        assert!(load.assign(Uuid::new_v4(), Uuid::new_v4()).is_err());
        assert!(load.start_transit().is_err());
    }

    #[test]
    fn fulfillment_chain_is_ordered() {
        let mut load = posted_load();
        assert!(load.start_transit().is_err());

        load.assign(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        load.start_transit().unwrap();
        load.mark_delivered().unwrap();
        load.complete().unwrap();

        assert_eq!(load.status, Status::Completed);
        assert!(load.start_transit().is_err());
    }

    #[test]
    fn edits_rejected_once_assigned() {
        let mut load = posted_load();
        load.ensure_editable("update a load").unwrap();

        load.assign(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let err = load.ensure_editable("update a load").unwrap_err();
        assert_eq!(
            format!("{err}"),
            "cannot update a load with status 'Assigned'"
        );
    }

    #[test]
    fn patch_revalidates() {
        let mut load = posted_load();
        let err = load
            .apply(LoadPatch {
                title: Some("".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}

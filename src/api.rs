use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Principal;
use crate::entities::load::{CargoType, TruckType};
use crate::entities::{Bid, CarrierProfile, CarrierSummary, Load, LoadDraft, LoadPatch, LoadSummary};
use crate::error::Error;

#[derive(Clone, Debug, Deserialize)]
pub struct CreateBidParams {
    pub load_id: Uuid,
    pub amount: f64,
    pub message: Option<String>,
    pub proposed_pickup_date: Option<DateTime<Utc>>,
    pub proposed_delivery_date: Option<DateTime<Utc>>,
}

/// Board filters for the public load listing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoadFilter {
    pub cargo_type: Option<CargoType>,
    pub truck_type: Option<TruckType>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
}

/// A bid as shown to the load's shipper: carrier summary attached.
#[derive(Clone, Debug, Serialize)]
pub struct BidView {
    #[serde(flatten)]
    pub bid: Bid,
    pub carrier: Option<CarrierSummary>,
}

/// All bids on one load, with the lowest live bid singled out for labeling.
#[derive(Clone, Debug, Serialize)]
pub struct LoadBids {
    pub bids: Vec<BidView>,
    pub lowest_bid_id: Option<Uuid>,
}

/// A bid as shown to its carrier: load summary attached.
#[derive(Clone, Debug, Serialize)]
pub struct CarrierBid {
    #[serde(flatten)]
    pub bid: Bid,
    pub load: LoadSummary,
}

/// A bid in the shipper's cross-load aggregate view.
#[derive(Clone, Debug, Serialize)]
pub struct ShipperBid {
    #[serde(flatten)]
    pub bid: Bid,
    pub load: LoadSummary,
    pub carrier: Option<CarrierSummary>,
}

/// Result of the accept-bid transaction.
#[derive(Clone, Debug, Serialize)]
pub struct AcceptedBid {
    pub bid: BidView,
    pub load: Load,
}

#[async_trait]
pub trait LoadApi {
    async fn create_load(&self, principal: Principal, draft: LoadDraft) -> Result<Load, Error>;
    async fn find_load(&self, id: Uuid) -> Result<Load, Error>;
    async fn update_load(
        &self,
        principal: Principal,
        id: Uuid,
        patch: LoadPatch,
    ) -> Result<Load, Error>;
    async fn delete_load(&self, principal: Principal, id: Uuid) -> Result<(), Error>;
    async fn list_open_loads(&self, filter: LoadFilter) -> Result<Vec<Load>, Error>;
    async fn list_shipper_loads(&self, principal: Principal) -> Result<Vec<Load>, Error>;
}

#[async_trait]
pub trait BidApi {
    async fn create_bid(&self, principal: Principal, params: CreateBidParams)
        -> Result<Bid, Error>;
    async fn accept_bid(&self, principal: Principal, bid_id: Uuid) -> Result<AcceptedBid, Error>;
    async fn withdraw_bid(&self, principal: Principal, bid_id: Uuid) -> Result<Bid, Error>;
}

#[async_trait]
pub trait QueryApi {
    async fn find_bid(&self, principal: Principal, bid_id: Uuid) -> Result<BidView, Error>;
    async fn list_bids_for_load(
        &self,
        principal: Principal,
        load_id: Uuid,
    ) -> Result<LoadBids, Error>;
    async fn list_bids_for_carrier(&self, principal: Principal) -> Result<Vec<CarrierBid>, Error>;
    async fn list_bids_for_shipper(&self, principal: Principal) -> Result<Vec<ShipperBid>, Error>;
}

/// Ingestion seam for the external carrier profile store.
#[async_trait]
pub trait DirectoryApi {
    async fn put_carrier_profile(&self, profile: CarrierProfile) -> Result<(), Error>;
}

pub trait Api: LoadApi + BidApi + QueryApi + DirectoryApi {}

pub type DynApi = Arc<dyn Api + Send + Sync>;

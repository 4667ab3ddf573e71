use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::{
    api::{AcceptedBid, BidView, CarrierBid, CreateBidParams, DynApi, LoadBids, ShipperBid},
    auth::Principal,
    entities::Bid,
    error::Error,
};

pub async fn create(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Json(params): Json<CreateBidParams>,
) -> Result<Json<Bid>, Error> {
    let bid = api.create_bid(principal, params).await?;

    Ok(bid.into())
}

pub async fn find(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<BidView>, Error> {
    let bid = api.find_bid(principal, id).await?;

    Ok(bid.into())
}

pub async fn accept(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<AcceptedBid>, Error> {
    let outcome = api.accept_bid(principal, id).await?;

    Ok(outcome.into())
}

pub async fn withdraw(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Bid>, Error> {
    let bid = api.withdraw_bid(principal, id).await?;

    Ok(bid.into())
}

pub async fn list_for_load(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Path(load_id): Path<Uuid>,
) -> Result<Json<LoadBids>, Error> {
    let bids = api.list_bids_for_load(principal, load_id).await?;

    Ok(bids.into())
}

pub async fn list_for_carrier(
    Extension(api): Extension<DynApi>,
    principal: Principal,
) -> Result<Json<Vec<CarrierBid>>, Error> {
    let bids = api.list_bids_for_carrier(principal).await?;

    Ok(bids.into())
}

pub async fn list_for_shipper(
    Extension(api): Extension<DynApi>,
    principal: Principal,
) -> Result<Json<Vec<ShipperBid>>, Error> {
    let bids = api.list_bids_for_shipper(principal).await?;

    Ok(bids.into())
}

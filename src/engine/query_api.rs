use super::Engine;

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use super::Database;
use crate::{
    api::{BidView, CarrierBid, LoadBids, QueryApi, ShipperBid},
    auth::Principal,
    entities::{Bid, CarrierProfile, CarrierSummary, Load},
    error::Error,
};

/// The bid the UI labels "lowest": minimum amount among live bids, ties
/// broken by earliest placement.
pub(crate) fn lowest_live_bid(bids: &[Bid], now: DateTime<Utc>) -> Option<Uuid> {
    bids.iter()
        .filter(|bid| bid.is_live(now))
        .min_by(|a, b| {
            a.amount
                .partial_cmp(&b.amount)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.created_at.cmp(&b.created_at))
        })
        .map(|bid| bid.id)
}

async fn fetch_profile(
    conn: &mut PoolConnection<Database>,
    id: &Uuid,
) -> Result<Option<CarrierProfile>, Error> {
    let maybe_row = conn
        .fetch_optional(sqlx::query("SELECT data FROM carriers WHERE id = $1").bind(id))
        .await?;

    match maybe_row {
        Some(row) => {
            let Json(profile) = row.try_get("data")?;
            Ok(Some(profile))
        }
        None => Ok(None),
    }
}

async fn fetch_summaries(
    conn: &mut PoolConnection<Database>,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, CarrierSummary>, Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = conn
        .fetch_all(sqlx::query("SELECT data FROM carriers WHERE id = ANY($1)").bind(&ids))
        .await?;

    let mut summaries = HashMap::with_capacity(rows.len());

    for row in rows {
        let Json(profile): Json<CarrierProfile> = row.try_get("data")?;
        summaries.insert(profile.id, profile.summary());
    }

    Ok(summaries)
}

#[async_trait]
impl QueryApi for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_bid(&self, principal: Principal, bid_id: Uuid) -> Result<BidView, Error> {
        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;

        let Json(bid): Json<Bid> = conn
            .fetch_optional(sqlx::query("SELECT data FROM bids WHERE id = $1").bind(&bid_id))
            .await?
            .ok_or(Error::NotFound("bid"))?
            .try_get("data")?;

        let Json(load): Json<Load> = conn
            .fetch_optional(sqlx::query("SELECT data FROM loads WHERE id = $1").bind(&bid.load_id))
            .await?
            .ok_or(Error::NotFound("load"))?
            .try_get("data")?;

        let is_owning_shipper = load.shipper_id == principal.id;
        let is_bidder = bid.carrier_id == principal.id;

        if !is_owning_shipper && !is_bidder {
            return Err(Error::Forbidden("view this bid"));
        }

        let carrier = fetch_profile(&mut conn, &bid.carrier_id).await?;

        Ok(BidView {
            bid: bid.normalized(now),
            carrier: carrier.map(|profile| profile.summary()),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_bids_for_load(
        &self,
        principal: Principal,
        load_id: Uuid,
    ) -> Result<LoadBids, Error> {
        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;

        let Json(load): Json<Load> = conn
            .fetch_optional(sqlx::query("SELECT data FROM loads WHERE id = $1").bind(&load_id))
            .await?
            .ok_or(Error::NotFound("load"))?
            .try_get("data")?;

        if load.shipper_id == principal.id {
            // the owning shipper sees every bid, cheapest first
            let rows = conn
                .fetch_all(
                    sqlx::query("SELECT data FROM bids WHERE load_id = $1 ORDER BY amount ASC")
                        .bind(&load_id),
                )
                .await?;

            let mut bids = Vec::with_capacity(rows.len());
            for row in rows {
                let Json(bid): Json<Bid> = row.try_get("data")?;
                bids.push(bid);
            }

            let lowest_bid_id = lowest_live_bid(&bids, now);
            let carrier_ids = bids.iter().map(|bid| bid.carrier_id).collect();
            let mut summaries = fetch_summaries(&mut conn, carrier_ids).await?;

            return Ok(LoadBids {
                bids: bids
                    .into_iter()
                    .map(|bid| {
                        let carrier = summaries.remove(&bid.carrier_id);
                        BidView {
                            bid: bid.normalized(now),
                            carrier,
                        }
                    })
                    .collect(),
                lowest_bid_id,
            });
        }

        // a carrier sees only their own bids on the load
        if fetch_profile(&mut conn, &principal.id).await?.is_none() {
            return Err(Error::Forbidden("view these bids"));
        }

        let rows = conn
            .fetch_all(
                sqlx::query("SELECT data FROM bids WHERE load_id = $1 AND carrier_id = $2")
                    .bind(&load_id)
                    .bind(&principal.id),
            )
            .await?;

        let mut bids = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(bid): Json<Bid> = row.try_get("data")?;
            bids.push(BidView {
                bid: bid.normalized(now),
                carrier: None,
            });
        }

        Ok(LoadBids {
            bids,
            lowest_bid_id: None,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_bids_for_carrier(&self, principal: Principal) -> Result<Vec<CarrierBid>, Error> {
        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;

        if fetch_profile(&mut conn, &principal.id).await?.is_none() {
            return Err(Error::Unauthorized(
                "not authorized, only carriers can access their bids",
            ));
        }

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT b.data AS bid, l.data AS load FROM bids b \
                     JOIN loads l ON l.id = b.load_id \
                     WHERE b.carrier_id = $1 ORDER BY b.created_at DESC",
                )
                .bind(&principal.id),
            )
            .await?;

        let mut bids = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(bid): Json<Bid> = row.try_get("bid")?;
            let Json(load): Json<Load> = row.try_get("load")?;
            bids.push(CarrierBid {
                bid: bid.normalized(now),
                load: load.summary(),
            });
        }

        Ok(bids)
    }

    #[tracing::instrument(skip(self))]
    async fn list_bids_for_shipper(&self, principal: Principal) -> Result<Vec<ShipperBid>, Error> {
        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT b.data AS bid, l.data AS load FROM bids b \
                     JOIN loads l ON l.id = b.load_id \
                     WHERE l.shipper_id = $1 ORDER BY b.created_at DESC",
                )
                .bind(&principal.id),
            )
            .await?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(bid): Json<Bid> = row.try_get("bid")?;
            let Json(load): Json<Load> = row.try_get("load")?;
            pairs.push((bid, load));
        }

        let carrier_ids = pairs.iter().map(|(bid, _)| bid.carrier_id).collect();
        let summaries = fetch_summaries(&mut conn, carrier_ids).await?;

        Ok(pairs
            .into_iter()
            .map(|(bid, load)| {
                let carrier = summaries.get(&bid.carrier_id).cloned();
                ShipperBid {
                    bid: bid.normalized(now),
                    load: load.summary(),
                    carrier,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::bid::Status;
    use chrono::Duration;

    fn bid(amount: f64, created_offset_secs: i64, status: Status, now: DateTime<Utc>) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            load_id: Uuid::new_v4(),
            carrier_id: Uuid::new_v4(),
            amount,
            currency: "USD".into(),
            message: None,
            proposed_pickup_date: None,
            proposed_delivery_date: None,
            status,
            is_winning_bid: status == Status::Accepted,
            created_at: now + Duration::seconds(created_offset_secs),
            expires_at: None,
            accepted_at: None,
        }
    }

    #[test]
    fn lowest_picks_minimum_live_amount() {
        let now = Utc::now();
        let bids = vec![
            bid(900.0, 0, Status::Pending, now),
            bid(850.0, 1, Status::Pending, now),
            bid(800.0, 2, Status::Withdrawn, now),
            bid(700.0, 3, Status::Rejected, now),
        ];

        assert_eq!(lowest_live_bid(&bids, now), Some(bids[1].id));
    }

    #[test]
    fn lowest_breaks_ties_by_earliest_placement() {
        let now = Utc::now();
        let bids = vec![
            bid(850.0, 10, Status::Pending, now),
            bid(850.0, 5, Status::Pending, now),
        ];

        assert_eq!(lowest_live_bid(&bids, now), Some(bids[1].id));
    }

    #[test]
    fn lowest_counts_accepted_and_skips_expired() {
        let now = Utc::now();
        let mut expired = bid(100.0, 0, Status::Pending, now);
        expired.expires_at = Some(now - Duration::hours(1));
        let accepted = bid(850.0, 1, Status::Accepted, now);
        let bids = vec![expired, accepted];

        assert_eq!(lowest_live_bid(&bids, now), Some(bids[1].id));
    }

    #[test]
    fn lowest_is_none_without_live_bids() {
        let now = Utc::now();
        let bids = vec![bid(900.0, 0, Status::Withdrawn, now)];

        assert_eq!(lowest_live_bid(&bids, now), None);
    }
}

use super::helpers::{
    fetch_bid_for_update, fetch_carrier_profile, fetch_load_for_update, insert_bid,
    reject_pending_siblings, update_bid, update_load_if_status,
};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Acquire, Executor, Row};

use crate::{
    api::{AcceptedBid, BidApi, BidView, CreateBidParams},
    auth::Principal,
    eligibility,
    entities::{load, Bid, BidDraft, CarrierProfile},
    error::Error,
};

#[async_trait]
impl BidApi for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_bid(
        &self,
        principal: Principal,
        params: CreateBidParams,
    ) -> Result<Bid, Error> {
        let now = Utc::now();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        // the load row lock serializes this against a concurrent accept
        let mut load = fetch_load_for_update(&mut tx, &params.load_id).await?;

        if !load.is_open_for_bidding() {
            return Err(Error::invalid_state("bid on a load", load.status.name()));
        }

        let profile = fetch_carrier_profile(&mut tx, &principal.id)
            .await?
            .ok_or(Error::Unauthorized(
                "not authorized to create bids, only carriers can bid on loads",
            ))?;

        let evaluation = eligibility::evaluate(&profile, &load.eligibility_criteria, now);

        if !evaluation.is_eligible {
            tracing::info!(
                carrier_id = %profile.id,
                load_id = %load.id,
                "carrier failed eligibility check"
            );
            return Err(Error::EligibilityFailed {
                reasons: evaluation.reasons,
            });
        }

        let existing: Vec<Bid> = tx
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM bids WHERE load_id = $1 AND carrier_id = $2 AND status IN ('Pending', 'Accepted')",
                )
                .bind(&load.id)
                .bind(&profile.id),
            )
            .await?
            .into_iter()
            .map(|row| row.try_get("data").map(|Json(bid)| bid))
            .collect::<Result<_, sqlx::Error>>()?;

        if existing.iter().any(|bid| bid.is_live(now)) {
            return Err(Error::Conflict(
                "you already have an active bid for this load".into(),
            ));
        }

        let bid = Bid::place(
            &load,
            profile.id,
            BidDraft {
                amount: params.amount,
                message: params.message,
                proposed_pickup_date: params.proposed_pickup_date,
                proposed_delivery_date: params.proposed_delivery_date,
            },
            now,
        )?;

        insert_bid(&mut tx, &bid).await?;

        // first bid flips the load onto the bidding track; guarded so a
        // concurrent transition can never be clobbered
        if load.status == load::Status::Posted {
            load.begin_bidding()?;

            if !update_load_if_status(&mut tx, &load, &["Posted"]).await? {
                return Err(Error::Conflict(
                    "load status changed while the bid was being created".into(),
                ));
            }
        }

        tx.commit().await?;

        tracing::info!(bid_id = %bid.id, load_id = %load.id, "bid created");

        Ok(bid)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_bid(
        &self,
        principal: Principal,
        bid_id: uuid::Uuid,
    ) -> Result<AcceptedBid, Error> {
        let now = Utc::now();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut bid = fetch_bid_for_update(&mut tx, &bid_id).await?;

        // unreachable unless referential integrity was violated out of band
        let mut load = fetch_load_for_update(&mut tx, &bid.load_id).await?;

        if load.shipper_id != principal.id {
            return Err(Error::Forbidden("accept bids for this load"));
        }

        if !load.is_open_for_bidding() {
            return Err(Error::invalid_state(
                "accept bids for a load",
                load.status.name(),
            ));
        }

        bid.accept(now)?;
        load.assign(bid.carrier_id, bid.id)?;

        update_bid(&mut tx, &bid).await?;

        let rejected = reject_pending_siblings(&mut tx, &load.id, &bid.id, now).await?;

        // commit-time check on the stored status; a miss means another
        // accept got there first and the whole unit rolls back
        if !update_load_if_status(&mut tx, &load, &["Posted", "Bidding"]).await? {
            return Err(Error::Conflict(
                "another bid was accepted for this load".into(),
            ));
        }

        tx.commit().await?;

        tracing::info!(
            bid_id = %bid.id,
            load_id = %load.id,
            carrier_id = %bid.carrier_id,
            rejected_siblings = rejected,
            "bid accepted, load assigned"
        );

        let carrier: Option<CarrierProfile> = match conn
            .fetch_optional(
                sqlx::query("SELECT data FROM carriers WHERE id = $1").bind(&bid.carrier_id),
            )
            .await?
        {
            Some(row) => {
                let Json(profile) = row.try_get("data")?;
                Some(profile)
            }
            None => None,
        };

        Ok(AcceptedBid {
            bid: BidView {
                bid,
                carrier: carrier.map(|profile| profile.summary()),
            },
            load,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn withdraw_bid(&self, principal: Principal, bid_id: uuid::Uuid) -> Result<Bid, Error> {
        let now = Utc::now();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut bid = fetch_bid_for_update(&mut tx, &bid_id).await?;

        if bid.carrier_id != principal.id {
            return Err(Error::Forbidden("withdraw this bid"));
        }

        bid.withdraw(now)?;

        update_bid(&mut tx, &bid).await?;

        tx.commit().await?;

        tracing::info!(bid_id = %bid.id, "bid withdrawn");

        Ok(bid)
    }
}

use super::Database;

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::entities::{Bid, CarrierProfile, Load};
use crate::error::Error;

#[tracing::instrument(skip(tx))]
pub async fn fetch_load_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Load, Error> {
    let Json(load): Json<Load> = tx
        .fetch_optional(sqlx::query("SELECT data FROM loads WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or(Error::NotFound("load"))?
        .try_get("data")?;

    Ok(load)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_bid_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Bid, Error> {
    let Json(bid): Json<Bid> = tx
        .fetch_optional(sqlx::query("SELECT data FROM bids WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or(Error::NotFound("bid"))?
        .try_get("data")?;

    Ok(bid)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_carrier_profile(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Option<CarrierProfile>, Error> {
    let maybe_row = tx
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

#[tracing::instrument(skip(tx, load))]
pub async fn insert_load(tx: &mut Transaction<'_, Database>, load: &Load) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "INSERT INTO loads (id, status, shipper_id, created_at, data) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&load.id)
        .bind(load.status.name())
        .bind(&load.shipper_id)
        .bind(load.created_at)
        .bind(Json(load)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, load))]
pub async fn update_load(tx: &mut Transaction<'_, Database>, load: &Load) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE loads SET status = $2, data = $3 WHERE id = $1")
            .bind(&load.id)
            .bind(load.status.name())
            .bind(Json(load)),
    )
    .await?;

    Ok(())
}

/// Writes the load only if the stored status still matches `expected`.
/// Returns whether the row was written; a miss means a concurrent transition
/// won the race.
#[tracing::instrument(skip(tx, load))]
pub async fn update_load_if_status(
    tx: &mut Transaction<'_, Database>,
    load: &Load,
    expected: &[&str],
) -> Result<bool, Error> {
    let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();

    let result = tx
        .execute(
            sqlx::query("UPDATE loads SET status = $2, data = $3 WHERE id = $1 AND status = ANY($4)")
                .bind(&load.id)
                .bind(load.status.name())
                .bind(Json(load))
                .bind(&expected),
        )
        .await?;

    Ok(result.rows_affected() == 1)
}

#[tracing::instrument(skip(tx, bid))]
pub async fn insert_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "INSERT INTO bids (id, load_id, carrier_id, status, amount, created_at, data) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&bid.id)
        .bind(&bid.load_id)
        .bind(&bid.carrier_id)
        .bind(bid.status.name())
        .bind(bid.amount)
        .bind(bid.created_at)
        .bind(Json(bid)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, bid))]
pub async fn update_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bids SET status = $2, data = $3 WHERE id = $1")
            .bind(&bid.id)
            .bind(bid.status.name())
            .bind(Json(bid)),
    )
    .await?;

    Ok(())
}

/// Bulk-rejects every sibling still pending at `now`. Terminal siblings are
/// untouched, and a stored-Pending row past its expiry is left for the lazy
/// expiry read path rather than overwritten with a rejection.
#[tracing::instrument(skip(tx))]
pub async fn reject_pending_siblings(
    tx: &mut Transaction<'_, Database>,
    load_id: &Uuid,
    accepted_bid_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<u64, Error> {
    let result = tx
        .execute(
            sqlx::query(
                "UPDATE bids SET status = 'Rejected', data = jsonb_set(data, '{status}', '\"Rejected\"') \
                 WHERE load_id = $1 AND id != $2 AND status = 'Pending' \
                 AND (data->>'expires_at' IS NULL OR (data->>'expires_at')::timestamptz > $3)",
            )
            .bind(load_id)
            .bind(accepted_bid_id)
            .bind(now),
        )
        .await?;

    Ok(result.rows_affected())
}

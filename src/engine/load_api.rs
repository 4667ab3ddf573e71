use super::helpers::{fetch_load_for_update, insert_load, update_load};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::{LoadApi, LoadFilter},
    auth::Principal,
    entities::{Load, LoadDraft, LoadPatch},
    error::Error,
};

#[async_trait]
impl LoadApi for Engine {
    #[tracing::instrument(skip(self, draft))]
    async fn create_load(&self, principal: Principal, draft: LoadDraft) -> Result<Load, Error> {
        if !principal.is_shipper() {
            return Err(Error::Unauthorized(
                "not authorized to post loads, only shippers can post loads",
            ));
        }

        let load = Load::create(principal.id, draft, Utc::now())?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        insert_load(&mut tx, &load).await?;

        tx.commit().await?;

        tracing::info!(load_id = %load.id, shipper_id = %load.shipper_id, "load posted");

        Ok(load)
    }

    #[tracing::instrument(skip(self))]
    async fn find_load(&self, id: Uuid) -> Result<Load, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(load): Json<Load> = conn
            .fetch_optional(sqlx::query("SELECT data FROM loads WHERE id = $1").bind(&id))
            .await?
            .ok_or(Error::NotFound("load"))?
            .try_get("data")?;

        Ok(load)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_load(
        &self,
        principal: Principal,
        id: Uuid,
        patch: LoadPatch,
    ) -> Result<Load, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut load = fetch_load_for_update(&mut tx, &id).await?;

        if load.shipper_id != principal.id {
            return Err(Error::Forbidden("update this load"));
        }

        load.ensure_editable("update a load")?;
        load.apply(patch)?;

        update_load(&mut tx, &load).await?;

        tx.commit().await?;

        Ok(load)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_load(&self, principal: Principal, id: Uuid) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let load = fetch_load_for_update(&mut tx, &id).await?;

        if load.shipper_id != principal.id {
            return Err(Error::Forbidden("delete this load"));
        }

        load.ensure_editable("delete a load")?;

        // bids reference the load; pre-assignment they are all dead weight
        tx.execute(sqlx::query("DELETE FROM bids WHERE load_id = $1").bind(&id))
            .await?;
        tx.execute(sqlx::query("DELETE FROM loads WHERE id = $1").bind(&id))
            .await?;

        tx.commit().await?;

        tracing::info!(load_id = %id, "load deleted");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_open_loads(&self, filter: LoadFilter) -> Result<Vec<Load>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query(
                "SELECT data FROM loads WHERE status IN ('Posted', 'Bidding') ORDER BY created_at DESC",
            ))
            .await?;

        let mut loads = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(load): Json<Load> = row.try_get("data")?;
            loads.push(load);
        }

        loads.retain(|load| {
            filter
                .cargo_type
                .map_or(true, |cargo_type| load.cargo_type == cargo_type)
                && filter
                    .truck_type
                    .map_or(true, |truck_type| load.required_truck_type == truck_type)
                && filter.min_budget.map_or(true, |min| load.budget.amount >= min)
                && filter.max_budget.map_or(true, |max| load.budget.amount <= max)
        });

        Ok(loads)
    }

    #[tracing::instrument(skip(self))]
    async fn list_shipper_loads(&self, principal: Principal) -> Result<Vec<Load>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM loads WHERE shipper_id = $1 ORDER BY created_at DESC",
                )
                .bind(&principal.id),
            )
            .await?;

        let mut loads = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(load): Json<Load> = row.try_get("data")?;
            loads.push(load);
        }

        Ok(loads)
    }
}

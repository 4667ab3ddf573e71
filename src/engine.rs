mod bid_api;
mod directory_api;
mod helpers;
mod load_api;
mod query_api;

use sqlx::{Executor, Pool, Postgres};

use crate::api::Api;
use crate::error::Error;

type Database = Postgres;

#[derive(Debug)]
pub struct Engine {
    pool: Pool<Database>,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub async fn new(pool: Pool<Database>) -> Result<Self, Error> {
        // load service
        pool.execute(
            "CREATE TABLE IF NOT EXISTS loads (id UUID PRIMARY KEY, status VARCHAR NOT NULL, shipper_id UUID NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
        )
        .await?;

        // bid service
        pool.execute(
            "CREATE TABLE IF NOT EXISTS bids (id UUID PRIMARY KEY, load_id UUID NOT NULL, carrier_id UUID NOT NULL, status VARCHAR NOT NULL, amount DOUBLE PRECISION NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL, CONSTRAINT fk_bid_load FOREIGN KEY(load_id) REFERENCES loads(id))",
        )
        .await?;

        // for the lowest-bid sort and the per-carrier duplicate check
        pool.execute("CREATE INDEX IF NOT EXISTS bids_load_amount ON bids (load_id, amount)")
            .await?;
        pool.execute(
            "CREATE INDEX IF NOT EXISTS bids_load_carrier ON bids (load_id, carrier_id, status)",
        )
        .await?;

        // carrier profile store (synced from the external directory)
        pool.execute(
            "CREATE TABLE IF NOT EXISTS carriers (id UUID PRIMARY KEY, data JSONB NOT NULL)",
        )
        .await?;

        Ok(Self { pool })
    }
}

impl Api for Engine {}

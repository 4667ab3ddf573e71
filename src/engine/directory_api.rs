use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor};

use crate::{api::DirectoryApi, entities::CarrierProfile, error::Error};

#[async_trait]
impl DirectoryApi for Engine {
    /// Upsert from the external profile store; the engine never edits these
    /// documents itself.
    #[tracing::instrument(skip(self, profile))]
    async fn put_carrier_profile(&self, profile: CarrierProfile) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO carriers (id, data) VALUES ($1, $2) \
                 ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data",
            )
            .bind(&profile.id)
            .bind(Json(&profile)),
        )
        .await?;

        tracing::info!(carrier_id = %profile.id, "carrier profile synced");

        Ok(())
    }
}

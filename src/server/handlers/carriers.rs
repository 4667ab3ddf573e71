use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{api::DynApi, entities::CarrierProfile, error::Error};

/// Sync seam for the external profile store; the path id is authoritative.
pub async fn put_profile(
    Extension(api): Extension<DynApi>,
    Path(id): Path<Uuid>,
    Json(mut profile): Json<CarrierProfile>,
) -> Result<StatusCode, Error> {
    profile.id = id;
    api.put_carrier_profile(profile).await?;

    Ok(StatusCode::NO_CONTENT)
}

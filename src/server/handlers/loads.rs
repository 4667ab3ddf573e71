use axum::extract::{Extension, Json, Path, Query};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
    api::{DynApi, LoadFilter},
    auth::Principal,
    entities::{Load, LoadDraft, LoadPatch},
    error::Error,
};

pub async fn create(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Json(draft): Json<LoadDraft>,
) -> Result<Json<Load>, Error> {
    let load = api.create_load(principal, draft).await?;

    Ok(load.into())
}

pub async fn find(
    Extension(api): Extension<DynApi>,
    Path(id): Path<Uuid>,
) -> Result<Json<Load>, Error> {
    let load = api.find_load(id).await?;

    Ok(load.into())
}

pub async fn update(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(patch): Json<LoadPatch>,
) -> Result<Json<Load>, Error> {
    let load = api.update_load(principal, id, patch).await?;

    Ok(load.into())
}

pub async fn remove(
    Extension(api): Extension<DynApi>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    api.delete_load(principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_open(
    Extension(api): Extension<DynApi>,
    Query(filter): Query<LoadFilter>,
) -> Result<Json<Vec<Load>>, Error> {
    let loads = api.list_open_loads(filter).await?;

    Ok(loads.into())
}

pub async fn list_for_shipper(
    Extension(api): Extension<DynApi>,
    principal: Principal,
) -> Result<Json<Vec<Load>>, Error> {
    let loads = api.list_shipper_loads(principal).await?;

    Ok(loads.into())
}

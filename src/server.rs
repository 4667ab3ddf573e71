mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post, put},
    Router,
};

use crate::api::{Api, DynApi};
use crate::server::handlers::{bids, carriers, loads};

pub async fn serve<T: Api + Send + Sync + 'static>(api: T, addr: SocketAddr) {
    let api = Arc::new(api) as DynApi;

    let app = Router::new()
        .route("/loads", post(loads::create).get(loads::list_open))
        .route(
            "/loads/:id",
            get(loads::find).put(loads::update).delete(loads::remove),
        )
        .route("/loads/:id/bids", get(bids::list_for_load))
        .route("/shipper/loads", get(loads::list_for_shipper))
        .route("/shipper/bids", get(bids::list_for_shipper))
        .route("/carrier/bids", get(bids::list_for_carrier))
        .route("/bids", post(bids::create))
        .route("/bids/:id", get(bids::find))
        .route("/bids/:id/accept", put(bids::accept))
        .route("/bids/:id/withdraw", patch(bids::withdraw))
        .route("/carriers/:id/profile", put(carriers::put_profile))
        .layer(Extension(api));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}

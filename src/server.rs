//! HTTP shell: accepts NetBox webhooks and hands them to [`process`].

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::inventory::{DeviceUpdater, InventoryFetcher};
use crate::{SyncResponse, process};

pub const WEBHOOK_PATH: &str = "/netbox-webhook";

pub struct AppState<P> {
    pub organization_id: String,
    pub platform: P,
}

async fn handle_webhook<P>(
    State(state): State<Arc<AppState<P>>>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<SyncResponse>)
where
    P: InventoryFetcher + DeviceUpdater + Send + Sync + 'static,
{
    info!("Webhook triggered");

    let response = process(
        &state.organization_id,
        payload,
        &state.platform,
        &state.platform,
    )
    .await;

    let status = if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(response))
}

pub fn router<P>(state: Arc<AppState<P>>) -> Router
where
    P: InventoryFetcher + DeviceUpdater + Send + Sync + 'static,
{
    Router::new()
        .route(WEBHOOK_PATH, post(handle_webhook::<P>))
        .with_state(state)
}

/// Serves the webhook endpoint until the process is stopped.
pub async fn serve<P>(bind_address: &str, state: Arc<AppState<P>>) -> Result<()>
where
    P: InventoryFetcher + DeviceUpdater + Send + Sync + 'static,
{
    let listener = TcpListener::bind(bind_address).await?;
    info!("Listening on http://{bind_address}{WEBHOOK_PATH}");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

//! Library for synchronizing device metadata from NetBox into Meraki.
//!
//! NetBox emits a webhook whenever a device changes. The notification is reconciled against the
//! Meraki organization inventory: a differing name is pushed with a rename, and a differing
//! primary IPv4 address is pushed as a static WAN configuration (address, subnet mask, gateway).
//!
//! Two shells drive the same [`process`] entry point: an HTTP endpoint ([`server`]) and a Lambda
//! handler.

use anyhow::{Result, anyhow};
use log::{LevelFilter, debug, error};
use serde::Serialize;
use serde_json::Value;

pub mod config;
pub mod inventory;
pub mod meraki;
pub mod notification;
pub mod reconcile;
pub mod server;
pub mod subnet;

#[cfg(test)]
mod testing;

use inventory::{DeviceUpdater, InventoryFetcher};
use notification::ChangeNotification;
use reconcile::{Reconciliation, reconcile};

pub const APP_NAME: &str = "netbox_meraki_sync";

/// Document returned to the caller of either shell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncResponse {
    Success,
    Error { message: String },
}

impl SyncResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncResponse::Success)
    }
}

pub fn set_up_logger(calling_module: &str, verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} - {} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for(APP_NAME, level)
        .level_for(calling_module.to_string(), level)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}

/// Unwraps a webhook document delivered inside an HTTP-style event envelope.
///
/// Function URL and API gateway invocations carry the document as a JSON string in `body`.
/// Documents that already have a `data` member, or no string `body`, are returned unchanged.
///
/// # Errors
/// * Returns error if `body` is present but is not valid JSON
pub fn unwrap_envelope(payload: Value) -> Result<Value> {
    if payload.get("data").is_some() {
        return Ok(payload);
    }

    match payload.get("body").and_then(Value::as_str) {
        Some(body) => {
            debug!("Unwrapping notification from event body");
            serde_json::from_str(body).map_err(|e| anyhow!("Invalid JSON in event body: {e}"))
        }
        None => Ok(payload),
    }
}

async fn try_process<F, U>(
    organization_id: &str,
    payload: Value,
    fetcher: &F,
    updater: &U,
) -> Result<Reconciliation>
where
    F: InventoryFetcher + ?Sized,
    U: DeviceUpdater + ?Sized,
{
    let notification = ChangeNotification::from_payload(payload)?;
    debug!("Notification: {notification:?}");

    reconcile(organization_id, &notification, fetcher, updater).await
}

/// Handles one webhook document end to end.
///
/// Structural and inventory fetch errors yield [`SyncResponse::Error`]. Update failures are
/// logged only, so a success response does not guarantee every update was applied.
pub async fn process<F, U>(
    organization_id: &str,
    payload: Value,
    fetcher: &F,
    updater: &U,
) -> SyncResponse
where
    F: InventoryFetcher + ?Sized,
    U: DeviceUpdater + ?Sized,
{
    match try_process(organization_id, payload, fetcher, updater).await {
        Ok(reconciliation) => {
            debug!("Reconciliation: {reconciliation:?}");
            SyncResponse::Success
        }
        Err(e) => {
            error!("Error processing payload: {e}");
            SyncResponse::Error {
                message: e.to_string(),
            }
        }
    }
}

//! Reconciles a change notification against the platform inventory.
//!
//! The inventory is fetched once per notification and the first device whose serial matches
//! is selected. At most one rename and one static WAN update are issued for it. A failure in
//! either update is logged and recorded in the returned [`Reconciliation`] without aborting the
//! other; only structural and fetch failures propagate as errors.
//!
//! Concurrent notifications for the same serial are not serialized against each other, so the
//! last write to the platform wins.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::fmt::{self, Display};

use crate::inventory::{DeviceUpdater, InventoryDevice, InventoryFetcher, StaticWan};
use crate::notification::ChangeNotification;
use crate::subnet::derive_subnet_mask;

/// Which attributes of a matched device differ from the notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub update_name: bool,
    pub update_ip: bool,
}

impl UpdatePlan {
    pub fn new(device: &InventoryDevice, notification: &ChangeNotification) -> Self {
        let update_name = device.name() != notification.device_name;
        if update_name {
            info!(
                "Name change detected: {} -> {}",
                device.name(),
                notification.device_name
            );
        }

        let update_ip = match notification.primary_ip() {
            Some(ip) if device.lan_ip.as_deref() != Some(ip) => {
                info!("IP change detected: {:?} -> {ip}", device.lan_ip);
                true
            }
            _ => false,
        };

        UpdatePlan {
            update_name,
            update_ip,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldOutcome {
    Unchanged,
    Applied,
    Skipped(String),
    Failed(String),
}

impl Display for FieldOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldOutcome::Unchanged => write!(f, "unchanged"),
            FieldOutcome::Applied => write!(f, "applied"),
            FieldOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            FieldOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of reconciling one notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    NoMatchingDevice,
    Reconciled {
        serial: String,
        name: FieldOutcome,
        wan: FieldOutcome,
    },
}

async fn apply_name<U>(updater: &U, serial: &str, name: &str) -> FieldOutcome
where
    U: DeviceUpdater + ?Sized,
{
    info!("Updating device name for {serial}");

    match updater.rename(serial, name).await {
        Ok(()) => {
            info!("Name updated successfully: {serial} -> {name}");
            FieldOutcome::Applied
        }
        Err(e) => {
            error!("Meraki API error while updating name: {e}");
            FieldOutcome::Failed(e.to_string())
        }
    }
}

async fn apply_wan<U>(updater: &U, serial: &str, notification: &ChangeNotification) -> FieldOutcome
where
    U: DeviceUpdater + ?Sized,
{
    let (Some(cidr), Some(ip)) = (
        notification.primary_address.as_deref(),
        notification.primary_ip(),
    ) else {
        warn!("No primary_ip4 field in the payload. Skipping IP update.");
        return FieldOutcome::Skipped("no primary address".to_string());
    };

    let gateway_ip = notification.gateway_address.as_deref();
    debug!("Extracted gateway IP from custom field: {gateway_ip:?}");

    let subnet_mask = derive_subnet_mask(cidr);
    debug!("Calculated subnet mask for {cidr}: {subnet_mask:?}");

    let (Some(subnet_mask), Some(gateway_ip)) = (subnet_mask, gateway_ip) else {
        warn!("Failed to calculate subnet mask or gateway IP. Skipping IP update.");
        return FieldOutcome::Skipped("subnet mask or gateway IP unavailable".to_string());
    };

    let wan = StaticWan {
        ip: ip.to_string(),
        subnet_mask,
        gateway_ip: gateway_ip.to_string(),
    };

    info!("Updating management interface for device {serial}");
    match updater.set_static_wan(serial, &wan).await {
        Ok(()) => {
            info!("Management interface updated successfully: {serial} -> {wan:?}");
            FieldOutcome::Applied
        }
        Err(e) => {
            error!("Meraki API error while updating IP: {e}");
            FieldOutcome::Failed(e.to_string())
        }
    }
}

/// Brings the matching platform device in line with the notification.
///
/// # Arguments
/// * `organization_id` - Organization whose inventory is searched
/// * `notification` - Desired device state
/// * `fetcher` - Source of the current inventory
/// * `updater` - Sink for rename and static WAN updates
///
/// # Errors
/// * Returns error if the inventory cannot be fetched; update failures are reported in the
///   returned [`Reconciliation`] instead
pub async fn reconcile<F, U>(
    organization_id: &str,
    notification: &ChangeNotification,
    fetcher: &F,
    updater: &U,
) -> Result<Reconciliation>
where
    F: InventoryFetcher + ?Sized,
    U: DeviceUpdater + ?Sized,
{
    info!(
        "Device {} with serial {} received from NetBox.",
        notification.device_name, notification.serial_number
    );
    info!("Extracted IP address: {:?}", notification.primary_ip());

    let devices = fetcher.fetch_inventory(organization_id).await?;
    info!("Fetched {} devices from Meraki.", devices.len());

    let Some(device) = devices
        .iter()
        .find(|d| d.serial == notification.serial_number)
    else {
        warn!(
            "No matching device found in Meraki for serial: {}",
            notification.serial_number
        );
        return Ok(Reconciliation::NoMatchingDevice);
    };

    let plan = UpdatePlan::new(device, notification);
    debug!("Update plan for {}: {plan:?}", device.serial);

    let name = if plan.update_name {
        apply_name(updater, &device.serial, &notification.device_name).await
    } else {
        FieldOutcome::Unchanged
    };

    let wan = if plan.update_ip {
        apply_wan(updater, &device.serial, notification).await
    } else {
        FieldOutcome::Unchanged
    };

    info!("Reconciled {}: name {name}, WAN {wan}", device.serial);

    Ok(Reconciliation::Reconciled {
        serial: device.serial.clone(),
        name,
        wan,
    })
}

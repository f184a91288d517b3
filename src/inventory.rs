//! Device records and the platform capabilities the reconciler depends on.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A device as known to the management platform's inventory.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDevice {
    pub serial: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lan_ip: Option<String>,
}

impl InventoryDevice {
    /// The device name, with an unnamed device reading as empty.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Static addressing for a device's primary uplink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaticWan {
    #[serde(rename = "staticIp")]
    pub ip: String,
    #[serde(rename = "staticSubnetMask")]
    pub subnet_mask: String,
    #[serde(rename = "staticGatewayIp")]
    pub gateway_ip: String,
}

#[async_trait]
pub trait InventoryFetcher {
    /// Fetches every device in the organization, in platform order.
    async fn fetch_inventory(&self, organization_id: &str) -> Result<Vec<InventoryDevice>>;
}

#[async_trait]
pub trait DeviceUpdater {
    async fn rename(&self, serial: &str, name: &str) -> Result<()>;

    async fn set_static_wan(&self, serial: &str, wan: &StaticWan) -> Result<()>;
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_inventory_device() -> Result<()> {
        let device: InventoryDevice = serde_json::from_value(json!({
            "mac": "00:18:0a:00:00:01",
            "serial": "Q2XX-AAAA-0001",
            "name": "branch-mx-01",
            "model": "MX68",
            "networkId": "N_1234",
            "lanIp": "10.0.0.4"
        }))?;

        assert_eq!("Q2XX-AAAA-0001", device.serial);
        assert_eq!("branch-mx-01", device.name());
        assert_eq!(Some("10.0.0.4"), device.lan_ip.as_deref());

        Ok(())
    }

    #[test]
    fn test_deserialize_unnamed_device() -> Result<()> {
        let device: InventoryDevice =
            serde_json::from_value(json!({"serial": "Q2XX-AAAA-0002", "name": null}))?;

        assert_eq!("", device.name());
        assert_eq!(None, device.lan_ip);

        Ok(())
    }

    #[test]
    fn test_serialize_static_wan() -> Result<()> {
        let wan = StaticWan {
            ip: "10.0.0.5".to_string(),
            subnet_mask: "255.255.255.0".to_string(),
            gateway_ip: "10.0.0.1".to_string(),
        };

        assert_eq!(
            json!({
                "staticIp": "10.0.0.5",
                "staticSubnetMask": "255.255.255.0",
                "staticGatewayIp": "10.0.0.1"
            }),
            serde_json::to_value(&wan)?
        );

        Ok(())
    }
}

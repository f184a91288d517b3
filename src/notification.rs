//! Extraction of the device fields a NetBox webhook carries.

use anyhow::{Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::subnet::bare_ip;

const GATEWAY_IP_FIELD: &str = "gateway_ip";

#[derive(Debug, Deserialize)]
struct Webhook {
    event: Option<String>,
    model: Option<String>,
    data: DeviceData,
}

#[derive(Debug, Deserialize)]
struct DeviceData {
    name: String,
    serial: String,
    primary_ip4: Option<PrimaryIp>,
    custom_fields: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PrimaryIp {
    address: Option<String>,
}

/// Desired state of a single device, as described by the inventory system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeNotification {
    pub device_name: String,
    pub serial_number: String,
    /// Primary IPv4 address in CIDR notation.
    pub primary_address: Option<String>,
    pub gateway_address: Option<String>,
    pub event: Option<String>,
    pub model: Option<String>,
}

impl ChangeNotification {
    /// Extracts a notification from a webhook document.
    ///
    /// # Errors
    /// * Returns error if `data.name` or `data.serial` is missing, null, or empty
    pub fn from_payload(payload: Value) -> Result<Self> {
        let webhook: Webhook = serde_json::from_value(payload)
            .map_err(|e| anyhow!("Malformed notification payload: {e}"))?;
        let data = webhook.data;

        if data.name.is_empty() {
            return Err(anyhow!("Device name is empty"));
        }
        if data.serial.is_empty() {
            return Err(anyhow!("Device serial is empty"));
        }

        let primary_address = data
            .primary_ip4
            .and_then(|ip| ip.address)
            .filter(|address| !address.is_empty());

        let gateway_address = data
            .custom_fields
            .as_ref()
            .and_then(|fields| fields.get(GATEWAY_IP_FIELD))
            .and_then(Value::as_str)
            .filter(|gateway| !gateway.is_empty())
            .map(str::to_string);

        Ok(ChangeNotification {
            device_name: data.name,
            serial_number: data.serial,
            primary_address,
            gateway_address,
            event: webhook.event,
            model: webhook.model,
        })
    }

    /// The primary address without its prefix length.
    pub fn primary_ip(&self) -> Option<&str> {
        self.primary_address.as_deref().and_then(bare_ip)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    const TEST_WEBHOOK: &str = r#"{"event":"updated","timestamp":"2024-05-01T12:00:00.000000+00:00","model":"device","username":"admin","request_id":"8a9b7c6d-0000-4000-8000-000000000000","data":{"id":42,"name":"branch-mx-01","serial":"Q2XX-AAAA-0001","primary_ip4":{"id":7,"url":"/api/ipam/ip-addresses/7/","family":4,"address":"10.0.0.5/24"},"custom_fields":{"gateway_ip":"10.0.0.1","site_code":"BR1"}},"snapshots":{"prechange":null,"postchange":null}}"#;

    #[test]
    fn test_from_payload() -> Result<()> {
        let notification = ChangeNotification::from_payload(serde_json::from_str(TEST_WEBHOOK)?)?;

        assert_eq!("branch-mx-01", notification.device_name);
        assert_eq!("Q2XX-AAAA-0001", notification.serial_number);
        assert_eq!(Some("10.0.0.5/24"), notification.primary_address.as_deref());
        assert_eq!(Some("10.0.0.5"), notification.primary_ip());
        assert_eq!(Some("10.0.0.1"), notification.gateway_address.as_deref());
        assert_eq!(Some("updated"), notification.event.as_deref());
        assert_eq!(Some("device"), notification.model.as_deref());

        Ok(())
    }

    #[test]
    fn test_from_payload_optional_fields_absent() -> Result<()> {
        let notification = ChangeNotification::from_payload(json!({
            "data": {"name": "sw-01", "serial": "Q2SW-0001"}
        }))?;

        assert_eq!(None, notification.primary_address);
        assert_eq!(None, notification.primary_ip());
        assert_eq!(None, notification.gateway_address);

        Ok(())
    }

    #[test]
    fn test_from_payload_optional_fields_null() -> Result<()> {
        let notification = ChangeNotification::from_payload(json!({
            "data": {
                "name": "sw-01",
                "serial": "Q2SW-0001",
                "primary_ip4": null,
                "custom_fields": {"gateway_ip": null}
            }
        }))?;

        assert_eq!(None, notification.primary_address);
        assert_eq!(None, notification.gateway_address);

        Ok(())
    }

    #[test]
    fn test_from_payload_missing_serial() {
        let res = ChangeNotification::from_payload(json!({"data": {"name": "sw-01"}}));

        assert!(res.is_err());
        if let Err(e) = res {
            assert!(e.to_string().contains("serial"));
        }
    }

    #[test]
    fn test_from_payload_empty_name() {
        let res =
            ChangeNotification::from_payload(json!({"data": {"name": "", "serial": "Q2SW-0001"}}));

        assert!(res.is_err());
        if let Err(e) = res {
            assert!(e.to_string().contains("Device name is empty"));
        }
    }

    #[test]
    fn test_from_payload_missing_data() {
        let res = ChangeNotification::from_payload(json!({"event": "updated"}));

        assert!(res.is_err());
        if let Err(e) = res {
            assert!(e.to_string().contains("Malformed notification payload"));
        }
    }
}

//! In-memory platform that records calls, for tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::inventory::{DeviceUpdater, InventoryDevice, InventoryFetcher, StaticWan};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    FetchInventory(String),
    Rename(String, String),
    SetStaticWan(String, StaticWan),
}

#[derive(Debug, Default)]
pub struct FakePlatform {
    devices: Vec<InventoryDevice>,
    fail_fetch: bool,
    fail_rename: bool,
    fail_wan: bool,
    calls: Mutex<Vec<Call>>,
}

pub fn device(serial: &str, name: &str, lan_ip: Option<&str>) -> InventoryDevice {
    InventoryDevice {
        serial: serial.to_string(),
        name: Some(name.to_string()),
        lan_ip: lan_ip.map(str::to_string),
    }
}

impl FakePlatform {
    pub fn new(devices: Vec<InventoryDevice>) -> Self {
        FakePlatform {
            devices,
            ..Default::default()
        }
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn failing_rename(mut self) -> Self {
        self.fail_rename = true;
        self
    }

    pub fn failing_wan(mut self) -> Self {
        self.fail_wan = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn update_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::FetchInventory(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock poisoned").push(call);
    }
}

#[async_trait]
impl InventoryFetcher for FakePlatform {
    async fn fetch_inventory(&self, organization_id: &str) -> Result<Vec<InventoryDevice>> {
        self.record(Call::FetchInventory(organization_id.to_string()));

        if self.fail_fetch {
            Err(anyhow!("Meraki API error 401 Unauthorized: Invalid API key"))
        } else {
            Ok(self.devices.clone())
        }
    }
}

#[async_trait]
impl DeviceUpdater for FakePlatform {
    async fn rename(&self, serial: &str, name: &str) -> Result<()> {
        self.record(Call::Rename(serial.to_string(), name.to_string()));

        if self.fail_rename {
            Err(anyhow!("Meraki API error 400 Bad Request: invalid name"))
        } else {
            Ok(())
        }
    }

    async fn set_static_wan(&self, serial: &str, wan: &StaticWan) -> Result<()> {
        self.record(Call::SetStaticWan(serial.to_string(), wan.clone()));

        if self.fail_wan {
            Err(anyhow!("Meraki API error 400 Bad Request: invalid gateway"))
        } else {
            Ok(())
        }
    }
}

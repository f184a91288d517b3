//! Meraki Dashboard API v1 client implementing the inventory and update capabilities.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::inventory::{DeviceUpdater, InventoryDevice, InventoryFetcher, StaticWan};

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

const INVENTORY_PAGE_SIZE: u32 = 1000;

#[derive(Clone, Debug)]
pub struct MerakiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DeviceNameUpdate<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManagementInterfaceUpdate<'a> {
    wan1: Wan1<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Wan1<'a> {
    using_static_ip: bool,
    #[serde(flatten)]
    wan: &'a StaticWan,
}

impl MerakiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(MerakiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        check_status(response).await
    }

    async fn put_json<T>(&self, path: &str, body: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("PUT {url}");

        let response = self.send(self.http.put(&url).json(body)).await?;
        let updated: serde_json::Value = response.json().await?;
        debug!("PUT {url} Succeeded: {updated}");

        Ok(())
    }
}

/// Converts a non-2xx response into an error carrying the status and any API error messages.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error_body) => error_body.errors.join("; "),
        Err(_) => body,
    };

    Err(anyhow!("Meraki API error {status}: {detail}"))
}

/// Extracts the `rel=next` target from a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LINK)?
        .to_str()
        .ok()?
        .split(',')
        .find_map(|link| {
            let (target, params) = link.split_once(';')?;
            let is_next = params
                .split(';')
                .any(|p| matches!(p.trim(), "rel=next" | "rel=\"next\""));

            is_next.then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
        })
}

#[async_trait]
impl InventoryFetcher for MerakiClient {
    async fn fetch_inventory(&self, organization_id: &str) -> Result<Vec<InventoryDevice>> {
        let url = self.url(&format!("/organizations/{organization_id}/inventory/devices"));
        debug!("GET {url}");

        let mut request = self
            .http
            .get(&url)
            .query(&[("perPage", INVENTORY_PAGE_SIZE)]);
        let mut devices = Vec::new();

        loop {
            let response = self.send(request).await?;
            let next = next_page(response.headers());

            let page: Vec<InventoryDevice> = response.json().await?;
            debug!("Fetched inventory page of {} device(s)", page.len());
            devices.extend(page);

            match next {
                Some(next) => {
                    debug!("GET {next}");
                    request = self.http.get(next);
                }
                None => break,
            }
        }

        Ok(devices)
    }
}

#[async_trait]
impl DeviceUpdater for MerakiClient {
    async fn rename(&self, serial: &str, name: &str) -> Result<()> {
        self.put_json(&format!("/devices/{serial}"), &DeviceNameUpdate { name })
            .await
    }

    async fn set_static_wan(&self, serial: &str, wan: &StaticWan) -> Result<()> {
        let update = ManagementInterfaceUpdate {
            wan1: Wan1 {
                using_static_ip: true,
                wan,
            },
        };

        self.put_json(&format!("/devices/{serial}/managementInterface"), &update)
            .await
    }
}

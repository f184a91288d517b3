use jluszcz_rust_utils::lambda;
use lambda_runtime::{LambdaEvent, service_fn};
use log::info;
use netbox_meraki_sync::config::Config;
use netbox_meraki_sync::meraki::MerakiClient;
use netbox_meraki_sync::{APP_NAME, SyncResponse, process, unwrap_envelope};
use serde_json::Value;
use std::error::Error;

type LambdaError = Box<dyn Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    let config = Config::from_env()?;
    let client = MerakiClient::new(&config.base_url, &config.api_key)?;

    let config = &config;
    let client = &client;

    let func = service_fn(move |event: LambdaEvent<Value>| function(config, client, event));
    lambda_runtime::run(func).await?;
    Ok(())
}

async fn function(
    config: &Config,
    client: &MerakiClient,
    event: LambdaEvent<Value>,
) -> Result<Value, LambdaError> {
    lambda::init(APP_NAME, module_path!(), config.verbose).await?;
    info!("Webhook triggered");

    let response = match unwrap_envelope(event.payload) {
        Ok(payload) => process(&config.organization_id, payload, client, client).await,
        Err(e) => SyncResponse::Error {
            message: e.to_string(),
        },
    };

    Ok(serde_json::to_value(response)?)
}

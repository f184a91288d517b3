use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use netbox_meraki_sync::config::{API_KEY_ENV, BASE_URL_ENV, Config, ORG_ID_ENV};
use netbox_meraki_sync::meraki::{DEFAULT_BASE_URL, MerakiClient};
use netbox_meraki_sync::server::{self, AppState};
use netbox_meraki_sync::{process, set_up_logger};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug)]
enum Mode {
    Serve { bind_address: String },
    Sync { payload: PathBuf },
}

#[derive(Debug)]
struct Args {
    config: Config,
    mode: Mode,
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow!("Missing required argument: {id}"))
}

fn parse_args() -> Result<Args> {
    let matches = Command::new("netbox-meraki-sync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pushes NetBox device changes into Meraki.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Verbose mode. Outputs DEBUG and higher log messages."),
        )
        .arg(
            Arg::new("org-id")
                .short('o')
                .long("org-id")
                .env(ORG_ID_ENV)
                .required(true)
                .help("Meraki organization ID."),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .env(API_KEY_ENV)
                .hide_env_values(true)
                .required(true)
                .help("Meraki Dashboard API key."),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .env(BASE_URL_ENV)
                .default_value(DEFAULT_BASE_URL)
                .help("Meraki Dashboard API base URL."),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve the NetBox webhook endpoint.")
                .arg(
                    Arg::new("bind")
                        .short('b')
                        .long("bind")
                        .default_value(DEFAULT_BIND_ADDRESS)
                        .help("Address to listen on."),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Reconcile a single webhook document read from a file.")
                .arg(
                    Arg::new("payload")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Path to a NetBox webhook JSON document."),
                ),
        )
        .get_matches();

    let config = Config {
        organization_id: required(&matches, "org-id")?,
        api_key: required(&matches, "api-key")?,
        base_url: required(&matches, "base-url")?,
        verbose: matches.get_flag("verbose"),
    };

    let mode = match matches.subcommand() {
        Some(("serve", sub)) => Mode::Serve {
            bind_address: required(sub, "bind")?,
        },
        Some(("sync", sub)) => Mode::Sync {
            payload: sub
                .get_one::<PathBuf>("payload")
                .cloned()
                .ok_or_else(|| anyhow!("Missing required argument: payload"))?,
        },
        _ => return Err(anyhow!("No subcommand given")),
    };

    Ok(Args { config, mode })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    set_up_logger(module_path!(), args.config.verbose)?;
    debug!("Args: {args:?}");

    let client = MerakiClient::new(&args.config.base_url, &args.config.api_key)?;

    match args.mode {
        Mode::Serve { bind_address } => {
            let state = Arc::new(AppState {
                organization_id: args.config.organization_id,
                platform: client,
            });
            server::serve(&bind_address, state).await?;
        }
        Mode::Sync { payload } => {
            let payload = serde_json::from_str(&tokio::fs::read_to_string(&payload).await?)?;
            let response = process(&args.config.organization_id, payload, &client, &client).await;
            info!("Response: {}", serde_json::to_string(&response)?);

            if !response.is_success() {
                return Err(anyhow!("Sync failed"));
            }
        }
    }

    Ok(())
}

use edge_analytics_proxy::{
    api,
    config::ProxyConfig,
    credentials::{CredentialSources, Credentials},
    logging,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = ProxyConfig::from_env();

    if let Err(e) = logging::init_logger(env!("CARGO_CRATE_NAME"), config.log_format) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let credentials = Credentials::resolve(&CredentialSources::from_env(config.key_file.clone()));
    match &credentials {
        Some(c) => info!("Loaded credentials for access key {}", c.access_key_id()),
        None => warn!("No credentials found; analytics queries will fail until configured"),
    }

    if let Err(e) = api::serve(config, credentials).await {
        error!("Analytics proxy stopped: {}", e);
        std::process::exit(1);
    }
}

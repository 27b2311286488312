// src/main.rs

//! # sigverify - Main Entry Point
//!
//! Verification gateway for signed attribute-disclosure messages. Accepts a
//! signed message over HTTP and answers with the attributes it proves.
//!
//! ## Architecture Overview
//! 1. **Trust Layer**: `TrustProvider` boundary and the scheme-directory provider
//! 2. **Services Layer**: `TrustStore` (configuration snapshots) and `ApiServer`
//! 3. **Storage Layer**: local scheme folder and scheme downloads
//!
//! ## Environment Variables
//! - `SCHEMES_DIR`: Scheme storage directory (required)
//! - `LISTEN_ADDR`: (Optional) listen socket (default: 0.0.0.0:8080)
//! - `DEFAULT_SCHEME_URLS`: Comma separated base URLs serving `scheme.json`
//!   (required). Fetched only when `SCHEMES_DIR` holds no usable scheme; if
//!   none of them can be installed then, startup fails.
//! - `REFRESH_INTERVAL_MINUTES`: (Optional) scheme refresh period (default: 15)
//! - `MAX_BODY_BYTES`, `REQUEST_TIMEOUT_SECS`, `DOWNLOAD_TIMEOUT_SECS`:
//!   (Optional) see `settings`
//! - `RUST_LOG`: (Optional) log filter (default: info)

use crate::services::api_server::ApiServer;
use crate::services::trust_store::TrustStore;
use crate::settings::Settings;
use crate::storage::scheme_client::SchemeClient;
use crate::storage::scheme_folder::SchemeFolder;
use crate::trust::provider::SchemeProvider;
use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::sync::Arc;

// Module declarations (organized by functional domain)
mod models;        // Data structures
mod services;      // Trust store and API
mod settings;      // Process configuration
mod storage;       // Scheme folder and downloads
mod trust;         // Trust provider boundary and verification
mod utils;         // Helper functions

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment configuration
/// 2. Initialize the trust store (downloading default schemes if needed)
/// 3. Start the background scheme refresh
/// 4. Start API server
///
/// # Errors
/// - If required environment variables are missing or invalid
/// - If no usable trust scheme can be loaded
/// - If the listen address cannot be bound
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().context("invalid configuration")?;
    info!(
        "starting with schemes in {}, refresh every {} minute(s)",
        settings.schemes_dir.display(),
        settings.refresh_interval_minutes
    );

    let client = SchemeClient::new(settings.download_timeout())
        .context("failed to initialize scheme download client")?;
    let provider = SchemeProvider::new(
        SchemeFolder::new(&settings.schemes_dir),
        client,
        settings.scheme_urls(),
    );

    let trust_store = TrustStore::initialize(provider)
        .await
        .context("failed to initialize trust store")?;
    let trust_store = Arc::new(trust_store);

    // Runs for the lifetime of the process
    let _refresh = trust_store.start_auto_refresh(settings.refresh_interval());

    let api_server = ApiServer::new(
        trust_store,
        settings.max_body_bytes,
        settings.request_timeout(),
    );

    api_server
        .run(settings.listen_addr)
        .await
        .context("API server failed")
}

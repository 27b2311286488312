// src/services/trust_store.rs
//! Holder of the active trust configuration.
//!
//! The configuration is parsed once at startup and replaced wholesale by the
//! refresh loop. Readers take an `Arc` snapshot and keep using it for the
//! whole verification, so a concurrent refresh never changes the material
//! a request is checked against.

use crate::trust::{TrustError, TrustProvider};
use log::{debug, info, warn};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub struct TrustStore<P: TrustProvider> {
    provider: Arc<P>,
    /// Lock only guards the pointer; it is never held across an await or a parse
    current: RwLock<Arc<P::Configuration>>,
}

impl<P: TrustProvider> TrustStore<P> {
    /// Loads the stored schemes, downloading the defaults if there are none.
    ///
    /// # Initialization Sequence
    /// 1. Parse the provider's storage
    /// 2. If that fails or finds no scheme, download the default schemes
    /// 3. Parse again; an empty result is fatal
    ///
    /// # Errors
    /// - [`TrustError::NoSchemes`] if no usable scheme could be loaded
    /// - Any download or storage error from the fallback path
    pub async fn initialize(provider: P) -> Result<Self, TrustError> {
        let configuration = match provider.parse_configuration().await {
            Ok(configuration) if provider.scheme_count(&configuration) > 0 => configuration,
            Ok(_) => {
                info!("scheme storage is empty, downloading default schemes");
                Self::install_defaults(&provider).await?
            }
            Err(e) => {
                warn!("failed to parse scheme storage ({}), downloading default schemes", e);
                Self::install_defaults(&provider).await?
            }
        };

        info!(
            "trust store initialized with {} scheme(s)",
            provider.scheme_count(&configuration)
        );
        Ok(TrustStore {
            provider: Arc::new(provider),
            current: RwLock::new(Arc::new(configuration)),
        })
    }

    async fn install_defaults(provider: &P) -> Result<P::Configuration, TrustError> {
        let installed = provider.download_default_schemes().await?;
        info!("downloaded {} default scheme(s)", installed);

        let configuration = provider.parse_configuration().await?;
        if provider.scheme_count(&configuration) == 0 {
            return Err(TrustError::NoSchemes);
        }
        Ok(configuration)
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Snapshot of the active configuration.
    pub fn current_configuration(&self) -> Arc<P::Configuration> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    fn publish(&self, configuration: P::Configuration) {
        let configuration = Arc::new(configuration);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = configuration;
    }

    /// Runs one refresh cycle.
    ///
    /// # Returns
    /// - `Ok(true)` if a new configuration was published
    /// - `Ok(false)` if the stored schemes were already current
    ///
    /// # Errors
    /// Update, parse, or an empty parse result. The active configuration is
    /// left untouched in every error case.
    pub async fn refresh(&self) -> Result<bool, TrustError> {
        let current = self.current_configuration();
        if !self.provider.update_schemes(&current).await? {
            return Ok(false);
        }

        let configuration = self.provider.parse_configuration().await?;
        let schemes = self.provider.scheme_count(&configuration);
        if schemes == 0 {
            return Err(TrustError::NoSchemes);
        }

        self.publish(configuration);
        info!("published refreshed trust configuration with {} scheme(s)", schemes);
        Ok(true)
    }

    /// Spawns the background refresh loop.
    ///
    /// The first refresh runs one `period` after this call. A slow refresh
    /// delays the following ones instead of triggering a burst.
    pub fn start_auto_refresh(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match store.refresh().await {
                    Ok(true) => {}
                    Ok(false) => debug!("trust schemes are up to date"),
                    Err(e) => warn!("scheme refresh failed, keeping current configuration: {}", e),
                }
            }
        })
    }
}

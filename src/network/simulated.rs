//! In-process SDK stand-in
//!
//! Completes init, loads and shows on the tokio runtime after configurable
//! delays, so the coordination layer can be exercised without a real network.

use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::coordination::{ConsentFlag, InitCompletion};
use crate::domain::{AdObjectId, AdRequest, AdUnitKind, Credentials};
use crate::error::{LoadError, MedleyError, Result};
use crate::network::NetworkSdk;
use crate::registry::AdCallbacks;

const SIMULATED_SDK_VERSION: &str = "7.1.0-sim";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimulatedAd {
    Loading,
    Loaded,
    Shown,
}

pub struct SimulatedSdk {
    config: SimulationConfig,
    runtime: Handle,
    initialized: Arc<AtomicBool>,
    ads: Arc<DashMap<AdObjectId, SimulatedAd>>,
    consent: Mutex<Vec<(ConsentFlag, bool)>>,
}

impl SimulatedSdk {
    /// Must be called from inside a tokio runtime
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| MedleyError::Internal(format!("simulated SDK needs a runtime: {}", e)))?;

        Ok(Self {
            config,
            runtime,
            initialized: Arc::new(AtomicBool::new(false)),
            ads: Arc::new(DashMap::new()),
            consent: Mutex::new(Vec::new()),
        })
    }

    /// Consent values the SDK has received, in order
    pub fn applied_consent(&self) -> Vec<(ConsentFlag, bool)> {
        self.consent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn live_ads(&self) -> usize {
        self.ads.len()
    }
}

impl NetworkSdk for SimulatedSdk {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn sdk_version(&self) -> String {
        SIMULATED_SDK_VERSION.to_string()
    }

    fn initialize(&self, credentials: &Credentials, completion: InitCompletion) {
        let delay = Duration::from_millis(self.config.init_delay_ms);
        let fails = self.config.init_fails;
        let initialized = self.initialized.clone();
        let app_id = credentials.app_id.clone();

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if fails {
                completion.fail(format!("simulated init failure for app {}", app_id));
            } else {
                initialized.store(true, Ordering::SeqCst);
                completion.succeed();
            }
        });
    }

    fn apply_consent(&self, flag: ConsentFlag, value: bool) -> Result<()> {
        // Child-directed treatment is fixed once the SDK is up
        if flag == ConsentFlag::Minor && self.initialized.load(Ordering::SeqCst) {
            return Err(MedleyError::Validation(
                "minor flag can only be set before init".to_string(),
            ));
        }
        self.consent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((flag, value));
        Ok(())
    }

    fn load_ad(&self, request: &AdRequest, callbacks: AdCallbacks) {
        let delay = Duration::from_millis(self.config.load_delay_ms);
        let fill_rate = self.config.fill_rate.clamp(0.0, 1.0);
        let ads = self.ads.clone();
        let ad = request.ad;
        ads.insert(ad, SimulatedAd::Loading);

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let filled = rand::thread_rng().gen_bool(fill_rate);

            // Destroyed while loading
            let Some(mut state) = ads.get_mut(&ad) else {
                return;
            };
            if filled {
                *state = SimulatedAd::Loaded;
                drop(state);
                callbacks.loaded();
            } else {
                drop(state);
                ads.remove(&ad);
                callbacks.load_failed(LoadError::NoFill("no ads from simulated network".to_string()));
            }
        });
    }

    fn show_ad(&self, request: &AdRequest, callbacks: AdCallbacks) {
        let duration = Duration::from_millis(self.config.show_duration_ms);
        let ads = self.ads.clone();
        let ad = request.ad;
        let rewarded = request.kind == AdUnitKind::RewardedVideo;

        self.runtime.spawn(async move {
            let loaded = ads
                .get_mut(&ad)
                .map(|mut state| {
                    let ready = *state == SimulatedAd::Loaded;
                    if ready {
                        *state = SimulatedAd::Shown;
                    }
                    ready
                })
                .unwrap_or(false);
            if !loaded {
                callbacks.show_failed("ad not loaded");
                return;
            }

            callbacks.show_succeeded();
            callbacks.impression();
            tokio::time::sleep(duration).await;
            if rewarded {
                callbacks.rewarded();
            }
            ads.remove(&ad);
            callbacks.closed();
        });
    }

    fn destroy_ad(&self, request: &AdRequest) {
        if self.ads.remove(&request.ad).is_some() {
            debug!("simulated: destroyed ad {}", request.ad);
        }
    }

    fn is_ad_ready(&self, request: &AdRequest) -> bool {
        self.ads
            .get(&request.ad)
            .map(|state| *state == SimulatedAd::Loaded)
            .unwrap_or(false)
    }

    fn bidding_token(&self) -> Option<String> {
        if self.initialized.load(Ordering::SeqCst) {
            Some(format!("sim-token-{}", uuid::Uuid::new_v4().simple()))
        } else {
            None
        }
    }
}

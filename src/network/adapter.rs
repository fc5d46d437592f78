//! Network adapter glue
//!
//! Wires one network's SDK, its init coordinator and the three ad unit
//! registries together, and speaks the mediation settings JSON.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::coordination::{parse_consent_value, ConsentDisposition, ConsentFlag, InitCoordinator};
use crate::domain::{AdUnitKind, InitState, PlacementKey};
use crate::error::{LoadError, MedleyError, Result};
use crate::network::NetworkSdk;
use crate::registry::{
    AdUnitRegistry, Banner, BannerListener, Interstitial, InterstitialListener,
    LoadWhileShowPolicy, Rewarded, RewardedListener,
};

/// Payload handed to the mediation server for a bidding auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiddingData {
    pub token: String,
    pub sdk_version: String,
}

pub struct NetworkAdapter {
    network: String,
    placement_field: String,
    sdk: Arc<dyn NetworkSdk>,
    coordinator: Arc<InitCoordinator>,
    rewarded: Arc<AdUnitRegistry<Rewarded>>,
    interstitial: Arc<AdUnitRegistry<Interstitial>>,
    banner: Arc<AdUnitRegistry<Banner>>,
}

impl NetworkAdapter {
    /// Build an adapter with its own coordinator
    pub fn new(config: &AppConfig, sdk: Arc<dyn NetworkSdk>) -> Self {
        let coordinator = InitCoordinator::new(sdk.clone());
        Self::with_coordinator(config, sdk, coordinator)
    }

    /// Build an adapter sharing an existing coordinator for the same network
    pub fn with_coordinator(
        config: &AppConfig,
        sdk: Arc<dyn NetworkSdk>,
        coordinator: Arc<InitCoordinator>,
    ) -> Self {
        let credentials = config.network.credentials();

        Self {
            network: config.network.name.clone(),
            placement_field: config.network.placement_field.clone(),
            rewarded: AdUnitRegistry::new(
                coordinator.clone(),
                sdk.clone(),
                credentials.clone(),
                config.rewarded.clone(),
            ),
            interstitial: AdUnitRegistry::new(
                coordinator.clone(),
                sdk.clone(),
                credentials.clone(),
                config.interstitial.clone(),
            ),
            banner: AdUnitRegistry::new(
                coordinator.clone(),
                sdk.clone(),
                credentials,
                config.banner.clone(),
            ),
            sdk,
            coordinator,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn coordinator(&self) -> &Arc<InitCoordinator> {
        &self.coordinator
    }

    pub fn rewarded(&self) -> &Arc<AdUnitRegistry<Rewarded>> {
        &self.rewarded
    }

    pub fn interstitial(&self) -> &Arc<AdUnitRegistry<Interstitial>> {
        &self.interstitial
    }

    pub fn banner(&self) -> &Arc<AdUnitRegistry<Banner>> {
        &self.banner
    }

    pub fn adapter_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn sdk_version(&self) -> String {
        self.sdk.sdk_version()
    }

    /// Read the placement id out of ad unit settings
    pub fn placement_key(&self, settings: &Value) -> Result<PlacementKey> {
        match settings.get(&self.placement_field) {
            Some(Value::String(raw)) => PlacementKey::new(raw.as_str())
                .map_err(|_| MedleyError::MissingParameter(self.placement_field.clone())),
            Some(Value::Number(n)) => PlacementKey::new(n.to_string()),
            _ => Err(MedleyError::MissingParameter(self.placement_field.clone())),
        }
    }

    /// Rewarded placement that wants the init outcome and loads later
    pub fn init_rewarded_with_callback(
        &self,
        settings: &Value,
        listener: Arc<dyn RewardedListener>,
    ) -> Result<()> {
        let placement = match self.placement_key(settings) {
            Ok(placement) => placement,
            Err(e) => {
                error!("{}: {}", self.network, e);
                listener.on_init_failed(&e.to_string());
                return Err(e);
            }
        };
        self.apply_policy_settings(&placement, settings)?;
        self.rewarded.register(placement.as_str(), listener)
    }

    /// Rewarded placement that loads as soon as init allows
    pub fn init_and_load_rewarded(
        &self,
        settings: &Value,
        listener: Arc<dyn RewardedListener>,
    ) -> Result<()> {
        let placement = match self.placement_key(settings) {
            Ok(placement) => placement,
            Err(e) => {
                error!("{}: {}", self.network, e);
                listener.on_availability_changed(false);
                return Err(e);
            }
        };
        self.apply_policy_settings(&placement, settings)?;
        self.rewarded.load(placement.as_str(), listener, false)
    }

    pub fn load_rewarded(&self, settings: &Value, listener: Arc<dyn RewardedListener>) -> Result<()> {
        let placement = self.placement_key(settings)?;
        self.rewarded.load(placement.as_str(), listener, false)
    }

    pub fn load_rewarded_for_bidding(
        &self,
        settings: &Value,
        listener: Arc<dyn RewardedListener>,
        server_data: &str,
    ) -> Result<()> {
        let placement = self.placement_key(settings)?;
        self.rewarded
            .load_for_bidding(placement.as_str(), listener, server_data)
    }

    pub fn show_rewarded(&self, settings: &Value) -> Result<()> {
        let placement = self.placement_key(settings)?;
        self.rewarded.show(placement.as_str())
    }

    pub fn is_rewarded_available(&self, settings: &Value) -> bool {
        self.placement_key(settings)
            .map(|placement| self.rewarded.is_available(placement.as_str()))
            .unwrap_or(false)
    }

    pub fn init_interstitial(
        &self,
        settings: &Value,
        listener: Arc<dyn InterstitialListener>,
    ) -> Result<()> {
        let placement = match self.placement_key(settings) {
            Ok(placement) => placement,
            Err(e) => {
                error!("{}: {}", self.network, e);
                listener.on_init_failed(&e.to_string());
                return Err(e);
            }
        };
        self.interstitial.register(placement.as_str(), listener)
    }

    pub fn load_interstitial(
        &self,
        settings: &Value,
        listener: Arc<dyn InterstitialListener>,
    ) -> Result<()> {
        let placement = match self.placement_key(settings) {
            Ok(placement) => placement,
            Err(e) => {
                listener.on_ad_load_failed(&LoadError::Network(e.to_string()));
                return Err(e);
            }
        };
        self.interstitial.load(placement.as_str(), listener, false)
    }

    pub fn show_interstitial(&self, settings: &Value) -> Result<()> {
        let placement = self.placement_key(settings)?;
        self.interstitial.show(placement.as_str())
    }

    pub fn is_interstitial_ready(&self, settings: &Value) -> bool {
        self.placement_key(settings)
            .map(|placement| self.interstitial.is_available(placement.as_str()))
            .unwrap_or(false)
    }

    pub fn init_banners(&self, settings: &Value, listener: Arc<dyn BannerListener>) -> Result<()> {
        let placement = match self.placement_key(settings) {
            Ok(placement) => placement,
            Err(e) => {
                error!("{}: {}", self.network, e);
                listener.on_init_failed(&e.to_string());
                return Err(e);
            }
        };
        self.banner.register(placement.as_str(), listener)
    }

    pub fn load_banner(&self, settings: &Value, listener: Arc<dyn BannerListener>) -> Result<()> {
        let placement = self.placement_key(settings)?;
        self.banner.load(placement.as_str(), listener, false)
    }

    pub fn destroy_banner(&self, settings: &Value) -> Result<bool> {
        let placement = self.placement_key(settings)?;
        Ok(self.banner.destroy(placement.as_str()))
    }

    /// Load-while-show policy the settings ask for, falling back to the rewarded default
    pub fn load_while_show_policy(&self, settings: &Value) -> LoadWhileShowPolicy {
        LoadWhileShowPolicy::from_settings(settings, self.rewarded.settings().load_while_show)
    }

    fn apply_policy_settings(&self, placement: &PlacementKey, settings: &Value) -> Result<()> {
        let policy = self.load_while_show_policy(settings);
        if policy != self.rewarded.settings().load_while_show {
            self.rewarded
                .set_placement_policy(placement.as_str(), policy)?;
        }
        Ok(())
    }

    /// GDPR style consent
    pub fn set_consent(&self, consent: bool) -> ConsentDisposition {
        self.coordinator
            .set_consent(ConsentFlag::BehavioralConsent, consent)
    }

    /// Free-form metadata from the host; only privacy keys are understood
    pub fn set_metadata(&self, key: &str, values: &[String]) -> Option<ConsentDisposition> {
        let Some(raw) = values.first() else {
            debug!("{}: metadata {} without values", self.network, key);
            return None;
        };

        let key = key.trim().to_ascii_lowercase();
        let coppa_key = format!("{}_coppa", self.network.to_ascii_lowercase());
        let flag = if key == "do_not_sell" {
            ConsentFlag::RegionalOptOut
        } else if key == "is_child_directed" || key == coppa_key {
            ConsentFlag::Minor
        } else {
            debug!("{}: ignoring metadata {}", self.network, key);
            return None;
        };

        let Some(value) = parse_consent_value(raw) else {
            debug!("{}: metadata {}={} is not a boolean", self.network, key, raw);
            return None;
        };

        info!("{}: metadata {} -> {}={}", self.network, key, flag, value);
        Some(self.coordinator.set_consent(flag, value))
    }

    /// Token and SDK version for server-side bidding, unless init failed
    pub fn bidding_data(&self) -> Option<BiddingData> {
        if let InitState::Failed(reason) = self.coordinator.state() {
            error!("{}: no bidding data, init failed: {}", self.network, reason);
            return None;
        }

        Some(BiddingData {
            token: self.sdk.bidding_token().unwrap_or_default(),
            sdk_version: self.sdk.sdk_version(),
        })
    }

    /// Drop every ad object of one ad unit type
    pub fn release_memory(&self, kind: AdUnitKind) -> usize {
        match kind {
            AdUnitKind::RewardedVideo => self.rewarded.release_memory(),
            AdUnitKind::Interstitial => self.interstitial.release_memory(),
            AdUnitKind::Banner => self.banner.release_memory(),
        }
    }
}

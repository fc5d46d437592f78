#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use medley::config::{AdUnitSettings, AppConfig};
use medley::coordination::{ConsentFlag, InitCompletion, InitCoordinator};
use medley::domain::{AdObjectId, AdRequest, Credentials};
use medley::error::{LoadError, Result, ShowError};
use medley::network::{NetworkAdapter, NetworkSdk};
use medley::registry::{
    AdCallbacks, AdUnitRegistry, Banner, BannerListener, Interstitial, InterstitialListener,
    Rewarded, RewardedListener,
};

/// SDK double that parks every handle so tests decide when and how callbacks fire
#[derive(Default)]
pub struct ScriptedSdk {
    init_calls: AtomicUsize,
    completion: Mutex<Option<InitCompletion>>,
    auto_init: Mutex<Option<std::result::Result<(), String>>>,
    loads: Mutex<Vec<(AdRequest, AdCallbacks)>>,
    shows: Mutex<Vec<(AdRequest, AdCallbacks)>>,
    destroyed: Mutex<Vec<AdObjectId>>,
    consent: Mutex<Vec<(ConsentFlag, bool)>>,
    not_ready: AtomicBool,
    token: Mutex<Option<String>>,
}

impl ScriptedSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// SDK whose init call resolves synchronously with `result`
    pub fn completing(result: std::result::Result<(), String>) -> Arc<Self> {
        let sdk = Self::default();
        *sdk.auto_init.lock().unwrap() = Some(result);
        Arc::new(sdk)
    }

    pub fn as_sdk(self: &Arc<Self>) -> Arc<dyn NetworkSdk> {
        self.clone()
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Fire the parked init completion
    pub fn complete_init(&self, result: std::result::Result<(), String>) {
        let completion = self
            .completion
            .lock()
            .unwrap()
            .take()
            .expect("SDK init was never called");
        completion.finish(result);
    }

    pub fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    pub fn loads_for(&self, placement: &str) -> Vec<(AdRequest, AdCallbacks)> {
        self.loads
            .lock()
            .unwrap()
            .iter()
            .filter(|(request, _)| request.placement.as_str() == placement)
            .cloned()
            .collect()
    }

    pub fn last_load(&self, placement: &str) -> (AdRequest, AdCallbacks) {
        self.loads_for(placement)
            .pop()
            .unwrap_or_else(|| panic!("no load issued for {}", placement))
    }

    pub fn show_count(&self) -> usize {
        self.shows.lock().unwrap().len()
    }

    pub fn last_show(&self) -> (AdRequest, AdCallbacks) {
        self.shows
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no show issued")
    }

    pub fn destroyed(&self) -> Vec<AdObjectId> {
        self.destroyed.lock().unwrap().clone()
    }

    pub fn applied_consent(&self) -> Vec<(ConsentFlag, bool)> {
        self.consent.lock().unwrap().clone()
    }

    pub fn set_ready(&self, ready: bool) {
        self.not_ready.store(!ready, Ordering::SeqCst);
    }

    pub fn set_token(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
    }
}

impl NetworkSdk for ScriptedSdk {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn sdk_version(&self) -> String {
        "9.9.9".to_string()
    }

    fn initialize(&self, _credentials: &Credentials, completion: InitCompletion) {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let auto = self.auto_init.lock().unwrap().clone();
        match auto {
            Some(result) => completion.finish(result),
            None => *self.completion.lock().unwrap() = Some(completion),
        }
    }

    fn apply_consent(&self, flag: ConsentFlag, value: bool) -> Result<()> {
        self.consent.lock().unwrap().push((flag, value));
        Ok(())
    }

    fn load_ad(&self, request: &AdRequest, callbacks: AdCallbacks) {
        self.loads.lock().unwrap().push((request.clone(), callbacks));
    }

    fn show_ad(&self, request: &AdRequest, callbacks: AdCallbacks) {
        self.shows.lock().unwrap().push((request.clone(), callbacks));
    }

    fn destroy_ad(&self, request: &AdRequest) {
        self.destroyed.lock().unwrap().push(request.ad);
    }

    fn is_ad_ready(&self, _request: &AdRequest) -> bool {
        !self.not_ready.load(Ordering::SeqCst)
    }

    fn bidding_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

/// Listener that records every callback by name
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl RewardedListener for Recorder {
    fn on_init_success(&self) {
        self.push("init_success");
    }
    fn on_init_failed(&self, reason: &str) {
        self.push(format!("init_failed:{}", reason));
    }
    fn on_availability_changed(&self, available: bool) {
        self.push(format!("available:{}", available));
    }
    fn on_load_failed(&self, error: &LoadError) {
        self.push(format!("load_failed:{}", error));
    }
    fn on_ad_opened(&self) {
        self.push("opened");
    }
    fn on_ad_show_failed(&self, error: &ShowError) {
        self.push(format!("show_failed:{}", error));
    }
    fn on_ad_started(&self) {
        self.push("started");
    }
    fn on_ad_clicked(&self) {
        self.push("clicked");
    }
    fn on_ad_rewarded(&self) {
        self.push("rewarded");
    }
    fn on_ad_closed(&self) {
        self.push("closed");
    }
}

impl InterstitialListener for Recorder {
    fn on_init_success(&self) {
        self.push("init_success");
    }
    fn on_init_failed(&self, reason: &str) {
        self.push(format!("init_failed:{}", reason));
    }
    fn on_ad_ready(&self) {
        self.push("ready");
    }
    fn on_ad_load_failed(&self, error: &LoadError) {
        self.push(format!("load_failed:{}", error));
    }
    fn on_ad_opened(&self) {
        self.push("opened");
    }
    fn on_ad_show_succeeded(&self) {
        self.push("show_succeeded");
    }
    fn on_ad_show_failed(&self, error: &ShowError) {
        self.push(format!("show_failed:{}", error));
    }
    fn on_ad_clicked(&self) {
        self.push("clicked");
    }
    fn on_ad_closed(&self) {
        self.push("closed");
    }
}

impl BannerListener for Recorder {
    fn on_init_success(&self) {
        self.push("init_success");
    }
    fn on_init_failed(&self, reason: &str) {
        self.push(format!("init_failed:{}", reason));
    }
    fn on_ad_loaded(&self) {
        self.push("loaded");
    }
    fn on_ad_load_failed(&self, error: &LoadError) {
        self.push(format!("load_failed:{}", error));
    }
    fn on_ad_shown(&self) {
        self.push("shown");
    }
    fn on_ad_clicked(&self) {
        self.push("clicked");
    }
    fn on_ad_left_application(&self) {
        self.push("left_application");
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("app-test")
}

/// The three registries of one network, sharing a coordinator
pub struct Network {
    pub sdk: Arc<ScriptedSdk>,
    pub coordinator: Arc<InitCoordinator>,
    pub rewarded: Arc<AdUnitRegistry<Rewarded>>,
    pub interstitial: Arc<AdUnitRegistry<Interstitial>>,
    pub banner: Arc<AdUnitRegistry<Banner>>,
}

impl Network {
    pub fn new(sdk: Arc<ScriptedSdk>) -> Self {
        Self::with_settings(sdk, AdUnitSettings::rewarded())
    }

    pub fn with_settings(sdk: Arc<ScriptedSdk>, rewarded: AdUnitSettings) -> Self {
        let coordinator = InitCoordinator::new(sdk.as_sdk());
        Self {
            rewarded: AdUnitRegistry::new(
                coordinator.clone(),
                sdk.as_sdk(),
                credentials(),
                rewarded,
            ),
            interstitial: AdUnitRegistry::new(
                coordinator.clone(),
                sdk.as_sdk(),
                credentials(),
                AdUnitSettings::default(),
            ),
            banner: AdUnitRegistry::new(
                coordinator.clone(),
                sdk.as_sdk(),
                credentials(),
                AdUnitSettings::default(),
            ),
            coordinator,
            sdk,
        }
    }

    /// Network whose init has already succeeded
    pub fn initialized() -> Self {
        let network = Self::new(ScriptedSdk::completing(Ok(())));
        network
            .coordinator
            .ensure_initialized(&credentials())
            .unwrap();
        network
    }
}

pub fn adapter(sdk: Arc<ScriptedSdk>) -> NetworkAdapter {
    let mut config = AppConfig::default_config("app-test");
    config.network.name = "scripted".to_string();
    NetworkAdapter::new(&config, sdk.as_sdk())
}

use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{AdUnitKind, InitOutcome};
use crate::error::{LoadError, MedleyError, Result, ShowError};
use crate::network::{build_adapter, NetworkAdapter};
use crate::registry::{InterstitialListener, RewardedListener};

#[derive(Parser)]
#[command(name = "medley")]
#[command(version)]
#[command(about = "Ad network mediation core demo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory
    #[arg(short, long, default_value = "config", env = "MEDLEY_CONFIG_DIR")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive the simulated network through init, load and show
    Demo {
        /// Rewarded placements to register before init
        #[arg(short, long, default_value = "3")]
        placements: usize,
        /// Make SDK init fail
        #[arg(long)]
        fail_init: bool,
        /// Override the simulated fill rate (0..=1)
        #[arg(long)]
        fill_rate: Option<f64>,
        /// Seconds to wait for an ad before giving up
        #[arg(long, default_value = "5")]
        timeout: u64,
    },
    /// Print the effective configuration
    Config,
}

/// Config from disk, or the built-in demo config when none is usable
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// Why the config on disk was not used
    pub fallback_reason: Option<String>,
}

impl LoadedConfig {
    /// Log the fallback. Call once the subscriber is installed.
    pub fn report_fallback(&self, config_dir: &str) {
        if let Some(reason) = &self.fallback_reason {
            warn!("no usable config in {} ({}), using defaults", config_dir, reason);
        }
    }
}

/// Load config from disk, falling back to the built-in demo config
pub fn load_config(config_dir: &str) -> LoadedConfig {
    match AppConfig::load_from(config_dir) {
        Ok(config) => LoadedConfig {
            config,
            fallback_reason: None,
        },
        Err(e) => LoadedConfig {
            config: AppConfig::default_config("medley-demo"),
            fallback_reason: Some(e.to_string()),
        },
    }
}

pub fn print_config(config: &AppConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    match config.validate() {
        Ok(()) => println!("\nconfig OK"),
        Err(errors) => {
            println!("\nconfig problems:");
            for error in errors {
                println!("  - {}", error);
            }
        }
    }
    Ok(())
}

/// Listener that records what a placement heard
pub struct EventLog {
    placement: String,
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn new(placement: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            placement: placement.into(),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn saw(&self, event: &str) -> bool {
        self.events().iter().any(|e| e == event)
    }

    fn record(&self, event: impl Into<String>) {
        let event = event.into();
        info!("[{}] {}", self.placement, event);
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl RewardedListener for EventLog {
    fn on_init_success(&self) {
        self.record("init_success");
    }

    fn on_init_failed(&self, reason: &str) {
        self.record(format!("init_failed: {}", reason));
    }

    fn on_availability_changed(&self, available: bool) {
        self.record(format!("availability: {}", available));
    }

    fn on_load_failed(&self, error: &LoadError) {
        self.record(format!("load_failed: {}", error));
    }

    fn on_ad_opened(&self) {
        self.record("opened");
    }

    fn on_ad_show_failed(&self, error: &ShowError) {
        self.record(format!("show_failed: {}", error));
    }

    fn on_ad_started(&self) {
        self.record("started");
    }

    fn on_ad_clicked(&self) {
        self.record("clicked");
    }

    fn on_ad_rewarded(&self) {
        self.record("rewarded");
    }

    fn on_ad_closed(&self) {
        self.record("closed");
    }
}

impl InterstitialListener for EventLog {
    fn on_init_success(&self) {
        self.record("init_success");
    }

    fn on_init_failed(&self, reason: &str) {
        self.record(format!("init_failed: {}", reason));
    }

    fn on_ad_ready(&self) {
        self.record("ready");
    }

    fn on_ad_load_failed(&self, error: &LoadError) {
        self.record(format!("load_failed: {}", error));
    }

    fn on_ad_opened(&self) {
        self.record("opened");
    }

    fn on_ad_show_succeeded(&self) {
        self.record("show_succeeded");
    }

    fn on_ad_show_failed(&self, error: &ShowError) {
        self.record(format!("show_failed: {}", error));
    }

    fn on_ad_clicked(&self) {
        self.record("clicked");
    }

    fn on_ad_closed(&self) {
        self.record("closed");
    }
}

/// Register placements before init, wait for the outcome, show one rewarded ad
pub async fn run_demo(config: &AppConfig, placements: usize, timeout: Duration) -> Result<()> {
    let adapter = build_adapter(config)?;
    let field = config.network.placement_field.clone();

    // Consent before init is staged and replayed right before the SDK init call
    adapter.set_consent(true);
    adapter.set_metadata("do_not_sell", &["false".to_string()]);

    let mut rewarded = Vec::new();
    for i in 0..placements.max(1) {
        let placement = format!("rv-{}", i);
        let log = EventLog::new(placement.clone());
        adapter.init_and_load_rewarded(&json!({ field.as_str(): placement }), log.clone())?;
        rewarded.push((placement, log));
    }

    let interstitial = EventLog::new("is-0");
    adapter.init_interstitial(&json!({ field.as_str(): "is-0" }), interstitial.clone())?;

    let outcome = tokio::time::timeout(timeout, adapter.coordinator().wait_for_outcome())
        .await
        .map_err(|_| MedleyError::InitFailed("timed out waiting for init".to_string()))?;
    println!("init outcome: {:?}", outcome);
    if let InitOutcome::Failed(reason) = outcome {
        print_summary(&adapter, &rewarded);
        return Err(MedleyError::InitFailed(reason));
    }

    if let Some(data) = adapter.bidding_data() {
        println!("bidding data: {}", serde_json::to_string(&data)?);
    }

    let shown = show_first_available(&adapter, &field, &rewarded, timeout).await?;
    if let Some((placement, log)) = shown {
        let deadline = tokio::time::Instant::now() + timeout;
        while !log.saw("closed") && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        println!("shown placement {}", placement);
    } else {
        println!("no rewarded placement filled within {:?}", timeout);
    }

    print_summary(&adapter, &rewarded);
    adapter.release_memory(AdUnitKind::RewardedVideo);
    Ok(())
}

async fn show_first_available<'a>(
    adapter: &NetworkAdapter,
    field: &str,
    rewarded: &'a [(String, Arc<EventLog>)],
    timeout: Duration,
) -> Result<Option<&'a (String, Arc<EventLog>)>> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut ticker = tokio::time::interval(Duration::from_millis(50));

    while tokio::time::Instant::now() < deadline {
        ticker.tick().await;
        let ready = rewarded.iter().find(|(placement, _)| {
            adapter.is_rewarded_available(&json!({ field: placement }))
        });
        if let Some(entry) = ready {
            adapter.show_rewarded(&json!({ field: entry.0 }))?;
            return Ok(Some(entry));
        }
        // Every placement settled without a fill
        if rewarded.iter().all(|(placement, _)| {
            adapter
                .rewarded()
                .state(placement)
                .is_some_and(|state| state.is_terminal())
        }) {
            break;
        }
    }
    Ok(None)
}

fn print_summary(adapter: &NetworkAdapter, rewarded: &[(String, Arc<EventLog>)]) {
    println!("\n=== Event log ===");
    for (placement, log) in rewarded {
        println!("{}: {}", placement, log.events().join(", "));
    }
    println!("\n=== Rewarded registry ===");
    match serde_json::to_string_pretty(&adapter.rewarded().stats()) {
        Ok(stats) => println!("{}", stats),
        Err(e) => warn!("could not render stats: {}", e),
    }
}

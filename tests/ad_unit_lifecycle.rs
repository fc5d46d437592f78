mod common;

use std::sync::{Arc, Weak};

use common::{Network, Recorder, ScriptedSdk};
use medley::config::AdUnitSettings;
use medley::domain::{AdUnitState, TerminalReason};
use medley::error::{MedleyError, ShowError};
use medley::registry::{AdUnitRegistry, LoadWhileShowPolicy, Rewarded, RewardedListener};
use medley::LoadError;

/// Load a rewarded placement on an initialized network and mark it loaded
fn ready(network: &Network, placement: &str, listener: &Arc<Recorder>) {
    network
        .rewarded
        .load(placement, listener.clone(), false)
        .unwrap();
    network.sdk.last_load(placement).1.loaded();
    assert_eq!(network.rewarded.state(placement), Some(AdUnitState::Ready));
}

/// Load, destroy, then a late load success for the destroyed object
#[test]
fn late_callback_after_destroy_is_discarded() {
    let network = Network::initialized();
    let listener = Recorder::new();

    network.rewarded.load("rv", listener.clone(), false).unwrap();
    let (request, callbacks) = network.sdk.last_load("rv");
    assert!(network.rewarded.destroy("rv"));
    assert_eq!(network.sdk.destroyed(), vec![request.ad]);

    callbacks.loaded();
    callbacks.closed();

    assert!(listener.events().is_empty(), "destroyed placement must stay silent");
    assert_eq!(network.rewarded.state("rv"), None);
    assert_eq!(network.rewarded.stats().stale_callbacks_discarded, 2);
}

/// A second load supersedes the pending ad object
#[test]
fn second_load_supersedes_pending_object() {
    let network = Network::initialized();
    let listener = Recorder::new();

    network.rewarded.load("rv", listener.clone(), false).unwrap();
    network
        .rewarded
        .load_for_bidding("rv", listener.clone(), "bid-payload")
        .unwrap();

    let loads = network.sdk.loads_for("rv");
    assert_eq!(loads.len(), 2);
    let (first, first_callbacks) = loads[0].clone();
    let (second, second_callbacks) = loads[1].clone();
    assert_eq!(second.server_data.as_deref(), Some("bid-payload"));
    assert_eq!(network.sdk.destroyed(), vec![first.ad]);

    // The superseded object's outcome changes nothing
    first_callbacks.load_failed(LoadError::Network("timeout".into()));
    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Loading));
    assert!(listener.events().is_empty());

    second_callbacks.loaded();
    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Ready));
    assert_eq!(
        network.rewarded.snapshot("rv").unwrap().ad,
        Some(second.ad)
    );
    assert_eq!(listener.events(), vec!["available:true"]);
}

/// Show is only accepted from Ready; anything else fails without reaching the SDK
#[test]
fn show_rejected_outside_ready() {
    let network = Network::new(ScriptedSdk::new());
    let listener = Recorder::new();

    // Unknown placement
    assert!(matches!(
        network.rewarded.show("nobody"),
        Err(MedleyError::Show(ShowError::NotAvailable))
    ));

    // AwaitingInit
    network.rewarded.load("rv", listener.clone(), false).unwrap();
    assert!(network.rewarded.show("rv").is_err());

    // Loading
    network.sdk.complete_init(Ok(()));
    assert!(network.rewarded.show("rv").is_err());

    // Terminal
    network
        .sdk
        .last_load("rv")
        .1
        .load_failed(LoadError::NoFill("none".into()));
    assert!(network.rewarded.show("rv").is_err());

    // Showing
    ready(&network, "rv", &listener);
    network.rewarded.show("rv").unwrap();
    assert!(network.rewarded.show("rv").is_err());

    assert_eq!(network.sdk.show_count(), 1);
    assert_eq!(listener.count("show_failed:no ads to show"), 4);
}

/// Full cycle: ready, show, reward, close, back to Idle
#[test]
fn show_cycle_rearms_reusable_placement() {
    let network = Network::initialized();
    let listener = Recorder::new();
    ready(&network, "rv", &listener);
    assert!(network.rewarded.is_available("rv"));

    network.rewarded.show("rv").unwrap();
    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Showing));
    assert!(!network.rewarded.is_available("rv"));

    let (_, callbacks) = network.sdk.last_show();
    callbacks.show_succeeded();
    callbacks.impression();
    callbacks.clicked();
    callbacks.rewarded();
    callbacks.closed();
    callbacks.closed();

    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Idle));
    assert_eq!(
        listener.events(),
        vec![
            "available:true",
            "available:false",
            "started",
            "opened",
            "clicked",
            "rewarded",
            "closed",
        ]
    );
    assert_eq!(network.rewarded.stats().stale_callbacks_discarded, 1);

    let last = network.rewarded.snapshot("rv").unwrap().last_transition.unwrap();
    assert_eq!(last.to, AdUnitState::Idle);
}

#[test]
fn auto_reload_after_close() {
    let settings = AdUnitSettings {
        auto_reload_on_close: true,
        ..AdUnitSettings::rewarded()
    };
    let network = Network::with_settings(ScriptedSdk::completing(Ok(())), settings);
    network
        .coordinator
        .ensure_initialized(&common::credentials())
        .unwrap();
    let listener = Recorder::new();
    ready(&network, "rv", &listener);

    network.rewarded.show("rv").unwrap();
    network.sdk.last_show().1.closed();

    assert_eq!(network.sdk.loads_for("rv").len(), 2);
    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Loading));
}

#[test]
fn show_failure_from_sdk() {
    let network = Network::initialized();
    let listener = Recorder::new();
    ready(&network, "rv", &listener);

    network.rewarded.show("rv").unwrap();
    network.sdk.last_show().1.show_failed("renderer crashed");

    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Idle));
    assert_eq!(
        listener.events().last().map(String::as_str),
        Some("show_failed:network error: renderer crashed")
    );
    assert_eq!(
        network.rewarded.snapshot("rv").unwrap().last_transition.unwrap().from,
        AdUnitState::Terminal(TerminalReason::ShowFailed)
    );
}

/// The SDK no longer holding the ad makes show fail and drops the object
#[test]
fn expired_ad_is_not_shown() {
    let network = Network::initialized();
    let listener = Recorder::new();
    ready(&network, "rv", &listener);
    let ad = network.rewarded.snapshot("rv").unwrap().ad.unwrap();

    network.sdk.set_ready(false);
    assert!(!network.rewarded.is_available("rv"));
    assert!(network.rewarded.show("rv").is_err());

    assert_eq!(network.sdk.show_count(), 0);
    assert_eq!(network.sdk.destroyed(), vec![ad]);
    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Idle));
    assert_eq!(
        listener.events(),
        vec!["available:true", "available:false", "show_failed:no ads to show"]
    );
}

/// Loading an already-ready placement re-reports it instead of reloading
#[test]
fn load_on_ready_placement_reports_availability() {
    let network = Network::initialized();
    let listener = Recorder::new();
    ready(&network, "rv", &listener);

    network.rewarded.load("rv", listener.clone(), false).unwrap();

    assert_eq!(network.sdk.load_count(), 1);
    assert_eq!(listener.count("available:true"), 2);
}

#[test]
fn load_while_show_none_blocks_everything() {
    let settings = AdUnitSettings {
        load_while_show: LoadWhileShowPolicy::None,
        ..AdUnitSettings::default()
    };
    let network = Network::with_settings(ScriptedSdk::completing(Ok(())), settings);
    network
        .coordinator
        .ensure_initialized(&common::credentials())
        .unwrap();
    let listener = Recorder::new();
    ready(&network, "a", &listener);
    network.rewarded.show("a").unwrap();

    let other = Recorder::new();
    network.rewarded.load("b", other.clone(), false).unwrap();

    assert_eq!(network.sdk.loads_for("b").len(), 0);
    assert_eq!(
        other.events(),
        vec![
            "available:false",
            "load_failed:load blocked while placement a is showing"
        ]
    );
}

#[test]
fn load_while_show_by_network_blocks_only_the_showing_placement() {
    let network = Network::initialized();
    let listener = Recorder::new();
    ready(&network, "a", &listener);
    network.rewarded.show("a").unwrap();

    network.rewarded.load("b", listener.clone(), false).unwrap();
    assert_eq!(network.sdk.loads_for("b").len(), 1);

    network.rewarded.load("a", listener.clone(), false).unwrap();
    assert_eq!(network.sdk.loads_for("a").len(), 1);
    assert_eq!(network.rewarded.state("a"), Some(AdUnitState::Showing));
}

/// With per-instance loads the showing ad still reports its close
#[test]
fn load_while_show_by_instance_keeps_presenting_ad() {
    let network = Network::initialized();
    network
        .rewarded
        .set_placement_policy("a", LoadWhileShowPolicy::ByInstance)
        .unwrap();
    let listener = Recorder::new();
    ready(&network, "a", &listener);
    network.rewarded.show("a").unwrap();
    let (shown, show_callbacks) = network.sdk.last_show();

    network.rewarded.load("a", listener.clone(), false).unwrap();
    assert_eq!(network.rewarded.state("a"), Some(AdUnitState::Loading));
    assert!(
        !network.sdk.destroyed().contains(&shown.ad),
        "showing ad must not be destroyed"
    );

    show_callbacks.rewarded();
    show_callbacks.closed();
    assert_eq!(listener.count("rewarded"), 1);
    assert_eq!(listener.count("closed"), 1);
    assert_eq!(network.rewarded.state("a"), Some(AdUnitState::Loading));

    network.sdk.last_load("a").1.loaded();
    assert_eq!(network.rewarded.state("a"), Some(AdUnitState::Ready));
}

/// The next ad waits until the one on screen closes
#[test]
fn show_waits_for_presenting_ad_to_close() {
    let network = Network::initialized();
    network
        .rewarded
        .set_placement_policy("a", LoadWhileShowPolicy::ByInstance)
        .unwrap();
    let listener = Recorder::new();
    ready(&network, "a", &listener);
    network.rewarded.show("a").unwrap();
    let (first, first_callbacks) = network.sdk.last_show();

    network.rewarded.load("a", listener.clone(), false).unwrap();
    network.sdk.last_load("a").1.loaded();
    assert_eq!(network.rewarded.state("a"), Some(AdUnitState::Ready));
    assert!(!network.rewarded.is_available("a"));

    let err = network.rewarded.show("a").unwrap_err();
    assert!(matches!(err, MedleyError::Show(ShowError::NotAvailable)));
    assert_eq!(network.sdk.show_count(), 1);
    assert_eq!(network.rewarded.state("a"), Some(AdUnitState::Ready));
    assert!(listener.events().last().unwrap().starts_with("show_failed"));
    assert!(network.sdk.destroyed().is_empty());

    first_callbacks.closed();
    assert_eq!(listener.count("closed"), 1);
    assert!(network.rewarded.is_available("a"));

    network.rewarded.show("a").unwrap();
    let (second, second_callbacks) = network.sdk.last_show();
    assert_ne!(second.ad, first.ad);
    second_callbacks.closed();
    assert_eq!(listener.count("closed"), 2);
    assert_eq!(network.rewarded.state("a"), Some(AdUnitState::Idle));
}

/// Banners are single use: closing one forgets the placement
#[test]
fn closed_banner_is_removed() {
    let network = Network::initialized();
    let listener = Recorder::new();

    network.banner.load("bn", listener.clone(), false).unwrap();
    network.sdk.last_load("bn").1.loaded();
    network.banner.show("bn").unwrap();
    let (_, callbacks) = network.sdk.last_show();
    callbacks.impression();
    callbacks.left_application();
    callbacks.closed();

    assert_eq!(network.banner.state("bn"), None);
    assert_eq!(listener.events(), vec!["loaded", "shown", "left_application"]);
}

#[test]
fn blank_placement_is_rejected() {
    let network = Network::initialized();
    let listener = Recorder::new();

    let err = network.rewarded.load("  ", listener.clone(), false).unwrap_err();
    assert!(matches!(err, MedleyError::MissingParameter(_)));
    let err = network
        .rewarded
        .load_for_bidding("rv", listener.clone(), "")
        .unwrap_err();
    assert!(matches!(err, MedleyError::MissingParameter(_)));

    assert!(network.rewarded.is_empty());
    assert_eq!(network.sdk.load_count(), 0);
}

#[test]
fn release_memory_destroys_every_ad() {
    let network = Network::initialized();
    let listener = Recorder::new();
    ready(&network, "a", &listener);
    network.rewarded.load("b", listener.clone(), false).unwrap();

    assert_eq!(network.rewarded.release_memory(), 2);
    assert_eq!(network.sdk.destroyed().len(), 2);
    assert!(network.rewarded.is_empty());
}

/// Listener that shows its placement from inside the availability callback
struct ShowOnReady {
    registry: Weak<AdUnitRegistry<Rewarded>>,
    recorder: Arc<Recorder>,
}

impl RewardedListener for ShowOnReady {
    fn on_init_success(&self) {}
    fn on_init_failed(&self, _reason: &str) {}
    fn on_availability_changed(&self, available: bool) {
        RewardedListener::on_availability_changed(self.recorder.as_ref(), available);
        if available {
            if let Some(registry) = self.registry.upgrade() {
                assert!(registry.is_available("rv"));
                registry.show("rv").unwrap();
            }
        }
    }
    fn on_ad_opened(&self) {}
    fn on_ad_show_failed(&self, error: &ShowError) {
        RewardedListener::on_ad_show_failed(self.recorder.as_ref(), error);
    }
    fn on_ad_clicked(&self) {}
    fn on_ad_rewarded(&self) {}
    fn on_ad_closed(&self) {
        RewardedListener::on_ad_closed(self.recorder.as_ref());
    }
}

/// Listeners may call back into the registry without deadlocking
#[test]
fn listener_can_reenter_registry() {
    let network = Network::initialized();
    let recorder = Recorder::new();
    let listener = Arc::new(ShowOnReady {
        registry: Arc::downgrade(&network.rewarded),
        recorder: recorder.clone(),
    });

    network.rewarded.load("rv", listener, false).unwrap();
    network.sdk.last_load("rv").1.loaded();

    assert_eq!(network.rewarded.state("rv"), Some(AdUnitState::Showing));
    assert_eq!(network.sdk.show_count(), 1);
    network.sdk.last_show().1.closed();
    assert_eq!(
        recorder.events(),
        vec!["available:true", "available:false", "closed"]
    );
}

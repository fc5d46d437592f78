//! Per-placement ad lifecycle, generic over the ad unit format
//!
//! Each placement moves through `Idle -> (AwaitingInit) -> Loading -> Ready ->
//! Showing -> Terminal`. Decisions are taken under the placement's map shard;
//! SDK calls, init subscriptions and listener callbacks run after the shard
//! guard is released, so any of them may call back into the registry.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

use crate::config::AdUnitSettings;
use crate::coordination::{InitCoordinator, InitWaiter};
use crate::domain::{
    AdObjectId, AdRequest, AdUnitKind, AdUnitState, Credentials, InitOutcome, InitState,
    PlacementKey, StateTransition, TerminalReason,
};
use crate::error::{LoadError, MedleyError, Result, ShowError};
use crate::network::NetworkSdk;
use crate::registry::callbacks::{AdCallbacks, AdEventSink, SdkEvent};
use crate::registry::format::{AdFormat, AdUnitEvent};
use crate::registry::record::{AdUnitRecord, LiveAd, PlacementSnapshot, RegistryStats};
use crate::registry::LoadWhileShowPolicy;

/// Work decided under a shard guard, carried out after it is dropped
enum Effect<L: ?Sized> {
    Notify(Arc<L>, AdUnitEvent),
    Load(AdRequest),
    Show(AdRequest),
    Destroy(AdRequest),
    Subscribe(u64),
    EnsureInit,
    Reload,
}

pub struct AdUnitRegistry<F: AdFormat> {
    coordinator: Arc<InitCoordinator>,
    sdk: Arc<dyn NetworkSdk>,
    credentials: Credentials,
    settings: AdUnitSettings,
    records: DashMap<PlacementKey, AdUnitRecord<F::Listener>>,
    policies: DashMap<PlacementKey, LoadWhileShowPolicy>,
    next_ticket: AtomicU64,
    stale_callbacks: AtomicU64,
    weak_self: Weak<AdUnitRegistry<F>>,
}

impl<F: AdFormat> AdUnitRegistry<F> {
    pub fn new(
        coordinator: Arc<InitCoordinator>,
        sdk: Arc<dyn NetworkSdk>,
        credentials: Credentials,
        settings: AdUnitSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            coordinator,
            sdk,
            credentials,
            settings,
            records: DashMap::new(),
            policies: DashMap::new(),
            next_ticket: AtomicU64::new(1),
            stale_callbacks: AtomicU64::new(0),
            weak_self: weak_self.clone(),
        })
    }

    pub fn kind(&self) -> AdUnitKind {
        F::KIND
    }

    pub fn network(&self) -> &'static str {
        self.sdk.name()
    }

    pub fn coordinator(&self) -> &Arc<InitCoordinator> {
        &self.coordinator
    }

    pub fn settings(&self) -> &AdUnitSettings {
        &self.settings
    }

    /// Register a placement that only wants to hear the init outcome
    pub fn register(&self, placement: &str, listener: Arc<F::Listener>) -> Result<()> {
        let placement = PlacementKey::new(placement)?;
        self.credentials.validate()?;

        let mut effects = Vec::new();
        {
            let mut entry = self
                .records
                .entry(placement.clone())
                .or_insert_with(|| AdUnitRecord::new(listener.clone()));
            let record = entry.value_mut();
            record.listener = listener;
            record.requires_init_callback = true;

            // Read under the entry guard so a waiter can't move the record in between
            match self.coordinator.state() {
                InitState::Success if record.state == AdUnitState::AwaitingInit => {
                    self.finish_init_wait(&placement, record, &mut effects)
                }
                InitState::Success => effects.push(Effect::Notify(
                    record.listener.clone(),
                    AdUnitEvent::InitSucceeded,
                )),
                InitState::Failed(reason) => {
                    self.report_init_failure(&placement, record, &reason, &mut effects)
                }
                InitState::NotStarted | InitState::InProgress => {
                    self.await_init(&placement, record, &mut effects)
                }
            }
        }

        self.run(&placement, effects);
        Ok(())
    }

    /// Load an ad for a placement, deferring until init succeeds if needed.
    ///
    /// With `requires_init_callback` the listener also hears the init outcome;
    /// without it an init failure is reported as the placement being unavailable.
    pub fn load(
        &self,
        placement: &str,
        listener: Arc<F::Listener>,
        requires_init_callback: bool,
    ) -> Result<()> {
        self.request_load(placement, listener, Some(requires_init_callback), None)
    }

    /// Load an auction winner. Always creates a new ad object.
    pub fn load_for_bidding(
        &self,
        placement: &str,
        listener: Arc<F::Listener>,
        server_data: &str,
    ) -> Result<()> {
        if server_data.trim().is_empty() {
            return Err(MedleyError::MissingParameter("serverData".to_string()));
        }
        self.request_load(placement, listener, None, Some(server_data.to_string()))
    }

    /// Forward a show to the SDK. Only a fresh `Ready` ad can be shown.
    pub fn show(&self, placement: &str) -> Result<()> {
        let placement = PlacementKey::new(placement)?;

        let candidate = self.records.get(&placement).and_then(|record| {
            if record.state != AdUnitState::Ready {
                return None;
            }
            record.ad.as_ref().map(|ad| {
                let expired = self.is_expired(ad);
                (record.request(F::KIND, &placement, ad), expired)
            })
        });
        let fresh = match &candidate {
            Some((request, expired)) => {
                !expired && self.coordinator.is_initialized() && self.sdk.is_ad_ready(request)
            }
            None => false,
        };

        let mut effects = Vec::new();
        let accepted = {
            let Some(mut entry) = self.records.get_mut(&placement) else {
                debug!(
                    "{} {} {}: show for unknown placement",
                    self.network(),
                    F::KIND,
                    placement
                );
                return Err(ShowError::NotAvailable.into());
            };
            let record = entry.value_mut();
            let listener = record.listener.clone();

            // Still the candidate ad, and still Ready
            let unchanged = match &candidate {
                Some((request, _)) => {
                    record.state == AdUnitState::Ready && record.holds(request.ad)
                }
                None => false,
            };

            if unchanged && fresh && record.presenting.is_some() {
                // One presentation at a time; the ready ad stays loaded for later
                debug!(
                    "{} {} {}: earlier ad still on screen",
                    self.network(),
                    F::KIND,
                    placement
                );
                effects.push(Effect::Notify(
                    listener,
                    AdUnitEvent::ShowFailed(ShowError::NotAvailable),
                ));
                false
            } else if unchanged && fresh {
                self.transition(&placement, record, AdUnitState::Showing, "show requested");
                record.presenting = record.ad.clone();
                effects.push(Effect::Notify(listener, AdUnitEvent::AvailabilityLost));
                if let Some(request) = record.current_request(F::KIND, &placement) {
                    effects.push(Effect::Show(request));
                }
                true
            } else {
                if unchanged {
                    if let Some(stale) = record.ad.take() {
                        effects.push(Effect::Destroy(record.request(F::KIND, &placement, &stale)));
                    }
                    self.transition(&placement, record, AdUnitState::Idle, "ad expired");
                    effects.push(Effect::Notify(listener.clone(), AdUnitEvent::AvailabilityLost));
                }
                effects.push(Effect::Notify(
                    listener,
                    AdUnitEvent::ShowFailed(ShowError::NotAvailable),
                ));
                false
            }
        };

        self.run(&placement, effects);
        if accepted {
            Ok(())
        } else {
            info!(
                "{} {} {}: show rejected, no ad available",
                self.network(),
                F::KIND,
                placement
            );
            Err(ShowError::NotAvailable.into())
        }
    }

    /// Ready, init succeeded, young enough, nothing else on screen for this
    /// placement and the SDK still has it
    pub fn is_available(&self, placement: &str) -> bool {
        let Ok(placement) = PlacementKey::new(placement) else {
            return false;
        };
        if !self.coordinator.is_initialized() {
            return false;
        }

        let request = match self.records.get(&placement) {
            Some(record) if record.state == AdUnitState::Ready => record
                .ad
                .as_ref()
                .filter(|_| record.presenting.is_none())
                .filter(|ad| !self.is_expired(ad))
                .map(|ad| record.request(F::KIND, &placement, ad)),
            _ => None,
        };

        request.is_some_and(|request| self.sdk.is_ad_ready(&request))
    }

    /// Forget a placement and destroy its ad objects. Late callbacks become stale.
    pub fn destroy(&self, placement: &str) -> bool {
        let Ok(placement) = PlacementKey::new(placement) else {
            return false;
        };
        let Some((_, record)) = self.records.remove(&placement) else {
            return false;
        };

        let mut requests = Vec::new();
        if let Some(ad) = &record.ad {
            requests.push(record.request(F::KIND, &placement, ad));
        }
        if let Some(ad) = &record.presenting {
            if !record.holds(ad.id) {
                requests.push(record.request(F::KIND, &placement, ad));
            }
        }
        for request in &requests {
            self.sdk.destroy_ad(request);
        }

        info!(
            "{} {} {}: destroyed ({} ad objects released)",
            self.network(),
            F::KIND,
            placement,
            requests.len()
        );
        true
    }

    /// Destroy every placement of this type
    pub fn release_memory(&self) -> usize {
        let placements: Vec<PlacementKey> =
            self.records.iter().map(|entry| entry.key().clone()).collect();
        let released = placements
            .iter()
            .filter(|placement| self.destroy(placement.as_str()))
            .count();
        info!(
            "{} {}: released {} placements",
            self.network(),
            F::KIND,
            released
        );
        released
    }

    /// Override the load-while-show policy for one placement
    pub fn set_placement_policy(&self, placement: &str, policy: LoadWhileShowPolicy) -> Result<()> {
        let placement = PlacementKey::new(placement)?;
        debug!(
            "{} {} {}: load while show policy {}",
            self.network(),
            F::KIND,
            placement,
            policy
        );
        self.policies.insert(placement, policy);
        Ok(())
    }

    pub fn placement_policy(&self, placement: &PlacementKey) -> LoadWhileShowPolicy {
        self.policies
            .get(placement)
            .map(|policy| *policy)
            .unwrap_or(self.settings.load_while_show)
    }

    pub fn state(&self, placement: &str) -> Option<AdUnitState> {
        let placement = PlacementKey::new(placement).ok()?;
        self.records.get(&placement).map(|record| record.state)
    }

    pub fn snapshot(&self, placement: &str) -> Option<PlacementSnapshot> {
        let placement = PlacementKey::new(placement).ok()?;
        self.records
            .get(&placement)
            .map(|record| record.snapshot(&placement))
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for entry in self.records.iter() {
            stats.count(entry.state);
        }
        stats.stale_callbacks_discarded = self.stale_callbacks.load(Ordering::Relaxed);
        stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn request_load(
        &self,
        placement: &str,
        listener: Arc<F::Listener>,
        requires_init_callback: Option<bool>,
        server_data: Option<String>,
    ) -> Result<()> {
        let placement = PlacementKey::new(placement)?;
        self.credentials.validate()?;

        let policy = self.placement_policy(&placement);
        // Must run before the entry guard is taken
        let showing_elsewhere = self.showing_elsewhere(&placement);

        let mut effects = Vec::new();
        {
            let mut entry = self
                .records
                .entry(placement.clone())
                .or_insert_with(|| AdUnitRecord::new(listener.clone()));
            let record = entry.value_mut();
            record.listener = listener.clone();
            // Sticky: a load can ask for the init callback but never cancel a registration
            if let Some(flag) = requires_init_callback {
                record.requires_init_callback |= flag;
            }

            match self.coordinator.state() {
                InitState::Failed(reason) => {
                    self.report_init_failure(&placement, record, &reason, &mut effects)
                }
                InitState::NotStarted | InitState::InProgress => {
                    record.load_after_init = true;
                    record.deferred_server_data = server_data;
                    self.await_init(&placement, record, &mut effects);
                }
                InitState::Success => {
                    if record.state == AdUnitState::AwaitingInit {
                        // Init resolved but our waiter hasn't run yet; this load takes over
                        record.init_ticket = None;
                        record.load_after_init = false;
                        record.deferred_server_data = None;
                        if record.requires_init_callback {
                            effects.push(Effect::Notify(
                                listener.clone(),
                                AdUnitEvent::InitSucceeded,
                            ));
                        }
                    }

                    let same_showing = record.state == AdUnitState::Showing;
                    if !policy.permits(same_showing, showing_elsewhere.is_some()) {
                        let showing = if same_showing {
                            placement.to_string()
                        } else {
                            showing_elsewhere
                                .as_ref()
                                .map(|key| key.to_string())
                                .unwrap_or_default()
                        };
                        info!(
                            "{} {} {}: load blocked by {} policy while {} is showing",
                            self.network(),
                            F::KIND,
                            placement,
                            policy,
                            showing
                        );
                        effects.push(Effect::Notify(
                            listener,
                            AdUnitEvent::LoadFailed(LoadError::LoadWhileShowBlocked { showing }),
                        ));
                    } else if server_data.is_none()
                        && record.state == AdUnitState::Ready
                        && record.ad.as_ref().is_some_and(|ad| !self.is_expired(ad))
                    {
                        debug!(
                            "{} {} {}: already loaded, reporting availability",
                            self.network(),
                            F::KIND,
                            placement
                        );
                        effects.push(Effect::Notify(listener, AdUnitEvent::Loaded));
                    } else {
                        self.begin_load(&placement, record, server_data, &mut effects);
                    }
                }
            }
        }

        self.run(&placement, effects);
        Ok(())
    }

    fn await_init(
        &self,
        placement: &PlacementKey,
        record: &mut AdUnitRecord<F::Listener>,
        effects: &mut Vec<Effect<F::Listener>>,
    ) {
        if record.state != AdUnitState::AwaitingInit
            && self.transition(placement, record, AdUnitState::AwaitingInit, "waiting for init")
        {
            let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
            record.init_ticket = Some(ticket);
            effects.push(Effect::Subscribe(ticket));
        }
        effects.push(Effect::EnsureInit);
    }

    fn finish_init_wait(
        &self,
        placement: &PlacementKey,
        record: &mut AdUnitRecord<F::Listener>,
        effects: &mut Vec<Effect<F::Listener>>,
    ) {
        record.init_ticket = None;
        if record.requires_init_callback {
            effects.push(Effect::Notify(
                record.listener.clone(),
                AdUnitEvent::InitSucceeded,
            ));
        }
        if record.load_after_init {
            let server_data = record.deferred_server_data.take();
            self.begin_load(placement, record, server_data, effects);
        } else {
            self.transition(placement, record, AdUnitState::Idle, "network initialized");
        }
    }

    fn report_init_failure(
        &self,
        placement: &PlacementKey,
        record: &mut AdUnitRecord<F::Listener>,
        reason: &str,
        effects: &mut Vec<Effect<F::Listener>>,
    ) {
        record.init_ticket = None;
        record.load_after_init = false;
        record.deferred_server_data = None;

        let failed = AdUnitState::Terminal(TerminalReason::InitFailed);
        if record.state != failed {
            self.transition(placement, record, failed, "network init failed");
        }

        let event = if record.requires_init_callback {
            AdUnitEvent::InitFailed(reason.to_string())
        } else {
            AdUnitEvent::Unavailable(LoadError::InitFailed(reason.to_string()))
        };
        effects.push(Effect::Notify(record.listener.clone(), event));
    }

    fn begin_load(
        &self,
        placement: &PlacementKey,
        record: &mut AdUnitRecord<F::Listener>,
        server_data: Option<String>,
        effects: &mut Vec<Effect<F::Listener>>,
    ) {
        let reason = if record.state == AdUnitState::Loading {
            "superseded by new load"
        } else {
            "load requested"
        };
        if !self.transition(placement, record, AdUnitState::Loading, reason) {
            return;
        }

        record.init_ticket = None;
        record.load_after_init = false;
        record.deferred_server_data = None;

        if let Some(old) = record.ad.take() {
            if !record.presents(old.id) {
                debug!(
                    "{} {} {}: dropping ad {}",
                    self.network(),
                    F::KIND,
                    placement,
                    old.id
                );
                effects.push(Effect::Destroy(record.request(F::KIND, placement, &old)));
            }
        }

        let ad = LiveAd::new(server_data);
        let request = record.request(F::KIND, placement, &ad);
        record.ad = Some(ad);
        effects.push(Effect::Load(request));
    }

    /// Closed or failed show: reusable formats go back to Idle, others are removed
    fn rearm(
        &self,
        placement: &PlacementKey,
        record: &mut AdUnitRecord<F::Listener>,
        reload: bool,
        effects: &mut Vec<Effect<F::Listener>>,
    ) -> bool {
        if !F::REUSABLE {
            return true;
        }
        self.transition(placement, record, AdUnitState::Idle, "re-armed");
        if reload {
            effects.push(Effect::Reload);
        }
        false
    }

    fn transition(
        &self,
        placement: &PlacementKey,
        record: &mut AdUnitRecord<F::Listener>,
        to: AdUnitState,
        reason: &str,
    ) -> bool {
        let from = record.state;
        if !from.can_transition_to(to) {
            warn!(
                "{} {} {}: refusing {} -> {} ({})",
                self.network(),
                F::KIND,
                placement,
                from,
                to,
                reason
            );
            return false;
        }

        debug!(
            "{} {} {}: {} -> {} ({})",
            self.network(),
            F::KIND,
            placement,
            from,
            to,
            reason
        );
        record.state = to;
        record.last_transition = Some(StateTransition::new(from, to, reason));
        true
    }

    fn is_expired(&self, ad: &LiveAd) -> bool {
        match (self.settings.max_ad_age(), ad.loaded_at) {
            (Some(max_age), Some(loaded_at)) => Utc::now() - loaded_at > max_age,
            _ => false,
        }
    }

    fn showing_elsewhere(&self, placement: &PlacementKey) -> Option<PlacementKey> {
        self.records
            .iter()
            .find(|entry| entry.key() != placement && entry.state == AdUnitState::Showing)
            .map(|entry| entry.key().clone())
    }

    fn resolve_init(&self, placement: &PlacementKey, ticket: u64, outcome: &InitOutcome) {
        let mut effects = Vec::new();
        {
            let Some(mut entry) = self.records.get_mut(placement) else {
                debug!(
                    "{} {} {}: init resolved after placement was destroyed",
                    self.network(),
                    F::KIND,
                    placement
                );
                return;
            };
            let record = entry.value_mut();
            if record.init_ticket != Some(ticket) {
                debug!(
                    "{} {} {}: ignoring outdated init subscription {}",
                    self.network(),
                    F::KIND,
                    placement,
                    ticket
                );
                return;
            }

            match outcome {
                InitOutcome::Success => self.finish_init_wait(placement, record, &mut effects),
                InitOutcome::Failed(reason) => {
                    self.report_init_failure(placement, record, reason, &mut effects)
                }
            }
        }

        self.run(placement, effects);
    }

    fn discard(&self, placement: &PlacementKey, ad: AdObjectId, event: &SdkEvent, why: &str) {
        self.stale_callbacks.fetch_add(1, Ordering::Relaxed);
        debug!(
            "{} {} {}: discarding {} for ad {} ({})",
            self.network(),
            F::KIND,
            placement,
            event.as_str(),
            ad,
            why
        );
    }

    fn callbacks(&self, request: &AdRequest) -> AdCallbacks {
        let sink: Weak<dyn AdEventSink> = self.weak_self.clone();
        AdCallbacks::new(F::KIND, request.placement.clone(), request.ad, sink)
    }

    fn run(&self, placement: &PlacementKey, effects: Vec<Effect<F::Listener>>) {
        for effect in effects {
            match effect {
                Effect::Notify(listener, event) => F::deliver(&listener, event),
                Effect::Load(request) => {
                    debug!(
                        "{} {} {}: loading ad {}",
                        self.network(),
                        F::KIND,
                        placement,
                        request.ad
                    );
                    self.sdk.load_ad(&request, self.callbacks(&request));
                }
                Effect::Show(request) => {
                    info!(
                        "{} {} {}: showing ad {}",
                        self.network(),
                        F::KIND,
                        placement,
                        request.ad
                    );
                    self.sdk.show_ad(&request, self.callbacks(&request));
                }
                Effect::Destroy(request) => self.sdk.destroy_ad(&request),
                Effect::Subscribe(ticket) => {
                    self.coordinator.subscribe(Arc::new(PlacementWaiter::<F> {
                        registry: self.weak_self.clone(),
                        placement: placement.clone(),
                        ticket,
                    }))
                }
                Effect::EnsureInit => {
                    if let Err(e) = self.coordinator.ensure_initialized(&self.credentials) {
                        error!("{}: could not start init: {}", self.network(), e);
                    }
                }
                Effect::Reload => self.reload(placement),
            }
        }
    }

    fn reload(&self, placement: &PlacementKey) {
        let Some(listener) = self
            .records
            .get(placement)
            .map(|record| record.listener.clone())
        else {
            return;
        };
        if let Err(e) = self.request_load(placement.as_str(), listener, None, None) {
            warn!(
                "{} {} {}: auto reload failed: {}",
                self.network(),
                F::KIND,
                placement,
                e
            );
        }
    }
}

impl<F: AdFormat> AdEventSink for AdUnitRegistry<F> {
    fn handle_sdk_event(&self, placement: &PlacementKey, ad: AdObjectId, event: SdkEvent) {
        let mut effects = Vec::new();
        let mut remove = false;
        {
            let Some(mut entry) = self.records.get_mut(placement) else {
                self.discard(placement, ad, &event, "placement not registered");
                return;
            };
            let record = entry.value_mut();
            let current = record.holds(ad);
            let presenting = record.presents(ad);
            if !current && !presenting {
                self.discard(placement, ad, &event, "superseded ad object");
                return;
            }
            let listener = record.listener.clone();

            match event {
                SdkEvent::Loaded => {
                    if !current || record.state != AdUnitState::Loading {
                        self.discard(placement, ad, &SdkEvent::Loaded, "not loading");
                        return;
                    }
                    if let Some(live) = record.ad.as_mut() {
                        let now = Utc::now();
                        debug!(
                            "{} {} {}: ad {} loaded in {}ms",
                            self.network(),
                            F::KIND,
                            placement,
                            ad,
                            (now - live.requested_at).num_milliseconds()
                        );
                        live.loaded_at = Some(now);
                    }
                    self.transition(placement, record, AdUnitState::Ready, "sdk loaded");
                    effects.push(Effect::Notify(listener, AdUnitEvent::Loaded));
                }
                SdkEvent::LoadFailed(error) => {
                    if !current || record.state != AdUnitState::Loading {
                        self.discard(placement, ad, &SdkEvent::LoadFailed(error), "not loading");
                        return;
                    }
                    record.ad = None;
                    self.transition(
                        placement,
                        record,
                        AdUnitState::Terminal(TerminalReason::LoadFailed),
                        "sdk load failed",
                    );
                    effects.push(Effect::Notify(listener, AdUnitEvent::LoadFailed(error)));
                }
                SdkEvent::ShowFailed(reason) => {
                    if !presenting {
                        self.discard(placement, ad, &SdkEvent::ShowFailed(reason), "not showing");
                        return;
                    }
                    record.presenting = None;
                    effects.push(Effect::Notify(
                        listener,
                        AdUnitEvent::ShowFailed(ShowError::Network(reason)),
                    ));
                    if current && record.state == AdUnitState::Showing {
                        record.ad = None;
                        self.transition(
                            placement,
                            record,
                            AdUnitState::Terminal(TerminalReason::ShowFailed),
                            "sdk show failed",
                        );
                        remove = self.rearm(placement, record, false, &mut effects);
                    }
                }
                SdkEvent::Closed => {
                    if !presenting {
                        self.discard(placement, ad, &SdkEvent::Closed, "not showing");
                        return;
                    }
                    record.presenting = None;
                    effects.push(Effect::Notify(listener, AdUnitEvent::Closed));
                    if current && record.state == AdUnitState::Showing {
                        record.ad = None;
                        self.transition(
                            placement,
                            record,
                            AdUnitState::Terminal(TerminalReason::Closed),
                            "ad closed",
                        );
                        remove = self.rearm(
                            placement,
                            record,
                            self.settings.auto_reload_on_close,
                            &mut effects,
                        );
                    }
                }
                SdkEvent::ShowSucceeded => {
                    effects.push(Effect::Notify(listener, AdUnitEvent::ShowSucceeded))
                }
                SdkEvent::Impression => {
                    effects.push(Effect::Notify(listener, AdUnitEvent::Impression))
                }
                SdkEvent::Clicked => effects.push(Effect::Notify(listener, AdUnitEvent::Clicked)),
                SdkEvent::Rewarded => {
                    effects.push(Effect::Notify(listener, AdUnitEvent::Rewarded))
                }
                SdkEvent::LeftApplication => {
                    effects.push(Effect::Notify(listener, AdUnitEvent::LeftApplication))
                }
            }
        }

        if remove {
            self.records.remove_if(placement, |_, record| {
                record.state.is_terminal() && record.ad.is_none()
            });
        }
        self.run(placement, effects);
    }
}

/// Init subscription for one placement
struct PlacementWaiter<F: AdFormat> {
    registry: Weak<AdUnitRegistry<F>>,
    placement: PlacementKey,
    ticket: u64,
}

impl<F: AdFormat> InitWaiter for PlacementWaiter<F> {
    fn on_init_outcome(&self, outcome: &InitOutcome) {
        if let Some(registry) = self.registry.upgrade() {
            registry.resolve_init(&self.placement, self.ticket, outcome);
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::{AdObjectId, AdRequest, AdUnitKind, AdUnitState, PlacementKey, StateTransition};

/// The ad object a record currently owns
#[derive(Debug, Clone)]
pub(crate) struct LiveAd {
    pub id: AdObjectId,
    pub server_data: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl LiveAd {
    pub fn new(server_data: Option<String>) -> Self {
        Self {
            id: AdObjectId::new(),
            server_data,
            requested_at: Utc::now(),
            loaded_at: None,
        }
    }
}

/// Registry entry for one placement
pub(crate) struct AdUnitRecord<L: ?Sized> {
    pub listener: Arc<L>,
    pub state: AdUnitState,
    pub ad: Option<LiveAd>,
    /// Ad on screen; can differ from `ad` after a load while show
    pub presenting: Option<LiveAd>,
    pub requires_init_callback: bool,
    /// Load once init succeeds
    pub load_after_init: bool,
    pub deferred_server_data: Option<String>,
    /// Identifies the live init subscription; outcomes for older ones are ignored
    pub init_ticket: Option<u64>,
    pub last_transition: Option<StateTransition>,
}

impl<L: ?Sized> AdUnitRecord<L> {
    pub fn new(listener: Arc<L>) -> Self {
        Self {
            listener,
            state: AdUnitState::Idle,
            ad: None,
            presenting: None,
            requires_init_callback: false,
            load_after_init: false,
            deferred_server_data: None,
            init_ticket: None,
            last_transition: None,
        }
    }

    pub fn request(&self, kind: AdUnitKind, placement: &PlacementKey, ad: &LiveAd) -> AdRequest {
        AdRequest {
            kind,
            placement: placement.clone(),
            ad: ad.id,
            server_data: ad.server_data.clone(),
        }
    }

    pub fn current_request(&self, kind: AdUnitKind, placement: &PlacementKey) -> Option<AdRequest> {
        self.ad.as_ref().map(|ad| self.request(kind, placement, ad))
    }

    pub fn holds(&self, ad: AdObjectId) -> bool {
        self.ad.as_ref().map(|live| live.id) == Some(ad)
    }

    pub fn presents(&self, ad: AdObjectId) -> bool {
        self.presenting.as_ref().map(|live| live.id) == Some(ad)
    }

    pub fn snapshot(&self, placement: &PlacementKey) -> PlacementSnapshot {
        PlacementSnapshot {
            placement: placement.clone(),
            state: self.state,
            ad: self.ad.as_ref().map(|ad| ad.id),
            presenting: self.presenting.as_ref().map(|ad| ad.id),
            requires_init_callback: self.requires_init_callback,
            loaded_at: self.ad.as_ref().and_then(|ad| ad.loaded_at),
            last_transition: self.last_transition.clone(),
        }
    }
}

/// Read-only view of one placement
#[derive(Debug, Clone, Serialize)]
pub struct PlacementSnapshot {
    pub placement: PlacementKey,
    pub state: AdUnitState,
    pub ad: Option<AdObjectId>,
    pub presenting: Option<AdObjectId>,
    pub requires_init_callback: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_transition: Option<StateTransition>,
}

/// Per-state counts for one registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub idle: usize,
    pub awaiting_init: usize,
    pub loading: usize,
    pub ready: usize,
    pub showing: usize,
    pub terminal: usize,
    pub stale_callbacks_discarded: u64,
}

impl RegistryStats {
    pub fn total(&self) -> usize {
        self.idle + self.awaiting_init + self.loading + self.ready + self.showing + self.terminal
    }

    pub(crate) fn count(&mut self, state: AdUnitState) {
        match state {
            AdUnitState::Idle => self.idle += 1,
            AdUnitState::AwaitingInit => self.awaiting_init += 1,
            AdUnitState::Loading => self.loading += 1,
            AdUnitState::Ready => self.ready += 1,
            AdUnitState::Showing => self.showing += 1,
            AdUnitState::Terminal(_) => self.terminal += 1,
        }
    }
}

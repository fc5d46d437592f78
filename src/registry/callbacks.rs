use std::sync::Weak;

use crate::domain::{AdObjectId, AdUnitKind, PlacementKey};
use crate::error::LoadError;

/// Raw SDK notification about one ad object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkEvent {
    Loaded,
    LoadFailed(LoadError),
    ShowSucceeded,
    ShowFailed(String),
    Impression,
    Clicked,
    Rewarded,
    Closed,
    LeftApplication,
}

impl SdkEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SdkEvent::Loaded => "loaded",
            SdkEvent::LoadFailed(_) => "load_failed",
            SdkEvent::ShowSucceeded => "show_succeeded",
            SdkEvent::ShowFailed(_) => "show_failed",
            SdkEvent::Impression => "impression",
            SdkEvent::Clicked => "clicked",
            SdkEvent::Rewarded => "rewarded",
            SdkEvent::Closed => "closed",
            SdkEvent::LeftApplication => "left_application",
        }
    }
}

/// Receiving side of `AdCallbacks`, implemented by every registry
pub(crate) trait AdEventSink: Send + Sync {
    fn handle_sdk_event(&self, placement: &PlacementKey, ad: AdObjectId, event: SdkEvent);
}

/// Inbound callback handle given to the SDK with each load and show.
///
/// Tagged with the ad object it was created for; the registry drops events
/// for objects it no longer holds. Safe to keep after the registry is gone.
#[derive(Clone)]
pub struct AdCallbacks {
    kind: AdUnitKind,
    placement: PlacementKey,
    ad: AdObjectId,
    sink: Weak<dyn AdEventSink>,
}

impl AdCallbacks {
    pub(crate) fn new(
        kind: AdUnitKind,
        placement: PlacementKey,
        ad: AdObjectId,
        sink: Weak<dyn AdEventSink>,
    ) -> Self {
        Self {
            kind,
            placement,
            ad,
            sink,
        }
    }

    pub fn kind(&self) -> AdUnitKind {
        self.kind
    }

    pub fn placement(&self) -> &PlacementKey {
        &self.placement
    }

    pub fn ad(&self) -> AdObjectId {
        self.ad
    }

    pub fn loaded(&self) {
        self.emit(SdkEvent::Loaded);
    }

    pub fn load_failed(&self, error: LoadError) {
        self.emit(SdkEvent::LoadFailed(error));
    }

    pub fn show_succeeded(&self) {
        self.emit(SdkEvent::ShowSucceeded);
    }

    pub fn show_failed(&self, reason: impl Into<String>) {
        self.emit(SdkEvent::ShowFailed(reason.into()));
    }

    pub fn impression(&self) {
        self.emit(SdkEvent::Impression);
    }

    pub fn clicked(&self) {
        self.emit(SdkEvent::Clicked);
    }

    pub fn rewarded(&self) {
        self.emit(SdkEvent::Rewarded);
    }

    pub fn closed(&self) {
        self.emit(SdkEvent::Closed);
    }

    pub fn left_application(&self) {
        self.emit(SdkEvent::LeftApplication);
    }

    pub fn emit(&self, event: SdkEvent) {
        if let Some(sink) = self.sink.upgrade() {
            sink.handle_sdk_event(&self.placement, self.ad, event);
        }
    }
}

impl std::fmt::Debug for AdCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdCallbacks")
            .field("kind", &self.kind)
            .field("placement", &self.placement)
            .field("ad", &self.ad)
            .finish()
    }
}

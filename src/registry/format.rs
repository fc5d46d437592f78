//! Ad unit formats and their listener contracts
//!
//! The registry speaks one event vocabulary; each format decides how that
//! maps onto the callbacks its host-facing listener exposes.

use crate::domain::AdUnitKind;
use crate::error::{LoadError, ShowError};

/// Notification a registry delivers to a placement's listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdUnitEvent {
    InitSucceeded,
    InitFailed(String),
    /// Placement can't load, reported instead of an init failure
    Unavailable(LoadError),
    Loaded,
    LoadFailed(LoadError),
    /// A ready ad stopped being showable because a show started
    AvailabilityLost,
    ShowSucceeded,
    ShowFailed(ShowError),
    Impression,
    Clicked,
    Rewarded,
    Closed,
    LeftApplication,
}

/// One ad unit type handled by an `AdUnitRegistry`
pub trait AdFormat: Send + Sync + 'static {
    const KIND: AdUnitKind;

    /// Closed records re-arm to `Idle` when true; otherwise they are removed
    const REUSABLE: bool;

    type Listener: ?Sized + Send + Sync + 'static;

    fn deliver(listener: &Self::Listener, event: AdUnitEvent);
}

pub trait RewardedListener: Send + Sync {
    fn on_init_success(&self);

    fn on_init_failed(&self, reason: &str);

    fn on_availability_changed(&self, available: bool);

    fn on_load_failed(&self, _error: &LoadError) {}

    fn on_ad_opened(&self);

    fn on_ad_show_failed(&self, error: &ShowError);

    fn on_ad_started(&self) {}

    fn on_ad_clicked(&self);

    fn on_ad_rewarded(&self);

    fn on_ad_closed(&self);
}

pub trait InterstitialListener: Send + Sync {
    fn on_init_success(&self);

    fn on_init_failed(&self, reason: &str);

    fn on_ad_ready(&self);

    fn on_ad_load_failed(&self, error: &LoadError);

    fn on_ad_opened(&self);

    fn on_ad_show_succeeded(&self);

    fn on_ad_show_failed(&self, error: &ShowError);

    fn on_ad_clicked(&self);

    fn on_ad_closed(&self);
}

pub trait BannerListener: Send + Sync {
    fn on_init_success(&self);

    fn on_init_failed(&self, reason: &str);

    fn on_ad_loaded(&self);

    fn on_ad_load_failed(&self, error: &LoadError);

    fn on_ad_shown(&self) {}

    fn on_ad_clicked(&self);

    fn on_ad_left_application(&self) {}
}

/// Rewarded video
pub struct Rewarded;

impl AdFormat for Rewarded {
    const KIND: AdUnitKind = AdUnitKind::RewardedVideo;
    const REUSABLE: bool = true;
    type Listener = dyn RewardedListener;

    fn deliver(listener: &Self::Listener, event: AdUnitEvent) {
        match event {
            AdUnitEvent::InitSucceeded => listener.on_init_success(),
            AdUnitEvent::InitFailed(reason) => listener.on_init_failed(&reason),
            AdUnitEvent::Unavailable(_) | AdUnitEvent::AvailabilityLost => {
                listener.on_availability_changed(false)
            }
            AdUnitEvent::Loaded => listener.on_availability_changed(true),
            AdUnitEvent::LoadFailed(error) => {
                listener.on_availability_changed(false);
                listener.on_load_failed(&error);
            }
            AdUnitEvent::ShowSucceeded => listener.on_ad_started(),
            AdUnitEvent::ShowFailed(error) => listener.on_ad_show_failed(&error),
            AdUnitEvent::Impression => listener.on_ad_opened(),
            AdUnitEvent::Clicked => listener.on_ad_clicked(),
            AdUnitEvent::Rewarded => listener.on_ad_rewarded(),
            AdUnitEvent::Closed => listener.on_ad_closed(),
            AdUnitEvent::LeftApplication => {}
        }
    }
}

/// Full screen interstitial
pub struct Interstitial;

impl AdFormat for Interstitial {
    const KIND: AdUnitKind = AdUnitKind::Interstitial;
    const REUSABLE: bool = true;
    type Listener = dyn InterstitialListener;

    fn deliver(listener: &Self::Listener, event: AdUnitEvent) {
        match event {
            AdUnitEvent::InitSucceeded => listener.on_init_success(),
            AdUnitEvent::InitFailed(reason) => listener.on_init_failed(&reason),
            AdUnitEvent::Unavailable(error) | AdUnitEvent::LoadFailed(error) => {
                listener.on_ad_load_failed(&error)
            }
            AdUnitEvent::Loaded => listener.on_ad_ready(),
            AdUnitEvent::ShowSucceeded => listener.on_ad_show_succeeded(),
            AdUnitEvent::ShowFailed(error) => listener.on_ad_show_failed(&error),
            AdUnitEvent::Impression => listener.on_ad_opened(),
            AdUnitEvent::Clicked => listener.on_ad_clicked(),
            AdUnitEvent::Closed => listener.on_ad_closed(),
            AdUnitEvent::AvailabilityLost
            | AdUnitEvent::Rewarded
            | AdUnitEvent::LeftApplication => {}
        }
    }
}

/// Inline banner. A banner view is used once, so closed records are dropped.
pub struct Banner;

impl AdFormat for Banner {
    const KIND: AdUnitKind = AdUnitKind::Banner;
    const REUSABLE: bool = false;
    type Listener = dyn BannerListener;

    fn deliver(listener: &Self::Listener, event: AdUnitEvent) {
        match event {
            AdUnitEvent::InitSucceeded => listener.on_init_success(),
            AdUnitEvent::InitFailed(reason) => listener.on_init_failed(&reason),
            AdUnitEvent::Unavailable(error) | AdUnitEvent::LoadFailed(error) => {
                listener.on_ad_load_failed(&error)
            }
            AdUnitEvent::Loaded => listener.on_ad_loaded(),
            AdUnitEvent::ShowFailed(error) => {
                listener.on_ad_load_failed(&LoadError::Network(error.to_string()))
            }
            AdUnitEvent::Impression => listener.on_ad_shown(),
            AdUnitEvent::Clicked => listener.on_ad_clicked(),
            AdUnitEvent::LeftApplication => listener.on_ad_left_application(),
            AdUnitEvent::AvailabilityLost
            | AdUnitEvent::ShowSucceeded
            | AdUnitEvent::Rewarded
            | AdUnitEvent::Closed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    impl Calls {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl RewardedListener for Calls {
        fn on_init_success(&self) {
            self.push("init_success");
        }
        fn on_init_failed(&self, reason: &str) {
            self.push(format!("init_failed:{}", reason));
        }
        fn on_availability_changed(&self, available: bool) {
            self.push(format!("available:{}", available));
        }
        fn on_load_failed(&self, _error: &LoadError) {
            self.push("load_failed");
        }
        fn on_ad_opened(&self) {
            self.push("opened");
        }
        fn on_ad_show_failed(&self, error: &ShowError) {
            self.push(format!("show_failed:{}", error));
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

    impl BannerListener for Calls {
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
        fn on_ad_clicked(&self) {
            self.push("clicked");
        }
    }

    #[test]
    fn test_rewarded_maps_availability() {
        let calls = Calls::default();

        Rewarded::deliver(&calls, AdUnitEvent::Loaded);
        Rewarded::deliver(
            &calls,
            AdUnitEvent::Unavailable(LoadError::InitFailed("x".into())),
        );
        Rewarded::deliver(&calls, AdUnitEvent::LoadFailed(LoadError::NoFill("x".into())));
        Rewarded::deliver(&calls, AdUnitEvent::ShowFailed(ShowError::NotAvailable));

        assert_eq!(
            calls.take(),
            vec![
                "available:true",
                "available:false",
                "available:false",
                "load_failed",
                "show_failed:no ads to show",
            ]
        );
    }

    #[test]
    fn test_banner_ignores_full_screen_events() {
        let calls = Calls::default();

        Banner::deliver(&calls, AdUnitEvent::AvailabilityLost);
        Banner::deliver(&calls, AdUnitEvent::Rewarded);
        Banner::deliver(&calls, AdUnitEvent::Closed);
        Banner::deliver(&calls, AdUnitEvent::Clicked);
        Banner::deliver(
            &calls,
            AdUnitEvent::Unavailable(LoadError::InitFailed("no app".into())),
        );

        assert_eq!(
            calls.take(),
            vec!["clicked", "load_failed:network init failed: no app"]
        );
    }
}

//! Ad unit registries
//!
//! One `AdUnitRegistry` per ad unit type and network:
//! - per-placement lifecycle state machine
//! - deferred loads while network init is pending
//! - stale callback filtering by ad object identity
//! - load-while-show policy

pub mod callbacks;
pub mod format;
pub mod policy;
pub mod record;
pub mod unit_registry;

pub use callbacks::{AdCallbacks, SdkEvent};
pub use format::{
    AdFormat, AdUnitEvent, Banner, BannerListener, Interstitial, InterstitialListener, Rewarded,
    RewardedListener,
};
pub use policy::LoadWhileShowPolicy;
pub use record::{PlacementSnapshot, RegistryStats};
pub use unit_registry::AdUnitRegistry;

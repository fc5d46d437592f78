pub mod cli;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod logging;
pub mod network;
pub mod registry;

pub use config::AppConfig;
pub use coordination::{
    ConsentDisposition, ConsentFlag, InitCompletion, InitCoordinator, InitWaiter,
    PendingConsentFlags,
};
pub use domain::{AdObjectId, AdRequest, AdUnitKind, AdUnitState, Credentials, InitOutcome, InitState, PlacementKey};
pub use error::{LoadError, MedleyError, Result, ShowError};
pub use network::{build_adapter, BiddingData, NetworkAdapter, NetworkSdk, SimulatedSdk};
pub use registry::{
    AdCallbacks, AdFormat, AdUnitEvent, AdUnitRegistry, Banner, BannerListener, Interstitial,
    InterstitialListener, LoadWhileShowPolicy, Rewarded, RewardedListener,
};

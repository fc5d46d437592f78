pub mod adapter;
pub mod factory;
pub mod simulated;
pub mod traits;

pub use adapter::{BiddingData, NetworkAdapter};
pub use factory::{build_adapter, build_sdk};
pub use simulated::SimulatedSdk;
pub use traits::NetworkSdk;

//! Coordination layer shared by every ad unit type of a network
//!
//! - Single-flight SDK initialization with outcome fan-out
//! - Consent staging until the SDK is ready

pub mod consent;
pub mod init;

pub use consent::{parse_consent_value, ConsentDisposition, ConsentFlag, PendingConsentFlags};
pub use init::{InitCompletion, InitCoordinator, InitWaiter};

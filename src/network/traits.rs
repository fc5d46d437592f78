use crate::coordination::{ConsentFlag, InitCompletion};
use crate::domain::{AdRequest, Credentials};
use crate::error::Result;
use crate::registry::AdCallbacks;

/// Seam to a third-party ad network SDK.
///
/// Every method must return promptly. Outcomes that take a network round trip
/// are reported later through the `InitCompletion` or `AdCallbacks` handle,
/// from any thread. Implementations may invoke those handles synchronously
/// from inside the call.
pub trait NetworkSdk: Send + Sync {
    /// Short network name used in logs ("vungle", "unityads", ...)
    fn name(&self) -> &'static str;

    fn sdk_version(&self) -> String;

    /// Start SDK initialization. Called at most once per coordinator.
    fn initialize(&self, credentials: &Credentials, completion: InitCompletion);

    /// Push one privacy value into the SDK
    fn apply_consent(&self, flag: ConsentFlag, value: bool) -> Result<()>;

    fn load_ad(&self, request: &AdRequest, callbacks: AdCallbacks);

    fn show_ad(&self, request: &AdRequest, callbacks: AdCallbacks);

    /// Release the SDK resources behind one ad object
    fn destroy_ad(&self, request: &AdRequest);

    /// SDK side freshness check for a loaded ad object
    fn is_ad_ready(&self, request: &AdRequest) -> bool;

    /// Token for server-side bidding, when the SDK has one
    fn bidding_token(&self) -> Option<String>;
}

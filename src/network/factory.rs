use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{MedleyError, Result};

use super::{NetworkAdapter, NetworkSdk, SimulatedSdk};

/// Create the SDK binding named by `network.name`.
///
/// Only the simulated network ships with the crate; real SDK bindings are
/// passed to `NetworkAdapter::new` directly.
pub fn build_sdk(app_config: &AppConfig) -> Result<Arc<dyn NetworkSdk>> {
    match app_config.network.name.trim().to_ascii_lowercase().as_str() {
        "simulated" | "sim" => Ok(Arc::new(SimulatedSdk::new(app_config.simulation.clone())?)),
        other => Err(MedleyError::Validation(format!(
            "no built-in SDK binding for network '{}'",
            other
        ))),
    }
}

/// Validate the config and build an adapter over the configured SDK
pub fn build_adapter(app_config: &AppConfig) -> Result<NetworkAdapter> {
    app_config
        .validate()
        .map_err(|errors| MedleyError::Validation(errors.join("; ")))?;

    let sdk = build_sdk(app_config)?;
    Ok(NetworkAdapter::new(app_config, sdk))
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Whether a network may load while one of its ads is on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadWhileShowPolicy {
    /// No loads at all while anything of this type is showing
    None,
    /// Other placements may load; the showing one may not
    ByNetwork,
    /// Any placement may load, including the one showing
    #[default]
    ByInstance,
}

impl LoadWhileShowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadWhileShowPolicy::None => "none",
            LoadWhileShowPolicy::ByNetwork => "by_network",
            LoadWhileShowPolicy::ByInstance => "by_instance",
        }
    }

    /// Decide a load given what is currently showing
    pub fn permits(&self, same_placement_showing: bool, other_placement_showing: bool) -> bool {
        match self {
            LoadWhileShowPolicy::None => !same_placement_showing && !other_placement_showing,
            LoadWhileShowPolicy::ByNetwork => !same_placement_showing,
            LoadWhileShowPolicy::ByInstance => true,
        }
    }

    /// Read the policy flags networks put in ad unit settings.
    ///
    /// `isSupportedLWSByInstance` wins, then `isSupportedLWS=false` turns loads
    /// off; anything else keeps `default`.
    pub fn from_settings(settings: &Value, default: LoadWhileShowPolicy) -> Self {
        if flag(settings, "isSupportedLWSByInstance") == Some(true) {
            return LoadWhileShowPolicy::ByInstance;
        }
        if flag(settings, "isSupportedLWS") == Some(false) {
            return LoadWhileShowPolicy::None;
        }
        default
    }
}

fn flag(settings: &Value, field: &str) -> Option<bool> {
    match settings.get(field)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl fmt::Display for LoadWhileShowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

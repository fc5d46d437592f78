//! Privacy consent staging
//!
//! Consent set before the network SDK is initialized cannot be handed to it
//! yet, so it is parked here and replayed once: right before the init call,
//! or on init success for values that arrive while init is in flight.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Privacy signals a host can pass to a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentFlag {
    /// GDPR style consent for behavioral ads
    BehavioralConsent,
    /// CCPA style "do not sell"
    RegionalOptOut,
    /// COPPA / child directed treatment
    Minor,
}

impl ConsentFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentFlag::BehavioralConsent => "behavioral_consent",
            ConsentFlag::RegionalOptOut => "regional_opt_out",
            ConsentFlag::Minor => "minor",
        }
    }
}

impl fmt::Display for ConsentFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConsentFlag {
    type Err = &'static str;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "behavioral_consent" | "consent" | "gdpr" => Ok(ConsentFlag::BehavioralConsent),
            "regional_opt_out" | "do_not_sell" | "ccpa" => Ok(ConsentFlag::RegionalOptOut),
            "minor" | "coppa" | "is_child_directed" => Ok(ConsentFlag::Minor),
            _ => Err("invalid consent flag; expected behavioral_consent|regional_opt_out|minor"),
        }
    }
}

/// What `set_consent` did with a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentDisposition {
    /// Handed to the live SDK
    Applied,
    /// Parked until init succeeds
    Staged,
}

/// Consent values waiting for the SDK. Unset flags are never sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConsentFlags {
    behavioral_consent: Option<bool>,
    regional_opt_out: Option<bool>,
    minor: Option<bool>,
}

impl PendingConsentFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a value; the last write per flag wins
    pub fn stage(&mut self, flag: ConsentFlag, value: bool) {
        *self.slot_mut(flag) = Some(value);
    }

    pub fn get(&self, flag: ConsentFlag) -> Option<bool> {
        match flag {
            ConsentFlag::BehavioralConsent => self.behavioral_consent,
            ConsentFlag::RegionalOptOut => self.regional_opt_out,
            ConsentFlag::Minor => self.minor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.behavioral_consent.is_none() && self.regional_opt_out.is_none() && self.minor.is_none()
    }

    /// Drain every staged value in a fixed order, leaving nothing behind
    pub fn take(&mut self) -> Vec<(ConsentFlag, bool)> {
        [
            ConsentFlag::BehavioralConsent,
            ConsentFlag::RegionalOptOut,
            ConsentFlag::Minor,
        ]
        .into_iter()
        .filter_map(|flag| self.slot_mut(flag).take().map(|value| (flag, value)))
        .collect()
    }

    fn slot_mut(&mut self, flag: ConsentFlag) -> &mut Option<bool> {
        match flag {
            ConsentFlag::BehavioralConsent => &mut self.behavioral_consent,
            ConsentFlag::RegionalOptOut => &mut self.regional_opt_out,
            ConsentFlag::Minor => &mut self.minor,
        }
    }
}

/// Parse a metadata value the way hosts send them ("true", "YES", "1", ...)
pub fn parse_consent_value(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

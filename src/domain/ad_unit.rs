use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::PlacementKey;
use crate::error::{MedleyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdUnitKind {
    RewardedVideo,
    Interstitial,
    Banner,
}

impl AdUnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RewardedVideo => "rewarded_video",
            Self::Interstitial => "interstitial",
            Self::Banner => "banner",
        }
    }

    pub fn all() -> [AdUnitKind; 3] {
        [Self::RewardedVideo, Self::Interstitial, Self::Banner]
    }
}

impl std::fmt::Display for AdUnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdUnitKind {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rewarded_video" | "rewarded" | "rv" => Ok(Self::RewardedVideo),
            "interstitial" | "is" => Ok(Self::Interstitial),
            "banner" | "bn" => Ok(Self::Banner),
            _ => Err("invalid ad unit; expected rewarded_video|interstitial|banner"),
        }
    }
}

pub fn parse_ad_unit_kind(raw: &str) -> Result<AdUnitKind> {
    AdUnitKind::from_str(raw).map_err(|e| MedleyError::Validation(e.to_string()))
}

/// Identity of one ad object handed to the network SDK.
///
/// Every load creates a fresh id, so callbacks can be matched against the
/// object a record currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdObjectId(Uuid);

impl AdObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AdObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the SDK needs to load, show or destroy one ad object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRequest {
    pub kind: AdUnitKind,
    pub placement: PlacementKey,
    pub ad: AdObjectId,
    /// Auction payload for bidding loads
    pub server_data: Option<String>,
}

impl AdRequest {
    pub fn is_bidding(&self) -> bool {
        self.server_data.is_some()
    }
}

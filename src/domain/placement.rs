use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::error::{MedleyError, Result};

/// Network placement (location) id.
///
/// Only unique within one ad unit type; each registry keeps its own map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementKey(String);

impl PlacementKey {
    /// Build a key, rejecting blank ids
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MedleyError::MissingParameter("placement id".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlacementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlacementKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PlacementKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PlacementKey {
    type Error = MedleyError;

    fn try_from(raw: &str) -> Result<Self> {
        Self::new(raw)
    }
}

/// Account credentials handed to the SDK's init call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub app_id: String,
    #[serde(default)]
    pub app_signature: Option<String>,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.app_signature = Some(signature.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(MedleyError::MissingParameter("app id".to_string()));
        }
        if matches!(&self.app_signature, Some(sig) if sig.trim().is_empty()) {
            return Err(MedleyError::MissingParameter("app signature".to_string()));
        }
        Ok(())
    }
}

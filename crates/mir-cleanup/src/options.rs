use std::str::FromStr;

use mir_core::config::{env_true, env_value};
use mir_core::error::Result;
use serde::{Deserialize, Serialize};

pub const ENV_PARALLEL: &str = "MIR_CLEANUP_PARALLEL";
pub const ENV_STRICT_DEFERRED: &str = "MIR_CLEANUP_STRICT_DEFERRED";
pub const ENV_SLOT_AMBIGUITY: &str = "MIR_CLEANUP_SLOT_AMBIGUITY";

/// What to do when a trait-object call matches several vtable slots that
/// differ only in the owning trait's generic arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotAmbiguity {
    /// Take the first matching slot silently.
    First,
    /// Take the first matching slot and record a warning.
    #[default]
    Warn,
    /// Abort the function.
    Deny,
}

impl SlotAmbiguity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotAmbiguity::First => "first",
            SlotAmbiguity::Warn => "warn",
            SlotAmbiguity::Deny => "deny",
        }
    }
}

impl FromStr for SlotAmbiguity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(SlotAmbiguity::First),
            "warn" | "warning" => Ok(SlotAmbiguity::Warn),
            "deny" | "error" => Ok(SlotAmbiguity::Deny),
            other => Err(format!("unknown slot ambiguity policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    /// Clean functions on the rayon thread pool.
    pub parallel: bool,
    /// Treat operands that would be left for a later phase as errors.
    pub strict_deferred: bool,
    pub slot_ambiguity: SlotAmbiguity,
}

impl CleanupOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `MIR_CLEANUP_*` variables on top of these options. Unset
    /// variables leave the current value in place.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(parallel) = env_true(ENV_PARALLEL) {
            self.parallel = parallel;
        }
        if let Some(strict) = env_true(ENV_STRICT_DEFERRED) {
            self.strict_deferred = strict;
        }
        if let Some(policy) = env_value(ENV_SLOT_AMBIGUITY) {
            self.slot_ambiguity = policy.parse()?;
        }
        Ok(self)
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn strict_deferred(mut self, strict: bool) -> Self {
        self.strict_deferred = strict;
        self
    }

    pub fn slot_ambiguity(mut self, policy: SlotAmbiguity) -> Self {
        self.slot_ambiguity = policy;
        self
    }
}

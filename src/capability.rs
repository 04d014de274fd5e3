//! Adapter capabilities.
//!
//! Every adapter carries a fixed [`CapabilitySet`] declaring which of the
//! three uniform operations it supports. "Unsupported" is a typed, checkable
//! condition: callers can introspect the set before dispatch, and a forced
//! call on a disabled operation fails with a typed error instead of
//! succeeding silently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three uniform adapter operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Train a fresh underlying model from data.
    Input,
    /// Produce predictions or transformed output from a trained model.
    Output,
    /// Continue fitting the existing trained model in place.
    Update,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// The set of operations an adapter supports, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    input: bool,
    output: bool,
    update: bool,
}

impl CapabilitySet {
    /// Build a set from explicit flags.
    pub const fn new(input: bool, output: bool, update: bool) -> Self {
        Self { input, output, update }
    }

    /// All three operations enabled.
    pub const fn all() -> Self {
        Self::new(true, true, true)
    }

    /// Input and output without update, for stateless-transform models
    /// that only support full refits.
    pub const fn frozen() -> Self {
        Self::new(true, true, false)
    }

    /// Whether the given operation is enabled.
    pub const fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Input => self.input,
            Capability::Output => self.output,
            Capability::Update => self.update,
        }
    }

    /// The enabled operations, in input/output/update order.
    pub fn list(&self) -> Vec<Capability> {
        [Capability::Input, Capability::Output, Capability::Update]
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.list().iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join("+"))
    }
}

// =============================================================================
// Tests
// =============================================================================

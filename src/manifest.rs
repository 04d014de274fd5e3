//! Static model manifest.
//!
//! Discovery is data, not reflection: a version-pinned table lists every
//! wrapped aprender class with its owning module, how it produces output,
//! and the constructor that builds its backend. The registry reads this
//! table once at startup; nothing is resolved at runtime.

use crate::backend::{self, Hyperparams, ModelBackend, OutputKind};

/// The wrapped library name used in qualified registry keys.
pub const LIBRARY: &str = "aprender";

/// The aprender modules covered by the manifest, in registration order.
pub const MODULES: &[&str] =
    &["linear_model", "classification", "cluster", "preprocessing", "decomposition"];

/// Modules whose models are pure, data-independent transforms.
///
/// A continued fit has no meaning for these, so registries built with the
/// default config disable their update capability.
pub const FROZEN_MODULES: &[&str] = &["preprocessing", "decomposition"];

/// One wrapped model class.
#[derive(Debug, Clone, Copy)]
pub struct ModelEntry {
    /// Owning aprender module.
    pub module: &'static str,
    /// Simple class name.
    pub name: &'static str,
    /// How the class produces output.
    pub output: OutputKind,
    /// Backend constructor taking the caller's hyperparameters.
    pub build: fn(&Hyperparams) -> backend::Result<Box<dyn ModelBackend>>,
}

impl ModelEntry {
    /// Qualified registry key: `aprender.<module>.<ClassName>`.
    pub fn qualified_name(&self) -> String {
        format!("{LIBRARY}.{}.{}", self.module, self.name)
    }
}

const ENTRIES: [ModelEntry; 8] = [
    ModelEntry {
        module: "linear_model",
        name: "LinearRegression",
        output: OutputKind::Predict,
        build: backend::linear_regression,
    },
    ModelEntry {
        module: "linear_model",
        name: "Ridge",
        output: OutputKind::Predict,
        build: backend::ridge,
    },
    ModelEntry {
        module: "linear_model",
        name: "Lasso",
        output: OutputKind::Predict,
        build: backend::lasso,
    },
    ModelEntry {
        module: "classification",
        name: "LogisticRegression",
        output: OutputKind::Predict,
        build: backend::logistic_regression,
    },
    ModelEntry {
        module: "cluster",
        name: "KMeans",
        output: OutputKind::Predict,
        build: backend::kmeans,
    },
    ModelEntry {
        module: "preprocessing",
        name: "StandardScaler",
        output: OutputKind::Transform,
        build: backend::standard_scaler,
    },
    ModelEntry {
        module: "preprocessing",
        name: "MinMaxScaler",
        output: OutputKind::Transform,
        build: backend::min_max_scaler,
    },
    ModelEntry {
        module: "decomposition",
        name: "PCA",
        output: OutputKind::Transform,
        build: backend::pca,
    },
];

/// Every wrapped model class, grouped by module in [`MODULES`] order.
pub fn entries() -> &'static [ModelEntry] {
    &ENTRIES
}

// =============================================================================
// Tests
// =============================================================================

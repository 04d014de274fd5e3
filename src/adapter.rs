//! Generic model adapter.
//!
//! One [`Adapter`] type serves every registered model class: instead of a
//! synthesized type per class, the adapter closes over a manifest entry and
//! owns at most one trained backend. The three uniform operations follow one
//! convention for column selection: explicit per-call options win, otherwise
//! the adapter's construction-time [`AdapterSettings`] apply, otherwise the
//! whole frame is used and fitting is unsupervised. That single convention is
//! what lets a serving layer reuse one adapter across many requests while
//! still overriding columns per call.
//!
//! # Example
//!
//! ```
//! use servir::{AdapterSettings, InputOptions, ModelRegistry, OutputOptions, RegistryConfig};
//! use servir::frame::Record;
//!
//! let registry = ModelRegistry::from_config(&RegistryConfig::default())
//!     .expect("default config is valid");
//!
//! let settings = AdapterSettings::new().with_x(["a"]).with_y("b");
//! let mut model = registry
//!     .instantiate("aprender.linear_model.LinearRegression", settings)
//!     .expect("registered model");
//!
//! let train: Vec<Record> = serde_json::from_value(serde_json::json!([
//!     {"a": 1.0, "b": 2.0},
//!     {"a": 2.0, "b": 4.0},
//!     {"a": 3.0, "b": 6.0},
//! ]))
//! .expect("valid records");
//! model.input(&train, &InputOptions::default()).expect("training succeeds");
//!
//! let score: Vec<Record> =
//!     serde_json::from_value(serde_json::json!([{"a": 4.0}])).expect("valid records");
//! let out = model.output(&score, &OutputOptions::default()).expect("prediction succeeds");
//!
//! assert_eq!(out.num_rows(), 1);
//! assert_eq!(out.columns(), ["b"]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendError, FitOptions, Hyperparams, ModelBackend, OutputKind};
use crate::capability::{Capability, CapabilitySet};
use crate::frame::{Frame, FrameError, Record};
use crate::manifest::ModelEntry;

/// Adapter errors
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Operation not supported by this model: {0}")]
    Unsupported(Capability),

    #[error("Model has not been trained: call input first")]
    NotTrained,

    #[error("Multiple target columns are not supported: {0}")]
    MultiTarget(String),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// One column name or several.
///
/// Deserializes from either a JSON string or an array of strings, so a
/// settings mapping may say `"y": "b"` or `"y": ["b", "c"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelect {
    /// A single column.
    One(String),
    /// Several columns, order preserved.
    Many(Vec<String>),
}

impl ColumnSelect {
    /// Normalize to a label sequence.
    pub fn as_labels(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }

    fn as_target(&self) -> Result<&str> {
        match self {
            Self::One(name) => Ok(name),
            Self::Many(names) => match names.as_slice() {
                [single] => Ok(single),
                _ => Err(AdapterError::MultiTarget(names.join(", "))),
            },
        }
    }
}

impl From<&str> for ColumnSelect {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for ColumnSelect {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for ColumnSelect {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

/// Construction-time column defaults for an adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterSettings {
    /// Default input feature columns, order preserved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<String>>,

    /// Default target column for training, and output labels for prediction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<ColumnSelect>,
}

impl AdapterSettings {
    /// Empty settings: every call supplies its own columns, or none.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default feature columns.
    pub fn with_x<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.x = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the default target/label column(s).
    pub fn with_y(mut self, y: impl Into<ColumnSelect>) -> Self {
        self.y = Some(y.into());
        self
    }
}

/// Per-call options for [`Adapter::input`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputOptions {
    /// Feature columns; overrides the adapter's settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<String>>,

    /// Target column; overrides the adapter's settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<ColumnSelect>,

    /// Constructor arguments for the fresh underlying model.
    #[serde(default, skip_serializing_if = "Hyperparams::is_empty")]
    pub hyperparams: Hyperparams,

    /// Options forwarded to the fit call.
    #[serde(default, skip_serializing_if = "FitOptions::is_empty")]
    pub fit_options: FitOptions,
}

impl InputOptions {
    /// Override the feature columns for this call.
    pub fn with_x<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.x = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override the target column for this call.
    pub fn with_y(mut self, y: impl Into<ColumnSelect>) -> Self {
        self.y = Some(y.into());
        self
    }

    /// Pass constructor arguments to the underlying model.
    pub fn with_hyperparams(mut self, hyperparams: Hyperparams) -> Self {
        self.hyperparams = hyperparams;
        self
    }
}

/// Per-call options for [`Adapter::output`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Feature columns; overrides the adapter's settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<String>>,

    /// Output column labels; overrides the adapter's settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<ColumnSelect>,
}

impl OutputOptions {
    /// Override the feature columns for this call.
    pub fn with_x<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.x = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override the output labels for this call.
    pub fn with_y(mut self, y: impl Into<ColumnSelect>) -> Self {
        self.y = Some(y.into());
        self
    }
}

/// Per-call options for [`Adapter::update`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Feature columns; overrides the adapter's settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<String>>,

    /// Target column; overrides the adapter's settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<ColumnSelect>,

    /// Options forwarded to the fit call.
    #[serde(default, skip_serializing_if = "FitOptions::is_empty")]
    pub fit_options: FitOptions,
}

impl UpdateOptions {
    /// Override the feature columns for this call.
    pub fn with_x<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.x = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override the target column for this call.
    pub fn with_y(mut self, y: impl Into<ColumnSelect>) -> Self {
        self.y = Some(y.into());
        self
    }
}

/// A serving adapter for one registered model class.
///
/// Owns at most one trained backend (`None` until [`Adapter::input`]
/// succeeds). Single-owner mutable state: concurrent calls on one adapter
/// must be serialized by the caller.
pub struct Adapter {
    qualified_name: String,
    entry: &'static ModelEntry,
    capabilities: CapabilitySet,
    settings: AdapterSettings,
    state: Option<Box<dyn ModelBackend>>,
}

impl Adapter {
    pub(crate) fn new(
        entry: &'static ModelEntry,
        capabilities: CapabilitySet,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            qualified_name: entry.qualified_name(),
            entry,
            capabilities,
            settings,
            state: None,
        }
    }

    /// Train a fresh underlying model and store it as this adapter's state.
    ///
    /// This is a full retrain: the previous trained model, if any, is
    /// discarded on success. On failure the previous state is kept.
    pub fn input(&mut self, records: &[Record], opts: &InputOptions) -> Result<()> {
        self.require(Capability::Input)?;

        let frame = Frame::from_records(records)?;
        let features = self.features(&frame, &opts.x)?;
        let target = self.target(&frame, &opts.y)?;

        let mut backend = (self.entry.build)(&opts.hyperparams)?;
        backend.fit(&features.to_matrix()?, target.as_ref(), &opts.fit_options)?;
        self.state = Some(backend);
        Ok(())
    }

    /// Produce output for the given records from the trained model.
    ///
    /// Output columns are named from the resolved `y` labels when present,
    /// `y0..yN` otherwise.
    pub fn output(&self, records: &[Record], opts: &OutputOptions) -> Result<Frame> {
        self.require(Capability::Output)?;
        let backend = self.state.as_ref().ok_or(AdapterError::NotTrained)?;

        let frame = Frame::from_records(records)?;
        let features = self.features(&frame, &opts.x)?;

        let raw = backend.infer(&features.to_matrix()?)?;
        let labels = opts
            .y
            .as_ref()
            .or(self.settings.y.as_ref())
            .map(ColumnSelect::as_labels);
        Ok(Frame::from_matrix(&raw, labels.as_deref())?)
    }

    /// Continue fitting the existing trained model in place.
    ///
    /// Unlike [`Adapter::input`], no fresh model is constructed; the stored
    /// backend object is refitted and its identity is unchanged.
    pub fn update(&mut self, records: &[Record], opts: &UpdateOptions) -> Result<()> {
        self.require(Capability::Update)?;

        let frame = Frame::from_records(records)?;
        let features = self.features(&frame, &opts.x)?;
        let target = self.target(&frame, &opts.y)?;

        let backend = self.state.as_mut().ok_or(AdapterError::NotTrained)?;
        backend.fit(&features.to_matrix()?, target.as_ref(), &opts.fit_options)?;
        Ok(())
    }

    /// Qualified name of the wrapped model class.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The operations this adapter supports.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// The adapter's construction-time column defaults.
    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Whether a trained model is stored.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// How the wrapped class produces output.
    pub fn output_kind(&self) -> OutputKind {
        self.entry.output
    }

    fn require(&self, capability: Capability) -> Result<()> {
        if self.capabilities.supports(capability) {
            Ok(())
        } else {
            Err(AdapterError::Unsupported(capability))
        }
    }

    /// Resolve feature columns (explicit wins over settings) and project.
    fn features(&self, frame: &Frame, explicit: &Option<Vec<String>>) -> Result<Frame> {
        match explicit.as_ref().or(self.settings.x.as_ref()) {
            Some(columns) => Ok(frame.select(columns)?),
            None => Ok(frame.clone()),
        }
    }

    /// Resolve the target column (explicit wins over settings) and extract it.
    fn target(
        &self,
        frame: &Frame,
        explicit: &Option<ColumnSelect>,
    ) -> Result<Option<aprender::primitives::Vector<f32>>> {
        match explicit.as_ref().or(self.settings.y.as_ref()) {
            Some(select) => Ok(Some(frame.column(select.as_target()?)?)),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("qualified_name", &self.qualified_name)
            .field("capabilities", &self.capabilities)
            .field("settings", &self.settings)
            .field("trained", &self.state.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModelRegistry, RegistryConfig};
    use approx::assert_relative_eq;
    use serde_json::json;

    fn registry() -> ModelRegistry {
        ModelRegistry::from_config(&RegistryConfig::default()).expect("default config is valid")
    }

    fn records(value: serde_json::Value) -> Vec<Record> {
        serde_json::from_value(value).expect("valid records")
    }

    fn backend_addr(adapter: &Adapter) -> usize {
        adapter
            .state
            .as_ref()
            .map(|b| std::ptr::addr_of!(**b) as *const () as usize)
            .expect("adapter is trained")
    }

    fn trained_linear() -> Adapter {
        let settings = AdapterSettings::new().with_x(["a"]).with_y("b");
        let mut adapter = registry()
            .instantiate("aprender.linear_model.LinearRegression", settings)
            .expect("registered model");
        adapter
            .input(
                &records(json!([
                    {"a": 1.0, "b": 2.0},
                    {"a": 2.0, "b": 4.0},
                    {"a": 3.0, "b": 6.0},
                ])),
                &InputOptions::default(),
            )
            .expect("training succeeds");
        adapter
    }

    #[test]
    fn test_settings_defaults_scenario() {
        // settings={'x': ['a'], 'y': 'b'}, train on y = 2a, predict a=3.
        let adapter = trained_linear();
        let out = adapter
            .output(&records(json!([{"a": 3.0}])), &OutputOptions::default())
            .expect("prediction succeeds");

        assert_eq!(out.num_rows(), 1);
        assert_eq!(out.columns(), ["b"]);
        let column = out.column("b").expect("labeled output column");
        assert_relative_eq!(column.as_slice()[0], 6.0, epsilon = 1e-2);
    }

    #[test]
    fn test_explicit_options_override_settings() {
        let settings = AdapterSettings::new().with_x(["wrong"]).with_y("also_wrong");
        let mut adapter = registry()
            .instantiate("aprender.linear_model.LinearRegression", settings)
            .expect("registered model");

        let opts = InputOptions::default().with_x(["a"]).with_y("b");
        adapter
            .input(
                &records(json!([
                    {"a": 1.0, "b": 1.0},
                    {"a": 2.0, "b": 2.0},
                ])),
                &opts,
            )
            .expect("explicit columns exist in the data");
        assert!(adapter.is_trained());
    }

    #[test]
    fn test_output_before_input_is_not_trained() {
        let adapter = registry()
            .instantiate("aprender.linear_model.LinearRegression", AdapterSettings::new())
            .expect("registered model");
        let err = adapter
            .output(&records(json!([{"a": 1.0}])), &OutputOptions::default())
            .expect_err("no trained state");
        assert!(matches!(err, AdapterError::NotTrained));
    }

    #[test]
    fn test_update_before_input_is_not_trained() {
        let mut adapter = registry()
            .instantiate("aprender.linear_model.LinearRegression", AdapterSettings::new())
            .expect("registered model");
        let err = adapter
            .update(&records(json!([{"a": 1.0, "b": 1.0}])), &UpdateOptions::default())
            .expect_err("no trained state");
        assert!(matches!(err, AdapterError::NotTrained));
    }

    #[test]
    fn test_update_keeps_backend_identity() {
        let mut adapter = trained_linear();
        let before = backend_addr(&adapter);

        adapter
            .update(
                &records(json!([{"a": 4.0, "b": 8.0}, {"a": 5.0, "b": 10.0}])),
                &UpdateOptions::default(),
            )
            .expect("continued fit succeeds");

        assert_eq!(backend_addr(&adapter), before, "update must refit in place");
    }

    #[test]
    fn test_input_replaces_backend() {
        let mut adapter = trained_linear();
        let before = backend_addr(&adapter);

        adapter
            .input(
                &records(json!([{"a": 1.0, "b": 3.0}, {"a": 2.0, "b": 6.0}])),
                &InputOptions::default(),
            )
            .expect("retraining succeeds");

        assert_ne!(backend_addr(&adapter), before, "input must build a fresh model");
    }

    #[test]
    fn test_unsupported_update_is_typed() {
        let mut adapter = registry()
            .instantiate("aprender.preprocessing.StandardScaler", AdapterSettings::new())
            .expect("registered model");
        let err = adapter
            .update(&records(json!([{"a": 1.0}])), &UpdateOptions::default())
            .expect_err("scalers are frozen");
        assert!(matches!(err, AdapterError::Unsupported(Capability::Update)));
    }

    #[test]
    fn test_projection_error_propagates() {
        let mut adapter = registry()
            .instantiate(
                "aprender.linear_model.LinearRegression",
                AdapterSettings::new().with_x(["missing"]).with_y("b"),
            )
            .expect("registered model");
        let err = adapter
            .input(&records(json!([{"a": 1.0, "b": 2.0}])), &InputOptions::default())
            .expect_err("missing column");
        assert!(matches!(err, AdapterError::Frame(FrameError::MissingColumn(_))));
    }

    #[test]
    fn test_multi_target_rejected_for_training() {
        let settings =
            AdapterSettings::new().with_x(["a"]).with_y(vec!["b".to_string(), "c".to_string()]);
        let mut adapter = registry()
            .instantiate("aprender.linear_model.LinearRegression", settings)
            .expect("registered model");
        let err = adapter
            .input(
                &records(json!([{"a": 1.0, "b": 2.0, "c": 3.0}])),
                &InputOptions::default(),
            )
            .expect_err("only one target column is supported");
        assert!(matches!(err, AdapterError::MultiTarget(_)));
    }

    #[test]
    fn test_single_element_y_list_is_a_valid_target() {
        let settings = AdapterSettings::new().with_x(["a"]).with_y(vec!["b".to_string()]);
        let mut adapter = registry()
            .instantiate("aprender.linear_model.LinearRegression", settings)
            .expect("registered model");
        adapter
            .input(
                &records(json!([{"a": 1.0, "b": 2.0}, {"a": 2.0, "b": 4.0}])),
                &InputOptions::default(),
            )
            .expect("one-element list normalizes to a single target");
    }

    #[test]
    fn test_transform_output_uses_default_labels() {
        let mut adapter = registry()
            .instantiate("aprender.preprocessing.StandardScaler", AdapterSettings::new())
            .expect("registered model");

        let data = records(json!([
            {"a": 1.0, "b": 10.0},
            {"a": 2.0, "b": 20.0},
            {"a": 3.0, "b": 30.0},
        ]));
        adapter.input(&data, &InputOptions::default()).expect("fit succeeds");

        let out = adapter.output(&data, &OutputOptions::default()).expect("transform succeeds");
        assert_eq!(out.num_rows(), 3);
        assert_eq!(out.columns(), ["y0", "y1"]);
    }

    #[test]
    fn test_settings_deserialize_from_mapping() {
        let settings: AdapterSettings =
            serde_json::from_value(json!({"x": ["a", "b"], "y": "target"}))
                .expect("settings mapping");
        assert_eq!(settings.x, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(settings.y, Some(ColumnSelect::One("target".to_string())));

        let many: AdapterSettings = serde_json::from_value(json!({"y": ["p", "q"]}))
            .expect("list form");
        assert_eq!(
            many.y,
            Some(ColumnSelect::Many(vec!["p".to_string(), "q".to_string()]))
        );
    }
}

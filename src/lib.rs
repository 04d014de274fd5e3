//! Servir: uniform serving adapters for aprender models.
//!
//! Servir wraps aprender's model classes behind one adapter surface with
//! three operations — `input` (train), `output` (predict or transform), and
//! `update` (continued fit) — so a model-serving layer can drive any wrapped
//! class the same way: look a model up by qualified name, instantiate it with
//! a settings mapping, and feed it row-records per request.
//!
//! # Toyota Way: Heijunka (平準化)
//!
//! Level the interface, not the models: every wrapped class, from linear
//! regression to a scaler, is served through the same three calls, so the
//! layer above never grows per-model branches.
//!
//! # Architecture
//!
//! - [`manifest`]: static table of wrapped aprender classes (no runtime
//!   discovery; the manifest is version-pinned data)
//! - [`registry`]: read-only mapping from qualified name
//!   (`aprender.<module>.<ClassName>`) to an instantiable model class
//! - [`adapter`]: one generic [`Adapter`] parameterized by a backend
//!   strategy, instead of a synthesized type per class
//! - [`backend`]: the trainable-object seam over aprender estimators and
//!   transformers
//! - [`frame`]: columnar table bridging JSON row-records and aprender's
//!   `Matrix`/`Vector` primitives
//! - [`capability`]: typed capability flags; unsupported operations fail
//!   with a typed error rather than being absent
//!
//! # Quick Start
//!
//! ```
//! use servir::{AdapterSettings, InputOptions, ModelRegistry, OutputOptions, RegistryConfig};
//! use servir::frame::Record;
//!
//! // Build the registry once at startup.
//! let registry = ModelRegistry::from_config(&RegistryConfig::default())
//!     .expect("default config names only known modules");
//!
//! // Instantiate an adapter with default column settings.
//! let settings = AdapterSettings::new().with_x(["x"]).with_y("y");
//! let mut model = registry
//!     .instantiate("aprender.linear_model.LinearRegression", settings)
//!     .expect("registered model");
//!
//! // Train on row-records (y = 2x + 1).
//! let train: Vec<Record> = serde_json::from_value(serde_json::json!([
//!     {"x": 1.0, "y": 3.0},
//!     {"x": 2.0, "y": 5.0},
//!     {"x": 3.0, "y": 7.0},
//!     {"x": 4.0, "y": 9.0},
//! ]))
//! .expect("valid records");
//! model.input(&train, &InputOptions::default()).expect("training succeeds");
//!
//! // Predict.
//! let score: Vec<Record> =
//!     serde_json::from_value(serde_json::json!([{"x": 5.0}])).expect("valid records");
//! let out = model.output(&score, &OutputOptions::default()).expect("prediction succeeds");
//! let predicted = out.column("y").expect("labeled column").as_slice()[0];
//! assert!((predicted - 11.0).abs() < 1e-2);
//! ```
//!
//! # Concurrency
//!
//! The registry is immutable after construction and may be shared freely.
//! Each [`Adapter`] is single-owner mutable state; callers needing
//! concurrent access must serialize externally or hold one adapter per
//! execution context.

pub mod adapter;
pub mod backend;
pub mod capability;
pub mod frame;
pub mod manifest;
pub mod registry;

pub use adapter::{
    Adapter, AdapterError, AdapterSettings, ColumnSelect, InputOptions, OutputOptions,
    UpdateOptions,
};
pub use backend::{BackendError, FitOptions, Hyperparams, ModelBackend, OutputKind};
pub use capability::{Capability, CapabilitySet};
pub use frame::{Frame, FrameError, Record};
pub use registry::{ModelRegistry, ModelSpec, RegistryConfig, RegistryError};

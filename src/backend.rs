//! Model backend seam over aprender estimators.
//!
//! A [`ModelBackend`] is the opaque, trainable object an adapter owns: it can
//! be fitted against a feature matrix (with or without a target) and asked
//! for output. Whether output means prediction or transformation is static
//! per model class ([`OutputKind`]), recorded in the manifest rather than
//! probed at call time.
//!
//! Each built-in backend is a thin shim around one concrete aprender type.
//! Library failures pass through unmodified as [`BackendError::Library`];
//! there is no recovery at this layer.

use aprender::classification::LogisticRegression;
use aprender::cluster::KMeans;
use aprender::linear_model::{Lasso, LinearRegression, Ridge};
use aprender::prelude::*;
// aprender exports PCA from preprocessing; the manifest files it under
// decomposition, where the serving API presents it.
use aprender::preprocessing::{MinMaxScaler, StandardScaler, PCA};
use aprender::primitives::{Matrix, Vector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Library error: {0}")]
    Library(String),

    #[error("Target column required for supervised fit")]
    MissingTarget,

    #[error("Unknown hyperparameter: {0}")]
    UnknownHyperparam(String),

    #[error("Invalid value for hyperparameter '{0}'")]
    InvalidHyperparam(String),

    #[error("Unsupported fit option: {0}")]
    UnknownFitOption(String),
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Constructor arguments for an underlying model, keyed by parameter name.
pub type Hyperparams = serde_json::Map<String, Value>;

/// Options forwarded to the underlying fit call, keyed by option name.
///
/// aprender models configure fitting at construction, so the built-in
/// backends accept only an empty bag and reject any key with a typed error.
pub type FitOptions = serde_json::Map<String, Value>;

/// How a model class produces output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Supervised or cluster prediction: one output column.
    Predict,
    /// Data transformation: as many output columns as the model emits.
    Transform,
}

/// A trainable model object behind the adapter boundary.
///
/// Calling [`ModelBackend::fit`] on a freshly built backend is a full train;
/// calling it again on the same object is a continued fit on its state.
pub trait ModelBackend: Send {
    /// Fit against features and an optional target column.
    fn fit(&mut self, x: &Matrix<f32>, y: Option<&Vector<f32>>, opts: &FitOptions) -> Result<()>;

    /// Produce output for the given features.
    fn infer(&self, x: &Matrix<f32>) -> Result<Matrix<f32>>;

    /// How this backend's output is produced.
    fn output_kind(&self) -> OutputKind;
}

fn reject_fit_options(opts: &FitOptions) -> Result<()> {
    match opts.keys().next() {
        Some(key) => Err(BackendError::UnknownFitOption(key.clone())),
        None => Ok(()),
    }
}

fn column_matrix(values: &[f32]) -> Result<Matrix<f32>> {
    Matrix::from_vec(values.len(), 1, values.to_vec())
        .map_err(|e| BackendError::Library(e.to_string()))
}

/// Supervised estimator shim: requires a target, predicts one column.
macro_rules! supervised_backend {
    ($backend:ident, $model:ty) => {
        struct $backend {
            model: $model,
        }

        impl ModelBackend for $backend {
            fn fit(
                &mut self,
                x: &Matrix<f32>,
                y: Option<&Vector<f32>>,
                opts: &FitOptions,
            ) -> Result<()> {
                reject_fit_options(opts)?;
                let y = y.ok_or(BackendError::MissingTarget)?;
                self.model
                    .fit(x, y)
                    .map_err(|e| BackendError::Library(e.to_string()))?;
                Ok(())
            }

            fn infer(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
                let predictions = self.model.predict(x);
                column_matrix(predictions.as_slice())
            }

            fn output_kind(&self) -> OutputKind {
                OutputKind::Predict
            }
        }
    };
}

/// Classifier shim: the target column carries integer class labels, so the
/// f32 targets convert to usize for fit and predicted labels convert back.
macro_rules! classifier_backend {
    ($backend:ident, $model:ty) => {
        struct $backend {
            model: $model,
        }

        impl ModelBackend for $backend {
            fn fit(
                &mut self,
                x: &Matrix<f32>,
                y: Option<&Vector<f32>>,
                opts: &FitOptions,
            ) -> Result<()> {
                reject_fit_options(opts)?;
                let y = y.ok_or(BackendError::MissingTarget)?;
                let classes: Vec<usize> = y.as_slice().iter().map(|&v| v as usize).collect();
                self.model
                    .fit(x, &classes)
                    .map_err(|e| BackendError::Library(e.to_string()))?;
                Ok(())
            }

            fn infer(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
                let labels = self.model.predict(x);
                let values: Vec<f32> = labels.iter().map(|&l| l as f32).collect();
                column_matrix(&values)
            }

            fn output_kind(&self) -> OutputKind {
                OutputKind::Predict
            }
        }
    };
}

/// Cluster estimator shim: unsupervised fit, predicts one label column.
macro_rules! cluster_backend {
    ($backend:ident, $model:ty) => {
        struct $backend {
            model: $model,
        }

        impl ModelBackend for $backend {
            fn fit(
                &mut self,
                x: &Matrix<f32>,
                _y: Option<&Vector<f32>>,
                opts: &FitOptions,
            ) -> Result<()> {
                reject_fit_options(opts)?;
                self.model
                    .fit(x)
                    .map_err(|e| BackendError::Library(e.to_string()))?;
                Ok(())
            }

            fn infer(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
                let labels = self.model.predict(x);
                let values: Vec<f32> = labels.as_slice().iter().map(|&l| l as f32).collect();
                column_matrix(&values)
            }

            fn output_kind(&self) -> OutputKind {
                OutputKind::Predict
            }
        }
    };
}

/// Transformer shim: unsupervised fit, transforms to a full matrix.
macro_rules! transformer_backend {
    ($backend:ident, $model:ty) => {
        struct $backend {
            model: $model,
        }

        impl ModelBackend for $backend {
            fn fit(
                &mut self,
                x: &Matrix<f32>,
                _y: Option<&Vector<f32>>,
                opts: &FitOptions,
            ) -> Result<()> {
                reject_fit_options(opts)?;
                self.model
                    .fit(x)
                    .map_err(|e| BackendError::Library(e.to_string()))?;
                Ok(())
            }

            fn infer(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
                self.model
                    .transform(x)
                    .map_err(|e| BackendError::Library(e.to_string()))
            }

            fn output_kind(&self) -> OutputKind {
                OutputKind::Transform
            }
        }
    };
}

supervised_backend!(LinearRegressionBackend, LinearRegression);
supervised_backend!(RidgeBackend, Ridge);
supervised_backend!(LassoBackend, Lasso);
classifier_backend!(LogisticRegressionBackend, LogisticRegression);
cluster_backend!(KMeansBackend, KMeans);
transformer_backend!(StandardScalerBackend, StandardScaler);
transformer_backend!(MinMaxScalerBackend, MinMaxScaler);
transformer_backend!(PcaBackend, PCA);

// -----------------------------------------------------------------------------
// Hyperparameter plumbing
// -----------------------------------------------------------------------------

fn check_known(params: &Hyperparams, known: &[&str]) -> Result<()> {
    for key in params.keys() {
        if !known.contains(&key.as_str()) {
            return Err(BackendError::UnknownHyperparam(key.clone()));
        }
    }
    Ok(())
}

fn f32_param(params: &Hyperparams, key: &str) -> Result<Option<f32>> {
    match params.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(|v| Some(v as f32))
            .ok_or_else(|| BackendError::InvalidHyperparam(key.to_string())),
    }
}

fn usize_param(params: &Hyperparams, key: &str) -> Result<Option<usize>> {
    match params.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| BackendError::InvalidHyperparam(key.to_string())),
    }
}

// -----------------------------------------------------------------------------
// Manifest constructors
// -----------------------------------------------------------------------------

pub(crate) fn linear_regression(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &[])?;
    Ok(Box::new(LinearRegressionBackend { model: LinearRegression::new() }))
}

pub(crate) fn ridge(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &["alpha"])?;
    let alpha = f32_param(params, "alpha")?.unwrap_or(1.0);
    Ok(Box::new(RidgeBackend { model: Ridge::new(alpha) }))
}

pub(crate) fn lasso(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &["alpha"])?;
    let alpha = f32_param(params, "alpha")?.unwrap_or(1.0);
    Ok(Box::new(LassoBackend { model: Lasso::new(alpha) }))
}

pub(crate) fn logistic_regression(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &[])?;
    Ok(Box::new(LogisticRegressionBackend { model: LogisticRegression::new() }))
}

pub(crate) fn kmeans(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &["n_clusters"])?;
    let n_clusters = usize_param(params, "n_clusters")?.unwrap_or(8);
    Ok(Box::new(KMeansBackend { model: KMeans::new(n_clusters) }))
}

pub(crate) fn standard_scaler(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &[])?;
    Ok(Box::new(StandardScalerBackend { model: StandardScaler::new() }))
}

pub(crate) fn min_max_scaler(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &[])?;
    Ok(Box::new(MinMaxScalerBackend { model: MinMaxScaler::new() }))
}

pub(crate) fn pca(params: &Hyperparams) -> Result<Box<dyn ModelBackend>> {
    check_known(params, &["n_components"])?;
    let n_components = usize_param(params, "n_components")?.unwrap_or(2);
    Ok(Box::new(PcaBackend { model: PCA::new(n_components) }))
}

// =============================================================================
// Tests
// =============================================================================

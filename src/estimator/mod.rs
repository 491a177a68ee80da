pub mod forest;
pub mod tree;

use crate::config::ModelParameters;
use crate::errors::ModelError;
use crate::estimator::forest::{ForestClassifier, ForestRegressor};

/// Fit/predict capability over rows of numeric features.
///
/// Feature building, evaluation and forecasting only see this trait and ask a
/// [`ModelFactory`] for fresh instances, so the ensemble technique can be
/// swapped without touching them.
pub trait Estimator<T> {
    /// Fits the estimator to training rows and their targets
    ///
    /// # Arguments
    ///
    /// * 'x' - feature rows, all of the same width
    /// * 'y' - one target per row
    fn fit(&mut self, x: &[Vec<f64>], y: &[T]) -> Result<(), ModelError>;

    /// Predicts one target per feature row
    ///
    /// # Arguments
    ///
    /// * 'x' - feature rows with the same width as used when fitting
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<T>, ModelError>;

    /// Convenience for predicting a single row
    ///
    /// # Arguments
    ///
    /// * 'row' - feature row
    fn predict_one(&self, row: Vec<f64>) -> Result<T, ModelError> {
        self.predict(&[row])?
            .pop()
            .ok_or(ModelError::Input("no prediction returned".to_string()))
    }
}

/// Produces unfitted classifiers and regressors
pub trait ModelFactory {
    type Classifier: Estimator<usize>;
    type Regressor: Estimator<f64>;

    fn classifier(&self) -> Self::Classifier;
    fn regressor(&self) -> Self::Regressor;
}

/// Factory for seeded bagged decision tree ensembles
#[derive(Clone, Debug)]
pub struct ForestFactory {
    params: ModelParameters,
}

impl ForestFactory {
    pub fn new(params: ModelParameters) -> ForestFactory {
        ForestFactory { params }
    }
}

impl ModelFactory for ForestFactory {
    type Classifier = ForestClassifier;
    type Regressor = ForestRegressor;

    fn classifier(&self) -> ForestClassifier {
        ForestClassifier::new(self.params.n_trees, self.params.seed)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_leaf(self.params.min_samples_leaf)
    }

    fn regressor(&self) -> ForestRegressor {
        ForestRegressor::new(self.params.n_trees, self.params.seed)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_leaf(self.params.min_samples_leaf)
    }
}

/// Checks that the training set is non-empty, rectangular and matches the target count.
/// Returns the number of features.
///
/// # Arguments
///
/// * 'x' - feature rows
/// * 'n_targets' - number of targets supplied with the rows
pub(crate) fn check_training_input(x: &[Vec<f64>], n_targets: usize) -> Result<usize, ModelError> {
    if x.is_empty() {
        return Err(ModelError::Input("empty training set".to_string()));
    }
    if x.len() != n_targets {
        return Err(ModelError::Input(format!("{} rows but {} targets", x.len(), n_targets)));
    }
    let n_features = x[0].len();
    if n_features == 0 || x.iter().any(|r| r.len() != n_features) {
        return Err(ModelError::Input("feature rows must share a non-zero width".to_string()));
    }
    if x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ModelError::Input("feature values must be finite".to_string()));
    }

    Ok(n_features)
}

/// Checks that rows to predict have the width the model was fitted with
///
/// # Arguments
///
/// * 'x' - feature rows
/// * 'n_features' - width seen when fitting
pub(crate) fn check_prediction_input(x: &[Vec<f64>], n_features: usize) -> Result<(), ModelError> {
    match x.iter().find(|r| r.len() != n_features) {
        Some(r) => Err(ModelError::Input(format!("expected {} features, got {}", n_features, r.len()))),
        None => Ok(()),
    }
}

use crate::errors::EvaluationError;
use crate::estimator::{Estimator, ModelFactory};
use crate::features::{CityFeatures, FeatureRow};
use crate::models::performance::EvaluationRecord;

/// Splits rows in time order, the last 'test_fraction' of the rows (rounded) becomes the test set.
/// Both sides always get at least one row.
///
/// # Arguments
///
/// * 'rows' - feature rows sorted by date
/// * 'test_fraction' - share of rows held out for testing
pub fn chronological_split(rows: &[FeatureRow], test_fraction: f64) -> Result<(&[FeatureRow], &[FeatureRow]), EvaluationError> {
    let n = rows.len();
    if n < 2 {
        return Err(EvaluationError::TooFewRows(n));
    }
    let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);

    Ok(rows.split_at(n - n_test))
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum::<f64>() / actual.len() as f64
}

pub fn accuracy_percent(actual: &[usize], predicted: &[usize]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    100.0 * correct as f64 / actual.len() as f64
}

/// Scores a city's models on the most recent part of its history.
///
/// The models fitted here are throwaway models, they are dropped once the
/// record is produced and never used for forecasting.
pub struct Evaluator<'a, F: ModelFactory> {
    factory: &'a F,
    test_fraction: f64,
}

impl<'a, F: ModelFactory> Evaluator<'a, F> {
    /// Returns a new Evaluator
    ///
    /// # Arguments
    ///
    /// * 'factory' - source of unfitted models
    /// * 'test_fraction' - share of rows held out for testing
    pub fn new(factory: &'a F, test_fraction: f64) -> Evaluator<'a, F> {
        Evaluator { factory, test_fraction }
    }

    /// Fits a two-way condition classifier and a max temperature regressor on the
    /// older rows and scores them on the newer ones
    ///
    /// # Arguments
    ///
    /// * 'features' - the city's features
    pub fn evaluate(&self, features: &CityFeatures) -> Result<EvaluationRecord, EvaluationError> {
        let (train, test) = chronological_split(&features.rows, self.test_fraction)?;

        let mut classifier = self.factory.classifier();
        classifier.fit(
            &train.iter().map(|r| r.condition_input()).collect::<Vec<_>>(),
            &train.iter().map(|r| r.simple_condition.class()).collect::<Vec<_>>(),
        )?;
        let predicted_conditions = classifier.predict(&test.iter().map(|r| r.condition_input()).collect::<Vec<_>>())?;

        let mut regressor = self.factory.regressor();
        regressor.fit(
            &train.iter().map(|r| r.temperature_input()).collect::<Vec<_>>(),
            &train.iter().map(|r| r.max_temp).collect::<Vec<_>>(),
        )?;
        let predicted_max = regressor.predict(&test.iter().map(|r| r.temperature_input()).collect::<Vec<_>>())?;

        let actual_conditions = test.iter().map(|r| r.simple_condition.class()).collect::<Vec<_>>();
        let actual_max = test.iter().map(|r| r.max_temp).collect::<Vec<_>>();

        Ok(EvaluationRecord {
            city: features.city.clone(),
            temperature_mean_absolute_error: mean_absolute_error(&actual_max, &predicted_max),
            condition_accuracy_percent: accuracy_percent(&actual_conditions, &predicted_conditions),
        })
    }
}

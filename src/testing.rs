use chrono::{Datelike, NaiveDate, TimeDelta};
use crate::config::ModelParameters;
use crate::errors::ModelError;
use crate::estimator::{Estimator, ForestFactory, ModelFactory};
use crate::models::observation::DailyObservation;

pub fn observation(city: &str, date: &str, max_temp: Option<f64>, min_temp: Option<f64>, precipitation: Option<f64>) -> DailyObservation {
    DailyObservation {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        city: city.to_string(),
        max_temp,
        min_temp,
        humidity: Some(60.0),
        pressure: Some(1010.0),
        precipitation,
    }
}

/// Complete daily history starting 2023-01-01 with a seasonal temperature cycle,
/// a small deterministic wobble and a repeating precipitation pattern covering all four conditions
///
/// # Arguments
///
/// * 'city' - city name stamped on every row
/// * 'days' - number of days to generate
pub fn synthetic_history(city: &str, days: usize) -> Vec<DailyObservation> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

    (0..days)
        .map(|i| {
            let date = start + TimeDelta::days(i as i64);
            let season = (date.ordinal() as f64 / 365.0 * std::f64::consts::TAU).sin();
            let wobble = ((i * 37) % 11) as f64 * 0.2;
            let max_temp = 30.0 + 6.0 * season + wobble;
            let precipitation = match (i * 13) % 17 {
                0..=8 => 0.0,
                9..=12 => 1.5,
                13..=15 => 10.0,
                _ => 40.0,
            };

            DailyObservation {
                date,
                city: city.to_string(),
                max_temp: Some(max_temp),
                min_temp: Some(max_temp - 10.0 - wobble / 2.0),
                humidity: Some(60.0),
                pressure: Some(1010.0),
                precipitation: Some(precipitation),
            }
        })
        .collect()
}

/// Predicts the mean of the training targets
#[derive(Default)]
pub struct MeanRegressor {
    mean: Option<f64>,
}

impl Estimator<f64> for MeanRegressor {
    fn fit(&mut self, _x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        self.mean = Some(y.iter().sum::<f64>() / y.len() as f64);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let mean = self.mean.ok_or(ModelError::NotFitted)?;
        Ok(vec![mean; x.len()])
    }
}

/// Predicts the most frequent training class, ties to the smallest
#[derive(Default)]
pub struct MajorityClassifier {
    class: Option<usize>,
}

impl Estimator<usize> for MajorityClassifier {
    fn fit(&mut self, _x: &[Vec<f64>], y: &[usize]) -> Result<(), ModelError> {
        let n_classes = y.iter().max().map_or(0, |m| m + 1);
        let mut counts = vec![0; n_classes];
        y.iter().for_each(|&c| counts[c] += 1);
        self.class = (0..n_classes).rev().max_by_key(|&c| counts[c]);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<usize>, ModelError> {
        let class = self.class.ok_or(ModelError::NotFitted)?;
        Ok(vec![class; x.len()])
    }
}

pub struct StubFactory;

impl ModelFactory for StubFactory {
    type Classifier = MajorityClassifier;
    type Regressor = MeanRegressor;

    fn classifier(&self) -> MajorityClassifier {
        MajorityClassifier::default()
    }

    fn regressor(&self) -> MeanRegressor {
        MeanRegressor::default()
    }
}

/// Always predicts the same class
pub struct ConstantClassifier(pub usize);

impl Estimator<usize> for ConstantClassifier {
    fn fit(&mut self, _x: &[Vec<f64>], _y: &[usize]) -> Result<(), ModelError> {
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<usize>, ModelError> {
        Ok(vec![self.0; x.len()])
    }
}

/// Predicts one input column plus an offset
pub struct ColumnRegressor {
    pub column: usize,
    pub offset: f64,
}

impl Estimator<f64> for ColumnRegressor {
    fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> Result<(), ModelError> {
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        Ok(x.iter().map(|r| r[self.column] + self.offset).collect())
    }
}

/// Small forests so tests stay quick
pub fn small_forest() -> ForestFactory {
    ForestFactory::new(ModelParameters { n_trees: 10, ..ModelParameters::default() })
}

use chrono::{Datelike, NaiveDate, TimeDelta};
use log::debug;
use crate::conditions::{ConditionCodes, IconTable};
use crate::errors::{ForecastError, ModelError};
use crate::estimator::{Estimator, ModelFactory};
use crate::features::{condition_input, temperature_input, CityFeatures, DailyNormals, FeatureRow, TemperatureState};
use crate::models::forecast::ForecastStep;

/// The three models used for forecasting, all fitted on the full history
pub struct ProductionModels<C, R> {
    pub condition: C,
    pub max_temp: R,
    pub min_temp: R,
}

impl<C: Estimator<usize>, R: Estimator<f64>> ProductionModels<C, R> {
    /// Fits a four-way condition classifier and max/min temperature regressors on all rows
    ///
    /// # Arguments
    ///
    /// * 'factory' - source of unfitted models
    /// * 'rows' - the city's complete feature history
    pub fn fit<F>(factory: &F, rows: &[FeatureRow]) -> Result<Self, ModelError>
    where
        F: ModelFactory<Classifier = C, Regressor = R>,
    {
        let condition_x = rows.iter().map(|r| r.condition_input()).collect::<Vec<_>>();
        let temperature_x = rows.iter().map(|r| r.temperature_input()).collect::<Vec<_>>();

        let mut condition = factory.classifier();
        condition.fit(&condition_x, &rows.iter().map(|r| r.condition_code).collect::<Vec<_>>())?;

        let mut max_temp = factory.regressor();
        max_temp.fit(&temperature_x, &rows.iter().map(|r| r.max_temp).collect::<Vec<_>>())?;

        let mut min_temp = factory.regressor();
        min_temp.fit(&temperature_x, &rows.iter().map(|r| r.min_temp).collect::<Vec<_>>())?;

        Ok(ProductionModels { condition, max_temp, min_temp })
    }
}

/// Autoregressive rollout.
///
/// Production models are fitted on the whole history, then the engine walks
/// forward one day at a time. Each step's predicted temperatures become the lag
/// input of the next step, so the rollout is a fold carrying a
/// [`TemperatureState`] rather than a set of independent predictions.
pub struct ForecastEngine<'a> {
    codes: &'a ConditionCodes,
    icons: &'a IconTable,
    horizon_days: usize,
}

impl<'a> ForecastEngine<'a> {
    /// Returns a new ForecastEngine
    ///
    /// # Arguments
    ///
    /// * 'codes' - condition code mapping used to decode predictions
    /// * 'icons' - condition name to icon lookup
    /// * 'horizon_days' - number of days to forecast
    pub fn new(codes: &'a ConditionCodes, icons: &'a IconTable, horizon_days: usize) -> ForecastEngine<'a> {
        ForecastEngine { codes, icons, horizon_days }
    }

    /// Fits production models on the full history and forecasts the days following 'today'
    ///
    /// # Arguments
    ///
    /// * 'factory' - source of unfitted models
    /// * 'features' - the city's features
    /// * 'today' - the last day before the forecast horizon
    pub fn forecast<F: ModelFactory>(&self, factory: &F, features: &CityFeatures, today: NaiveDate) -> Result<Vec<ForecastStep>, ForecastError> {
        let models = ProductionModels::fit(factory, &features.rows)?;
        self.rollout(&models, features, today)
    }

    /// Runs the rollout with already fitted models, starting from the last known actual temperatures
    ///
    /// # Arguments
    ///
    /// * 'models' - fitted production models
    /// * 'features' - the city's features
    /// * 'today' - the last day before the forecast horizon
    pub fn rollout<C, R>(&self, models: &ProductionModels<C, R>, features: &CityFeatures, today: NaiveDate) -> Result<Vec<ForecastStep>, ForecastError>
    where
        C: Estimator<usize>,
        R: Estimator<f64>,
    {
        let (steps, _) = (1..=self.horizon_days).try_fold(
            (Vec::with_capacity(self.horizon_days), features.last_known),
            |(mut steps, state), offset| {
                let forecast_date = today + TimeDelta::days(offset as i64);
                let (step, next) = self.step(models, &features.city, &features.normals, state, forecast_date)?;
                steps.push(step);
                Ok::<_, ForecastError>((steps, next))
            },
        )?;

        Ok(steps)
    }

    /// Forecasts a single day and returns it together with the state for the next day
    ///
    /// # Arguments
    ///
    /// * 'models' - fitted production models
    /// * 'city' - city to stamp on the step
    /// * 'normals' - the city's normals
    /// * 'state' - temperatures of the previous day, actual or predicted
    /// * 'forecast_date' - the day to forecast
    pub fn step<C, R>(&self, models: &ProductionModels<C, R>, city: &str, normals: &DailyNormals, state: TemperatureState, forecast_date: NaiveDate)
        -> Result<(ForecastStep, TemperatureState), ForecastError>
    where
        C: Estimator<usize>,
        R: Estimator<f64>,
    {
        let day_of_year = forecast_date.ordinal();
        let (normal_day, normal) = normals.resolve(day_of_year).ok_or(ForecastError::NoNormals(forecast_date))?;
        if normal_day != day_of_year {
            debug!("{}: no normal for day {}, using day {}", city, day_of_year, normal_day);
        }

        let condition_code = models.condition.predict_one(condition_input(state, &normal))?;
        let temp_input = temperature_input(state, &normal, condition_code);
        let max_temp = models.max_temp.predict_one(temp_input.clone())?;
        let min_temp = models.min_temp.predict_one(temp_input)?;

        let condition = self.codes.decode(condition_code);
        let step = ForecastStep {
            city: city.to_string(),
            forecast_date,
            predicted_max_temp: max_temp,
            predicted_min_temp: min_temp,
            predicted_condition: condition.to_string(),
            condition_icon_reference: self.icons.icon_for(condition).to_string(),
        };
        debug!("{}: {} max {:.1} min {:.1} {}", city, forecast_date, max_temp, min_temp, condition);

        Ok((step, TemperatureState { max_temp, min_temp }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::conditions::UNKNOWN_CONDITION;
    use crate::features::{FeatureBuilder, Normal};
    use crate::testing::{small_forest, synthetic_history, ColumnRegressor, ConstantClassifier, StubFactory};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn features(days: usize) -> CityFeatures {
        FeatureBuilder::new(ConditionCodes::default(), 365)
            .build("Mumbai", &synthetic_history("Mumbai", days))
            .unwrap()
    }

    /// Max follows yesterday's max + 1, min echoes the normal min
    fn echo_models(code: usize) -> ProductionModels<ConstantClassifier, ColumnRegressor> {
        ProductionModels {
            condition: ConstantClassifier(code),
            max_temp: ColumnRegressor { column: 0, offset: 1.0 },
            min_temp: ColumnRegressor { column: 3, offset: 0.0 },
        }
    }

    #[test]
    fn thirty_consecutive_days() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        let today = date("2026-10-16");
        let steps = ForecastEngine::new(&codes, &icons, 30)
            .forecast(&small_forest(), &features(400), today)
            .unwrap();

        assert_eq!(steps.len(), 30);
        assert_eq!(steps[0].forecast_date, date("2026-10-17"));
        for pair in steps.windows(2) {
            assert_eq!(pair[1].forecast_date, pair[0].forecast_date + TimeDelta::days(1));
        }
        assert!(steps.iter().all(|s| s.city == "Mumbai" && s.predicted_max_temp.is_finite()));
    }

    #[test]
    fn identical_runs_are_bit_identical() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        let features = features(400);
        let engine = ForecastEngine::new(&codes, &icons, 30);
        let a = engine.forecast(&small_forest(), &features, date("2026-10-16")).unwrap();
        let b = engine.forecast(&small_forest(), &features, date("2026-10-16")).unwrap();

        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.predicted_max_temp.to_bits(), y.predicted_max_temp.to_bits());
            assert_eq!(x.predicted_min_temp.to_bits(), y.predicted_min_temp.to_bits());
            assert_eq!(x.predicted_condition, y.predicted_condition);
        }
    }

    #[test]
    fn production_models_see_the_whole_history() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        let features = features(400);
        let steps = ForecastEngine::new(&codes, &icons, 30)
            .forecast(&StubFactory, &features, date("2026-10-16"))
            .unwrap();

        let mean = |rows: &[FeatureRow]| rows.iter().map(|r| r.max_temp).sum::<f64>() / rows.len() as f64;
        let all_rows = mean(&features.rows);
        let older_rows = mean(&features.rows[..features.rows.len() * 4 / 5]);

        assert!((all_rows - older_rows).abs() > 1e-6);
        for step in &steps {
            assert_relative_eq!(step.predicted_max_temp, all_rows);
        }
    }

    #[test]
    fn predictions_feed_the_next_step() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        let features = features(400);
        let steps = ForecastEngine::new(&codes, &icons, 30)
            .rollout(&echo_models(2), &features, date("2026-10-16"))
            .unwrap();

        for (i, step) in steps.iter().enumerate() {
            assert_relative_eq!(step.predicted_max_temp, features.last_known.max_temp + (i + 1) as f64);
        }
        assert_eq!(steps[0].predicted_condition, "Moderate Rain");
        assert_eq!(steps[0].condition_icon_reference, "https://cdn.weatherapi.com/weather/64x64/day/302.png");
    }

    #[test]
    fn single_step_in_isolation() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        let normals = vec![(46, Normal { max_temp: 25.0, min_temp: 12.0 })].into_iter().collect::<DailyNormals>();
        let state = TemperatureState { max_temp: 20.0, min_temp: 9.0 };

        let (step, next) = ForecastEngine::new(&codes, &icons, 30)
            .step(&echo_models(3), "Kolkata", &normals, state, date("2026-02-15"))
            .unwrap();

        assert_eq!(step.predicted_condition, "Heavy Rain");
        assert_eq!(step.condition_icon_reference, "https://cdn.weatherapi.com/weather/64x64/day/308.png");
        assert_eq!(next, TemperatureState { max_temp: 21.0, min_temp: 12.0 });
    }

    #[test]
    fn missing_leap_day_uses_new_year_normals() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        // 2023-01-01 + 400 days never reaches a day 366
        let features = features(400);
        assert!(features.normals.get(366).is_none());

        let steps = ForecastEngine::new(&codes, &icons, 3)
            .rollout(&echo_models(0), &features, date("2024-12-30"))
            .unwrap();

        assert_eq!(steps[0].forecast_date, date("2024-12-31"));
        assert_relative_eq!(steps[0].predicted_min_temp, features.normals.get(1).unwrap().min_temp);
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn unmapped_code_is_unknown_with_default_icon() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        let steps = ForecastEngine::new(&codes, &icons, 2)
            .rollout(&echo_models(9), &features(400), date("2026-10-16"))
            .unwrap();

        assert_eq!(steps[0].predicted_condition, UNKNOWN_CONDITION);
        assert_eq!(steps[0].condition_icon_reference, icons.default_icon);
    }

    #[test]
    fn no_normals_at_all_is_an_error() {
        let codes = ConditionCodes::default();
        let icons = IconTable::default();
        let state = TemperatureState { max_temp: 20.0, min_temp: 9.0 };
        let result = ForecastEngine::new(&codes, &icons, 30)
            .step(&echo_models(0), "Kolkata", &DailyNormals::default(), state, date("2026-02-15"));

        assert_eq!(result.unwrap_err(), ForecastError::NoNormals(date("2026-02-15")));
    }
}

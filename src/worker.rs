use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use crate::aggregation::{CityOutcome, ForecastReport, ResultAggregator};
use crate::conditions::{ConditionCodes, IconTable};
use crate::config::ForecastParameters;
use crate::errors::CityError;
use crate::estimator::ModelFactory;
use crate::evaluation::Evaluator;
use crate::features::FeatureBuilder;
use crate::forecasting::ForecastEngine;
use crate::manager_history::{CityHistory, HistoryStore};
use crate::manager_results::ResultSink;

/// Counts of how the cities of a run went
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Per city pipeline: features, evaluation and forecast
pub struct Pipeline<'a, F: ModelFactory> {
    params: &'a ForecastParameters,
    codes: &'a ConditionCodes,
    icons: &'a IconTable,
    factory: &'a F,
    today: NaiveDate,
}

impl<'a, F: ModelFactory> Pipeline<'a, F> {
    /// Returns a new Pipeline
    ///
    /// # Arguments
    ///
    /// * 'params' - forecast parameters from configuration
    /// * 'codes' - condition code mapping
    /// * 'icons' - condition icon lookup
    /// * 'factory' - source of unfitted models
    /// * 'today' - the day the forecast horizon starts after
    pub fn new(params: &'a ForecastParameters, codes: &'a ConditionCodes, icons: &'a IconTable, factory: &'a F, today: NaiveDate) -> Pipeline<'a, F> {
        Pipeline { params, codes, icons, factory, today }
    }

    /// Loads all history, processes every city and hands the aggregated report to the sink.
    /// A city that fails is logged and left out, it never stops the run.
    ///
    /// # Arguments
    ///
    /// * 'store' - source of the history
    /// * 'sink' - destination of the results
    pub fn run(&self, store: &dyn HistoryStore, sink: &dyn ResultSink) -> Result<(RunSummary, ForecastReport)> {
        let histories = store.load().context("loading history")?;
        info!("Found {} cities to process, forecasting from {}", histories.len(), self.today);

        let (summary, report) = self.process_all(&histories);

        sink.store(&report).context("saving results")?;
        info!("Saved {} forecast rows, {} averages and {} evaluations",
            report.seven_day.len(), report.thirty_day.len(), report.performance.len());
        info!("Run finished: {} processed, {} skipped, {} failed", summary.processed, summary.skipped, summary.failed);

        Ok((summary, report))
    }

    /// Processes cities one at a time and aggregates the outcomes
    ///
    /// # Arguments
    ///
    /// * 'histories' - history per city
    pub fn process_all(&self, histories: &[CityHistory]) -> (RunSummary, ForecastReport) {
        let mut summary = RunSummary::default();
        let mut aggregator = ResultAggregator::new(self.params.detail_days);

        for history in histories {
            match self.process_city(history) {
                Ok(outcome) => {
                    aggregator.add(outcome);
                    summary.processed += 1;
                }
                Err(e) if e.is_skip() => {
                    warn!("Skipping {}: {}", history.city, e);
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!("Processing {} failed: {}", history.city, e);
                    summary.failed += 1;
                }
            }
        }

        (summary, aggregator.finish())
    }

    /// Runs features, evaluation and forecast for one city
    ///
    /// # Arguments
    ///
    /// * 'history' - the city's history
    pub fn process_city(&self, history: &CityHistory) -> Result<CityOutcome, CityError> {
        info!("Processing forecast and evaluation for {}", history.city);

        let builder = FeatureBuilder::new(self.codes.clone(), self.params.min_history_days);
        let features = builder.build(&history.city, &history.observations)?;
        debug!("{}: {} feature rows, normals for {} days", history.city, features.rows.len(), features.normals.len());

        let evaluation = Evaluator::new(self.factory, self.params.test_fraction).evaluate(&features)?;
        info!("{}: evaluation complete, MAE={:.2}°C, accuracy={:.2}%",
            history.city, evaluation.temperature_mean_absolute_error, evaluation.condition_accuracy_percent);

        let engine = ForecastEngine::new(self.codes, self.icons, self.params.horizon_days);
        let forecast = engine.forecast(self.factory, &features, self.today)?;
        info!("{}: {} day forecast done", history.city, forecast.len());

        Ok(CityOutcome { city: history.city.clone(), forecast, evaluation })
    }
}

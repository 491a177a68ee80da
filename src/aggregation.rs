use crate::models::forecast::{ForecastStep, ThirtyDayAverage};
use crate::models::performance::EvaluationRecord;

/// What a successfully processed city contributes to the run
#[derive(Clone, Debug)]
pub struct CityOutcome {
    pub city: String,
    pub forecast: Vec<ForecastStep>,
    pub evaluation: EvaluationRecord,
}

/// The three record sets handed to the result sink
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastReport {
    pub seven_day: Vec<ForecastStep>,
    pub thirty_day: Vec<ThirtyDayAverage>,
    pub performance: Vec<EvaluationRecord>,
}

/// Collects city outcomes, in processing order, into a report
pub struct ResultAggregator {
    detail_days: usize,
    report: ForecastReport,
}

impl ResultAggregator {
    /// Returns a new, empty, ResultAggregator
    ///
    /// # Arguments
    ///
    /// * 'detail_days' - number of leading forecast days kept as detail rows
    pub fn new(detail_days: usize) -> ResultAggregator {
        ResultAggregator { detail_days, report: ForecastReport::default() }
    }

    /// Adds one city's outcome
    ///
    /// # Arguments
    ///
    /// * 'outcome' - the city's forecast and evaluation
    pub fn add(&mut self, outcome: CityOutcome) {
        if let Some(average) = average_max_temp(&outcome.forecast) {
            self.report.thirty_day.push(ThirtyDayAverage {
                city: outcome.city.clone(),
                predicted_30_day_avg_temp: average,
            });
        }
        self.report.seven_day.extend(outcome.forecast.into_iter().take(self.detail_days));
        self.report.performance.push(outcome.evaluation);
    }

    pub fn finish(self) -> ForecastReport {
        self.report
    }
}

/// Mean predicted max temperature over the whole horizon
fn average_max_temp(forecast: &[ForecastStep]) -> Option<f64> {
    if forecast.is_empty() {
        None
    } else {
        Some(forecast.iter().map(|s| s.predicted_max_temp).sum::<f64>() / forecast.len() as f64)
    }
}

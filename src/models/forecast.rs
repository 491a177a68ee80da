use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single day of the autoregressive rollout for one city
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ForecastStep {
    pub city: String,
    pub forecast_date: NaiveDate,
    pub predicted_max_temp: f64,
    pub predicted_min_temp: f64,
    pub predicted_condition: String,
    pub condition_icon_reference: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ThirtyDayAverage {
    pub city: String,
    pub predicted_30_day_avg_temp: f64,
}

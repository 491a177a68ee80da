use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of observed weather for a city as delivered by the history store.
///
/// Temperature and precipitation may be missing for days the archive has not
/// consolidated yet, such rows never make it into a feature row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub city: String,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(alias = "chance_of_rain")]
    pub precipitation: Option<f64>,
}

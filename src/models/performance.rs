use serde::{Deserialize, Serialize};

/// Held-out accuracy of the throwaway evaluation models for one city
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EvaluationRecord {
    pub city: String,
    #[serde(rename = "temperature_mae_celsius")]
    pub temperature_mean_absolute_error: f64,
    pub condition_accuracy_percent: f64,
}

use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::aggregation::ForecastReport;
use crate::errors::SinkError;
use crate::models::forecast::{ForecastStep, ThirtyDayAverage};
use crate::models::performance::EvaluationRecord;

pub const SEVEN_DAY_FILE: &str = "forecast_7day.json";
pub const THIRTY_DAY_FILE: &str = "forecast_30day_avg.json";
pub const PERFORMANCE_FILE: &str = "model_performance.json";

/// Destination of the three output record sets, each call replaces what was stored before
pub trait ResultSink {
    fn replace_seven_day(&self, rows: &[ForecastStep]) -> Result<(), SinkError>;
    fn replace_thirty_day(&self, rows: &[ThirtyDayAverage]) -> Result<(), SinkError>;
    fn replace_performance(&self, rows: &[EvaluationRecord]) -> Result<(), SinkError>;

    /// Stores all three record sets of a report
    ///
    /// # Arguments
    ///
    /// * 'report' - the aggregated run results
    fn store(&self, report: &ForecastReport) -> Result<(), SinkError> {
        self.replace_seven_day(&report.seven_day)?;
        self.replace_thirty_day(&report.thirty_day)?;
        self.replace_performance(&report.performance)
    }
}

/// Result sink writing pretty printed JSON files into an output directory
pub struct JsonResultSink {
    output_dir: PathBuf,
}

impl JsonResultSink {
    /// Returns a new JsonResultSink
    ///
    /// # Arguments
    ///
    /// * 'output_dir' - directory to write result files to, created if missing
    pub fn new(output_dir: &str) -> JsonResultSink {
        JsonResultSink { output_dir: PathBuf::from(output_dir) }
    }

    /// Writes rows to a temp file and renames it over the target so a failed
    /// write never leaves a half written file behind
    ///
    /// # Arguments
    ///
    /// * 'file_name' - name of the file within the output directory
    /// * 'rows' - the records to write
    fn replace<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<(), SinkError> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| SinkError::Unavailable(format!("{}: {}", self.output_dir.display(), e)))?;

        let json = serde_json::to_string_pretty(rows)?;
        let target = self.output_dir.join(file_name);
        let tmp = self.output_dir.join(format!("{}.tmp", file_name));

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &target)?;

        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ResultSink for JsonResultSink {
    fn replace_seven_day(&self, rows: &[ForecastStep]) -> Result<(), SinkError> {
        self.replace(SEVEN_DAY_FILE, rows)
    }

    fn replace_thirty_day(&self, rows: &[ThirtyDayAverage]) -> Result<(), SinkError> {
        self.replace(THIRTY_DAY_FILE, rows)
    }

    fn replace_performance(&self, rows: &[EvaluationRecord]) -> Result<(), SinkError> {
        self.replace(PERFORMANCE_FILE, rows)
    }
}

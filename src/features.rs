use std::collections::BTreeMap;
use chrono::{Datelike, NaiveDate};
use crate::conditions::{ConditionCodes, ConditionLabel, SimpleConditionLabel};
use crate::errors::FeatureError;
use crate::models::observation::DailyObservation;

/// Number of day-of-year slots on the calendar circle
const DAYS_IN_LEAP_YEAR: u32 = 366;

/// Climatological normal for one calendar day
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normal {
    pub max_temp: f64,
    pub min_temp: f64,
}

/// Mean max/min temperature per day-of-year over all years of a city's history
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DailyNormals {
    normals: BTreeMap<u32, Normal>,
}

impl DailyNormals {
    /// Averages max and min temperature per day-of-year, ignoring missing values.
    /// A day-of-year only gets a normal if both averages exist.
    ///
    /// # Arguments
    ///
    /// * 'history' - observations for one city
    pub fn from_history(history: &[DailyObservation]) -> DailyNormals {
        let mut sums: BTreeMap<u32, [(f64, usize); 2]> = BTreeMap::new();
        for o in history {
            let entry = sums.entry(o.date.ordinal()).or_insert([(0.0, 0); 2]);
            if let Some(t) = o.max_temp {
                entry[0].0 += t;
                entry[0].1 += 1;
            }
            if let Some(t) = o.min_temp {
                entry[1].0 += t;
                entry[1].1 += 1;
            }
        }

        sums.into_iter()
            .filter(|(_, [max, min])| max.1 > 0 && min.1 > 0)
            .map(|(d, [max, min])| (d, Normal { max_temp: max.0 / max.1 as f64, min_temp: min.0 / min.1 as f64 }))
            .collect()
    }

    pub fn get(&self, day_of_year: u32) -> Option<&Normal> {
        self.normals.get(&day_of_year)
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    /// Returns the normal to use for a forecast day together with the day-of-year it was taken from.
    ///
    /// A day without a normal is clamped to day 1 when past day 365 and to day 365 otherwise.
    /// Should that day be missing as well the nearest day on the calendar circle is used,
    /// so there is always an answer as long as any normal exists.
    ///
    /// # Arguments
    ///
    /// * 'day_of_year' - ordinal day of the forecast date
    pub fn resolve(&self, day_of_year: u32) -> Option<(u32, Normal)> {
        if let Some(n) = self.normals.get(&day_of_year) {
            return Some((day_of_year, *n));
        }

        let clamped = if day_of_year > 365 { 1 } else { 365 };
        if let Some(n) = self.normals.get(&clamped) {
            return Some((clamped, *n));
        }

        self.normals.iter()
            .min_by_key(|(d, _)| calendar_distance(**d, day_of_year))
            .map(|(d, n)| (*d, *n))
    }
}

impl FromIterator<(u32, Normal)> for DailyNormals {
    fn from_iter<I: IntoIterator<Item = (u32, Normal)>>(iter: I) -> Self {
        DailyNormals { normals: iter.into_iter().collect() }
    }
}

/// Distance in days between two day-of-year values, wrapping around new year
fn calendar_distance(a: u32, b: u32) -> u32 {
    let diff = a.abs_diff(b) % DAYS_IN_LEAP_YEAR;
    diff.min(DAYS_IN_LEAP_YEAR - diff)
}

/// Yesterday's temperatures, the lag input of a row or a forecast step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemperatureState {
    pub max_temp: f64,
    pub min_temp: f64,
}

/// Classifier input: lag max, lag min, normal max, normal min
///
/// # Arguments
///
/// * 'lag' - previous day's temperatures
/// * 'normal' - normal for the day
pub fn condition_input(lag: TemperatureState, normal: &Normal) -> Vec<f64> {
    vec![lag.max_temp, lag.min_temp, normal.max_temp, normal.min_temp]
}

/// Regressor input: the classifier input followed by the condition code
///
/// # Arguments
///
/// * 'lag' - previous day's temperatures
/// * 'normal' - normal for the day
/// * 'condition_code' - actual or predicted condition code for the day
pub fn temperature_input(lag: TemperatureState, normal: &Normal, condition_code: usize) -> Vec<f64> {
    let mut input = condition_input(lag, normal);
    input.push(condition_code as f64);
    input
}

/// One historical day with its features and targets
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub lag: TemperatureState,
    pub normal: Normal,
    pub max_temp: f64,
    pub min_temp: f64,
    pub condition: ConditionLabel,
    pub simple_condition: SimpleConditionLabel,
    pub condition_code: usize,
}

impl FeatureRow {
    pub fn condition_input(&self) -> Vec<f64> {
        condition_input(self.lag, &self.normal)
    }

    pub fn temperature_input(&self) -> Vec<f64> {
        temperature_input(self.lag, &self.normal, self.condition_code)
    }
}

/// Everything derived from one city's history
#[derive(Clone, Debug)]
pub struct CityFeatures {
    pub city: String,
    pub normals: DailyNormals,
    pub rows: Vec<FeatureRow>,
    pub last_known: TemperatureState,
}

/// Turns a city's history into normals, lag features and condition labels
pub struct FeatureBuilder {
    codes: ConditionCodes,
    min_history_days: usize,
}

impl FeatureBuilder {
    /// Returns a new FeatureBuilder
    ///
    /// # Arguments
    ///
    /// * 'codes' - condition label to code mapping
    /// * 'min_history_days' - cities with fewer observations are skipped
    pub fn new(codes: ConditionCodes, min_history_days: usize) -> FeatureBuilder {
        FeatureBuilder { codes, min_history_days }
    }

    /// Builds features for one city
    ///
    /// # Arguments
    ///
    /// * 'city' - the city the history belongs to
    /// * 'history' - the city's observations sorted by date
    pub fn build(&self, city: &str, history: &[DailyObservation]) -> Result<CityFeatures, FeatureError> {
        if history.len() < self.min_history_days {
            return Err(FeatureError::InsufficientHistory { found: history.len(), required: self.min_history_days });
        }

        let normals = DailyNormals::from_history(history);
        let rows = history
            .windows(2)
            .filter_map(|pair| self.feature_row(&pair[0], &pair[1], &normals))
            .collect::<Vec<FeatureRow>>();

        let last = rows.last().ok_or(FeatureError::NoUsableRows)?;
        let last_known = TemperatureState { max_temp: last.max_temp, min_temp: last.min_temp };

        Ok(CityFeatures { city: city.to_string(), normals, rows, last_known })
    }

    /// Builds the row for 'today', None if any value is missing
    ///
    /// # Arguments
    ///
    /// * 'yesterday' - the observation providing the lag values
    /// * 'today' - the observation providing targets and labels
    /// * 'normals' - the city's normals
    fn feature_row(&self, yesterday: &DailyObservation, today: &DailyObservation, normals: &DailyNormals) -> Option<FeatureRow> {
        let lag = TemperatureState { max_temp: yesterday.max_temp?, min_temp: yesterday.min_temp? };
        let precipitation = today.precipitation?;
        let condition = ConditionLabel::categorize(precipitation);

        Some(FeatureRow {
            date: today.date,
            lag,
            normal: *normals.get(today.date.ordinal())?,
            max_temp: today.max_temp?,
            min_temp: today.min_temp?,
            condition,
            simple_condition: SimpleConditionLabel::categorize(precipitation),
            condition_code: self.codes.code(condition)?,
        })
    }
}

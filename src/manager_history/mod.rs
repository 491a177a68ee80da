use std::fs;
use std::path::Path;
use glob::glob;
use log::warn;
use crate::errors::HistoryError;
use crate::models::observation::DailyObservation;

/// A city's observations, sorted by date with one row per date
#[derive(Clone, Debug, PartialEq)]
pub struct CityHistory {
    pub city: String,
    pub observations: Vec<DailyObservation>,
}

/// Source of historical daily observations
pub trait HistoryStore {
    /// Returns the history of every city known to the store
    fn load(&self) -> Result<Vec<CityHistory>, HistoryError>;
}

/// History store reading JSON arrays of observations from every *.json file in a directory
pub struct JsonHistoryStore {
    history_dir: String,
}

impl JsonHistoryStore {
    /// Returns a new JsonHistoryStore
    ///
    /// # Arguments
    ///
    /// * 'history_dir' - directory holding the history files
    pub fn new(history_dir: &str) -> JsonHistoryStore {
        JsonHistoryStore { history_dir: history_dir.to_string() }
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<Vec<CityHistory>, HistoryError> {
        let dir = Path::new(&self.history_dir);
        if !dir.is_dir() {
            return Err(HistoryError::File(format!("history directory {} not found", self.history_dir)));
        }

        let pattern = dir.join("*.json");
        let pattern = pattern.to_str().ok_or(HistoryError::File("illegal character in history path".to_string()))?;

        let mut observations: Vec<DailyObservation> = Vec::new();
        for entry in glob(pattern)? {
            match entry {
                Ok(path) => {
                    let json = fs::read_to_string(&path)?;
                    let mut records: Vec<DailyObservation> = serde_json::from_str(&json)
                        .map_err(|e| HistoryError::Document(format!("{}: {}", path.display(), e)))?;
                    observations.append(&mut records);
                }
                Err(e) => warn!("{:?}", e),
            }
        }

        Ok(group_by_city(observations))
    }
}

/// Groups observations per city in first seen order, sorts each city by date and
/// keeps only the first observation of any repeated date
///
/// # Arguments
///
/// * 'observations' - observations for any number of cities
pub fn group_by_city(observations: Vec<DailyObservation>) -> Vec<CityHistory> {
    let mut histories: Vec<CityHistory> = Vec::new();
    for o in observations {
        match histories.iter_mut().find(|h| h.city == o.city) {
            Some(h) => h.observations.push(o),
            None => histories.push(CityHistory { city: o.city.clone(), observations: vec![o] }),
        }
    }

    for h in histories.iter_mut() {
        h.observations.sort_by_key(|o| o.date);
        let before = h.observations.len();
        h.observations.dedup_by_key(|o| o.date);
        if h.observations.len() < before {
            warn!("{}: dropped {} duplicate observation(s)", h.city, before - h.observations.len());
        }
    }

    histories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{observation, synthetic_history};

    #[test]
    fn groups_sorts_and_dedups() {
        let observations = vec![
            observation("Pune", "2025-01-03", Some(3.0), Some(1.0), Some(0.0)),
            observation("Delhi", "2025-01-01", Some(9.0), Some(1.0), Some(0.0)),
            observation("Pune", "2025-01-01", Some(1.0), Some(1.0), Some(0.0)),
            observation("Pune", "2025-01-03", Some(33.0), Some(1.0), Some(0.0)),
        ];
        let histories = group_by_city(observations);

        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].city, "Pune");
        assert_eq!(histories[1].city, "Delhi");

        let pune = &histories[0].observations;
        assert_eq!(pune.len(), 2);
        assert!(pune[0].date < pune[1].date);
        assert_eq!(pune[1].max_temp, Some(3.0));
    }

    #[test]
    fn loads_every_json_file_in_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let pune = synthetic_history("Pune", 5);
        let delhi = synthetic_history("Delhi", 3);
        fs::write(dir.path().join("pune.json"), serde_json::to_string(&pune).unwrap()).unwrap();
        fs::write(dir.path().join("delhi.json"), serde_json::to_string(&delhi).unwrap()).unwrap();
        fs::write(dir.path().join("notes.txt"), "not history").unwrap();

        let store = JsonHistoryStore::new(dir.path().to_str().unwrap());
        let mut histories = store.load().unwrap();
        histories.sort_by(|a, b| a.city.cmp(&b.city));

        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].observations, delhi);
        assert_eq!(histories[1].observations, pune);
    }

    #[test]
    fn malformed_file_is_a_document_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();
        let store = JsonHistoryStore::new(dir.path().to_str().unwrap());

        assert!(matches!(store.load(), Err(HistoryError::Document(_))));
    }

    #[test]
    fn missing_directory_is_a_file_error() {
        let store = JsonHistoryStore::new("/nonexistent/wxcast/history");

        assert!(matches!(store.load(), Err(HistoryError::File(_))));
    }
}

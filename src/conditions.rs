use std::collections::HashMap;
use std::fmt;
use std::fmt::Formatter;
use serde::Deserialize;

/// Precipitation below this many millimeters counts as a dry day
const DRY_LIMIT_MM: f64 = 0.3;

/// Upper bound (inclusive) for light rain in millimeters
const LIGHT_RAIN_LIMIT_MM: f64 = 3.0;

/// Upper bound (inclusive) for moderate rain in millimeters
const MODERATE_RAIN_LIMIT_MM: f64 = 25.0;

/// Label used when a predicted condition code has no entry in the code mapping
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Sky/precipitation condition derived from daily precipitation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionLabel {
    ClearSunny,
    CloudyLightRain,
    ModerateRain,
    HeavyRain,
}

impl ConditionLabel {
    /// Categorizes a day given its precipitation sum
    ///
    /// # Arguments
    ///
    /// * 'precipitation_mm' - precipitation sum for the day in millimeters
    pub fn categorize(precipitation_mm: f64) -> ConditionLabel {
        if precipitation_mm < DRY_LIMIT_MM {
            ConditionLabel::ClearSunny
        } else if precipitation_mm <= LIGHT_RAIN_LIMIT_MM {
            ConditionLabel::CloudyLightRain
        } else if precipitation_mm <= MODERATE_RAIN_LIMIT_MM {
            ConditionLabel::ModerateRain
        } else {
            ConditionLabel::HeavyRain
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConditionLabel::ClearSunny      => "Clear/Sunny",
            ConditionLabel::CloudyLightRain => "Cloudy / Light Rain",
            ConditionLabel::ModerateRain    => "Moderate Rain",
            ConditionLabel::HeavyRain       => "Heavy Rain",
        }
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Coarse two-way condition, only used when scoring models
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimpleConditionLabel {
    ClearSunny,
    Rainy,
}

impl SimpleConditionLabel {
    /// Categorizes a day as dry or rainy given its precipitation sum
    ///
    /// # Arguments
    ///
    /// * 'precipitation_mm' - precipitation sum for the day in millimeters
    pub fn categorize(precipitation_mm: f64) -> SimpleConditionLabel {
        if precipitation_mm < DRY_LIMIT_MM {
            SimpleConditionLabel::ClearSunny
        } else {
            SimpleConditionLabel::Rainy
        }
    }

    /// Class index used as classifier target
    pub fn class(&self) -> usize {
        match self {
            SimpleConditionLabel::ClearSunny => 0,
            SimpleConditionLabel::Rainy => 1,
        }
    }
}

/// Two-way mapping between condition labels and the integer codes fed to the models
#[derive(Clone, Debug)]
pub struct ConditionCodes {
    codes: Vec<(ConditionLabel, usize)>,
}

impl ConditionCodes {
    /// Returns a mapping built from the given pairs
    ///
    /// # Arguments
    ///
    /// * 'codes' - label and code pairs, both sides expected to be unique
    pub fn new(codes: Vec<(ConditionLabel, usize)>) -> ConditionCodes {
        ConditionCodes { codes }
    }

    pub fn code(&self, label: ConditionLabel) -> Option<usize> {
        self.codes.iter().find(|(l, _)| *l == label).map(|(_, c)| *c)
    }

    pub fn label(&self, code: usize) -> Option<ConditionLabel> {
        self.codes.iter().find(|(_, c)| *c == code).map(|(l, _)| *l)
    }

    /// Decodes a predicted code into a display name, unmapped codes become "Unknown"
    ///
    /// # Arguments
    ///
    /// * 'code' - predicted condition code
    pub fn decode(&self, code: usize) -> &'static str {
        self.label(code).map_or(UNKNOWN_CONDITION, |l| l.name())
    }
}

impl Default for ConditionCodes {
    fn default() -> Self {
        ConditionCodes::new(vec![
            (ConditionLabel::ClearSunny, 0),
            (ConditionLabel::CloudyLightRain, 1),
            (ConditionLabel::ModerateRain, 2),
            (ConditionLabel::HeavyRain, 3),
        ])
    }
}

/// Condition name to icon reference lookup with a fallback for names not in the table
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct IconTable {
    pub icons: HashMap<String, String>,
    pub default_icon: String,
}

impl IconTable {
    pub fn icon_for(&self, condition: &str) -> &str {
        self.icons.get(condition).unwrap_or(&self.default_icon)
    }
}

impl Default for IconTable {
    fn default() -> Self {
        let icons = [
            (ConditionLabel::HeavyRain, "https://cdn.weatherapi.com/weather/64x64/day/308.png"),
            (ConditionLabel::ModerateRain, "https://cdn.weatherapi.com/weather/64x64/day/302.png"),
            (ConditionLabel::CloudyLightRain, "https://cdn.weatherapi.com/weather/64x64/day/176.png"),
            (ConditionLabel::ClearSunny, "https://cdn.weatherapi.com/weather/64x64/day/113.png"),
        ]
            .iter()
            .map(|(l, url)| (l.name().to_string(), url.to_string()))
            .collect::<HashMap<String, String>>();

        IconTable {
            icons,
            default_icon: "https://cdn.weatherapi.com/weather/64x64/day/113.png".to_string(),
        }
    }
}

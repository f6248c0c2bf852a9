use serde::{Deserialize, Serialize};
use std::fmt;

/// Samples at or above this horizontal accuracy are too coarse for a lookup.
pub const ACCURACY_THRESHOLD_METERS: f64 = 100.0;

/// One reading from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self { latitude, longitude, accuracy_meters }
    }

    /// Whether the sample is precise enough to be turned into a query.
    pub fn is_qualifying(&self) -> bool {
        self.accuracy_meters < ACCURACY_THRESHOLD_METERS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    ByCoordinates { lat: f64, lon: f64 },
    ByCityName(String),
}

impl From<LocationSample> for WeatherQuery {
    fn from(sample: LocationSample) -> Self {
        WeatherQuery::ByCoordinates { lat: sample.latitude, lon: sample.longitude }
    }
}

impl fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherQuery::ByCoordinates { lat, lon } => write!(f, "({lat:.4}, {lon:.4})"),
            WeatherQuery::ByCityName(city) => write!(f, "'{city}'"),
        }
    }
}

/// Current conditions as shown on the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub temperature: f64,
    pub humidity: u8,
    pub icon_code: String,
    pub city_name: String,
}

impl WeatherResult {
    /// Placeholder shown when a lookup fails.
    pub fn dummy() -> Self {
        Self {
            temperature: 20.0,
            humidity: 90,
            icon_code: "01d".to_string(),
            city_name: "RxCity".to_string(),
        }
    }

    pub fn is_dummy(&self) -> bool {
        *self == Self::dummy()
    }

    /// Glyph for an OpenWeather-style icon code (`01d`, `10n`, ...).
    pub fn icon_symbol(&self) -> &'static str {
        let night = self.icon_code.ends_with('n');
        match self.icon_code.get(..2) {
            Some("01") if night => "🌙",
            Some("01") => "☀️",
            Some("02") if night => "☁️",
            Some("02") => "🌤️",
            Some("03") => "☁️",
            Some("04") => "🌥️",
            Some("09") => "🌧️",
            Some("10") if night => "🌧️",
            Some("10") => "🌦️",
            Some("11") => "⛈️",
            Some("13") => "❄️",
            Some("50") => "🌫️",
            _ => "❔",
        }
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{QueryError, truncate_body},
    model::{WeatherQuery, WeatherResult},
};

use super::{WeatherProvider, http_client};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";
const PROVIDER: &str = "weatherapi";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Result<Self, QueryError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, QueryError> {
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http_client()?,
        })
    }
}

fn location_param(query: &WeatherQuery) -> String {
    match query {
        WeatherQuery::ByCityName(city) => city.clone(),
        WeatherQuery::ByCoordinates { lat, lon } => format!("{lat},{lon}"),
    }
}

/// Map a WeatherAPI.com condition code onto the OpenWeather icon family,
/// so the rest of the crate deals with one icon vocabulary.
fn icon_code(condition_code: u32, is_day: u8) -> String {
    let family = match condition_code {
        1000 => "01",
        1003 => "02",
        1006 => "03",
        1009 => "04",
        1030 | 1135 | 1147 => "50",
        1087 | 1273 | 1276 | 1279 | 1282 => "11",
        1150..=1171 | 1180..=1183 | 1240 => "09",
        1063 | 1186..=1201 | 1243 | 1246 => "10",
        1066 | 1069 | 1072 | 1114 | 1117 | 1204..=1237 | 1249..=1264 => "13",
        _ => return "e".to_string(),
    };
    let suffix = if is_day == 0 { 'n' } else { 'd' };
    format!("{family}{suffix}")
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    code: u32,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: u8,
    #[serde(default = "default_is_day")]
    is_day: u8,
    condition: WaCondition,
}

fn default_is_day() -> u8 {
    1
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<WeatherResult, QueryError> {
        let url = format!("{}/v1/current.json", self.base_url);
        let q = location_param(query);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", q.as_str())])
            .send()
            .await
            .map_err(|source| QueryError::Request { provider: PROVIDER, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| QueryError::Request { provider: PROVIDER, source })?;

        if !status.is_success() {
            return Err(QueryError::Status { provider: PROVIDER, status, body: truncate_body(&body) });
        }

        let parsed: WaResponse = serde_json::from_str(&body)
            .map_err(|source| QueryError::Parse { provider: PROVIDER, source })?;

        Ok(WeatherResult {
            temperature: parsed.current.temp_c,
            humidity: parsed.current.humidity,
            icon_code: icon_code(parsed.current.condition.code, parsed.current.is_day),
            city_name: parsed.location.name,
        })
    }
}

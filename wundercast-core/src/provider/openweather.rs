use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{QueryError, truncate_body},
    model::{WeatherQuery, WeatherResult},
};

use super::{WeatherProvider, http_client};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const PROVIDER: &str = "openweather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, QueryError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the provider at another host, e.g. a mock server.
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, QueryError> {
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http_client()?,
        })
    }

    fn query_params(&self, query: &WeatherQuery) -> Vec<(&'static str, String)> {
        let mut params = match query {
            WeatherQuery::ByCityName(city) => vec![("q", city.clone())],
            WeatherQuery::ByCoordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));
        params
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

impl From<OwCurrentResponse> for WeatherResult {
    fn from(parsed: OwCurrentResponse) -> Self {
        let icon_code = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| w.icon)
            .unwrap_or_else(|| "e".to_string());

        WeatherResult {
            temperature: parsed.main.temp,
            humidity: parsed.main.humidity,
            icon_code,
            city_name: parsed.name,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<WeatherResult, QueryError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|source| QueryError::Request { provider: PROVIDER, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| QueryError::Request { provider: PROVIDER, source })?;

        if !status.is_success() {
            return Err(QueryError::Status {
                provider: PROVIDER,
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|source| QueryError::Parse { provider: PROVIDER, source })?;

        Ok(parsed.into())
    }
}

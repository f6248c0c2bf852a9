#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use wundercast_core::{QueryError, Subscription, WeatherProvider, WeatherQuery, WeatherResult};

pub const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default)]
pub enum Behavior {
    #[default]
    Echo,
    Fail,
    Hang,
    Panic,
}

/// Provider that records every query and answers according to `behavior`.
#[derive(Debug, Default)]
pub struct FakeProvider {
    behavior: Behavior,
    calls: Mutex<Vec<WeatherQuery>>,
}

impl FakeProvider {
    pub fn new(behavior: Behavior) -> Self {
        Self { behavior, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<WeatherQuery> {
        self.calls.lock().clone()
    }
}

pub fn sunny(city: &str) -> WeatherResult {
    WeatherResult {
        temperature: 20.0,
        humidity: 60,
        icon_code: "01d".to_string(),
        city_name: city.to_string(),
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<WeatherResult, QueryError> {
        self.calls.lock().push(query.clone());

        match self.behavior {
            Behavior::Echo => Ok(match query {
                WeatherQuery::ByCityName(city) => sunny(city),
                WeatherQuery::ByCoordinates { .. } => sunny("Here"),
            }),
            Behavior::Fail => Err(QueryError::Status {
                provider: "fake",
                status: reqwest::StatusCode::NOT_FOUND,
                body: "city not found".to_string(),
            }),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("provider blew up"),
        }
    }
}

/// Next value from a subscription, failing the test instead of hanging.
pub async fn next<T: Clone>(sub: &mut Subscription<T>) -> Option<T> {
    tokio::time::timeout(WAIT, sub.recv()).await.expect("timed out waiting for a value")
}

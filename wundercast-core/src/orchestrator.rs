//! Merges location and city-name lookups into one result stream.
//!
//! Triggers travel over a channel to a single dispatcher task. The dispatcher
//! owns the derived state (latest result, busy flag), starts one lookup per
//! trigger and publishes each outcome in completion order. Failed lookups
//! resolve to [`WeatherResult::dummy`]; nothing downstream ever sees an error.
//!
//! A location lookup waits for the next qualifying sample without a timeout.
//! If none ever arrives no fetch is made and the busy flag stays `true`.

use std::sync::Arc;

use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;

use crate::{
    location::{LocationProvider, next_qualifying_sample},
    model::{WeatherQuery, WeatherResult},
    provider::WeatherProvider,
    replay::{Replay, Subscription},
};

#[derive(Debug)]
enum Trigger {
    Locate,
    Search(String),
}

/// Handle to a running orchestrator.
///
/// Dropping the handle tears down the dispatcher and aborts every lookup
/// still in flight.
#[derive(Debug)]
pub struct Orchestrator {
    triggers: mpsc::UnboundedSender<Trigger>,
    results: Arc<Replay<WeatherResult>>,
    busy: Arc<Replay<bool>>,
    activity: Arc<Replay<bool>>,
    cancel: CancellationToken,
    dispatcher: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Start the dispatcher. Must be called from within a Tokio runtime.
    pub fn spawn(provider: Arc<dyn WeatherProvider>, location: Arc<dyn LocationProvider>) -> Self {
        let (triggers, rx) = mpsc::unbounded_channel();
        let results = Arc::new(Replay::new(None));
        let busy = Arc::new(Replay::new(Some(true)));
        let activity = Arc::new(Replay::new(None));
        let cancel = CancellationToken::new();

        let dispatcher = Dispatcher {
            provider,
            location,
            results: Arc::clone(&results),
            busy: Arc::clone(&busy),
            activity: Arc::clone(&activity),
            lookups: JoinSet::new(),
        };
        let handle = tokio::spawn(dispatcher.run(rx, cancel.clone()));

        tracing::debug!("Orchestrator started");
        Self { triggers, results, busy, activity, cancel, dispatcher: Some(handle) }
    }

    /// Look up weather for a city. Blank input is ignored; returns whether a
    /// lookup was requested.
    pub fn search_city(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        let city = text.trim();
        if city.is_empty() {
            tracing::debug!("Ignoring blank city search");
            return false;
        }
        self.send(Trigger::Search(city.to_string()))
    }

    /// Look up weather for the next sufficiently precise position.
    pub fn locate(&self) -> bool {
        self.send(Trigger::Locate)
    }

    /// Every result, starting with the latest one if there is any.
    pub fn results(&self) -> Subscription<WeatherResult> {
        self.results.subscribe()
    }

    /// Busy flag, starting with its current value.
    pub fn busy(&self) -> Subscription<bool> {
        self.busy.subscribe()
    }

    /// `true` for every dispatched trigger and `false` for every result,
    /// without collapsing repeats. Nothing is replayed before the first trigger.
    pub fn activity(&self) -> Subscription<bool> {
        self.activity.subscribe()
    }

    pub fn latest(&self) -> Option<WeatherResult> {
        self.results.latest()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.latest().unwrap_or(true)
    }

    /// Stop the dispatcher and wait for it to finish. Later triggers are refused.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.dispatcher.take() {
            if let Err(e) = handle.await {
                tracing::error!("Orchestrator dispatcher failed to join: {}", e);
            }
        }
    }

    /// Stop the dispatcher and release the handle, ending every subscription.
    pub async fn shutdown(mut self) {
        self.stop().await;
        tracing::debug!("Orchestrator shut down");
    }

    fn send(&self, trigger: Trigger) -> bool {
        match self.triggers.send(trigger) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Orchestrator is not running, dropped {:?}", e.0);
                false
            }
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Dispatcher {
    provider: Arc<dyn WeatherProvider>,
    location: Arc<dyn LocationProvider>,
    results: Arc<Replay<WeatherResult>>,
    busy: Arc<Replay<bool>>,
    activity: Arc<Replay<bool>>,
    lookups: JoinSet<Option<WeatherResult>>,
}

impl Dispatcher {
    async fn run(mut self, mut triggers: mpsc::UnboundedReceiver<Trigger>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                trigger = triggers.recv() => match trigger {
                    Some(trigger) => self.handle_trigger(trigger),
                    None => break,
                },
                Some(joined) = self.lookups.join_next(), if !self.lookups.is_empty() => {
                    self.handle_completion(joined);
                }
            }
        }

        if !self.lookups.is_empty() {
            tracing::debug!("Aborting {} in-flight lookups", self.lookups.len());
        }
        self.lookups.abort_all();
    }

    fn handle_trigger(&mut self, trigger: Trigger) {
        self.busy.publish_if_changed(true);
        self.activity.publish(true);
        let provider = Arc::clone(&self.provider);

        match trigger {
            Trigger::Search(city) => {
                self.lookups.spawn(async move {
                    Some(fetch(provider.as_ref(), WeatherQuery::ByCityName(city)).await)
                });
            }
            Trigger::Locate => {
                // Subscribe before starting updates so the first sample can't slip past.
                let mut samples = self.location.samples();
                self.location.request_permission();
                self.location.start_updates();

                self.lookups.spawn(async move {
                    let sample = next_qualifying_sample(&mut samples).await?;
                    Some(fetch(provider.as_ref(), WeatherQuery::from(sample)).await)
                });
            }
        }
    }

    fn handle_completion(&mut self, joined: Result<Option<WeatherResult>, JoinError>) {
        let result = match joined {
            Ok(Some(result)) => result,
            Ok(None) => {
                tracing::warn!("Location updates ended before a usable position arrived");
                return;
            }
            Err(e) if e.is_panic() => {
                tracing::error!("Weather lookup panicked, showing placeholder: {}", e);
                WeatherResult::dummy()
            }
            Err(_) => return,
        };

        self.results.publish(result);
        self.busy.publish_if_changed(false);
        self.activity.publish(false);
    }
}

async fn fetch(provider: &dyn WeatherProvider, query: WeatherQuery) -> WeatherResult {
    tracing::debug!("Fetching weather for {}", query);
    match provider.fetch_weather(&query).await {
        Ok(result) => {
            tracing::debug!("Weather for {}: {:.1}° in {}", query, result.temperature, result.city_name);
            result
        }
        Err(e) => {
            tracing::warn!("Weather lookup for {} failed, showing placeholder: {}", query, e);
            WeatherResult::dummy()
        }
    }
}

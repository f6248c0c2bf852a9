//! Drives a view from an orchestrator's streams.

use std::{fmt::Debug, sync::Arc};

use tokio::task::JoinHandle;

use crate::{model::WeatherResult, orchestrator::Orchestrator};

/// Label texts for one result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherLabels {
    pub temperature: String,
    pub humidity: String,
    pub icon: String,
    pub city_name: String,
}

impl From<&WeatherResult> for WeatherLabels {
    fn from(result: &WeatherResult) -> Self {
        Self {
            temperature: format!("{:.0}° C", result.temperature),
            humidity: format!("{}%", result.humidity),
            icon: result.icon_symbol().to_string(),
            city_name: result.city_name.clone(),
        }
    }
}

/// What a screen exposes to the orchestrator. Implementations only render.
pub trait ViewSink: Send + Sync + Debug {
    fn set_activity(&self, animating: bool);

    /// Hides or shows all four weather labels.
    fn set_labels_hidden(&self, hidden: bool);

    fn set_map_hidden(&self, hidden: bool);

    fn set_labels(&self, labels: &WeatherLabels);
}

/// Keeps a view bound for as long as it lives.
#[derive(Debug)]
pub struct ViewBinding {
    task: JoinHandle<()>,
}

impl Drop for ViewBinding {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Bind `sink` to the orchestrator's busy flag, activity and results.
///
/// Labels are hidden while busy. The activity indicator spins from each
/// dispatched lookup until its result, and stays still before anything was
/// asked for.
pub fn bind(orchestrator: &Orchestrator, sink: Arc<dyn ViewSink>) -> ViewBinding {
    let mut busy = orchestrator.busy();
    let mut activity = orchestrator.activity();
    let mut results = orchestrator.results();

    let task = tokio::spawn(async move {
        let mut busy_open = true;
        let mut activity_open = true;
        let mut results_open = true;

        loop {
            tokio::select! {
                value = busy.recv(), if busy_open => match value {
                    Some(is_busy) => sink.set_labels_hidden(is_busy),
                    None => busy_open = false,
                },
                value = activity.recv(), if activity_open => match value {
                    Some(animating) => sink.set_activity(animating),
                    None => activity_open = false,
                },
                value = results.recv(), if results_open => match value {
                    Some(result) => sink.set_labels(&WeatherLabels::from(&result)),
                    None => results_open = false,
                },
                else => break,
            }
        }
    });

    ViewBinding { task }
}

/// Map visibility, flipped by the map button.
#[derive(Debug, Clone, Copy)]
pub struct MapToggle {
    hidden: bool,
}

impl Default for MapToggle {
    fn default() -> Self {
        Self { hidden: true }
    }
}

impl MapToggle {
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Flip visibility, push it to the sink and return the new hidden state.
    pub fn toggle(&mut self, sink: &dyn ViewSink) -> bool {
        self.hidden = !self.hidden;
        sink.set_map_hidden(self.hidden);
        self.hidden
    }
}

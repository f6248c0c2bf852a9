mod common;

use std::sync::Arc;

use common::{Behavior, FakeProvider, WAIT};
use parking_lot::Mutex;
use wundercast_core::{
    ManualLocationProvider, MapToggle, Orchestrator, ViewSink, WeatherLabels, view::bind,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Activity(bool),
    LabelsHidden(bool),
    MapHidden(bool),
    Labels(WeatherLabels),
}

#[derive(Debug, Default)]
struct RecordingSink {
    calls: Mutex<Vec<Call>>,
}

impl RecordingSink {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    async fn wait_for(&self, pred: impl Fn(&[Call]) -> bool) {
        tokio::time::timeout(WAIT, async {
            while !pred(&self.calls.lock()) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("sink never reached expected state");
    }
}

impl ViewSink for RecordingSink {
    fn set_activity(&self, animating: bool) {
        self.calls.lock().push(Call::Activity(animating));
    }

    fn set_labels_hidden(&self, hidden: bool) {
        self.calls.lock().push(Call::LabelsHidden(hidden));
    }

    fn set_map_hidden(&self, hidden: bool) {
        self.calls.lock().push(Call::MapHidden(hidden));
    }

    fn set_labels(&self, labels: &WeatherLabels) {
        self.calls.lock().push(Call::Labels(labels.clone()));
    }
}

fn spawn() -> Orchestrator {
    spawn_with(Behavior::Echo)
}

fn spawn_with(behavior: Behavior) -> Orchestrator {
    Orchestrator::spawn(
        Arc::new(FakeProvider::new(behavior)),
        Arc::new(ManualLocationProvider::new()),
    )
}

#[tokio::test]
async fn initial_busy_hides_labels_without_spinning() {
    let orchestrator = spawn();
    let sink = Arc::new(RecordingSink::default());
    let _binding = bind(&orchestrator, sink.clone());

    sink.wait_for(|calls| !calls.is_empty()).await;
    assert_eq!(sink.calls(), vec![Call::LabelsHidden(true)]);
}

#[tokio::test]
async fn result_fills_labels_and_stops_spinner() {
    let orchestrator = spawn();
    let sink = Arc::new(RecordingSink::default());
    let _binding = bind(&orchestrator, sink.clone());

    orchestrator.search_city("Paris");
    sink.wait_for(|calls| calls.contains(&Call::Activity(false))).await;
    sink.wait_for(|calls| calls.iter().any(|c| matches!(c, Call::Labels(_)))).await;

    let calls = sink.calls();
    assert!(calls.contains(&Call::LabelsHidden(false)));
    let started = calls.iter().position(|c| *c == Call::Activity(true)).expect("spinner started");
    let stopped = calls.iter().position(|c| *c == Call::Activity(false)).expect("spinner stopped");
    assert!(started < stopped);
    assert!(calls.contains(&Call::Labels(WeatherLabels {
        temperature: "20° C".into(),
        humidity: "60%".into(),
        icon: "☀️".into(),
        city_name: "Paris".into(),
    })));
}

#[tokio::test]
async fn first_lookup_spins_while_in_flight() {
    let orchestrator = spawn_with(Behavior::Hang);
    let sink = Arc::new(RecordingSink::default());
    let _binding = bind(&orchestrator, sink.clone());

    orchestrator.search_city("Paris");
    sink.wait_for(|calls| calls.contains(&Call::Activity(true))).await;

    let calls = sink.calls();
    assert!(!calls.contains(&Call::Activity(false)));
    assert!(!calls.iter().any(|c| matches!(c, Call::Labels(_))));
    assert!(!calls.contains(&Call::LabelsHidden(false)));
}

#[tokio::test]
async fn every_lookup_restarts_spinner() {
    let orchestrator = spawn();
    let sink = Arc::new(RecordingSink::default());
    let _binding = bind(&orchestrator, sink.clone());
    let mut results = orchestrator.results();

    orchestrator.search_city("Paris");
    common::next(&mut results).await;
    orchestrator.search_city("Rome");
    common::next(&mut results).await;

    sink.wait_for(|calls| calls.iter().filter(|c| **c == Call::Activity(false)).count() == 2)
        .await;
    let spins: Vec<_> = sink
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Activity(_)))
        .collect();
    assert_eq!(
        spins,
        vec![
            Call::Activity(true),
            Call::Activity(false),
            Call::Activity(true),
            Call::Activity(false),
        ]
    );
}

#[tokio::test]
async fn dropping_binding_stops_updates() {
    let orchestrator = spawn();
    let sink = Arc::new(RecordingSink::default());
    let binding = bind(&orchestrator, sink.clone());
    sink.wait_for(|calls| !calls.is_empty()).await;

    drop(binding);
    orchestrator.search_city("Paris");
    let mut results = orchestrator.results();
    common::next(&mut results).await;
    tokio::task::yield_now().await;

    assert_eq!(sink.calls(), vec![Call::LabelsHidden(true)]);
}

#[tokio::test]
async fn map_toggle_reaches_sink() {
    let sink = RecordingSink::default();
    let mut map = MapToggle::default();

    map.toggle(&sink);

    assert_eq!(sink.calls(), vec![Call::MapHidden(false)]);
}

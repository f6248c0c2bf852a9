use chrono::Local;
use parking_lot::Mutex;
use wundercast_core::{ViewSink, WeatherLabels};

/// Renders view updates as lines on stdout.
///
/// A terminal can't hide text after the fact, so labels are held back while
/// the view is busy and printed once it isn't.
#[derive(Debug)]
pub struct TerminalView {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    labels_hidden: bool,
    pending: Option<WeatherLabels>,
}

impl Default for TerminalView {
    fn default() -> Self {
        Self { state: Mutex::new(State { labels_hidden: true, pending: None }) }
    }
}

pub fn format_labels(labels: &WeatherLabels) -> String {
    format!(
        "{}  {}  {} humidity  {}",
        labels.icon, labels.temperature, labels.humidity, labels.city_name
    )
}

fn print_line(line: &str) {
    println!("[{}] {}", Local::now().format("%H:%M:%S"), line);
}

impl ViewSink for TerminalView {
    fn set_activity(&self, animating: bool) {
        if animating {
            print_line("looking up weather...");
        }
    }

    fn set_labels_hidden(&self, hidden: bool) {
        let mut state = self.state.lock();
        state.labels_hidden = hidden;
        if !hidden {
            if let Some(labels) = state.pending.take() {
                print_line(&format_labels(&labels));
            }
        }
    }

    fn set_map_hidden(&self, hidden: bool) {
        print_line(if hidden { "map hidden" } else { "map shown" });
    }

    fn set_labels(&self, labels: &WeatherLabels) {
        let mut state = self.state.lock();
        if state.labels_hidden {
            state.pending = Some(labels.clone());
        } else {
            state.pending = None;
            print_line(&format_labels(labels));
        }
    }
}

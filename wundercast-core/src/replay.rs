//! Broadcast that hands every new subscriber the latest value first.

use parking_lot::Mutex;
use tokio::sync::broadcast;

const CAPACITY: usize = 64;

#[derive(Debug)]
struct State<T> {
    latest: Option<T>,
    tx: broadcast::Sender<T>,
}

#[derive(Debug)]
pub struct Replay<T> {
    state: Mutex<State<T>>,
}

impl<T: Clone> Replay<T> {
    pub fn new(initial: Option<T>) -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { state: Mutex::new(State { latest: initial, tx }) }
    }

    pub fn publish(&self, value: T) {
        let mut state = self.state.lock();
        state.latest = Some(value.clone());
        // No subscribers is fine; the value is still kept for replay.
        let _ = state.tx.send(value);
    }

    /// Publish only if `value` differs from the latest one. Returns whether it was published.
    pub fn publish_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let mut state = self.state.lock();
        if state.latest.as_ref() == Some(&value) {
            return false;
        }
        state.latest = Some(value.clone());
        let _ = state.tx.send(value);
        true
    }

    pub fn latest(&self) -> Option<T> {
        self.state.lock().latest.clone()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let state = self.state.lock();
        Subscription { pending: state.latest.clone(), rx: state.tx.subscribe() }
    }
}

/// A subscriber's view: the value current at subscribe time, then every later one.
#[derive(Debug)]
pub struct Subscription<T> {
    pending: Option<T>,
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Next value, or `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(value) = self.pending.take() {
            return Some(value);
        }
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber lagged, skipped {} values", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

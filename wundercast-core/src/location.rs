//! Location provider abstraction.
//!
//! The orchestrator only needs three things from the platform: ask for
//! permission, start delivering updates, and a stream of samples.

use std::{
    fmt::Debug,
    sync::atomic::{AtomicUsize, Ordering},
};

use tokio::sync::{broadcast, watch};

use crate::model::LocationSample;

const SAMPLE_BUFFER: usize = 16;

pub trait LocationProvider: Send + Sync + Debug {
    fn request_permission(&self);

    fn start_updates(&self);

    /// A receiver for samples delivered after this call.
    fn samples(&self) -> broadcast::Receiver<LocationSample>;
}

/// Wait for the next sample precise enough to query with.
///
/// Returns `None` once the provider stops delivering samples.
pub async fn next_qualifying_sample(
    rx: &mut broadcast::Receiver<LocationSample>,
) -> Option<LocationSample> {
    loop {
        match rx.recv().await {
            Ok(sample) if sample.is_qualifying() => return Some(sample),
            Ok(sample) => {
                tracing::debug!(
                    "Dropping location sample with accuracy {:.0}m",
                    sample.accuracy_meters
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Location receiver lagged, skipped {} samples", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Location provider fed by the host program.
///
/// Counts permission requests and update starts so callers can tell when a
/// lookup is actually waiting for a position.
#[derive(Debug)]
pub struct ManualLocationProvider {
    tx: broadcast::Sender<LocationSample>,
    permission_requests: AtomicUsize,
    starts: watch::Sender<usize>,
}

impl Default for ManualLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualLocationProvider {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SAMPLE_BUFFER);
        let (starts, _) = watch::channel(0);
        Self { tx, permission_requests: AtomicUsize::new(0), starts }
    }

    /// Deliver a sample to everyone currently listening. Returns how many received it.
    pub fn push(&self, sample: LocationSample) -> usize {
        self.tx.send(sample).unwrap_or(0)
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    pub fn update_starts(&self) -> usize {
        *self.starts.borrow()
    }

    /// Resolve once `start_updates` has been called at least `count` times.
    pub async fn wait_for_starts(&self, count: usize) {
        let mut rx = self.starts.subscribe();
        // The sender lives in `self`, so this can only fail if it were dropped.
        let _ = rx.wait_for(|n| *n >= count).await;
    }
}

impl LocationProvider for ManualLocationProvider {
    fn request_permission(&self) {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn start_updates(&self) {
        self.starts.send_modify(|n| *n += 1);
    }

    fn samples(&self) -> broadcast::Receiver<LocationSample> {
        self.tx.subscribe()
    }
}

//! Pause primitive used between refresh attempts.

use std::time::Duration;

use async_trait::async_trait;

/// Something that can suspend the caller for a while.
#[async_trait]
pub trait Delay: Send + Sync {
    /// Suspend for `duration`.
    async fn wait(&self, duration: Duration);
}

/// Delay backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Delay that returns immediately and remembers what it was asked for.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct RecordingDelay {
    waits: parking_lot::Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingDelay {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

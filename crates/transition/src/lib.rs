use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const DEFAULT_PRESENT_DELAY_MS: u64 = 60;
const DEFAULT_DISMISS_DELAY_MS: u64 = 300;
const DEFAULT_DISMISS_DELAY_ANIMATED_MS: u64 = 600;

/// Delays standing in for the rendering collaborator's transitions.
///
/// The dismiss delays must outlast the collaborator's exit transition, since
/// an exiting modal entry is released once its delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTimings {
    pub present_delay_ms: u64,
    pub dismiss_delay_ms: u64,
    pub dismiss_delay_animated_ms: u64,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            present_delay_ms: DEFAULT_PRESENT_DELAY_MS,
            dismiss_delay_ms: DEFAULT_DISMISS_DELAY_MS,
            dismiss_delay_animated_ms: DEFAULT_DISMISS_DELAY_ANIMATED_MS,
        }
    }
}

impl TransitionTimings {
    pub fn instant() -> Self {
        Self {
            present_delay_ms: 0,
            dismiss_delay_ms: 0,
            dismiss_delay_animated_ms: 0,
        }
    }

    pub fn present_delay(&self) -> Duration {
        Duration::from_millis(self.present_delay_ms)
    }

    pub fn dismiss_delay(&self, animated: bool) -> Duration {
        if animated {
            Duration::from_millis(self.dismiss_delay_animated_ms)
        } else {
            Duration::from_millis(self.dismiss_delay_ms)
        }
    }
}

#[async_trait]
pub trait TransitionScheduler: Send + Sync {
    /// Suspends the caller until `delay` has elapsed. Scheduled waits always
    /// run to completion; there is no abort path.
    async fn wait(&self, delay: Duration);
}

/// Waits on the tokio timer wheel.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl TransitionScheduler for TokioScheduler {
    async fn wait(&self, delay: Duration) {
        if delay.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::time::sleep(delay).await;
    }
}

/// Fires every wait instantly. Used by tests and by `--instant` sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

#[async_trait]
impl TransitionScheduler for ImmediateScheduler {
    async fn wait(&self, _delay: Duration) {}
}

/// Fires instantly and remembers every requested delay.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn waits(&self) -> Vec<Duration> {
        self.waits.lock().await.clone()
    }
}

#[async_trait]
impl TransitionScheduler for RecordingScheduler {
    async fn wait(&self, delay: Duration) {
        self.waits.lock().await.push(delay);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use super::VitalsEngine;

/// Background worker that force-resolves alerts on silent streams
///
/// A wedged or unplugged sensor stops producing samples, so the recovery
/// path through the decision rules can never run; this worker is the only
/// way such an alert ends.
pub struct StalenessSweeper {
    engine: Arc<VitalsEngine>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl StalenessSweeper {
    pub fn new(engine: Arc<VitalsEngine>) -> Self {
        let interval = engine.config().sweep_interval();
        Self {
            engine,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background worker
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tracing::info!(
                "Staleness sweeper started with interval {:?}",
                self.interval
            );

            let mut interval = time::interval(self.interval);

            while self.running.load(Ordering::SeqCst) {
                interval.tick().await;

                let now = chrono::Utc::now().timestamp_millis();
                let resolved = self.engine.sweep_stale(now);

                if resolved > 0 {
                    tracing::info!("Staleness sweeper resolved {} alerts", resolved);
                }
            }

            tracing::info!("Staleness sweeper stopped");
        })
    }

    /// Stop the worker
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if worker is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, ResolveReason};
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_resolves_stale_alert_in_background() {
        let (tx, mut rx) = mpsc::channel(4);
        let engine = Arc::new(VitalsEngine::new(EngineConfig::default(), tx));

        // plant an alert that went silent a minute ago
        let now = chrono::Utc::now().timestamp_millis();
        let entry = engine.registry().get_or_init("patient-1");
        {
            let mut state = entry.bpm.lock();
            state.in_alert = true;
            state.last_sample_at = now - 60_000;
            state.last_transition_at = now - 60_000;
        }

        let sweeper = Arc::new(StalenessSweeper::new(engine.clone()));
        assert!(!sweeper.is_running());
        let handle = sweeper.clone().start();
        assert!(sweeper.is_running());

        let mut swept = false;
        for _ in 0..50 {
            if !entry.bpm.lock().in_alert {
                swept = true;
                break;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        assert!(swept, "sweeper should have resolved the alert");

        let transition = rx.recv().await.expect("resolve should be queued");
        assert_eq!(transition.reason, Some(ResolveReason::Stale));

        sweeper.stop();
        handle.await.unwrap();
        assert!(!sweeper.is_running());
    }
}

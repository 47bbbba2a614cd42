use std::sync::Arc;

use tokio::sync::mpsc;

use super::client::DeliveryClient;
use crate::engine::AlertTransition;

/// Background worker that drains the transition queue into the client
///
/// Single consumer: transitions go out one at a time, in queue order. On
/// shutdown the queue is drained before the task exits, so transitions
/// already accepted by the engine still get their delivery attempt.
pub struct DeliveryWorker {
    client: Arc<DeliveryClient>,
    queue: mpsc::Receiver<AlertTransition>,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl DeliveryWorker {
    pub fn new(client: Arc<DeliveryClient>, queue: mpsc::Receiver<AlertTransition>) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Self {
            client,
            queue,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Sender half of the shutdown signal; grab it before `start`
    pub fn shutdown_handle(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Start draining in the background
    pub fn start(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Delivery worker started");

            loop {
                tokio::select! {
                    _ = self.shutdown_rx.recv() => {
                        tracing::info!("Delivery worker shutting down");
                        break;
                    }
                    maybe = self.queue.recv() => {
                        match maybe {
                            Some(transition) => {
                                self.client.deliver(&transition).await;
                            }
                            None => {
                                tracing::info!("Transition queue closed");
                                break;
                            }
                        }
                    }
                }
            }

            // ship whatever is still queued before exiting
            while let Ok(transition) = self.queue.try_recv() {
                self.client.deliver(&transition).await;
            }

            tracing::info!("Delivery worker stopped");
        })
    }
}

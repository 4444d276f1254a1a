use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::warn;

use common::PipelineEvent;

/// Bounded buffer of the most recent pipeline events.
#[derive(Clone)]
pub struct RecentEvents {
    inner: Arc<RwLock<VecDeque<PipelineEvent>>>,
    capacity: usize,
}

impl RecentEvents {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub async fn record(&self, event: PipelineEvent) {
        let mut buf = self.inner.write().await;
        buf.push_back(event);
        while buf.len() > self.capacity {
            buf.pop_front();
        }
    }

    /// Oldest first.
    pub async fn snapshot(&self) -> Vec<PipelineEvent> {
        self.inner.read().await.iter().cloned().collect()
    }

    /// Keep the buffer filled from the event broadcast until it closes.
    pub async fn run(self, mut events_rx: broadcast::Receiver<PipelineEvent>) {
        loop {
            match events_rx.recv().await {
                Ok(event) => self.record(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(dropped = n, "Recent-event buffer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}

impl Default for RecentEvents {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

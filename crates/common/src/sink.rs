use tokio::sync::{broadcast, mpsc};

use crate::PipelineEvent;

/// Receiver of pipeline events.
///
/// `emit` is called from inside the per-tick step and must not block.
/// Delivery is fire-and-forget: a sink with nobody listening drops the event.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

impl EventSink for broadcast::Sender<PipelineEvent> {
    fn emit(&self, event: PipelineEvent) {
        // Err only means there are no subscribers right now
        let _ = self.send(event);
    }
}

impl EventSink for mpsc::UnboundedSender<PipelineEvent> {
    fn emit(&self, event: PipelineEvent) {
        let _ = self.send(event);
    }
}

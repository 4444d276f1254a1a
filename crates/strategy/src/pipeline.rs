use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use common::{EventSink, PipelineEvent, PipelineStats, Result, Tick};

use crate::config::PipelineConfig;
use crate::detector::SignalDetector;
use crate::history::HistoryTracker;
use crate::queue::TradeQueue;

/// Per-stream state: history windows, cooldown clock and in-flight trades.
///
/// One tick is processed completely (history, then signal check, then queue
/// advance) before the next one is accepted. `&mut self` on every entry point
/// enforces that ordering.
pub struct Pipeline {
    config: PipelineConfig,
    history: HistoryTracker,
    detector: SignalDetector,
    queue: TradeQueue,
    stats: PipelineStats,
}

impl Pipeline {
    /// Build a pipeline. Fails on an invalid configuration before any tick is accepted.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history: HistoryTracker::new(config.history_capacity),
            detector: SignalDetector::new(config.cooldown()),
            queue: TradeQueue::new(config.trade_len(), config.barrier_upper, config.barrier_lower),
            stats: PipelineStats::default(),
            config,
        })
    }

    /// Process one tick and return the events it produced, signal first.
    ///
    /// A trade opened on this tick takes `price` as its start price. It does
    /// not collect it; its first collected price is the next tick's.
    pub fn process(&mut self, price: f64, now: DateTime<Utc>) -> Result<Vec<PipelineEvent>> {
        if let Err(e) = self.history.update(price) {
            self.stats.ticks_rejected += 1;
            return Err(e);
        }

        let signal = self.detector.check(&self.history, &mut self.queue, price, now);
        let mut events: Vec<PipelineEvent> = Vec::new();
        if let Some(signal) = signal {
            events.push(signal.into());
        }
        events.extend(self.queue.advance(price, now).into_iter().map(PipelineEvent::from));

        self.stats.ticks_processed += 1;
        self.stats.last_price = Some(price);
        self.stats.in_flight = self.queue.len();
        for event in &events {
            self.stats.record_event(event);
        }
        debug!(price, in_flight = self.queue.len(), events = events.len(), "Tick processed");
        Ok(events)
    }

    /// Process one tick and hand every resulting event to `sink`.
    pub fn on_tick(&mut self, price: f64, now: DateTime<Utc>, sink: &dyn EventSink) -> Result<()> {
        for event in self.process(price, now)? {
            sink.emit(event);
        }
        Ok(())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn queue(&self) -> &TradeQueue {
        &self.queue
    }

    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    /// Counters over every tick offered so far, rejected ones included.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }
}

/// Drain `tick_rx` through the pipeline until every sender is gone.
///
/// This task is the single consumer of the tick channel. Malformed ticks are
/// logged, counted and skipped. `stats` is overwritten with the pipeline's
/// own counters after every tick.
pub async fn run_pipeline<S>(
    mut pipeline: Pipeline,
    mut tick_rx: mpsc::Receiver<Tick>,
    sink: S,
    stats: Arc<RwLock<PipelineStats>>,
) where
    S: EventSink,
{
    info!(config = ?pipeline.config(), "Pipeline running");
    while let Some(tick) = tick_rx.recv().await {
        if let Err(e) = pipeline.on_tick(tick.quote, tick.received_at, &sink) {
            warn!(symbol = %tick.symbol, error = %e, "Tick rejected");
        }
        *stats.write().await = pipeline.stats().clone();
    }
    warn!(in_flight = pipeline.in_flight(), "Tick channel closed — pipeline stopping");
}

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use common::{Outcome, PipelineEvent, PipelineStats, TickSource};
use engine::ReplaySource;
use strategy::{run_pipeline, Pipeline, PipelineConfig};

#[tokio::test]
async fn replayed_ticks_flow_through_pipeline_to_sink() {
    let pipeline = Pipeline::new(PipelineConfig {
        barrier_upper: 0.05,
        barrier_lower: 0.05,
        ticks_for_trade: 2,
        cooldown_ms: 0,
        history_capacity: 1000,
    })
    .unwrap();

    let source = ReplaySource::new(
        "1HZ100V",
        vec![10.00, 10.01, 10.02, 10.02, 10.03, 10.05, 10.04, 10.06],
    );
    let (tick_tx, tick_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let stats = Arc::new(RwLock::new(PipelineStats::default()));

    let runner = tokio::spawn(run_pipeline(pipeline, tick_rx, event_tx, stats.clone()));
    source.run(tick_tx).await;
    runner.await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 2, "events: {events:?}");
    let PipelineEvent::Signal(signal) = &events[0] else {
        panic!("expected signal, got {:?}", events[0]);
    };
    assert_eq!(signal.price, 10.02);
    let PipelineEvent::TradeResult(result) = &events[1] else {
        panic!("expected trade result, got {:?}", events[1]);
    };
    assert_eq!(result.id, signal.id);
    assert_eq!(result.prices, vec![10.03, 10.05]);
    assert_eq!(result.outcome, Outcome::Win);

    let stats = stats.read().await;
    assert_eq!(stats.ticks_processed, 8);
    assert_eq!(stats.wins, 1);
}

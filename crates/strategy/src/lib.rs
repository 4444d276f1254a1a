//! Tick-driven digit-pattern detection and simulated trade evaluation.
//!
//! Per tick: [`HistoryTracker`] records the price and its last digit,
//! [`SignalDetector`] may open a trade, [`TradeQueue`] advances every open
//! trade and settles the ones whose window is full. [`Pipeline`] owns all
//! three and runs them in that order.

pub mod config;
pub mod detector;
pub mod history;
pub mod pipeline;
pub mod queue;

pub use config::PipelineConfig;
pub use detector::SignalDetector;
pub use history::{last_digit, HistoryTracker};
pub use pipeline::{run_pipeline, Pipeline};
pub use queue::{Barriers, TradeHypothesis, TradeQueue};

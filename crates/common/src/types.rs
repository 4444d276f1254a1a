use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One observed quote for the tracked instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub quote: f64,
    /// Local arrival time. Cooldown and trade timestamps are measured on this clock.
    pub received_at: DateTime<Utc>,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, quote: f64, received_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            quote,
            received_at,
        }
    }
}

/// Two equal trailing digits, the witness of a trigger. Serialized as `[d, d]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern(pub [u8; 2]);

impl Pattern {
    pub fn repeated(digit: u8) -> Self {
        Pattern([digit, digit])
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.0[0], self.0[1])
    }
}

/// Emitted once when the detector opens a trade hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Shared with the trade hypothesis and its eventual result.
    pub id: Uuid,
    pub price: f64,
    pub time: DateTime<Utc>,
    pub pattern: Pattern,
}

/// Outcome of a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Loss => write!(f, "LOSS"),
        }
    }
}

/// Emitted once per completed trade hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResult {
    pub id: Uuid,
    pub start_price: f64,
    pub prices: Vec<f64>,
    pub upper_barrier: f64,
    pub lower_barrier: f64,
    pub outcome: Outcome,
    /// Completion time, serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub pattern: Pattern,
}

/// Everything the pipeline hands to an [`EventSink`](crate::EventSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    #[serde(rename = "SIGNAL")]
    Signal(Signal),
    #[serde(rename = "TRADE_RESULT")]
    TradeResult(TradeResult),
}

/// Identifies one event: its wire `type` plus the trade id it belongs to.
pub type EventKey = (&'static str, Uuid);

impl PipelineEvent {
    pub fn key(&self) -> EventKey {
        match self {
            PipelineEvent::Signal(s) => ("SIGNAL", s.id),
            PipelineEvent::TradeResult(r) => ("TRADE_RESULT", r.id),
        }
    }
}

impl From<Signal> for PipelineEvent {
    fn from(signal: Signal) -> Self {
        PipelineEvent::Signal(signal)
    }
}

impl From<TradeResult> for PipelineEvent {
    fn from(result: TradeResult) -> Self {
        PipelineEvent::TradeResult(result)
    }
}

/// Running counters published by the pipeline runner for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub ticks_processed: u64,
    pub ticks_rejected: u64,
    pub signals: u64,
    pub wins: u64,
    pub losses: u64,
    pub in_flight: usize,
    pub last_price: Option<f64>,
}

impl PipelineStats {
    pub fn record_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Signal(_) => self.signals += 1,
            PipelineEvent::TradeResult(r) => match r.outcome {
                Outcome::Win => self.wins += 1,
                Outcome::Loss => self.losses += 1,
            },
        }
    }

    /// Fraction of completed trades that won, `None` before the first result.
    pub fn win_rate(&self) -> Option<f64> {
        let total = self.wins + self.losses;
        (total > 0).then(|| self.wins as f64 / total as f64)
    }
}

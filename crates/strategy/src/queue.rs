use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use common::{Outcome, Pattern, TradeResult};

/// An open trade waiting for its evaluation window to fill.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeHypothesis {
    pub id: Uuid,
    pub start_price: f64,
    /// Prices observed after the trigger tick, oldest first.
    pub collected: Vec<f64>,
    pub pattern: Pattern,
    pub timestamp: DateTime<Utc>,
}

impl TradeHypothesis {
    pub fn new(id: Uuid, start_price: f64, pattern: Pattern, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            start_price,
            collected: Vec::new(),
            pattern,
            timestamp,
        }
    }
}

/// Upper/lower price bounds for one trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barriers {
    pub upper: f64,
    pub lower: f64,
}

impl Barriers {
    pub fn around(start_price: f64, upper_offset: f64, lower_offset: f64) -> Self {
        Self {
            upper: start_price + upper_offset,
            lower: start_price - lower_offset,
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, price: f64) -> bool {
        self.lower <= price && price <= self.upper
    }

    pub fn outcome(&self, prices: &[f64]) -> Outcome {
        if prices.iter().all(|&p| self.contains(p)) {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }
}

/// In-flight trades, each advanced by one price per tick.
///
/// A trade pushed during a tick is held back from that tick's `advance`, so it
/// starts collecting on the tick after the one that opened it.
#[derive(Debug, Clone)]
pub struct TradeQueue {
    trades: Vec<TradeHypothesis>,
    opened: Vec<TradeHypothesis>,
    ticks_for_trade: usize,
    barrier_upper: f64,
    barrier_lower: f64,
}

impl TradeQueue {
    pub fn new(ticks_for_trade: usize, barrier_upper: f64, barrier_lower: f64) -> Self {
        Self {
            trades: Vec::new(),
            opened: Vec::new(),
            ticks_for_trade,
            barrier_upper,
            barrier_lower,
        }
    }

    /// Open a trade on the current tick.
    pub fn push(&mut self, trade: TradeHypothesis) {
        self.opened.push(trade);
    }

    /// Feed `price` to every trade opened before this tick and finalize the
    /// ones that now hold `ticks_for_trade` prices. Finalized trades leave the
    /// queue. Trades opened during this tick join afterwards.
    pub fn advance(&mut self, price: f64, now: DateTime<Utc>) -> Vec<TradeResult> {
        let k = self.ticks_for_trade;
        let mut results = Vec::new();

        for trade in &mut self.trades {
            if trade.collected.len() >= k {
                continue;
            }
            trade.collected.push(price);
            if trade.collected.len() < k {
                continue;
            }

            let barriers = Barriers::around(trade.start_price, self.barrier_upper, self.barrier_lower);
            let outcome = barriers.outcome(&trade.collected);
            info!(
                id = %trade.id,
                start_price = trade.start_price,
                upper = barriers.upper,
                lower = barriers.lower,
                outcome = %outcome,
                "Trade completed"
            );
            results.push(TradeResult {
                id: trade.id,
                start_price: trade.start_price,
                prices: trade.collected.clone(),
                upper_barrier: barriers.upper,
                lower_barrier: barriers.lower,
                outcome,
                timestamp: now,
                pattern: trade.pattern,
            });
        }

        self.trades.retain(|t| t.collected.len() < k);
        self.trades.append(&mut self.opened);
        results
    }

    pub fn len(&self) -> usize {
        self.trades.len() + self.opened.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TradeHypothesis> {
        self.trades.iter().chain(self.opened.iter())
    }
}

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use common::{Tick, TickSource};

/// Replays a fixed price sequence as ticks, stamped with the send time.
/// Ticks go out as fast as the channel accepts them.
pub struct ReplaySource {
    symbol: String,
    prices: Vec<f64>,
}

impl ReplaySource {
    pub fn new(symbol: impl Into<String>, prices: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            prices,
        }
    }
}

#[async_trait]
impl TickSource for ReplaySource {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn run(&self, tick_tx: mpsc::Sender<Tick>) {
        info!(symbol = %self.symbol, ticks = self.prices.len(), "Replaying ticks");
        for &price in &self.prices {
            if tick_tx.send(Tick::new(&self.symbol, price, Utc::now())).await.is_err() {
                debug!("Tick receiver dropped — replay stopped early");
                return;
            }
        }
        info!(symbol = %self.symbol, "Replay finished");
    }
}

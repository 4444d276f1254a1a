use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Tick;

/// Anything that produces ticks for the pipeline.
///
/// `DerivStream` implements this for the live feed.
/// `ReplaySource` implements this for fixed price sequences.
///
/// A source only pushes into `tick_tx`. The pipeline runner is the single
/// consumer of that channel, which keeps tick processing strictly ordered.
#[async_trait]
pub trait TickSource: Send + Sync {
    /// Symbol this source is quoting.
    fn symbol(&self) -> &str;

    /// Push ticks until the source is exhausted or the receiver is dropped.
    async fn run(&self, tick_tx: mpsc::Sender<Tick>);
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use common::{Error, Result, Tick, TickSource};

/// Deriv tick WebSocket stream for a single market.
///
/// Subscribes to the market's tick stream, parses `tick` frames into
/// [`Tick`], and pushes them into the pipeline's tick channel.
/// Reconnects automatically with exponential backoff.
pub struct DerivStream {
    ws_url: String,
    app_id: u32,
    market: String,
}

/// Why a stream session ended without an error.
enum SessionEnd {
    /// Server closed the socket.
    Closed,
    /// The pipeline dropped its receiver.
    ReceiverGone,
}

impl DerivStream {
    pub fn new(ws_url: impl Into<String>, app_id: u32, market: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            app_id,
            market: market.into(),
        }
    }

    fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&self.ws_url).map_err(|e| Error::WebSocket(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("app_id", &self.app_id.to_string());
        Ok(url)
    }

    async fn connect_once(&self, tick_tx: &mpsc::Sender<Tick>) -> Result<SessionEnd> {
        let url = self.endpoint()?;
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        info!(market = %self.market, "Connected to Deriv WebSocket");

        let (mut write, mut read) = ws_stream.split();
        write
            .send(Message::Text(subscribe_request(&self.market)))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        while let Some(msg) = read.next().await {
            let msg = msg.map_err(|e| Error::WebSocket(e.to_string()))?;

            match msg {
                Message::Text(text) => match parse_tick_message(&text, Utc::now()) {
                    Ok(Some(tick)) => {
                        if tick_tx.send(tick).await.is_err() {
                            return Ok(SessionEnd::ReceiverGone);
                        }
                    }
                    Ok(None) => {} // non-tick message, skip
                    Err(e) => {
                        warn!(error = %e, "Failed to parse Deriv message");
                    }
                },
                Message::Ping(payload) => {
                    write
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| Error::WebSocket(e.to_string()))?;
                }
                Message::Close(frame) => {
                    debug!(?frame, "Deriv sent close frame");
                    break;
                }
                _ => {}
            }
        }

        Ok(SessionEnd::Closed)
    }
}

#[async_trait]
impl TickSource for DerivStream {
    fn symbol(&self) -> &str {
        &self.market
    }

    /// Run the stream loop until the pipeline goes away, reconnecting on failure.
    async fn run(&self, tick_tx: mpsc::Sender<Tick>) {
        let mut backoff = Duration::from_secs(1);
        const MAX_BACKOFF: Duration = Duration::from_secs(60);

        loop {
            info!(market = %self.market, url = %self.ws_url, "Connecting to Deriv tick stream");
            match self.connect_once(&tick_tx).await {
                Ok(SessionEnd::ReceiverGone) => {
                    info!(market = %self.market, "Tick receiver dropped — stopping Deriv stream");
                    return;
                }
                Ok(SessionEnd::Closed) => {
                    info!(market = %self.market, "Deriv stream closed cleanly");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    backoff = Duration::from_secs(1);
                }
                Err(e) => {
                    warn!(market = %self.market, error = %e, backoff = ?backoff, "Deriv stream error, reconnecting");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
            if tick_tx.is_closed() {
                return;
            }
        }
    }
}

// ─── Deriv JSON ──────────────────────────────────────────────────────────────

pub(crate) fn subscribe_request(market: &str) -> String {
    serde_json::json!({ "ticks": market, "subscribe": 1 }).to_string()
}

#[derive(Deserialize)]
struct DerivMessage {
    msg_type: Option<String>,
    tick: Option<DerivTick>,
    error: Option<DerivError>,
}

#[derive(Deserialize)]
struct DerivTick {
    quote: Value,
    symbol: Option<String>,
}

#[derive(Deserialize)]
struct DerivError {
    code: Option<String>,
    message: Option<String>,
}

/// Parse one Deriv frame. `Ok(None)` for anything that is not a tick.
///
/// The quote is passed on as-is when it is numeric (or a numeric string);
/// finiteness is checked by the pipeline, not here.
pub fn parse_tick_message(text: &str, received_at: DateTime<Utc>) -> Result<Option<Tick>> {
    let message: DerivMessage = serde_json::from_str(text)?;

    if let Some(err) = message.error {
        return Err(Error::Other(format!(
            "Deriv API error {}: {}",
            err.code.as_deref().unwrap_or("unknown"),
            err.message.as_deref().unwrap_or("no message")
        )));
    }
    if message.msg_type.as_deref() != Some("tick") {
        return Ok(None);
    }
    let tick = message
        .tick
        .ok_or_else(|| Error::MalformedTick("tick frame without 'tick' body".into()))?;

    let quote = match &tick.quote {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::MalformedTick(format!("quote is not numeric: {}", tick.quote)))?;

    Ok(Some(Tick::new(tick.symbol.unwrap_or_default(), quote, received_at)))
}

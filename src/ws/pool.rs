//! Application-owned set of the five stream clients.

use crate::config::FeedConfig;
use crate::error::Result;
use crate::ws::client::{StreamClient, StreamConfig};
use crate::ws::protocol::{
    ForeignStream, GoldQuoteStream, GoldTradeStream, QuoteStream, TradeStream,
};

/// One client per stream, created once and shared (by clone) with every
/// view that needs live data.
///
/// Views only subscribe and unsubscribe; the owner of the pool decides when
/// to [`disconnect_all`](Self::disconnect_all). A stream's connection also
/// stops once the pool and every clone of that client are dropped.
#[derive(Debug, Clone)]
pub struct StreamPool {
    pub quote: StreamClient<QuoteStream>,
    pub trade: StreamClient<TradeStream>,
    pub foreign: StreamClient<ForeignStream>,
    pub gold_quote: StreamClient<GoldQuoteStream>,
    pub gold_trade: StreamClient<GoldTradeStream>,
}

impl StreamPool {
    /// Build the five clients against `config.ws_base_url`. Nothing connects
    /// until a client is used.
    pub fn new(config: &FeedConfig, stream: StreamConfig) -> Result<Self> {
        Ok(Self {
            quote: StreamClient::from_config(config, stream.clone())?,
            trade: StreamClient::from_config(config, stream.clone())?,
            foreign: StreamClient::from_config(config, stream.clone())?,
            gold_quote: StreamClient::from_config(config, stream.clone())?,
            gold_trade: StreamClient::from_config(config, stream)?,
        })
    }

    /// Disconnect every stream and drop all listeners.
    pub fn disconnect_all(&self) {
        self.quote.disconnect();
        self.trade.disconnect();
        self.foreign.disconnect();
        self.gold_quote.disconnect();
        self.gold_trade.disconnect();
        tracing::info!("All streams disconnected");
    }

    /// Whether any stream currently has an open socket.
    pub fn any_connected(&self) -> bool {
        self.quote.is_connected()
            || self.trade.is_connected()
            || self.foreign.is_connected()
            || self.gold_quote.is_connected()
            || self.gold_trade.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_point_at_their_endpoints() {
        let config = FeedConfig {
            ws_base_url: "wss://feed.example.com".into(),
            ..FeedConfig::default()
        };
        let pool = StreamPool::new(&config, StreamConfig::default()).unwrap();
        assert_eq!(pool.quote.url(), "wss://feed.example.com/ws/quote");
        assert_eq!(pool.trade.url(), "wss://feed.example.com/ws/trade");
        assert_eq!(pool.foreign.url(), "wss://feed.example.com/ws/foreign-quote");
        assert_eq!(pool.gold_quote.url(), "wss://feed.example.com/ws/gold-quote");
        assert_eq!(pool.gold_trade.url(), "wss://feed.example.com/ws/gold-trade");
        assert!(!pool.any_connected());
    }
}

//! Wire protocol shared by the five market-data streams.
//!
//! Clients send JSON control frames:
//!
//! ```text
//! {"action":"subscribe","stockCode":"005930"}
//! {"action":"unsubscribe","exchangeCode":"NAS","stockCode":"AAPL","dataType":"trade"}
//! ```
//!
//! Domestic and foreign servers answer with acknowledgements
//! (`{"type":"subscribe",...}`) and push data inside an envelope
//! (`{"type":"trade","data":{...}}`). Gold servers push every product to every
//! client without an envelope and take no control frames.
//!
//! Each stream is described by a zero-sized marker implementing
//! [`StreamKind`], which [`StreamClient`](super::StreamClient) is generic over.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    WS_FOREIGN_QUOTE_PATH, WS_GOLD_QUOTE_PATH, WS_GOLD_TRADE_PATH, WS_QUOTE_PATH, WS_TRADE_PATH,
};
use crate::types::ForeignDataType;
use crate::types::stream::{ForeignTick, GoldQuoteTick, GoldTradeTick, QuoteTick, TradeTick};
use crate::ws::registry::DispatchPolicy;

// ---------------------------------------------------------------------------
// Subscription key
// ---------------------------------------------------------------------------

/// Identifies one server-side subscription on a stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    /// Domestic quote / trade subscription.
    Stock { stock_code: String },
    /// Foreign subscription for one data type.
    Foreign {
        exchange_code: String,
        stock_code: String,
        data_type: ForeignDataType,
    },
    /// The single implicit gold channel.
    Gold,
}

impl SubscriptionKey {
    /// Domestic stock key.
    pub fn stock(stock_code: impl Into<String>) -> Self {
        Self::Stock {
            stock_code: stock_code.into(),
        }
    }

    /// Foreign stock key.
    pub fn foreign(
        exchange_code: impl Into<String>,
        stock_code: impl Into<String>,
        data_type: ForeignDataType,
    ) -> Self {
        Self::Foreign {
            exchange_code: exchange_code.into(),
            stock_code: stock_code.into(),
            data_type,
        }
    }

    /// Control frame for this key, or `None` for keys the server does not
    /// negotiate (gold).
    pub fn control_frame(&self, action: Action) -> Option<ControlFrame<'_>> {
        match self {
            Self::Stock { stock_code } => Some(ControlFrame {
                action,
                exchange_code: None,
                stock_code: Some(stock_code),
                data_type: None,
            }),
            Self::Foreign {
                exchange_code,
                stock_code,
                data_type,
            } => Some(ControlFrame {
                action,
                exchange_code: Some(exchange_code),
                stock_code: Some(stock_code),
                data_type: Some(*data_type),
            }),
            Self::Gold => None,
        }
    }

    /// Whether a key rebuilt from an inbound frame addresses this
    /// subscription.
    ///
    /// Foreign data frames may omit the exchange code; such frames match on
    /// stock code and data type alone.
    pub fn matches(&self, routed: &SubscriptionKey) -> bool {
        match (self, routed) {
            (
                Self::Foreign {
                    exchange_code,
                    stock_code,
                    data_type,
                },
                Self::Foreign {
                    exchange_code: routed_exchange,
                    stock_code: routed_code,
                    data_type: routed_type,
                },
            ) => {
                stock_code == routed_code
                    && data_type == routed_type
                    && (routed_exchange.is_empty() || exchange_code == routed_exchange)
            }
            _ => self == routed,
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stock { stock_code } => f.write_str(stock_code),
            Self::Foreign {
                exchange_code,
                stock_code,
                data_type,
            } => write!(f, "{exchange_code}:{stock_code}:{}", data_type.as_str()),
            Self::Gold => f.write_str("gold"),
        }
    }
}

// ---------------------------------------------------------------------------
// Control frames
// ---------------------------------------------------------------------------

/// Control frame action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Subscribe,
    Unsubscribe,
}

/// Client-to-server subscribe / unsubscribe request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFrame<'a> {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<ForeignDataType>,
}

// ---------------------------------------------------------------------------
// Inbound frames
// ---------------------------------------------------------------------------

/// Classification of one inbound text frame.
#[derive(Debug)]
pub enum Routed<P> {
    /// Subscribe / unsubscribe acknowledgement.
    Control,
    /// Data for the subscription identified by `key`.
    Data { key: SubscriptionKey, payload: P },
    /// Well-formed JSON this stream does not deliver (errors, other types).
    Ignored,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Split an enveloped frame into its type tag and data object.
/// Acknowledgements come back as [`Err`] with [`Routed::Control`].
fn open_envelope<P>(text: &str) -> serde_json::Result<Result<(String, Value), Routed<P>>> {
    let envelope: Envelope = serde_json::from_str(text)?;
    Ok(match (envelope.kind.as_str(), envelope.data) {
        ("subscribe" | "unsubscribe", _) => Err(Routed::Control),
        (_, Some(data)) if data.is_object() => Ok((envelope.kind, data)),
        _ => Err(Routed::Ignored),
    })
}

/// Parse an enveloped frame whose `type` must equal `expected`.
fn route_enveloped<P: DeserializeOwned>(
    text: &str,
    expected: &str,
    key_of: impl FnOnce(&P) -> SubscriptionKey,
) -> serde_json::Result<Routed<P>> {
    match open_envelope(text)? {
        Ok((kind, data)) if kind == expected => {
            let payload: P = serde_json::from_value(data)?;
            Ok(Routed::Data {
                key: key_of(&payload),
                payload,
            })
        }
        Ok(_) => Ok(Routed::Ignored),
        Err(routed) => Ok(routed),
    }
}

// ---------------------------------------------------------------------------
// Stream kinds
// ---------------------------------------------------------------------------

/// Static description of one stream: endpoint, payload type, routing and
/// dispatch policy.
pub trait StreamKind: Send + Sync + 'static {
    /// Payload delivered to listeners.
    type Payload: DeserializeOwned + Send + Sync + 'static;

    /// Name used in log fields.
    const NAME: &'static str;
    /// Endpoint path joined onto the WebSocket base URL.
    const PATH: &'static str;
    /// Listener policy for a key.
    const DISPATCH: DispatchPolicy;

    /// Classify one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed frames; the caller drops them.
    fn route(text: &str) -> serde_json::Result<Routed<Self::Payload>>;
}

/// Domestic 10-level order book (`/ws/quote`).
#[derive(Debug, Clone, Copy)]
pub struct QuoteStream;

impl StreamKind for QuoteStream {
    type Payload = QuoteTick;

    const NAME: &'static str = "quote";
    const PATH: &'static str = WS_QUOTE_PATH;
    const DISPATCH: DispatchPolicy = DispatchPolicy::FanOut;

    fn route(text: &str) -> serde_json::Result<Routed<QuoteTick>> {
        route_enveloped(text, "quote", |tick: &QuoteTick| {
            SubscriptionKey::stock(&tick.stock_code)
        })
    }
}

/// Domestic executions (`/ws/trade`).
#[derive(Debug, Clone, Copy)]
pub struct TradeStream;

impl StreamKind for TradeStream {
    type Payload = TradeTick;

    const NAME: &'static str = "trade";
    const PATH: &'static str = WS_TRADE_PATH;
    const DISPATCH: DispatchPolicy = DispatchPolicy::FanOut;

    fn route(text: &str) -> serde_json::Result<Routed<TradeTick>> {
        route_enveloped(text, "trade", |tick: &TradeTick| {
            SubscriptionKey::stock(&tick.stock_code)
        })
    }
}

/// Foreign trades and quotes on one socket (`/ws/foreign-quote`).
#[derive(Debug, Clone, Copy)]
pub struct ForeignStream;

impl StreamKind for ForeignStream {
    type Payload = ForeignTick;

    const NAME: &'static str = "foreign-quote";
    const PATH: &'static str = WS_FOREIGN_QUOTE_PATH;
    const DISPATCH: DispatchPolicy = DispatchPolicy::FanOut;

    fn route(text: &str) -> serde_json::Result<Routed<ForeignTick>> {
        match open_envelope(text)? {
            Ok((kind, data)) => {
                let Some(data_type) = ForeignDataType::from_wire(&kind) else {
                    return Ok(Routed::Ignored);
                };
                let payload: ForeignTick = serde_json::from_value(data)?;
                Ok(Routed::Data {
                    key: SubscriptionKey::foreign(
                        &payload.exchange_code,
                        &payload.stock_code,
                        data_type,
                    ),
                    payload,
                })
            }
            Err(routed) => Ok(routed),
        }
    }
}

/// Gold order book for every product (`/ws/gold-quote`).
#[derive(Debug, Clone, Copy)]
pub struct GoldQuoteStream;

impl StreamKind for GoldQuoteStream {
    type Payload = GoldQuoteTick;

    const NAME: &'static str = "gold-quote";
    const PATH: &'static str = WS_GOLD_QUOTE_PATH;
    const DISPATCH: DispatchPolicy = DispatchPolicy::LastSubscriberWins;

    fn route(text: &str) -> serde_json::Result<Routed<GoldQuoteTick>> {
        Ok(Routed::Data {
            key: SubscriptionKey::Gold,
            payload: serde_json::from_str(text)?,
        })
    }
}

/// Gold executions for every product (`/ws/gold-trade`).
#[derive(Debug, Clone, Copy)]
pub struct GoldTradeStream;

impl StreamKind for GoldTradeStream {
    type Payload = GoldTradeTick;

    const NAME: &'static str = "gold-trade";
    const PATH: &'static str = WS_GOLD_TRADE_PATH;
    const DISPATCH: DispatchPolicy = DispatchPolicy::LastSubscriberWins;

    fn route(text: &str) -> serde_json::Result<Routed<GoldTradeTick>> {
        Ok(Routed::Data {
            key: SubscriptionKey::Gold,
            payload: serde_json::from_str(text)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(key: &SubscriptionKey, action: Action) -> Value {
        serde_json::to_value(key.control_frame(action).unwrap()).unwrap()
    }

    #[test]
    fn stock_control_frame_carries_only_stock_code() {
        let key = SubscriptionKey::stock("005930");
        assert_eq!(
            frame(&key, Action::Subscribe),
            json!({"action": "subscribe", "stockCode": "005930"})
        );
    }

    #[test]
    fn foreign_control_frame_carries_exchange_and_type() {
        let key = SubscriptionKey::foreign("NAS", "AAPL", ForeignDataType::Quote);
        assert_eq!(
            frame(&key, Action::Unsubscribe),
            json!({
                "action": "unsubscribe",
                "exchangeCode": "NAS",
                "stockCode": "AAPL",
                "dataType": "quote"
            })
        );
    }

    #[test]
    fn gold_has_no_control_frame() {
        assert!(SubscriptionKey::Gold.control_frame(Action::Subscribe).is_none());
    }

    #[test]
    fn trade_frames_route_by_stock_code() {
        let text = r#"{"type":"trade","data":{"stockCode":"005930","currentPrice":"71000"}}"#;
        match TradeStream::route(text).unwrap() {
            Routed::Data { key, payload } => {
                assert_eq!(key, SubscriptionKey::stock("005930"));
                assert_eq!(payload.current_price, "71000");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn acknowledgements_and_foreign_types_are_not_data() {
        let ack = r#"{"type":"subscribe","stockCode":"005930","message":"ok"}"#;
        assert!(matches!(TradeStream::route(ack).unwrap(), Routed::Control));

        let quote_on_trade = r#"{"type":"quote","data":{"stockCode":"005930"}}"#;
        assert!(matches!(
            TradeStream::route(quote_on_trade).unwrap(),
            Routed::Ignored
        ));

        let error = r#"{"type":"error","message":"boom"}"#;
        assert!(matches!(ForeignStream::route(error).unwrap(), Routed::Ignored));
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(TradeStream::route("not json").is_err());
        assert!(GoldTradeStream::route("{\"price\":").is_err());
    }

    #[test]
    fn foreign_frames_without_exchange_match_on_code_and_type() {
        let text = r#"{"type":"trade","data":{"stockCode":"AAPL","currentPrice":"190.1"}}"#;
        let Routed::Data { key: routed, .. } = ForeignStream::route(text).unwrap() else {
            panic!("expected data");
        };

        let trade = SubscriptionKey::foreign("NAS", "AAPL", ForeignDataType::Trade);
        let quote = SubscriptionKey::foreign("NAS", "AAPL", ForeignDataType::Quote);
        let other = SubscriptionKey::foreign("NAS", "TSLA", ForeignDataType::Trade);
        assert!(trade.matches(&routed));
        assert!(!quote.matches(&routed));
        assert!(!other.matches(&routed));

        let explicit = SubscriptionKey::foreign("NYS", "AAPL", ForeignDataType::Trade);
        assert!(!trade.matches(&explicit));
    }

    #[test]
    fn gold_frames_are_bare_payloads() {
        let text = r#"{"productCode":"M04020000","price":131500.0,"changeRate":0.4}"#;
        match GoldTradeStream::route(text).unwrap() {
            Routed::Data { key, payload } => {
                assert_eq!(key, SubscriptionKey::Gold);
                assert_eq!(payload.product_code, "M04020000");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

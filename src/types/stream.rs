//! Payloads delivered by the five real-time streams.
//!
//! Domestic and foreign payloads arrive inside a `{"type": ..., "data": ...}`
//! envelope; gold payloads are sent bare. Field names follow the wire format
//! (camelCase) via serde renames.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Domestic quote (order book)
// ---------------------------------------------------------------------------

/// 10-level order book snapshot from `/ws/quote`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTick {
    pub stock_code: String,
    #[serde(default)]
    pub timestamp: String,
    /// Ask prices, best first.
    #[serde(default)]
    pub ask_prices: Vec<f64>,
    /// Bid prices, best first.
    #[serde(default)]
    pub bid_prices: Vec<f64>,
    #[serde(default)]
    pub ask_volumes: Vec<f64>,
    #[serde(default)]
    pub bid_volumes: Vec<f64>,
    #[serde(default)]
    pub total_ask_volume: f64,
    #[serde(default)]
    pub total_bid_volume: f64,
}

// ---------------------------------------------------------------------------
// Domestic trade (execution)
// ---------------------------------------------------------------------------

/// Execution tick from `/ws/trade`. Numeric fields are sent as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeTick {
    pub stock_code: String,
    pub timestamp: String,
    pub trade_time: String,

    pub current_price: String,
    /// `1` upper limit, `2` rise, `3` flat, `4` lower limit, `5` fall.
    pub price_change_sign: String,
    pub price_change: String,
    pub change_rate: String,

    pub open_price: String,
    pub high_price: String,
    pub low_price: String,

    pub trade_volume: String,
    pub accumulated_volume: String,
    pub accumulated_amount: String,

    pub ask_price1: String,
    pub bid_price1: String,
    pub total_ask_remain: String,
    pub total_bid_remain: String,

    pub trade_strength: String,
    pub sell_count: String,
    pub buy_count: String,
}

impl TradeTick {
    /// Last traded price, if it parses.
    pub fn price(&self) -> Option<f64> {
        self.current_price.trim().parse().ok()
    }

    /// Change versus the previous close, if it parses.
    pub fn change(&self) -> Option<f64> {
        self.price_change.trim().parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Foreign stock trade / quote
// ---------------------------------------------------------------------------

/// Foreign stock tick from `/ws/foreign-quote` (both `trade` and `quote`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForeignTick {
    pub exchange_code: String,
    pub stock_code: String,
    #[serde(alias = "last")]
    pub current_price: String,
    /// Absolute change versus the previous close (not always sent).
    #[serde(alias = "diff")]
    pub price_change: String,
    #[serde(alias = "rate")]
    pub change_rate: String,
    #[serde(alias = "bidp")]
    pub bid_price1: String,
    #[serde(alias = "bidv")]
    pub bid_quantity1: String,
    #[serde(alias = "askp")]
    pub ask_price1: String,
    #[serde(alias = "askv")]
    pub ask_quantity1: String,
    #[serde(alias = "tvol")]
    pub volume: String,
    #[serde(alias = "tday")]
    pub execution_time: String,
    pub currency: String,
    pub timestamp: String,
}

impl ForeignTick {
    /// Last traded price, if present and numeric.
    pub fn price(&self) -> Option<f64> {
        self.current_price.trim().parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Gold trade
// ---------------------------------------------------------------------------

/// Gold spot execution pushed by `/ws/gold-trade` for every product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldTradeTick {
    pub product_code: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub change_amount: f64,
    #[serde(default)]
    pub change_rate: f64,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Gold quote
// ---------------------------------------------------------------------------

/// One price level of the gold order book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Gold spot 10-level order book pushed by `/ws/gold-quote`.
///
/// The wire format flattens the ladder into `bidPrice1..10`,
/// `bidQuantity1..10`, `askPrice1..10`, `askQuantity1..10`; it is regrouped
/// into `bids` / `asks` (best first) on deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawGoldQuote")]
pub struct GoldQuoteTick {
    pub product_code: String,
    pub timestamp: String,
    pub bids: Vec<GoldLevel>,
    pub asks: Vec<GoldLevel>,
}

/// Number of levels in the gold order book.
const GOLD_DEPTH: usize = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGoldQuote {
    product_code: String,
    #[serde(default)]
    timestamp: String,
    #[serde(flatten)]
    levels: HashMap<String, Value>,
}

impl From<RawGoldQuote> for GoldQuoteTick {
    fn from(raw: RawGoldQuote) -> Self {
        let ladder = |side: &str| -> Vec<GoldLevel> {
            (1..=GOLD_DEPTH)
                .map(|i| GoldLevel {
                    price: level_value(&raw.levels, &format!("{side}Price{i}")),
                    quantity: level_value(&raw.levels, &format!("{side}Quantity{i}")),
                })
                .collect()
        };
        Self {
            bids: ladder("bid"),
            asks: ladder("ask"),
            product_code: raw.product_code,
            timestamp: raw.timestamp,
        }
    }
}

fn level_value(levels: &HashMap<String, Value>, name: &str) -> f64 {
    match levels.get(name) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

//! Constants for the brokerage backend.
//!
//! Contains default base URLs, WebSocket endpoint paths, reconnection
//! defaults and chart refresh timings. These are used internally by
//! [`RestClient`](crate::client::RestClient), the stream clients and
//! [`ChartSession`](crate::chart::ChartSession), but are also exported for
//! advanced usage.

// ---------------------------------------------------------------------------
// Base URLs
// ---------------------------------------------------------------------------

/// Default base URL for the REST API.
pub const API_BASE_URL: &str = "http://localhost:8080";

/// Default base URL for the WebSocket endpoints.
pub const WS_BASE_URL: &str = "ws://localhost:8080";

// ---------------------------------------------------------------------------
// WebSocket endpoint paths
// ---------------------------------------------------------------------------

/// Domestic 10-level order book stream.
pub const WS_QUOTE_PATH: &str = "/ws/quote";

/// Domestic execution (trade) stream.
pub const WS_TRADE_PATH: &str = "/ws/trade";

/// Foreign stock trade + quote stream.
pub const WS_FOREIGN_QUOTE_PATH: &str = "/ws/foreign-quote";

/// Gold spot order book stream.
pub const WS_GOLD_QUOTE_PATH: &str = "/ws/gold-quote";

/// Gold spot execution stream.
pub const WS_GOLD_TRADE_PATH: &str = "/ws/gold-trade";

// ---------------------------------------------------------------------------
// Stream defaults
// ---------------------------------------------------------------------------

/// Stream connection defaults.
pub mod stream {
    /// Maximum consecutive reconnect attempts before giving up.
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
    /// Fixed delay between reconnect attempts (milliseconds).
    pub const RECONNECT_DELAY_MS: u64 = 3_000;
}

// ---------------------------------------------------------------------------
// Chart refresh defaults
// ---------------------------------------------------------------------------

/// Chart refresh loop defaults.
pub mod chart {
    /// Interval between chart snapshot fetches (milliseconds).
    pub const REFRESH_INTERVAL_MS: u64 = 500;
    /// Minimum time the loading skeleton stays up on first load (milliseconds).
    pub const MIN_SKELETON_MS: u64 = 700;
    /// Minute-bar width requested for intraday charts.
    pub const INTRADAY_MINUTE_GAP: u32 = 5;
    /// Look-back (in periods) for daily charts.
    pub const DAILY_LOOKBACK: i64 = 30;
    /// Look-back (in periods) for weekly, monthly and yearly charts.
    pub const LONG_LOOKBACK: i64 = 20;

    /// Gold chart candle counts.
    pub mod gold {
        /// Minute candles requested.
        pub const MINUTE_COUNT: u32 = 25;
        /// Daily candles requested.
        pub const DAY_COUNT: u32 = 50;
        /// Weekly candles requested.
        pub const WEEK_COUNT: u32 = 13;
        /// Monthly candles requested.
        pub const MONTH_COUNT: u32 = 3;
    }
}

// ---------------------------------------------------------------------------
// Gold products
// ---------------------------------------------------------------------------

/// Gold 99.99 1 kg.
pub const GOLD_1KG: &str = "M04020000";

/// Mini gold 99.99 100 g.
pub const GOLD_100G: &str = "M04020100";

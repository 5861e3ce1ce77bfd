//! Real-time market-data streams over WebSocket.
//!
//! The backend exposes one endpoint per stream:
//!
//! | Stream | Endpoint | Key | Listeners per key |
//! |---|---|---|---|
//! | [`QuoteStream`] | `/ws/quote` | stock code | many |
//! | [`TradeStream`] | `/ws/trade` | stock code | many |
//! | [`ForeignStream`] | `/ws/foreign-quote` | exchange, stock code, data type | many |
//! | [`GoldQuoteStream`] | `/ws/gold-quote` | single channel | one (last wins) |
//! | [`GoldTradeStream`] | `/ws/gold-trade` | single channel | one (last wins) |
//!
//! All five are served by the generic [`StreamClient`]; [`StreamPool`] holds
//! one of each for an application.
//!
//! ## Delivery
//!
//! Frames reach listeners in the order the socket delivers them, with no
//! deduplication and no ordering across streams. Malformed frames are dropped
//! and never reach a listener. Listeners run on the driver task, so they
//! should hand work off rather than block.

pub mod client;
pub mod pool;
pub mod protocol;
pub mod registry;

pub use client::{ConnectionState, StreamClient, StreamConfig};
pub use pool::StreamPool;
pub use protocol::{
    Action, ControlFrame, ForeignStream, GoldQuoteStream, GoldTradeStream, QuoteStream, Routed,
    StreamKind, SubscriptionKey, TradeStream,
};
pub use registry::{DispatchPolicy, Listener, listener};

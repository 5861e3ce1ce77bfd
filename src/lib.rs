//! # hana-feed
//!
//! Real-time market data for the TheNext brokerage backend: WebSocket stream
//! clients for domestic quotes and trades, foreign stocks and gold spot, plus
//! a chart session that merges periodic REST snapshots with live prices.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hana_feed::ws::{StreamConfig, StreamPool, SubscriptionKey};
//! use hana_feed::FeedConfig;
//!
//! #[tokio::main]
//! async fn main() -> hana_feed::Result<()> {
//!     let config = FeedConfig::from_env()?;
//!     let streams = StreamPool::new(&config, StreamConfig::default())?;
//!
//!     streams.trade.subscribe(SubscriptionKey::stock("005930"), |tick| {
//!         println!("{} @ {}", tick.stock_code, tick.current_price);
//!     });
//!     streams.trade.connect().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod ws;

/// Re-export the REST client at crate root for convenience.
pub use client::RestClient;
/// Re-export the configuration type.
pub use config::FeedConfig;
/// Re-export the error type and Result alias.
pub use error::{FeedError, Result};
/// Re-export the chart session.
pub use chart::{ChartSession, ChartState};
/// Re-export the stream clients.
pub use ws::{StreamClient, StreamPool};

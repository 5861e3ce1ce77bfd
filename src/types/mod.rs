//! Typed payloads for the market-data streams and the chart snapshot API.
//!
//! - [`enums`]: instruments, chart periods, foreign data types, price direction
//! - [`stream`]: tick payloads delivered by the five WebSocket streams
//! - [`chart`]: REST chart snapshot responses
//!
//! All enums are re-exported at the module root via `pub use enums::*`.

pub mod chart;
pub mod enums;
pub mod stream;

pub use enums::*;

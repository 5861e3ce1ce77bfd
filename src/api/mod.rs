//! REST API endpoint implementations.
//!
//! Each sub-module adds `async` methods to
//! [`RestClient`](crate::client::RestClient) via `impl` blocks.
//!
//! | Module | Endpoints | Description |
//! |---|---|---|
//! | [`chart`] | 7 | Domestic, foreign and gold chart snapshots |

pub mod chart;

//! Chart data that stays current.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`model`] | Render-ready [`ChartViewModel`] built from REST snapshots |
//! | [`source`] | [`SnapshotSource`]: where full snapshots come from |
//! | [`live`] | [`PriceFeed`]: price ticks from the trade streams |
//! | [`session`] | [`ChartSession`]: polling-merge loop tying the two together |

pub mod live;
pub mod model;
pub mod session;
pub mod source;

pub use live::{PriceFeed, PriceWatch};
pub use model::{Candle, ChartViewModel, PriceOverlay, VolumeBar};
pub use session::{ChartSession, ChartSessionConfig, ChartState};
pub use source::SnapshotSource;

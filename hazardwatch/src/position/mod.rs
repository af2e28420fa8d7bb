//! Device position input.
//!
//! The engine consumes positions through the [`PositionSource`] trait. Two
//! adapters ship with the library:
//!
//! - [`ManualPositionSource`] - push-style, fed by an OS callback or a replay
//! - [`PollingPositionSource`] - pull-style, polls a [`PositionReader`]
//!
//! Both apply the watch's [`WatchOptions`] through an [`UpdateFilter`].

mod filter;
mod manual;
mod model;
mod polling;
mod source;

pub use filter::UpdateFilter;
pub use manual::ManualPositionSource;
pub use model::Position;
pub use polling::{PollingPositionSource, PositionReader};
pub use source::{Accuracy, PositionCallback, PositionSource, Subscription, WatchOptions};

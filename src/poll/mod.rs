//! Polling a condition under a ticker.
//!
//! - [`poll`] the engine
//! - `with_*` one-line compositions of a ticker constructor and [`poll`]

mod engine;
mod with;

pub use engine::poll;
pub use with::{with_deadline, with_interval, with_jitter, with_max_intervals, with_timeout};

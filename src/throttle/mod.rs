//! Throttling batches of work.
//!
//! ## Contents
//! - [`Rate`]     admissions per second, with `INFINITE` and `ZERO` sentinels
//! - [`Throttle`] token bucket (rate) plus semaphore (burst) admission
//!
//! ## Quick wiring
//! ```text
//! Throttle { rate, burst }
//!      └─► process(ctx, events)
//!           - bucket.reserve(len)   how long until the batch may start
//!           - slots.acquire(len)    at most `burst` events in flight
//!           - events run in order, slots released afterwards
//! ```
//!
//! ## Defaults
//! - `Throttle::default()` → infinite rate, burst 1 (a plain mutex-like gate).

mod bucket;
mod rate;
#[allow(clippy::module_inception)]
mod throttle;

pub use rate::Rate;
pub use throttle::Throttle;

//! # Condition abstraction and function-backed conditions.
//!
//! A [`Condition`] is checked once per pulse by [`poll`](crate::poll):
//! - `Ok(true)`  → satisfied, polling ends successfully;
//! - `Ok(false)` → not yet, wait for the next pulse;
//! - `Err(e)`    → polling ends with [`PollError::Condition`](crate::PollError::Condition).
//!
//! Two adapters cover the common cases:
//! - [`ConditionFn`] wraps a synchronous `FnMut() -> Result<bool, BoxError>`;
//! - [`AsyncConditionFn`] wraps a closure producing a fresh future per check.
//!
//! State the condition needs lives in the closure. Checks are never run
//! concurrently with each other, so `FnMut` is enough.

use std::future::Future;

use async_trait::async_trait;

use crate::error::BoxError;

/// # Predicate polled until it holds.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use waitline::{BoxError, Condition};
///
/// struct Countdown(u32);
///
/// #[async_trait]
/// impl Condition for Countdown {
///     async fn check(&mut self) -> Result<bool, BoxError> {
///         self.0 = self.0.saturating_sub(1);
///         Ok(self.0 == 0)
///     }
/// }
/// ```
#[async_trait]
pub trait Condition: Send {
    /// Checks the condition once.
    async fn check(&mut self) -> Result<bool, BoxError>;
}

/// Synchronous function-backed condition.
///
/// ## Example
/// ```rust
/// use waitline::ConditionFn;
///
/// let mut ready = false;
/// let cond = ConditionFn::new(move || {
///     let was = ready;
///     ready = true;
///     Ok(was)
/// });
/// # drop(cond);
/// ```
#[derive(Debug)]
pub struct ConditionFn<F> {
    f: F,
}

impl<F> ConditionFn<F>
where
    F: FnMut() -> Result<bool, BoxError> + Send,
{
    /// Wraps `f` as a condition.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Condition for ConditionFn<F>
where
    F: FnMut() -> Result<bool, BoxError> + Send,
{
    async fn check(&mut self) -> Result<bool, BoxError> {
        (self.f)()
    }
}

/// Asynchronous function-backed condition.
///
/// Wraps a closure that *creates* a new future per check. The future owns
/// whatever it needs (clone `Arc`s into it).
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use waitline::{AsyncConditionFn, BoxError};
///
/// let flag = Arc::new(AtomicBool::new(false));
/// let cond = AsyncConditionFn::new(move || {
///     let flag = flag.clone();
///     async move { Ok::<_, BoxError>(flag.load(Ordering::Acquire)) }
/// });
/// # drop(cond);
/// ```
#[derive(Debug)]
pub struct AsyncConditionFn<F> {
    f: F,
}

impl<F, Fut> AsyncConditionFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    /// Wraps `f` as a condition.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Condition for AsyncConditionFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    async fn check(&mut self) -> Result<bool, BoxError> {
        (self.f)().await
    }
}

//! # Rate- and concurrency-bounded batch admission.
//!
//! [`Throttle::process`] admits a batch of events as a whole, then runs them in order.
//!
//! ## Admission flow
//! ```text
//! process(ctx, events)
//!   ├─► len > burst ? ───────────────► BurstExceeded      (never fits)
//!   ├─► ctx done ? ──────────────────► ContextDone
//!   ├─► reserve len tokens (lock)
//!   │     └─ wait > ctx remaining ? ─► WouldExceedDeadline (nothing reserved)
//!   ├─► sleep(wait)          ◄── ctx done ─► give tokens back ─► Cancelled
//!   ├─► acquire len slots    ◄── ctx done ─► give tokens back ─► Cancelled
//!   ├─► run events in order; first Err ─► EventFailed{index}, rest not started
//!   └─► release slots (every path, including panics)
//! ```
//!
//! ## Rules
//! - At most `burst` admitted events execute at any time, across all callers.
//! - Admissions are spaced at `1/rate` once the initial burst is spent.
//! - A batch is admitted entirely or not at all.
//! - Dropping a pending `process` future returns its reserved tokens.
//! - The bucket lock covers only read-check-update, never event execution.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::{
    select,
    sync::{Semaphore, SemaphorePermit},
    time::{self, Instant},
};

use crate::{
    config::ThrottleConfig,
    context::Context,
    error::{BoxError, ThrottleError},
    throttle::{
        Rate,
        bucket::{Bucket, Refused},
    },
};

/// Token-bucket throttle bounding both admission rate and concurrency.
///
/// Share it between callers with an `Arc`.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use waitline::{BoxError, Context, Rate, Throttle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let throttle = Throttle::new(Rate::per_second(100.0), 2);
/// let ctx = Context::with_timeout(Duration::from_secs(1));
///
/// throttle
///     .process(&ctx, (0..2).map(|_| async { Ok::<_, BoxError>(()) }))
///     .await
///     .unwrap();
///
/// let err = throttle
///     .process(&ctx, (0..3).map(|_| async { Ok::<_, BoxError>(()) }))
///     .await
///     .unwrap_err();
/// assert!(err.is_rejection());
/// # }
/// ```
#[derive(Debug)]
pub struct Throttle {
    rate: Rate,
    burst: usize,
    bucket: Mutex<Bucket>,
    slots: Semaphore,
}

impl Throttle {
    /// Creates a throttle admitting `rate` events per second, at most `burst` at once.
    ///
    /// `burst` is capped at `u32::MAX` (and the semaphore maximum); `0` admits nothing.
    pub fn new(rate: Rate, burst: usize) -> Self {
        let burst = burst
            .min(u32::MAX as usize)
            .min(Semaphore::MAX_PERMITS);
        Self {
            rate,
            burst,
            bucket: Mutex::new(Bucket::new(rate, burst, Instant::now())),
            slots: Semaphore::new(burst),
        }
    }

    /// Creates a throttle from a [`ThrottleConfig`].
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.rate, config.burst)
    }

    /// Configured admission rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Configured burst (maximum concurrently admitted events).
    pub fn burst(&self) -> usize {
        self.burst
    }

    /// Number of admitted events currently executing.
    pub fn in_flight(&self) -> usize {
        self.burst - self.slots.available_permits()
    }

    /// Current bucket level; negative while admissions are queued.
    ///
    /// Always `burst` for an infinite rate.
    pub fn tokens(&self) -> f64 {
        if self.rate.is_infinite() {
            return self.burst as f64;
        }
        self.lock().level(Instant::now())
    }

    /// Admits `events` as one batch and runs them in order.
    ///
    /// ### Errors
    /// Rejections (nothing ran): [`ThrottleError::BurstExceeded`],
    /// [`ThrottleError::ContextDone`], [`ThrottleError::WouldExceedDeadline`],
    /// [`ThrottleError::Cancelled`]. After admission, the first failing event
    /// ends the batch with [`ThrottleError::EventFailed`].
    ///
    /// An empty batch succeeds without waiting once the context check passed.
    pub async fn process<I, Fut, E>(&self, ctx: &Context, events: I) -> Result<(), ThrottleError>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<(), E>>,
        E: Into<BoxError>,
    {
        let events: Vec<Fut> = events.into_iter().collect();
        let n = events.len();

        if n > self.burst {
            tracing::debug!(events = n, burst = self.burst, "throttle batch exceeds burst");
            return Err(ThrottleError::BurstExceeded {
                events: n,
                burst: self.burst,
            });
        }
        if ctx.is_done() {
            tracing::debug!(events = n, "throttle context already done");
            return Err(ThrottleError::ContextDone);
        }
        if n == 0 {
            return Ok(());
        }

        let _permit = self.admit(ctx, n).await?;
        tracing::trace!(events = n, in_flight = self.in_flight(), "throttle admitted batch");

        for (index, event) in events.into_iter().enumerate() {
            if let Err(e) = event.await {
                let error = e.into();
                tracing::debug!(index, %error, "throttle event failed");
                return Err(ThrottleError::EventFailed { index, error });
            }
        }
        Ok(())
    }

    /// Waits until `n` tokens and `n` slots are available for this batch.
    ///
    /// The reserved tokens go back to the bucket on every path that does not
    /// end in admission, including drop of the pending future.
    async fn admit(&self, ctx: &Context, n: usize) -> Result<SemaphorePermit<'_>, ThrottleError> {
        let wait = self.reserve(ctx, n)?;
        let reservation = Reservation {
            throttle: self,
            events: n,
            armed: true,
        };

        if !wait.is_zero() {
            select! {
                biased;
                _ = ctx.done() => {
                    tracing::debug!(events = n, ?wait, "throttle cancelled while waiting for tokens");
                    return Err(ThrottleError::Cancelled);
                }
                _ = time::sleep(wait) => {}
            }
        }

        // `n <= burst <= u32::MAX`, checked on construction and in `process`.
        let permits = n as u32;
        let permit = select! {
            biased;
            _ = ctx.done() => {
                tracing::debug!(events = n, "throttle cancelled while waiting for slots");
                return Err(ThrottleError::Cancelled);
            }
            res = self.slots.acquire_many(permits) => res.map_err(|_closed| ThrottleError::Cancelled)?,
        };
        reservation.commit();
        Ok(permit)
    }

    /// Takes tokens for `n` events unless the wait cannot finish before the deadline.
    fn reserve(&self, ctx: &Context, n: usize) -> Result<Duration, ThrottleError> {
        if self.rate.is_infinite() {
            return Ok(Duration::ZERO);
        }

        let res = self.lock().reserve(Instant::now(), n, ctx.remaining());
        res.map_err(|refused| {
            let wait = match refused {
                Refused::TooLong(wait) => Some(wait),
                Refused::Never => None,
            };
            tracing::debug!(events = n, ?wait, "throttle wait would exceed context deadline");
            ThrottleError::WouldExceedDeadline { wait }
        })
    }

    fn unreserve(&self, n: usize) {
        if !self.rate.is_infinite() {
            self.lock().cancel(Instant::now(), n);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Bucket> {
        // Every bucket update is a single assignment; a poisoned guard is still consistent.
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tokens taken for a batch that is not admitted yet.
///
/// Dropping it before [`commit`](Reservation::commit) gives the tokens back.
struct Reservation<'a> {
    throttle: &'a Throttle,
    events: usize,
    armed: bool,
}

impl Reservation<'_> {
    fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.throttle.unreserve(self.events);
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn ok() -> impl Future<Output = Result<(), BoxError>> {
        async { Ok(()) }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_batches_are_spaced_by_rate() {
        let throttle = Throttle::new(Rate::per_second(2.0), 1);
        let ctx = Context::background();
        let start = Instant::now();
        for _ in 0..10 {
            throttle.process(&ctx, [ok()]).await.unwrap();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(4500), "elapsed {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(5500), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_zero_burst_rejects_everything() {
        let throttle = Throttle::new(Rate::INFINITE, 0);
        let ran = AtomicUsize::new(0);
        for _ in 0..10 {
            let err = throttle
                .process(
                    &Context::background(),
                    [async {
                        ran.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, BoxError>(())
                    }],
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ThrottleError::BurstExceeded { events: 1, burst: 0 }));
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_batch_runs_nothing() {
        let throttle = Throttle::new(Rate::per_second(20.0), 1);
        let ran = AtomicUsize::new(0);
        let counter = &ran;
        let events = (0..5).map(move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(())
        });
        let err = throttle
            .process(&Context::background(), events)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceed throttle burst capacity 1"));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_done_context_is_rejected() {
        let throttle = Throttle::new(Rate::per_second(20.0), 1);
        let ctx = Context::background();
        ctx.cancel();
        let err = throttle.process(&ctx, [ok()]).await.unwrap_err();
        assert!(matches!(err, ThrottleError::ContextDone));
        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_infeasible_deadline_fails_fast() {
        let throttle = Throttle::new(Rate::per_second(20.0), 1);
        throttle.process(&Context::background(), [ok()]).await.unwrap();

        let ctx = Context::with_timeout(Duration::from_millis(1));
        let start = Instant::now();
        let err = throttle.process(&ctx, [ok()]).await.unwrap_err();
        assert!(matches!(err, ThrottleError::WouldExceedDeadline { wait: Some(_) }));
        assert!(err.to_string().contains("would exceed throttle context deadline"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_rate_only_admits_initial_burst() {
        let throttle = Throttle::new(Rate::ZERO, 2);
        let ctx = Context::background();
        throttle.process(&ctx, [ok(), ok()]).await.unwrap();
        let err = throttle.process(&ctx, [ok()]).await.unwrap_err();
        assert!(matches!(err, ThrottleError::WouldExceedDeadline { wait: None }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_gives_tokens_back() {
        let throttle = Arc::new(Throttle::new(Rate::per_second(1.0), 1));
        throttle.process(&Context::background(), [ok()]).await.unwrap();

        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(1)).await;
            canceller.cancel();
        });

        let ran = AtomicUsize::new(0);
        let err = throttle
            .process(
                &ctx,
                [async {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ThrottleError::Cancelled));
        assert!(err.to_string().contains("throttle context timed out or cancelled"));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        // Only the first admission is still charged.
        assert!(throttle.tokens() > -0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_gives_tokens_back() {
        let throttle = Throttle::new(Rate::per_second(1.0), 1);
        let ctx = Context::background();
        throttle.process(&ctx, [ok()]).await.unwrap();

        let abandoned = time::timeout(Duration::from_millis(10), throttle.process(&ctx, [ok()])).await;
        assert!(abandoned.is_err());
        assert!(throttle.tokens() > -0.5);

        let start = Instant::now();
        throttle.process(&ctx, [ok()]).await.unwrap();
        assert!(start.elapsed() <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_for_slots() {
        let throttle = Arc::new(Throttle::new(Rate::per_second(100.0), 1));
        let holder = {
            let throttle = throttle.clone();
            tokio::spawn(async move {
                let long = async {
                    time::sleep(Duration::from_secs(10)).await;
                    Ok::<_, BoxError>(())
                };
                throttle.process(&Context::background(), [long]).await
            })
        };

        // Tokens refill meanwhile; only the slot is taken.
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(throttle.in_flight(), 1);
        assert_eq!(throttle.tokens(), 1.0);

        let ran = AtomicUsize::new(0);
        let ctx = Context::with_timeout(Duration::from_secs(1));
        let err = throttle
            .process(
                &ctx,
                [async {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ThrottleError::Cancelled));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(throttle.in_flight(), 1);
        assert_eq!(throttle.tokens(), 1.0);

        holder.await.unwrap().unwrap();
        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failing_event_stops_batch() {
        let throttle = Throttle::new(Rate::INFINITE, 3);
        let ran = AtomicUsize::new(0);
        let counter = &ran;
        let events = (0..3).map(move |i| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if i == 1 {
                return Err::<(), BoxError>("ouch".into());
            }
            Ok(())
        });
        let err = throttle
            .process(&Context::background(), events)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "processing event 1 returned error: ouch");
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_accessors() {
        let throttle = Throttle::new(Rate::per_second(20.0), 5);
        assert_eq!(throttle.rate(), Rate::per_second(20.0));
        assert_eq!(throttle.burst(), 5);
        assert_eq!(throttle.in_flight(), 0);
        assert_eq!(Throttle::new(Rate::INFINITE, 4).tokens(), 4.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_burst_is_hard_concurrency_ceiling() {
        const BURST: usize = 3;
        let throttle = Arc::new(Throttle::new(Rate::INFINITE, BURST));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let peak_slots = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..64 {
            let throttle = throttle.clone();
            let current = current.clone();
            let peak = peak.clone();
            let peak_slots = peak_slots.clone();
            handles.push(tokio::spawn(async move {
                let size = 1 + i % BURST;
                let events = (0..size).map(|_| {
                    let throttle = throttle.clone();
                    let current = current.clone();
                    let peak = peak.clone();
                    let peak_slots = peak_slots.clone();
                    async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        peak_slots.fetch_max(throttle.in_flight(), Ordering::SeqCst);
                        time::sleep(Duration::from_millis(1)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, BoxError>(())
                    }
                });
                throttle.process(&Context::background(), events).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= BURST);
        assert!(peak_slots.load(Ordering::SeqCst) <= BURST);
        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_contention_under_tiny_deadline_is_rejected() {
        let throttle = Arc::new(Throttle::new(Rate::per_second(20.0), 1));
        let mut handles = Vec::new();
        for _ in 0..55 {
            let throttle = throttle.clone();
            handles.push(tokio::spawn(async move {
                let ctx = Context::with_timeout(Duration::from_millis(1));
                throttle.process(&ctx, [ok()]).await
            }));
        }

        let start = std::time::Instant::now();
        let mut infeasible = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => {}
                Err(ThrottleError::WouldExceedDeadline { .. }) => {
                    infeasible += 1;
                    rejected += 1;
                }
                Err(e) if e.is_rejection() => rejected += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(infeasible > 0);
        assert!(rejected >= 50, "rejected {rejected}");
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]
        #[test]
        fn prop_in_flight_never_exceeds_burst(
            burst in 1usize..6,
            sizes in proptest::collection::vec(1usize..8, 1..40),
        ) {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(4)
                .enable_time()
                .build()
                .unwrap();

            let peak = rt.block_on(async {
                let throttle = Arc::new(Throttle::new(Rate::INFINITE, burst));
                let current = Arc::new(AtomicUsize::new(0));
                let peak = Arc::new(AtomicUsize::new(0));

                let handles: Vec<_> = sizes
                    .iter()
                    .map(|&size| {
                        let throttle = throttle.clone();
                        let current = current.clone();
                        let peak = peak.clone();
                        tokio::spawn(async move {
                            let events = (0..size.min(burst)).map(|_| {
                                let current = current.clone();
                                let peak = peak.clone();
                                async move {
                                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                                    peak.fetch_max(now, Ordering::SeqCst);
                                    tokio::task::yield_now().await;
                                    current.fetch_sub(1, Ordering::SeqCst);
                                    Ok::<_, BoxError>(())
                                }
                            });
                            throttle.process(&Context::background(), events).await
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.await.unwrap().unwrap();
                }
                peak.load(Ordering::SeqCst)
            });

            proptest::prop_assert!(peak <= burst);
        }
    }
}

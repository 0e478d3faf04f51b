//! # Convenience compositions.
//!
//! Each function builds one ticker and hands it to [`poll`]. They exist for
//! call-site brevity only; anything they do can be written as
//! `poll(ctx, <ticker>, condition)`.

use std::time::Duration;

use tokio::time::Instant;

use crate::{
    condition::Condition,
    context::Context,
    error::PollError,
    poll::poll,
    ticker::{deadlined, expiring, interval, jittering, max_intervals},
};

/// [`poll`] with [`interval`].
pub async fn with_interval<C: Condition>(
    ctx: &Context,
    every: Duration,
    condition: C,
) -> Result<(), PollError> {
    poll(ctx, interval(every), condition).await
}

/// [`poll`] with [`max_intervals`].
pub async fn with_max_intervals<C: Condition>(
    ctx: &Context,
    every: Duration,
    max: usize,
    condition: C,
) -> Result<(), PollError> {
    poll(ctx, max_intervals(every, max), condition).await
}

/// [`poll`] with [`deadlined`].
pub async fn with_deadline<C: Condition>(
    ctx: &Context,
    every: Duration,
    deadline: Instant,
    condition: C,
) -> Result<(), PollError> {
    poll(ctx, deadlined(every, deadline), condition).await
}

/// [`poll`] with [`expiring`].
pub async fn with_timeout<C: Condition>(
    ctx: &Context,
    every: Duration,
    timeout: Duration,
    condition: C,
) -> Result<(), PollError> {
    poll(ctx, expiring(every, timeout), condition).await
}

/// [`poll`] with [`jittering`].
pub async fn with_jitter<C: Condition>(
    ctx: &Context,
    interval: Duration,
    offset: Duration,
    timeout: Duration,
    condition: C,
) -> Result<(), PollError> {
    poll(ctx, jittering(interval, offset, timeout), condition).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionFn;

    fn fifth() -> impl Condition {
        let mut count = 0;
        ConditionFn::new(move || {
            count += 1;
            Ok(count == 5)
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_interval() {
        with_interval(&Context::background(), Duration::from_millis(20), fifth())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_max_intervals() {
        with_max_intervals(&Context::background(), Duration::from_millis(20), 10, fifth())
            .await
            .unwrap();

        let err = with_max_intervals(&Context::background(), Duration::from_millis(20), 4, fifth())
            .await
            .unwrap_err();
        assert!(err.is_exceeded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_and_timeout() {
        let deadline = Instant::now() + Duration::from_millis(55);
        with_deadline(&Context::background(), Duration::from_millis(5), deadline, fifth())
            .await
            .unwrap();

        with_timeout(
            &Context::background(),
            Duration::from_millis(5),
            Duration::from_millis(55),
            fifth(),
        )
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_jitter() {
        let start = Instant::now();
        with_jitter(
            &Context::background(),
            Duration::from_millis(50),
            Duration::from_millis(10),
            Duration::from_millis(1250),
            fifth(),
        )
        .await
        .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}

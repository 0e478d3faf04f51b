//! # Example: throttled_batches
//!
//! Demonstrates [`Throttle`] admitting batches from several concurrent
//! callers at a bounded rate, with at most `burst` events in flight.
//!
//! ## Flow
//! ```text
//! Throttle { rate = 4/s, burst = 2 }
//!   ├─► caller 0: process([e, e]) ── admitted at once (bucket starts full)
//!   ├─► caller 1: process([e])    ── waits for tokens, then a slot
//!   ├─► caller 2: process([e, e]) ── waits for tokens, then slots
//!   ├─► caller 3: process([e, e, e]) ──► Err(BurstExceeded)
//!   └─► caller 4: process([e]) under a 10ms deadline ──► Err(WouldExceedDeadline)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example throttled_batches
//! ```

use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use waitline::{BoxError, Context, Rate, Throttle, ThrottleError};

async fn event(caller: usize, idx: usize, started: Instant) -> Result<(), BoxError> {
    println!(
        "[caller {caller}] event {idx} at {:>4}ms",
        started.elapsed().as_millis()
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let throttle = Arc::new(Throttle::new(Rate::per_second(4.0), 2));
    let started = Instant::now();
    let ctx = Context::with_timeout(Duration::from_secs(10));

    // 1. Three well-formed batches compete for the same throttle
    let mut handles = Vec::new();
    for (caller, size) in [2usize, 1, 2].into_iter().enumerate() {
        let throttle = throttle.clone();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            throttle
                .process(&ctx, (0..size).map(|idx| event(caller, idx, started)))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    // 2. A batch larger than the burst is rejected up front
    match throttle
        .process(&ctx, (0..3).map(|idx| event(3, idx, started)))
        .await
    {
        Err(err @ ThrottleError::BurstExceeded { .. }) => println!("[caller 3] rejected: {err}"),
        other => println!("[caller 3] unexpected: {other:?}"),
    }

    // 3. Exhaust the bucket, then ask under a deadline that cannot be met
    throttle
        .process(&ctx, (0..2).map(|idx| event(4, idx, started)))
        .await?;
    let tight = ctx.timeout(Duration::from_millis(10));
    if let Err(err) = throttle
        .process(&tight, [event(4, 2, started)])
        .await
    {
        println!("[caller 4] rejected: {err} (label={})", err.as_label());
    }

    println!(
        "done in {}ms, {} tokens left",
        started.elapsed().as_millis(),
        throttle.tokens()
    );
    Ok(())
}

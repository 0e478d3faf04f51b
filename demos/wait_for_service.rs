//! # Example: wait_for_service
//!
//! Demonstrates waiting for a dependency to come up with [`poll`] and a
//! jittered [`Ticker`](waitline::Ticker), so several waiters do not hammer
//! the service in lockstep.
//!
//! A background task flips the service to "ready" after ~300ms. The waiter
//! checks every 50ms ± jitter and gives up after 2s.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► spawn(service) ──── sleep(300ms) ──► ready = true
//!   ├─► poll(ctx, jittering(50ms, 20ms, 2s), probe)
//!   │     ├─► pulse → probe() → Ok(false)
//!   │     ├─► pulse → probe() → Ok(false)
//!   │     └─► pulse → probe() → Ok(true)  ──► Ok(())
//!   └─► poll(ctx, max_intervals(10ms, 3), never) → Err(Exceeded)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example wait_for_service
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};
use waitline::{AsyncConditionFn, BoxError, ConditionFn, Context, jittering, max_intervals, poll};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A "service" that becomes ready after a while
    let ready = Arc::new(AtomicBool::new(false));
    let flag = ready.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        println!("[service] ready");
        flag.store(true, Ordering::Release);
    });

    // 2. Probe it on a jittered schedule, bounded by an outer context
    let ctx = Context::with_timeout(Duration::from_secs(5));
    let attempts = Arc::new(AtomicU32::new(0));
    let probe = {
        let attempts = attempts.clone();
        AsyncConditionFn::new(move || {
            let ready = ready.clone();
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                let up = ready.load(Ordering::Acquire);
                println!("[waiter] probe #{attempt}: up={up}");
                Ok::<_, BoxError>(up)
            }
        })
    };
    poll(
        &ctx,
        jittering(
            Duration::from_millis(50),
            Duration::from_millis(20),
            Duration::from_secs(2),
        ),
        probe,
    )
    .await?;
    println!(
        "[waiter] service up after {} probes",
        attempts.load(Ordering::Relaxed)
    );

    // 3. A condition that never holds runs out of pulses
    let err = poll(
        &ctx,
        max_intervals(Duration::from_millis(10), 3),
        ConditionFn::new(|| Ok(false)),
    )
    .await
    .unwrap_err();
    println!("[waiter] gave up: {err} (label={})", err.as_label());

    Ok(())
}

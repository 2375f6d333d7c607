//! Tokio pump standing in for the host's cooperative event loop.
//!
//! DESIGN
//! ======
//! The panel is single-threaded (`Rc` callbacks, `Rc<RefCell<_>>` sharing),
//! so the driver runs on a current-thread runtime or inside a `LocalSet`.
//! Each tick borrows the panel only long enough to take the due
//! notifications; callbacks run with the borrow released, so they may call
//! back into the panel.

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::dispatch::{Clock, Pending, SystemClock};
use crate::panel::Panel;

/// Clock backed by tokio's timer, so paused-time tests advance it.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
    epoch_ms: i64,
}

impl TokioClock {
    /// Anchor tokio's monotonic time to the current wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self { origin: Instant::now(), epoch_ms: SystemClock.now_millis() }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.epoch_ms.saturating_add(elapsed)
    }
}

/// Pump `panel` every `tick` until `shutdown` resolves, then flush whatever is
/// still pending. Returns the number of callbacks delivered.
pub async fn run(panel: Rc<RefCell<Panel>>, tick: Duration, shutdown: impl Future<Output = ()>) -> usize {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let instance = panel.borrow().instance_id();
    debug!(panel = %instance, ?tick, "driver: started");

    let mut delivered = 0usize;
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                let ready = panel.borrow_mut().take_ready();
                delivered += deliver(ready);
            }
        }
    }

    let rest = panel.borrow_mut().take_all();
    delivered += deliver(rest);
    debug!(panel = %instance, delivered, "driver: stopped");
    delivered
}

/// Sleep until the panel has nothing pending, delivering as windows elapse.
pub async fn settle(panel: &Rc<RefCell<Panel>>) -> usize {
    let mut delivered = 0usize;
    loop {
        let next = panel.borrow().next_due();
        let Some(due) = next else {
            return delivered;
        };
        let now = panel.borrow().now_millis();
        if due > now {
            let wait = u64::try_from(due - now).unwrap_or(0);
            trace!(wait_ms = wait, "driver: waiting for debounce window");
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
        let ready = panel.borrow_mut().take_ready();
        if ready.is_empty() {
            // Clock and timer disagree by less than a millisecond.
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        delivered += deliver(ready);
    }
}

fn deliver(ready: Vec<Pending>) -> usize {
    let count = ready.len();
    for p in ready {
        trace!(id = %p.event.id, kind = %p.event.kind, "driver: delivered");
        p.callback.call(&p.event);
    }
    count
}

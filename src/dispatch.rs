//! Change events, clocks, and the per-panel debouncer.
//!
//! DESIGN
//! ======
//! A raw input becomes a [`ChangeEvent`] immediately, but delivery is deferred
//! by the debounce window: the event and its callback are parked in the
//! [`Debouncer`] and handed out by [`Debouncer::take_due`] once the panel clock
//! passes the due time. Scheduling a new notification supersedes pending ones
//! within the configured [`DebounceScope`]: every pending notification on the
//! panel (`Panel`, the default) or only the same control's (`Control`).
//!
//! The callback itself never runs while scheduling, so a burst of raw events
//! collapses to the last scheduled value.

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::descriptor::ControlKind;
use crate::host::NodeId;
use crate::value::Value;

// =============================================================================
// EVENTS
// =============================================================================

/// Normalized change notification handed to callbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    /// Un-prefixed logical id (the radio-group id for radio options).
    pub id: String,
    /// Host node that produced the change.
    pub target: NodeId,
    /// Kind of the reporting control.
    pub kind: ControlKind,
    /// Logical value at the time of the change.
    pub value: Value,
    /// Milliseconds since the Unix epoch, from the panel clock.
    pub timestamp: i64,
}

/// Change callback shared between controls.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&ChangeEvent)>);

impl Callback {
    pub fn new(f: impl Fn(&ChangeEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &ChangeEvent) {
        (self.0)(event);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

// =============================================================================
// CLOCKS
// =============================================================================

/// Millisecond time source for timestamps and debounce deadlines.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<i64>>);

impl ManualClock {
    #[must_use]
    pub fn new(start: i64) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn advance(&self, millis: i64) {
        self.0.set(self.0.get() + millis);
    }

    pub fn set(&self, millis: i64) {
        self.0.set(millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.get()
    }
}

// =============================================================================
// DEBOUNCER
// =============================================================================

/// Which pending notifications a new one supersedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebounceScope {
    /// One slot for the whole panel.
    #[default]
    Panel,
    /// One slot per control.
    Control,
}

/// A notification waiting for its debounce window to elapse.
#[derive(Debug, Clone)]
pub struct Pending {
    /// Resolved id of the control that scheduled it.
    pub control: String,
    pub due: i64,
    pub event: ChangeEvent,
    pub callback: Callback,
}

/// Deferred, coalescing delivery queue owned by one panel.
#[derive(Debug)]
pub struct Debouncer {
    delay_ms: i64,
    scope: DebounceScope,
    pending: Vec<Pending>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay_ms: i64, scope: DebounceScope) -> Self {
        Self { delay_ms, scope, pending: Vec::new() }
    }

    #[must_use]
    pub fn scope(&self) -> DebounceScope {
        self.scope
    }

    /// Park `event` for delivery `delay_ms` after `now`, superseding pending
    /// notifications within the scope.
    pub fn schedule(&mut self, now: i64, control: &str, event: ChangeEvent, callback: Callback) {
        let before = self.pending.len();
        match self.scope {
            DebounceScope::Panel => self.pending.clear(),
            DebounceScope::Control => self.pending.retain(|p| p.control != control),
        }
        let superseded = before - self.pending.len();
        if superseded > 0 {
            trace!(control, superseded, "dispatch: superseded pending notification");
        }
        trace!(control, due = now + self.delay_ms, "dispatch: scheduled");
        self.pending.push(Pending { control: control.to_owned(), due: now + self.delay_ms, event, callback });
    }

    /// Drop pending notifications of a removed control.
    pub fn cancel(&mut self, control: &str) {
        self.pending.retain(|p| p.control != control);
    }

    /// Remove and return every notification due at `now`, in scheduling order.
    pub fn take_due(&mut self, now: i64) -> Vec<Pending> {
        let (due, waiting): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;
        due
    }

    /// Remove and return everything pending regardless of time.
    pub fn take_all(&mut self) -> Vec<Pending> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn pending(&self) -> &[Pending] {
        &self.pending
    }

    /// Earliest due time, if anything is pending.
    #[must_use]
    pub fn next_due(&self) -> Option<i64> {
        self.pending.iter().map(|p| p.due).min()
    }
}

// =============================================================================
// CUSTOM DISPATCH HOOK
// =============================================================================

/// Handle custom controls call from their host event handlers to run the
/// change pipeline for their node. Queued nodes are drained by the panel on
/// its next tick.
#[derive(Debug, Clone, Default)]
pub struct DispatchHook {
    inbox: Rc<RefCell<VecDeque<NodeId>>>,
}

impl DispatchHook {
    /// Report that the custom control mounted at `node` changed.
    pub fn notify(&self, node: NodeId) {
        self.inbox.borrow_mut().push_back(node);
    }

    pub(crate) fn drain(&self) -> Vec<NodeId> {
        self.inbox.borrow_mut().drain(..).collect()
    }
}

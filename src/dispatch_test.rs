use super::*;

fn event(id: &str, value: f64, timestamp: i64) -> ChangeEvent {
    ChangeEvent {
        id: id.to_owned(),
        target: crate::host::HostTree::new().root(),
        kind: ControlKind::Slider,
        value: Value::Number(value),
        timestamp,
    }
}

fn noop() -> Callback {
    Callback::new(|_| {})
}

// =============================================================
// Clocks
// =============================================================

#[test]
fn manual_clock_clones_share_time() {
    let clock = ManualClock::new(100);
    let other = clock.clone();
    clock.advance(5);
    assert_eq!(other.now_millis(), 105);
    other.set(0);
    assert_eq!(clock.now_millis(), 0);
}

#[test]
fn system_clock_is_after_epoch() {
    assert!(SystemClock.now_millis() > 1_600_000_000_000);
}

// =============================================================
// Debouncer
// =============================================================

#[test]
fn nothing_is_due_before_window() {
    let mut d = Debouncer::new(7, DebounceScope::Panel);
    d.schedule(0, "a", event("a", 1.0, 0), noop());
    assert!(d.take_due(6).is_empty());
    assert_eq!(d.next_due(), Some(7));
    assert_eq!(d.take_due(7).len(), 1);
    assert!(d.pending().is_empty());
}

#[test]
fn panel_scope_supersedes_everything() {
    let mut d = Debouncer::new(7, DebounceScope::Panel);
    d.schedule(0, "a", event("a", 1.0, 0), noop());
    d.schedule(1, "b", event("b", 2.0, 1), noop());
    let due = d.take_due(100);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].event.id, "b");
}

#[test]
fn control_scope_keeps_other_controls() {
    let mut d = Debouncer::new(7, DebounceScope::Control);
    d.schedule(0, "a", event("a", 1.0, 0), noop());
    d.schedule(1, "b", event("b", 2.0, 1), noop());
    d.schedule(2, "a", event("a", 3.0, 2), noop());
    let due = d.take_due(100);
    let seen: Vec<_> = due.iter().map(|p| (p.event.id.as_str(), p.event.value.clone())).collect();
    assert_eq!(seen, vec![("b", Value::Number(2.0)), ("a", Value::Number(3.0))]);
}

#[test]
fn burst_collapses_to_terminal_value() {
    let mut d = Debouncer::new(7, DebounceScope::Panel);
    for (t, v) in [(0, 1.0), (2, 2.0), (4, 3.0)] {
        d.schedule(t, "a", event("a", v, t), noop());
    }
    assert!(d.take_due(10).is_empty());
    let due = d.take_due(11);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].event.value, Value::Number(3.0));
}

#[test]
fn cancel_drops_only_that_control() {
    let mut d = Debouncer::new(7, DebounceScope::Control);
    d.schedule(0, "a", event("a", 1.0, 0), noop());
    d.schedule(0, "b", event("b", 1.0, 0), noop());
    d.cancel("a");
    assert_eq!(d.pending().len(), 1);
    assert_eq!(d.pending()[0].control, "b");
}

#[test]
fn take_all_ignores_deadline() {
    let mut d = Debouncer::new(1_000, DebounceScope::Panel);
    d.schedule(0, "a", event("a", 1.0, 0), noop());
    assert_eq!(d.take_all().len(), 1);
    assert_eq!(d.next_due(), None);
}

#[test]
fn scope_deserializes_lowercase() {
    let scope: DebounceScope = serde_json::from_str("\"control\"").unwrap();
    assert_eq!(scope, DebounceScope::Control);
    assert_eq!(DebounceScope::default(), DebounceScope::Panel);
}

// =============================================================
// Payload and hook
// =============================================================

#[test]
fn change_event_serializes_kind_name() {
    let json = serde_json::to_value(event("s", 2.0, 9)).unwrap();
    assert_eq!(json["id"], "s");
    assert_eq!(json["kind"], "slider");
    assert_eq!(json["value"], 2.0);
    assert_eq!(json["timestamp"], 9);
}

#[test]
fn callback_runs_closure() {
    let seen = Rc::new(Cell::new(0));
    let sink = Rc::clone(&seen);
    let cb = Callback::new(move |e| sink.set(e.timestamp));
    cb.call(&event("a", 0.0, 42));
    assert_eq!(seen.get(), 42);
    assert_eq!(format!("{cb:?}"), "Callback(..)");
}

#[test]
fn hook_clones_share_inbox() {
    let hook = DispatchHook::default();
    let handle = hook.clone();
    let node = crate::host::HostTree::new().root();
    handle.notify(node);
    handle.notify(node);
    assert_eq!(hook.drain(), vec![node, node]);
    assert!(hook.drain().is_empty());
}

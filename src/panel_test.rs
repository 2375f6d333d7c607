use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::descriptor::{
    ButtonSpec, CheckboxSpec, CustomSpec, DropdownSpec, GroupSpec, InfoSpec, RadioSpec, SliderSpec, TextboxSpec,
};
use crate::consts::DEBOUNCE_MS;
use crate::dispatch::ManualClock;
use crate::input::Key;

type Log = Rc<RefCell<Vec<ChangeEvent>>>;

fn panel_with(options: PanelOptions) -> (Panel, ManualClock, Log) {
    let clock = ManualClock::new(1_000);
    let log: Log = Rc::default();
    let sink = Rc::clone(&log);
    let panel = Panel::new(options)
        .with_clock(clock.clone())
        .with_callback(Callback::new(move |e| sink.borrow_mut().push(e.clone())));
    (panel, clock, log)
}

fn panel() -> (Panel, ManualClock, Log) {
    panel_with(PanelOptions::default())
}

/// Let the debounce window elapse and deliver.
fn settle(panel: &mut Panel, clock: &ManualClock) {
    clock.advance(DEBOUNCE_MS);
    panel.run_pending();
}

fn checkbox(id: &str) -> Descriptor {
    Descriptor::new(ControlSpec::Checkbox(CheckboxSpec::default())).with_id(id)
}

// =============================================================
// Construction and ids
// =============================================================

#[test]
fn container_mounts_under_root() {
    let options = PanelOptions { id: Some("left".into()), ..PanelOptions::default() };
    let (panel, _, _) = panel_with(options);
    let container = panel.host().node(panel.container()).unwrap();
    assert_eq!(container.parent(), Some(panel.host().root()));
    assert_eq!(container.class.as_deref(), Some("dashboard"));
    assert_eq!(panel.host().find("left"), Some(panel.container()));
}

#[test]
fn prefixed_ids_stay_short_for_callers() {
    let (mut panel, _, _) = panel_with(PanelOptions::default().with_prefix("p"));
    let id = panel.add(checkbox("x")).unwrap();
    assert_eq!(id, "x");
    assert_eq!(panel.host().find("p_x"), Some(panel.control("x").unwrap().node));
    assert_eq!(panel.ids(), vec!["x"]);
}

#[test]
fn two_panels_coexist_with_same_ids() {
    let (mut a, _, _) = panel_with(PanelOptions::default().with_prefix("a"));
    let (mut b, _, _) = panel_with(PanelOptions::default().with_prefix("b"));
    a.add(checkbox("x")).unwrap();
    b.add(checkbox("x")).unwrap();
    assert_ne!(a.instance_id(), b.instance_id());
}

#[test]
fn duplicate_explicit_id_is_rejected() {
    let (mut panel, _, _) = panel();
    panel.add(checkbox("x")).unwrap();
    assert!(matches!(panel.add(checkbox("x")), Err(PanelError::DuplicateControl(id)) if id == "x"));
    assert_eq!(panel.ids().len(), 1);
}

#[test]
fn add_json_reports_unknown_kind_without_adding() {
    let (mut panel, _, _) = panel();
    let err = panel.add_json(&json!([{"kind": "checkbox"}, {"kind": "dial"}])).unwrap_err();
    assert!(matches!(err, PanelError::UnknownControlKind(k) if k == "dial"));
    assert!(panel.ids().is_empty());
}

#[test]
fn ids_follow_document_order() {
    let (mut panel, _, _) = panel();
    panel
        .add_json(&json!([
            {"kind": "group", "id": "g", "items": [{"kind": "checkbox", "id": "inner"}]},
            {"kind": "button", "id": "after"}
        ]))
        .unwrap();
    panel.add_to(checkbox("late"), "g").unwrap();
    assert_eq!(panel.ids(), vec!["g", "inner", "late", "after"]);
}

// =============================================================
// Parents
// =============================================================

#[test]
fn parent_may_be_host_node() {
    let (mut panel, _, _) = panel();
    let slot = panel.host_mut().create(Tag::Div);
    panel.host_mut().node_mut(slot).unwrap().dom_id = Some("slot".into());
    let container = panel.container();
    panel.host_mut().append(container, slot).unwrap();

    panel.add(checkbox("x").with_parent("slot")).unwrap();
    let line = panel.control("x").unwrap().line;
    assert_eq!(panel.host().node(line).unwrap().parent(), Some(slot));
}

#[test]
fn non_group_parent_is_rejected() {
    let (mut panel, _, _) = panel();
    panel.add(checkbox("x")).unwrap();
    assert!(matches!(panel.add_to(checkbox("y"), "x"), Err(PanelError::UnknownControl(_))));
    assert!(matches!(panel.add_to(checkbox("y"), "nowhere"), Err(PanelError::UnknownControl(_))));
}

#[test]
fn custom_node_already_mounted_fails_cleanly() {
    let (mut panel, _, _) = panel();
    let node = panel.host_mut().create(Tag::Div);
    let root = panel.host().root();
    panel.host_mut().append(root, node).unwrap();
    let before = panel.host().len();
    let err = panel.add(Descriptor::new(ControlSpec::Custom(CustomSpec::new(node)))).unwrap_err();
    assert!(matches!(err, PanelError::Host(HostError::AlreadyMounted(n)) if n == node));
    assert_eq!(panel.host().len(), before);
}

// =============================================================
// Remove
// =============================================================

#[test]
fn remove_group_removes_descendants() {
    let (mut panel, _, _) = panel();
    panel
        .add_json(&json!({"kind": "group", "id": "g", "items": [
            {"kind": "checkbox", "id": "a"},
            {"kind": "group", "id": "h", "items": [{"kind": "radio-group", "id": "r", "items": ["x"]}]}
        ]}))
        .unwrap();
    panel.remove("g").unwrap();
    for id in ["g", "a", "h", "r"] {
        assert!(matches!(panel.value(id), Err(PanelError::UnknownControl(_))));
    }
    assert!(panel.ids().is_empty());
    assert_eq!(panel.host().len(), 2);
}

#[test]
fn remove_child_updates_group_children() {
    let (mut panel, _, _) = panel();
    panel.add_json(&json!({"kind": "group", "id": "g", "items": [{"kind": "checkbox", "id": "a"}]})).unwrap();
    panel.remove("a").unwrap();
    let Backing::Group(group) = &panel.control("g").unwrap().backing else {
        panic!("expected group");
    };
    assert!(group.children.is_empty());
}

#[test]
fn remove_unknown_is_an_error() {
    let (mut panel, _, _) = panel();
    assert!(matches!(panel.remove("ghost"), Err(PanelError::UnknownControl(_))));
}

#[test]
fn removed_control_drops_pending_delivery() {
    let (mut panel, clock, log) = panel();
    panel.add(checkbox("x")).unwrap();
    panel.set_value("x", true).unwrap();
    panel.remove("x").unwrap();
    settle(&mut panel, &clock);
    assert!(log.borrow().is_empty());
}

// =============================================================
// Dispatch pipeline
// =============================================================

#[test]
fn delivery_waits_for_debounce_window() {
    let (mut panel, clock, log) = panel();
    panel.add(checkbox("x")).unwrap();
    panel.set_value("x", true).unwrap();
    assert_eq!(panel.run_pending(), 0);
    assert_eq!(panel.pending(), 1);
    assert_eq!(panel.next_due(), Some(1_007));

    settle(&mut panel, &clock);
    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id, "x");
    assert_eq!(log[0].kind, ControlKind::Checkbox);
    assert_eq!(log[0].value, Value::Bool(true));
    assert_eq!(log[0].timestamp, 1_000);
}

#[test]
fn repeated_set_dispatches_once() {
    let (mut panel, clock, log) = panel();
    panel.add(Descriptor::new(ControlSpec::Slider(SliderSpec::default())).with_id("s")).unwrap();
    panel.set_value("s", 5).unwrap();
    settle(&mut panel, &clock);
    panel.set_value("s", 5).unwrap();
    settle(&mut panel, &clock);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn radio_set_without_match_is_silent() {
    let (mut panel, clock, log) = panel();
    let spec = RadioSpec { items: vec!["a".into(), "b".into()], value: 1, group: None };
    panel.add(Descriptor::new(ControlSpec::RadioGroup(spec)).with_id("r")).unwrap();
    for _ in 0..3 {
        panel.set_value("r", "zzz").unwrap();
        settle(&mut panel, &clock);
    }
    panel.set_value("r", 9).unwrap();
    settle(&mut panel, &clock);
    assert!(log.borrow().is_empty());
    assert_eq!(panel.value("r").unwrap(), Some(Value::Number(1.0)));

    panel.set_value("r", "a").unwrap();
    settle(&mut panel, &clock);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn dropdown_set_without_match_is_silent() {
    let (mut panel, clock, log) = panel();
    let spec = DropdownSpec { items: vec!["a".into(), "b".into()], value: 0 };
    panel.add(Descriptor::new(ControlSpec::Dropdown(spec)).with_id("d")).unwrap();
    panel.set_value("d", "zzz").unwrap();
    settle(&mut panel, &clock);
    panel.set_value("d", 5).unwrap();
    settle(&mut panel, &clock);
    assert!(log.borrow().is_empty());
    assert_eq!(panel.value("d").unwrap(), Some(Value::Number(0.0)));
}

#[test]
fn unparseable_slider_text_is_silent() {
    let (mut panel, clock, log) = panel();
    panel.add(Descriptor::new(ControlSpec::Slider(SliderSpec::default())).with_id("s")).unwrap();
    panel.set_value("s", "loud").unwrap();
    settle(&mut panel, &clock);
    assert!(log.borrow().is_empty());
}

#[test]
fn panel_scope_coalesces_across_controls() {
    let (mut panel, clock, log) = panel();
    panel.add(checkbox("a")).unwrap();
    panel.add(checkbox("b")).unwrap();
    panel.set_value("a", true).unwrap();
    panel.set_value("b", true).unwrap();
    settle(&mut panel, &clock);
    let ids: Vec<_> = log.borrow().iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, vec!["b"]);
}

#[test]
fn control_scope_keeps_each_control() {
    let (mut panel, clock, log) = panel_with(PanelOptions::default().with_scope(DebounceScope::Control));
    panel.add(checkbox("a")).unwrap();
    panel.add(checkbox("b")).unwrap();
    panel.set_value("a", true).unwrap();
    panel.set_value("b", true).unwrap();
    settle(&mut panel, &clock);
    let ids: Vec<_> = log.borrow().iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn flush_ignores_window() {
    let (mut panel, _, log) = panel();
    panel.add(checkbox("x")).unwrap();
    panel.set_value("x", true).unwrap();
    assert_eq!(panel.flush(), 1);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn descriptor_callback_overrides_panel_callback() {
    let (mut panel, clock, log) = panel();
    let own: Log = Rc::default();
    let sink = Rc::clone(&own);
    let cb = Callback::new(move |e| sink.borrow_mut().push(e.clone()));
    panel.add(checkbox("x").with_callback(cb)).unwrap();
    panel.set_value("x", true).unwrap();
    settle(&mut panel, &clock);
    assert!(log.borrow().is_empty());
    assert_eq!(own.borrow().len(), 1);
}

#[test]
fn control_without_callback_is_silent() {
    let mut panel = Panel::new(PanelOptions::default());
    panel.add(checkbox("x")).unwrap();
    panel.set_value("x", true).unwrap();
    assert_eq!(panel.pending(), 0);
    assert_eq!(panel.value("x").unwrap(), Some(Value::Bool(true)));
}

// =============================================================
// Raw events
// =============================================================

#[test]
fn checkbox_change_event() {
    let (mut panel, clock, log) = panel();
    panel.add(checkbox("x")).unwrap();
    let node = panel.control("x").unwrap().node;
    panel.host_mut().node_mut(node).unwrap().checked = true;
    panel.on_event(node, RawEvent::Click).unwrap();
    assert_eq!(panel.pending(), 0);
    panel.on_event(node, RawEvent::Change).unwrap();
    settle(&mut panel, &clock);
    assert_eq!(log.borrow()[0].target, node);
}

#[test]
fn slider_input_only_refreshes_readout_until_change() {
    let (mut panel, clock, log) = panel();
    panel.add(Descriptor::new(ControlSpec::Slider(SliderSpec::default())).with_id("s")).unwrap();
    let (node, readout) = match &panel.control("s").unwrap().backing {
        Backing::Slider(slider) => (panel.control("s").unwrap().node, slider.readout),
        _ => panic!("expected slider"),
    };
    panel.host_mut().node_mut(node).unwrap().value = "30".into();
    panel.on_event(node, RawEvent::Input).unwrap();
    assert_eq!(panel.host().node(readout).unwrap().text, "30");
    assert_eq!(panel.pending(), 0);

    panel.on_event(node, RawEvent::Change).unwrap();
    settle(&mut panel, &clock);
    assert_eq!(log.borrow()[0].value, Value::Number(30.0));
}

#[test]
fn live_slider_dispatches_on_input() {
    let (mut panel, _, _) = panel();
    let spec = SliderSpec { live: true, ..SliderSpec::default() };
    panel.add(Descriptor::new(ControlSpec::Slider(spec)).with_id("s")).unwrap();
    let node = panel.control("s").unwrap().node;
    panel.host_mut().node_mut(node).unwrap().value = "12".into();
    panel.on_event(node, RawEvent::Input).unwrap();
    assert_eq!(panel.pending(), 1);
}

#[test]
fn live_textbox_dispatches_on_key_up() {
    let (mut panel, _, _) = panel();
    let spec = TextboxSpec { live: true, ..TextboxSpec::default() };
    panel.add(Descriptor::new(ControlSpec::Textbox(spec)).with_id("t")).unwrap();
    panel.add(Descriptor::new(ControlSpec::Textbox(TextboxSpec::default())).with_id("u")).unwrap();

    let t = panel.control("t").unwrap().node;
    let u = panel.control("u").unwrap().node;
    panel.host_mut().node_mut(u).unwrap().value = "b".into();
    panel.on_event(u, RawEvent::KeyUp).unwrap();
    assert_eq!(panel.pending(), 0);
    panel.host_mut().node_mut(t).unwrap().value = "a".into();
    panel.on_event(t, RawEvent::KeyUp).unwrap();
    assert_eq!(panel.pending(), 1);
}

#[test]
fn radio_click_reports_group_id() {
    let (mut panel, clock, log) = panel_with(PanelOptions::default().with_prefix("p"));
    let spec = RadioSpec { items: vec!["a".into(), "b".into()], value: 0, group: None };
    panel.add(Descriptor::new(ControlSpec::RadioGroup(spec)).with_id("r")).unwrap();
    let Backing::RadioGroup(radio) = &panel.control("r").unwrap().backing else {
        panic!("expected radio");
    };
    let second = radio.members[1];

    panel.on_event(second, RawEvent::Click).unwrap();
    settle(&mut panel, &clock);
    assert_eq!(panel.value("r").unwrap(), Some(Value::Number(1.0)));
    assert_eq!(log.borrow()[0].id, "r");
    assert_eq!(log.borrow()[0].target, second);

    // Re-selecting the same option reports again.
    panel.on_event(second, RawEvent::Click).unwrap();
    settle(&mut panel, &clock);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn button_click_always_dispatches() {
    let (mut panel, clock, log) = panel();
    panel.add(Descriptor::new(ControlSpec::Button(ButtonSpec::default())).with_id("b")).unwrap();
    let node = panel.control("b").unwrap().node;
    for _ in 0..2 {
        panel.on_event(node, RawEvent::Click).unwrap();
        settle(&mut panel, &clock);
    }
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn button_set_only_relabels() {
    let (mut panel, _, _) = panel();
    panel.add(Descriptor::new(ControlSpec::Button(ButtonSpec::default())).with_id("b")).unwrap();
    panel.set_value("b", "Run").unwrap();
    assert_eq!(panel.pending(), 0);
    assert_eq!(panel.value("b").unwrap(), Some(Value::Text("Run".into())));
}

#[test]
fn group_click_and_keys() {
    let (mut panel, clock, log) = panel();
    panel.add(Descriptor::new(ControlSpec::Group(GroupSpec::default())).with_id("g")).unwrap();
    let header = panel.control("g").unwrap().node;

    panel.on_event(header, RawEvent::Click).unwrap();
    settle(&mut panel, &clock);
    assert_eq!(panel.value("g").unwrap(), Some(Value::Bool(false)));

    panel.on_event(header, RawEvent::KeyDown(Key::ArrowRight)).unwrap();
    settle(&mut panel, &clock);
    panel.on_event(header, RawEvent::KeyDown(Key::ArrowRight)).unwrap();
    settle(&mut panel, &clock);
    panel.on_event(header, RawEvent::KeyDown(Key::Other("Tab".into()))).unwrap();
    settle(&mut panel, &clock);

    let values: Vec<_> = log.borrow().iter().map(|e| e.value.clone()).collect();
    assert_eq!(values, vec![Value::Bool(false), Value::Bool(true)]);
}

#[test]
fn events_on_disabled_nodes_are_ignored() {
    let (mut panel, _, _) = panel();
    panel.add(checkbox("x").enabled(false)).unwrap();
    let node = panel.control("x").unwrap().node;
    panel.on_event(node, RawEvent::Change).unwrap();
    assert_eq!(panel.pending(), 0);
}

#[test]
fn event_for_foreign_node_is_unknown() {
    let (mut panel, _, _) = panel();
    let node = panel.host_mut().create(Tag::Div);
    assert!(matches!(panel.on_event(node, RawEvent::Click), Err(PanelError::UnknownControl(_))));
}

// =============================================================
// Enable / show
// =============================================================

#[test]
fn disabling_group_collapses_and_dispatches() {
    let (mut panel, clock, log) = panel();
    panel.add(Descriptor::new(ControlSpec::Group(GroupSpec::default())).with_id("g")).unwrap();
    panel.enable("g", false).unwrap();
    settle(&mut panel, &clock);

    assert_eq!(panel.value("g").unwrap(), Some(Value::Bool(false)));
    assert_eq!(log.borrow().len(), 1);
    let header = panel.control("g").unwrap().node;
    panel.on_event(header, RawEvent::Click).unwrap();
    panel.set_value("g", true).unwrap();
    assert_eq!(panel.value("g").unwrap(), Some(Value::Bool(false)));

    panel.enable("g", true).unwrap();
    panel.set_value("g", true).unwrap();
    assert_eq!(panel.value("g").unwrap(), Some(Value::Bool(true)));
}

#[test]
fn show_hides_line_and_panel() {
    let (mut panel, _, _) = panel();
    panel.add(checkbox("x")).unwrap();
    panel.show("x", false).unwrap();
    let line = panel.control("x").unwrap().line;
    assert!(panel.host().node(line).unwrap().hidden);
    assert!(!panel.is_visible("x").unwrap());
    panel.show("x", true).unwrap();
    assert!(panel.is_visible("x").unwrap());
    assert!(matches!(panel.is_visible("nope"), Err(PanelError::UnknownControl(_))));

    panel.show_panel(false).unwrap();
    assert!(!panel.is_shown());
    panel.show_panel(true).unwrap();
    assert!(panel.is_shown());
}

#[test]
fn node_refs_resolve_to_owner() {
    let (mut panel, _, _) = panel();
    panel.add(Descriptor::new(ControlSpec::Info(InfoSpec { text: "i".into() })).with_id("i")).unwrap();
    let node = panel.control("i").unwrap().node;
    assert_eq!(panel.value(node).unwrap(), Some(Value::Text("i".into())));
    panel.enable(node, false).unwrap();
    assert!(!panel.control("i").unwrap().enabled);
}

// =============================================================
// Custom controls
// =============================================================

#[test]
fn custom_hook_notifies_on_next_tick() {
    let (mut panel, clock, log) = panel();
    let node = panel.host_mut().create(Tag::Div);
    let spec = CustomSpec::new(node).on_get(|host, node| host.node(node).map_or(None, |n| Some(Value::Text(n.value.clone()))));
    panel.add(Descriptor::new(ControlSpec::Custom(spec)).with_id("c")).unwrap();

    let hook = panel.custom_dispatch_hook();
    panel.host_mut().node_mut(node).unwrap().value = "turned".into();
    hook.notify(node);
    panel.run_pending();
    settle(&mut panel, &clock);

    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].kind, ControlKind::Custom);
    assert_eq!(log.borrow()[0].value, Value::Text("turned".into()));
}

#[test]
fn custom_raw_events_are_ignored() {
    let (mut panel, _, _) = panel();
    let node = panel.host_mut().create(Tag::Div);
    let spec = CustomSpec::new(node).on_get(|_, _| Some(Value::Bool(true)));
    panel.add(Descriptor::new(ControlSpec::Custom(spec))).unwrap();
    panel.on_event(node, RawEvent::Change).unwrap();
    assert_eq!(panel.pending(), 0);
    panel.notify_changed(node).unwrap();
    assert_eq!(panel.pending(), 1);
}

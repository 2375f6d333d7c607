use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::descriptor::{CheckboxSpec, ControlSpec, CustomSpec, Descriptor, GroupSpec, RadioSpec};
use crate::factory::Factory;
use crate::host::Tag;
use crate::ident::IdAllocator;

fn build(host: &mut HostTree, spec: ControlSpec) -> ControlInstance {
    let mut ids = IdAllocator::new(None, 1);
    Factory { host, ids: &mut ids, default_callback: None }
        .build(Descriptor::new(spec), None)
        .unwrap()
        .instance
}

#[test]
fn enable_toggles_primary_node() {
    let mut host = HostTree::new();
    let mut ctl = build(&mut host, ControlSpec::Checkbox(CheckboxSpec::default()));
    enable(&mut host, &mut ctl, false).unwrap();
    assert!(host.node(ctl.node).unwrap().disabled);
    assert!(!ctl.enabled);
    enable(&mut host, &mut ctl, false).unwrap();
    assert!(host.node(ctl.node).unwrap().disabled);
    enable(&mut host, &mut ctl, true).unwrap();
    assert!(!host.node(ctl.node).unwrap().disabled);
}

#[test]
fn radio_enable_reaches_every_option() {
    let mut host = HostTree::new();
    let spec = RadioSpec { items: vec!["a".into(), "b".into()], value: 1, group: None };
    let mut ctl = build(&mut host, ControlSpec::RadioGroup(spec));
    enable(&mut host, &mut ctl, false).unwrap();
    let Backing::RadioGroup(radio) = &ctl.backing else {
        panic!("expected radio backing");
    };
    for member in &radio.members {
        assert!(host.node(*member).unwrap().disabled);
    }
    assert!(host.node(radio.members[1]).unwrap().checked);
}

#[test]
fn group_enable_targets_header() {
    let mut host = HostTree::new();
    let mut ctl = build(&mut host, ControlSpec::Group(GroupSpec::default()));
    enable(&mut host, &mut ctl, false).unwrap();
    assert!(host.node(ctl.node).unwrap().disabled);
    assert!(!host.node(ctl.line).unwrap().disabled);
}

#[test]
fn custom_enable_calls_hook() {
    let mut host = HostTree::new();
    let node = host.create(Tag::Div);
    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    let spec = CustomSpec::new(node).on_enable(move |_, _, state| sink.set(Some(state)));
    let mut ctl = build(&mut host, ControlSpec::Custom(spec));
    enable(&mut host, &mut ctl, false).unwrap();
    assert_eq!(seen.get(), Some(false));
    assert!(!host.node(node).unwrap().disabled);
}

#[test]
fn show_hides_whole_line() {
    let mut host = HostTree::new();
    let mut ctl = build(&mut host, ControlSpec::Checkbox(CheckboxSpec::default()));
    show(&mut host, &mut ctl, false).unwrap();
    assert!(host.node(ctl.line).unwrap().hidden);
    assert!(!host.node(ctl.node).unwrap().hidden);
    assert!(!ctl.visible);
    show(&mut host, &mut ctl, true).unwrap();
    assert!(!host.node(ctl.line).unwrap().hidden);
}

#[test]
fn show_container_flags_node() {
    let mut host = HostTree::new();
    let root = host.root();
    show_container(&mut host, root, false).unwrap();
    assert!(host.node(root).unwrap().hidden);
}

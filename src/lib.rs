//! Declarative control-panel engine.
//!
//! A [`Panel`] turns descriptors (built in code or parsed from JSON) into live
//! widgets inside a headless host tree, keeps a uniform get/set value protocol
//! across every widget kind, binds tagged widgets to a flat JSON model, and
//! delivers debounced, de-duplicated change events to callbacks. The embedding
//! UI layer mirrors the [`host::HostTree`] onto real widgets, writes user
//! edits back into its nodes, and forwards raw events through
//! [`Panel::on_event`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`panel`] | Public API, control registry, dispatch pipeline |
//! | [`descriptor`] | Control kinds and per-kind descriptor attributes |
//! | [`host`] | Headless host tree the widgets live in |
//! | [`accessor`] | Per-kind value get/set |
//! | [`binding`] | `bind_to` / `get_bound` against a JSON model |
//! | [`dispatch`] | Change events, clocks, debouncer, custom dispatch hook |
//! | [`group`] | Collapsible group state machine |
//! | [`visibility`] | Enable and show/hide |
//! | [`ident`] | Id prefixing, synthesis, tab order |
//! | [`control`] | Live control instances and their backing state |
//! | [`input`] | Raw host events and keys |
//! | [`value`] | Logical control values |
//! | [`config`] | Panel options and environment overrides |
//! | [`driver`] | Tokio pump playing the host event loop |
//! | [`error`] | Error types |
//! | [`consts`] | Class names, id affixes, defaults |

pub mod accessor;
pub mod binding;
pub mod config;
pub mod consts;
pub mod control;
pub mod descriptor;
pub mod dispatch;
pub mod driver;
pub mod error;
mod factory;
pub mod group;
pub mod host;
pub mod ident;
pub mod input;
pub mod panel;
pub mod value;
pub mod visibility;

pub use config::PanelOptions;
pub use descriptor::{ControlKind, ControlSpec, Descriptor};
pub use dispatch::{Callback, ChangeEvent, DebounceScope, ManualClock};
pub use error::{HostError, PanelError};
pub use panel::{ControlRef, Panel};
pub use value::Value;

//! Raw host input: the events the host toolkit reports for a node.
//!
//! The host writes any user edit into the node first (a slider's new
//! position, a typed character, a checked radio) and then reports one of
//! these events through [`crate::panel::Panel::on_event`].

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

/// A keyboard key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    ArrowLeft,
    ArrowRight,
    /// Any other key, by the name the host reports.
    Other(String),
}

impl Key {
    /// Map a browser-style key name (`"Enter"`, `" "`, `"ArrowLeft"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            " " | "Space" | "Spacebar" => Self::Space,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Raw input signal for a host node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// Incremental edit (every slider step, every keystroke).
    Input,
    /// Committed edit (blur, confirm, checkbox toggle, option pick).
    Change,
    /// Pointer activation.
    Click,
    /// Key released; live text boxes dispatch on it.
    KeyUp,
    /// Key pressed; group headers react to it.
    KeyDown(Key),
}

/// What a raw event on a control asks the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Nothing beyond the visual readout.
    Ignore,
    /// Refresh the readout only.
    InfoOnly,
    /// Run the full dispatch pipeline.
    Dispatch,
}

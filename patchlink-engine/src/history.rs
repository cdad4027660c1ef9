//! Read-only view of the host's linear undo/edit history
//!
//! The auto-deploy policy only ever needs the current action index and the
//! name of the most recent action; it never stores or mutates history.

/// Read-only access to the host's edit history
pub trait EditHistory {
    /// Index of the most recent action in the linear history.
    /// Monotonic per edit; undo/redo move it as the host sees fit.
    fn action_index(&self) -> i64;

    /// Display name of the most recent action, if any
    fn last_action_name(&self) -> Option<String>;
}

/// Classified edit-history action kinds.
///
/// Continuous-drag kinds fire once per frame while the user is dragging and
/// must not trigger auto-deploy on their own. Keeping them as an explicit
/// enumeration means a renamed host action shows up as a test failure here
/// instead of silently re-enabling deploy floods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditActionKind {
    /// Knob dragged ("move knob")
    MoveKnob,
    /// Slider dragged ("move slider")
    MoveSlider,
    /// Module repositioned on the rack ("move module" / "move modules")
    MoveModule,
    /// Any other discrete edit
    Other,
}

impl EditActionKind {
    /// Map a free-text history action name to its kind
    pub fn classify(name: &str) -> Self {
        match name {
            "move knob" => Self::MoveKnob,
            "move slider" => Self::MoveSlider,
            "move module" | "move modules" => Self::MoveModule,
            _ => Self::Other,
        }
    }

    /// True for high-frequency drag actions excluded from auto-deploy
    pub fn is_continuous(self) -> bool {
        !matches!(self, Self::Other)
    }
}

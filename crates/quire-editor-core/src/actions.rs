//! Platform-agnostic keyboard input.
//!
//! Host code converts native key events to [`Key`] and lets the surface
//! decide whether it consumed them. Keys the surface never acts on map to
//! [`Key::Unidentified`] and are left to the platform.

/// Key values the surface reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Any key the surface does not handle.
    Unidentified,

    Enter,
    Tab,
    Escape,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            _ => Self::Unidentified,
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not consumed, let the platform handle it.
    NotHandled,
}

impl KeydownResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dom() {
        assert_eq!(Key::from_dom("ArrowUp"), Key::ArrowUp);
        assert_eq!(Key::from_dom("Esc"), Key::Escape);
        assert_eq!(Key::from_dom("你"), Key::Unidentified);
        assert_eq!(Key::from_dom("Backspace"), Key::Unidentified);
    }
}

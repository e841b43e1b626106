//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Gravity,
    PrecomputeOrder,
    Reset,
    Rebuild,
    GrowSize,
    ShrinkSize,
    /// Quick-pick swatch, 0-based.
    Swatch(usize),
    BeginHexColor,
    Quit,
    None,
}

/// Map key event to an action. Hex colour entry is handled by the caller before this.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('g') | KeyCode::Char(' ') => Action::Gravity,
        KeyCode::Char('o') => Action::PrecomputeOrder,
        KeyCode::Char('r') => Action::Reset,
        KeyCode::Enter => Action::Rebuild,
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => Action::GrowSize,
        KeyCode::Char('-') | KeyCode::Down => Action::ShrinkSize,
        KeyCode::Char('#') => Action::BeginHexColor,
        KeyCode::Char(c @ '1'..='6') => Action::Swatch(c as usize - '1' as usize),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn swatch_keys_are_zero_based() {
        assert_eq!(key_to_action(press(KeyCode::Char('1'))), Action::Swatch(0));
        assert_eq!(key_to_action(press(KeyCode::Char('6'))), Action::Swatch(5));
        assert_eq!(key_to_action(press(KeyCode::Char('7'))), Action::None);
    }

    #[test]
    fn ctrl_c_quits_but_ctrl_g_does_nothing() {
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('g'), KeyModifiers::CONTROL)),
            Action::None
        );
    }

    #[test]
    fn shifted_symbols_still_map() {
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('#'), KeyModifiers::SHIFT)),
            Action::BeginHexColor
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('+'), KeyModifiers::SHIFT)),
            Action::GrowSize
        );
    }
}

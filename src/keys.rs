//! Keyboard boundary: terminal key events become single characters.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub const ESCAPE: char = '\x1b';
pub const CTRL_H: char = '\x08';
pub const BACKSPACE: char = '\x7f';
pub const CTRL_K: char = '\x0b';
pub const NEWLINE: char = '\n';
pub const CARRIAGE_RETURN: char = '\r';

/// Translate a key event into the character the dispatcher consumes.
///
/// Returns `None` for releases and keys with no character form (arrows,
/// function keys); those are ignored by the interface.
pub fn key_to_char(event: &KeyEvent) -> Option<char> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    match event.code {
        KeyCode::Enter => Some(NEWLINE),
        KeyCode::Esc => Some(ESCAPE),
        KeyCode::Backspace => Some(BACKSPACE),
        KeyCode::Tab => Some('\t'),
        KeyCode::Char('h') if ctrl => Some(CTRL_H),
        KeyCode::Char('k') if ctrl => Some(CTRL_K),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

/// Ctrl-C leaves the program regardless of mode or editing state.
pub fn is_interrupt(event: &KeyEvent) -> bool {
    event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_keys() {
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(key_to_char(&enter), Some(NEWLINE));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(key_to_char(&esc), Some(ESCAPE));
        let ctrl_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::CONTROL);
        assert_eq!(key_to_char(&ctrl_h), Some(CTRL_H));
        let ctrl_k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL);
        assert_eq!(key_to_char(&ctrl_k), Some(CTRL_K));
    }

    #[test]
    fn test_printable_and_ignored_keys() {
        let g = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(key_to_char(&g), Some('G'));
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(key_to_char(&up), None);
        let ctrl_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(key_to_char(&ctrl_x), None);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(is_interrupt(&ctrl_c));
    }
}

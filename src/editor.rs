//! Single-line input capture used by prompts such as the table filter.
//!
//! An [`Editor`] is idle until [`Editor::start_editing`] is called. While
//! editing it consumes one character at a time; the update policy decides
//! after every change whether editing continues. The finalize callback runs
//! exactly once when the session ends, whichever path ended it.

use crate::keys::{BACKSPACE, CARRIAGE_RETURN, CTRL_H, CTRL_K, ESCAPE, NEWLINE};

/// Decides, after each buffer change, whether editing continues.
/// May rewrite the buffer (e.g. strip the commit character).
pub type UpdatePolicy = Box<dyn Fn(&mut String) -> bool>;

/// Receives the editing target and the final buffer when editing ends.
pub type Finalize<T> = Box<dyn FnMut(&mut T, &str)>;

/// Default update policy: never stop editing on its own.
pub fn keep_editing(_buffer: &mut String) -> bool {
    true
}

/// Stop editing once the buffer ends with a newline, committing the value
/// without trailing newline/carriage-return characters.
pub fn exit_on_return(buffer: &mut String) -> bool {
    if buffer.ends_with(NEWLINE) {
        let committed_len = buffer.trim_end_matches([NEWLINE, CARRIAGE_RETURN]).len();
        buffer.truncate(committed_len);
        return false;
    }
    true
}

pub struct Editor<T> {
    prompt: String,
    buffer: String,
    editing: bool,
    update: UpdatePolicy,
    finalize: Finalize<T>,
}

impl<T> Editor<T> {
    /// Create an idle editor with the default policy ("always continue
    /// editing") and a no-op finalize.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            buffer: String::new(),
            editing: false,
            update: Box::new(keep_editing),
            finalize: Box::new(|_, _| {}),
        }
    }

    pub fn with_update_policy(mut self, policy: impl Fn(&mut String) -> bool + 'static) -> Self {
        self.update = Box::new(policy);
        self
    }

    pub fn with_finalize(mut self, finalize: impl FnMut(&mut T, &str) + 'static) -> Self {
        self.finalize = Box::new(finalize);
        self
    }

    /// Enter the editing state with an empty buffer.
    pub fn start_editing(&mut self) {
        self.buffer.clear();
        self.editing = true;
    }

    /// Feed one character. Returns whether editing should continue.
    ///
    /// Escape always ends editing without touching the buffer or consulting
    /// the update policy.
    pub fn send_character(&mut self, ch: char) -> bool {
        if !self.editing || ch == ESCAPE {
            return false;
        }
        match ch {
            BACKSPACE | CTRL_H => {
                self.buffer.pop();
            }
            CTRL_K => self.buffer.clear(),
            _ => self.buffer.push(ch),
        }
        (self.update)(&mut self.buffer)
    }

    /// End the editing session, running finalize once. Calling this on an
    /// idle editor does nothing.
    pub fn finish(&mut self, target: &mut T) {
        if !self.editing {
            return;
        }
        self.editing = false;
        (self.finalize)(target, &self.buffer);
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }
}

impl<T> std::fmt::Debug for Editor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("prompt", &self.prompt)
            .field("buffer", &self.buffer)
            .field("editing", &self.editing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn type_str(editor: &mut Editor<Vec<String>>, text: &str) -> bool {
        let mut keep = true;
        for ch in text.chars() {
            keep = editor.send_character(ch);
        }
        keep
    }

    #[test]
    fn test_idle_until_started() {
        let mut editor: Editor<Vec<String>> = Editor::new("filter: ");
        assert!(!editor.is_editing());
        assert!(!editor.send_character('a'));
        assert_eq!(editor.buffer(), "");

        editor.start_editing();
        assert!(editor.is_editing());
        assert!(editor.send_character('a'));
        assert_eq!(editor.buffer(), "a");
    }

    #[test]
    fn test_backspace_on_empty_buffer_is_noop() {
        let mut editor: Editor<Vec<String>> = Editor::new("> ");
        editor.start_editing();
        assert!(editor.send_character(BACKSPACE));
        assert!(editor.send_character(CTRL_H));
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_backspace_and_clear_line() {
        let mut editor: Editor<Vec<String>> = Editor::new("> ");
        editor.start_editing();
        type_str(&mut editor, "abc");
        editor.send_character(BACKSPACE);
        assert_eq!(editor.buffer(), "ab");
        editor.send_character(CTRL_H);
        assert_eq!(editor.buffer(), "a");
        type_str(&mut editor, "xyz");
        editor.send_character(CTRL_K);
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_exit_on_return_strips_newline_and_carriage_return() {
        let mut editor: Editor<Vec<String>> =
            Editor::new("filter: ").with_update_policy(exit_on_return);
        editor.start_editing();
        assert!(type_str(&mut editor, "Age > 30\r"));
        assert!(!editor.send_character(NEWLINE));
        assert_eq!(editor.buffer(), "Age > 30");
    }

    #[test]
    fn test_default_policy_keeps_newlines() {
        let mut editor: Editor<Vec<String>> = Editor::new("> ");
        editor.start_editing();
        assert!(type_str(&mut editor, "a\nb"));
        assert_eq!(editor.buffer(), "a\nb");
    }

    #[test]
    fn test_finalize_runs_once_on_commit() {
        let mut editor: Editor<Vec<String>> = Editor::new("> ")
            .with_update_policy(exit_on_return)
            .with_finalize(|values: &mut Vec<String>, value: &str| values.push(value.to_string()));
        let mut committed = Vec::new();
        editor.start_editing();
        let keep = type_str(&mut editor, "name\n");
        assert!(!keep);
        editor.finish(&mut committed);
        editor.finish(&mut committed);
        assert_eq!(committed, vec!["name".to_string()]);
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_cancel_mid_buffer_bypasses_policy_and_finalizes_once() {
        let policy_calls = Rc::new(Cell::new(0));
        let calls = policy_calls.clone();
        let finalized = Rc::new(Cell::new(0));
        let count = finalized.clone();
        let mut editor: Editor<Vec<String>> = Editor::new("> ")
            .with_update_policy(move |_| {
                calls.set(calls.get() + 1);
                true
            })
            .with_finalize(move |_, _| count.set(count.get() + 1));
        editor.start_editing();
        type_str(&mut editor, "par");
        assert_eq!(policy_calls.get(), 3);

        assert!(!editor.send_character(ESCAPE));
        assert_eq!(policy_calls.get(), 3);
        assert_eq!(editor.buffer(), "par");

        let mut target = Vec::new();
        editor.finish(&mut target);
        editor.finish(&mut target);
        assert_eq!(finalized.get(), 1);
    }

    #[test]
    fn test_restart_resets_buffer() {
        let mut editor: Editor<Vec<String>> = Editor::new("> ");
        editor.start_editing();
        type_str(&mut editor, "old");
        editor.finish(&mut Vec::new());
        editor.start_editing();
        assert_eq!(editor.buffer(), "");
    }
}

//! State mutated by command handlers: mode, table view, active editor.

use polars::prelude::PolarsResult;

use crate::editor::{exit_on_return, Editor};
use crate::source::DataSource;
use crate::view::{Mode, ViewState};

pub const FILTER_PROMPT: &str = "filter: ";

#[derive(Debug)]
pub struct Session {
    pub mode: Mode,
    pub view: ViewState,
    /// The editor currently capturing keystrokes, if any.
    pub editor: Option<Editor<ViewState>>,
    pub source: DataSource,
    /// Rows in the unfiltered source, counted once at startup.
    pub total_rows: usize,
}

impl Session {
    pub fn new(source: DataSource) -> PolarsResult<Self> {
        let total_rows = source.row_count()?;
        let view = ViewState::new(total_rows, source.column_count());
        Ok(Self {
            mode: Mode::default(),
            view,
            editor: None,
            source,
            total_rows,
        })
    }

    /// Open the filter prompt; keystrokes go to it until Enter or Esc.
    pub fn start_filter(&mut self) {
        let mut editor = Editor::new(FILTER_PROMPT)
            .with_update_policy(exit_on_return)
            .with_finalize(|view: &mut ViewState, text: &str| view.set_filter(text));
        editor.start_editing();
        self.editor = Some(editor);
    }

    pub fn is_editing(&self) -> bool {
        self.editor.as_ref().is_some_and(Editor::is_editing)
    }

    /// The filter the table should show: the prompt buffer while typing,
    /// otherwise the committed filter.
    pub fn effective_filter(&self) -> Option<&str> {
        match &self.editor {
            Some(editor) if editor.is_editing() => Some(editor.buffer()),
            _ => self.view.filter_text.as_deref(),
        }
    }

    /// Whether the prompt line takes a row of the table panel.
    pub fn prompt_visible(&self) -> bool {
        self.is_editing() || self.view.filter_text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

//! Browsing state: active mode and the table view's offsets and filter.

use std::fmt;

/// The exclusive UI context. The table is shown on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Summary,
    #[default]
    Table,
    Help,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Summary, Mode::Table, Mode::Help];

    /// Label shown in the mode line; the parenthesized character is the key.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Summary => "(s)ummary",
            Mode::Table => "(t)able",
            Mode::Help => "(?)help",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Offsets and filter of the table view.
///
/// `row_count` and `column_count` describe the filtered view as of the last
/// frame and are what the offsets are clamped against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    startat: usize,
    column_start_at: usize,
    pub last_page_size: usize,
    pub filter_text: Option<String>,
    row_count: usize,
    column_count: usize,
}

fn clamp(value: isize, count: usize) -> usize {
    let upper = count.max(1) - 1;
    value.clamp(0, upper as isize) as usize
}

impl ViewState {
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            row_count,
            column_count,
            ..Self::default()
        }
    }

    pub fn startat(&self) -> usize {
        self.startat
    }

    pub fn column_start_at(&self) -> usize {
        self.column_start_at
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Set the row offset, clamped to `[0, row_count - 1]` (0 when empty).
    pub fn set_startat(&mut self, value: isize) {
        self.startat = clamp(value, self.row_count);
    }

    /// Set the column offset, clamped to `[0, column_count - 1]`.
    pub fn set_column_start_at(&mut self, value: isize) {
        self.column_start_at = clamp(value, self.column_count);
    }

    /// Record the shape of the filtered view and re-clamp the offsets.
    pub fn set_extent(&mut self, row_count: usize, column_count: usize) {
        self.row_count = row_count;
        self.column_count = column_count;
        self.set_startat(self.startat as isize);
        self.set_column_start_at(self.column_start_at as isize);
    }

    pub fn page_down(&mut self) {
        self.set_startat(self.startat as isize + self.last_page_size as isize);
    }

    pub fn page_up(&mut self) {
        self.set_startat(self.startat as isize - self.last_page_size as isize);
    }

    pub fn scroll_left(&mut self) {
        self.set_column_start_at(self.column_start_at as isize - 1);
    }

    pub fn scroll_right(&mut self) {
        self.set_column_start_at(self.column_start_at as isize + 1);
    }

    pub fn go_to_top(&mut self) {
        self.set_startat(0);
    }

    /// Show the final page: the last row lands at the bottom of the body.
    pub fn go_to_bottom(&mut self) {
        self.set_startat(self.row_count as isize - self.last_page_size as isize);
    }

    /// Commit a filter. Empty text clears it; the view returns to the top.
    pub fn set_filter(&mut self, text: &str) {
        self.filter_text = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        self.startat = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_offsets() {
        let mut view = ViewState::new(10, 3);
        view.set_startat(-4);
        assert_eq!(view.startat(), 0);
        view.set_startat(25);
        assert_eq!(view.startat(), 9);
        view.set_column_start_at(7);
        assert_eq!(view.column_start_at(), 2);
        view.set_column_start_at(-1);
        assert_eq!(view.column_start_at(), 0);
    }

    #[test]
    fn test_empty_view_clamps_to_zero() {
        let mut view = ViewState::new(0, 0);
        view.set_startat(5);
        view.set_column_start_at(5);
        assert_eq!(view.startat(), 0);
        assert_eq!(view.column_start_at(), 0);
        view.last_page_size = 20;
        view.go_to_bottom();
        assert_eq!(view.startat(), 0);
    }

    #[test]
    fn test_page_down_then_up_round_trips() {
        let mut view = ViewState::new(100, 3);
        view.last_page_size = 20;
        view.set_startat(15);
        view.page_down();
        assert_eq!(view.startat(), 35);
        view.page_up();
        assert_eq!(view.startat(), 15);
    }

    #[test]
    fn test_page_up_at_top_stays_at_top() {
        let mut view = ViewState::new(100, 3);
        view.last_page_size = 20;
        view.page_up();
        assert_eq!(view.startat(), 0);
    }

    #[test]
    fn test_go_to_bottom() {
        let mut view = ViewState::new(55, 3);
        view.last_page_size = 20;
        view.go_to_bottom();
        assert_eq!(view.startat(), 35);
        view.go_to_top();
        assert_eq!(view.startat(), 0);
    }

    #[test]
    fn test_shrinking_extent_reclamps() {
        let mut view = ViewState::new(100, 5);
        view.set_startat(80);
        view.set_column_start_at(4);
        view.set_extent(12, 1);
        assert_eq!(view.startat(), 11);
        assert_eq!(view.column_start_at(), 0);
    }

    #[test]
    fn test_set_filter_resets_offset() {
        let mut view = ViewState::new(100, 3);
        view.set_startat(40);
        view.set_filter("Age > 30");
        assert_eq!(view.filter_text.as_deref(), Some("Age > 30"));
        assert_eq!(view.startat(), 0);
        view.set_filter("");
        assert_eq!(view.filter_text, None);
    }

    #[test]
    fn test_mode_labels() {
        let labels: Vec<_> = Mode::ALL.iter().map(Mode::label).collect();
        assert_eq!(labels, vec!["(s)ummary", "(t)able", "(?)help"]);
        assert_eq!(Mode::default(), Mode::Table);
    }
}

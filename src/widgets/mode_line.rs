use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Paragraph, Widget},
};

use crate::view::Mode;

/// One centered label per mode, the current one highlighted.
pub struct ModeLine {
    pub current: Mode,
    pub active: Color,
    pub inactive: Color,
}

impl ModeLine {
    pub fn new(current: Mode) -> Self {
        Self {
            current,
            active: Color::Yellow,
            inactive: Color::White,
        }
    }

    pub fn with_colors(mut self, active: Color, inactive: Color) -> Self {
        self.active = active;
        self.inactive = inactive;
        self
    }
}

impl Widget for &ModeLine {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let constraints = vec![Constraint::Ratio(1, Mode::ALL.len() as u32); Mode::ALL.len()];
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (mode, cell) in Mode::ALL.iter().zip(cells.iter()) {
            let bg = if *mode == self.current {
                self.active
            } else {
                self.inactive
            };
            Paragraph::new(mode.label())
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Black).bg(bg))
                .render(*cell, buf);
        }
    }
}

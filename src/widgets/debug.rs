use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Debug, Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub last_key_event_name: String,
    /// Short description of the last command dispatched.
    pub last_command: String,
    /// How the table filter was applied in the last frame.
    pub filter_strategy: String,
    pub enabled: bool,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let strategy = if self.filter_strategy.is_empty() {
            "-"
        } else {
            &self.filter_strategy
        };
        Paragraph::new(format!(
            "events={} keys={} last_key={} last_command={} frames={} filter={}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.last_command,
            self.num_frames,
            strategy
        ))
        .render(area, buf);
    }
}

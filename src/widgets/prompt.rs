use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

const CURSOR: &str = "█";

/// `prompt` followed by the value, with a block cursor while editing.
pub struct PromptLine<'a> {
    pub prompt: &'a str,
    pub value: &'a str,
    pub editing: bool,
    pub style: Style,
    pub cursor: Color,
}

impl<'a> PromptLine<'a> {
    pub fn new(prompt: &'a str, value: &'a str, editing: bool) -> Self {
        Self {
            prompt,
            value,
            editing,
            style: Style::default(),
            cursor: Color::White,
        }
    }

    pub fn with_style(mut self, style: Style, cursor: Color) -> Self {
        self.style = style;
        self.cursor = cursor;
        self
    }
}

impl Widget for &PromptLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::raw(self.prompt), Span::raw(self.value)];
        if self.editing {
            spans.push(Span::styled(CURSOR, Style::default().fg(self.cursor)));
        }
        Paragraph::new(Line::from(spans))
            .style(self.style)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(prompt: &PromptLine) -> String {
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        prompt.render(area, &mut buf);
        (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_cursor_only_while_editing() {
        assert_eq!(text(&PromptLine::new("filter: ", "Age", true)), "filter: Age█");
        assert_eq!(text(&PromptLine::new("filter: ", "Age", false)), "filter: Age");
    }
}

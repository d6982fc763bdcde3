use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Row, Table, Widget},
};

use crate::render::Frame;

/// Bordered table for a rendered [`Frame`] with the total-row footer below.
pub struct TableView<'a> {
    frame: &'a Frame,
    row_styles: [Style; 2],
    footer_style: Style,
}

impl<'a> TableView<'a> {
    pub fn new(frame: &'a Frame) -> Self {
        Self {
            frame,
            row_styles: [Style::default(); 2],
            footer_style: Style::default(),
        }
    }

    pub fn with_row_styles(mut self, even: Style, odd: Style) -> Self {
        self.row_styles = [even, odd];
        self
    }

    pub fn with_footer_style(mut self, style: Style) -> Self {
        self.footer_style = style;
        self
    }
}

impl Widget for &TableView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [table_area, footer_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length(1)])
            .areas(area);

        // widths already include one cell of separation
        let widths: Vec<Constraint> = self
            .frame
            .widths
            .iter()
            .map(|w| Constraint::Length(*w as u16))
            .collect();
        let rows: Vec<Row> = self
            .frame
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Row::new(row.iter().map(|cell| Line::from(cell.as_str())))
                    .style(self.row_styles[i % 2])
            })
            .collect();
        let header = Row::new(self.frame.headers.iter().map(|h| Line::from(h.as_str())))
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let table = Table::new(rows, widths)
            .column_spacing(0)
            .header(header)
            .block(Block::default().borders(Borders::ALL));
        Widget::render(table, table_area, buf);

        Paragraph::new(self.frame.footer())
            .style(self.footer_style)
            .render(footer_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_header_rows_and_footer() {
        let frame = Frame {
            headers: vec![" ".to_string(), "Name".to_string()],
            rows: vec![
                vec!["0".to_string(), "ann".to_string()],
                vec!["1".to_string(), "bob".to_string()],
            ],
            widths: vec![2, 5],
            total_rows: 40,
        };
        let area = Rect::new(0, 0, 20, 8);
        let mut buf = Buffer::empty(area);
        TableView::new(&frame).render(area, &mut buf);
        let lines: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol().to_string()).collect())
            .collect();

        assert!(lines[1].contains("Name"));
        // header margin leaves row 2 blank inside the border
        assert!(lines[3].contains("ann"));
        assert!(lines[4].contains("bob"));
        assert!(lines[7].starts_with("... 40 total rows"));
    }
}

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::source::DataSource;

/// Schema of the loaded table plus its size.
pub struct SummaryView<'a> {
    source: &'a DataSource,
    total_rows: usize,
    row_styles: [Style; 2],
}

impl<'a> SummaryView<'a> {
    pub fn new(source: &'a DataSource, total_rows: usize) -> Self {
        Self {
            source,
            total_rows,
            row_styles: [Style::default(); 2],
        }
    }

    pub fn with_row_styles(mut self, even: Style, odd: Style) -> Self {
        self.row_styles = [even, odd];
        self
    }
}

impl Widget for &SummaryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [counts_area, schema_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Fill(1)])
            .areas(area);

        let dtypes = self.source.dtypes();
        Paragraph::new(format!(
            "{} rows × {} columns",
            self.total_rows,
            dtypes.len()
        ))
        .render(counts_area, buf);

        let block = Block::default()
            .title("Schema")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);

        // two column table: name and type
        let rows: Vec<Row> = dtypes
            .iter()
            .enumerate()
            .map(|(i, (name, dtype))| {
                Row::new(vec![
                    Cell::from(Span::raw(name.clone())),
                    Cell::from(Span::raw(dtype.to_string())),
                ])
                .style(self.row_styles[i % 2])
            })
            .collect();

        let widths = [Constraint::Percentage(50), Constraint::Percentage(50)];
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let table = Table::new(rows, widths)
            .header(Row::new(vec![
                Cell::from(Span::styled("Column", bold)),
                Cell::from(Span::styled("Type", bold)),
            ]))
            .block(block);

        Widget::render(table, schema_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_summary_lists_columns_and_counts() {
        let df = df!("Name" => ["a", "b"], "Age" => [1i64, 2]).unwrap();
        let source = DataSource::new(df.lazy()).unwrap();
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        SummaryView::new(&source, 2).render(area, &mut buf);

        let lines: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol().to_string()).collect())
            .collect();
        let text = lines.join("\n");
        assert!(lines[0].starts_with("2 rows × 2 columns"));
        assert!(text.contains("Name"));
        assert!(text.contains("Age"));
        assert!(text.contains("i64"));
        assert!(!text.contains("__dbv_row_index__"));
    }
}

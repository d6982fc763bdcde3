use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Row, Table, Widget},
};

use crate::commands::{CommandRegistry, CommandScope};

/// One table per command scope, in registration order.
pub struct HelpView<'a> {
    registry: &'a CommandRegistry,
    row_styles: [Style; 2],
}

impl<'a> HelpView<'a> {
    pub fn new(registry: &'a CommandRegistry) -> Self {
        Self {
            registry,
            row_styles: [Style::default(); 2],
        }
    }

    pub fn with_row_styles(mut self, even: Style, odd: Style) -> Self {
        self.row_styles = [even, odd];
        self
    }

    fn table(&self, scope: CommandScope) -> (Table<'a>, u16) {
        let rows: Vec<Row> = self
            .registry
            .in_scope(scope)
            .enumerate()
            .map(|(i, command)| {
                Row::new(vec![
                    command.key.to_string(),
                    command.short_description.to_string(),
                    command.help.to_string(),
                ])
                .style(self.row_styles[i % 2])
            })
            .collect();
        // borders + header
        let height = rows.len() as u16 + 3;
        let header = Row::new(vec!["Command", "Short", "Description"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let table = Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(14),
                Constraint::Fill(1),
            ],
        )
        .header(header)
        .block(Block::default().title(scope.title()).borders(Borders::ALL));
        (table, height)
    }
}

impl Widget for &HelpView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let tables: Vec<(Table, u16)> = CommandScope::ALL
            .iter()
            .map(|scope| self.table(*scope))
            .collect();
        let mut constraints: Vec<Constraint> = tables
            .iter()
            .map(|(_, height)| Constraint::Length(*height))
            .collect();
        constraints.push(Constraint::Fill(1));

        let areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        for ((table, _), table_area) in tables.into_iter().zip(areas.iter()) {
            Widget::render(table, *table_area, buf);
        }
    }
}

use crossterm::event::KeyEvent;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Padding, Paragraph};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use tracing::debug;

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error_display;
pub mod filter;
pub mod keys;
pub mod logging;
mod query;
pub mod render;
pub mod session;
pub mod source;
pub mod view;
pub mod widgets;

pub use cache::CacheManager;
pub use cli::{Args, CompressionFormat, EvaluatorKind};
pub use commands::{default_registry, CommandRegistry, CommandScope, RegistryError};
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use filter::{evaluator_for, FilterCompiler, Strategy};
pub use render::{Frame, TableRenderer};
pub use session::Session;
pub use source::{load_paths, DataSource, OpenOptions};
pub use view::{Mode, ViewState};

use widgets::debug::DebugState;
use widgets::help::HelpView;
use widgets::mode_line::ModeLine;
use widgets::prompt::PromptLine;
use widgets::summary::SummaryView;
use widgets::table::TableView;

/// Application name used for config and cache directories
pub const APP_NAME: &str = "dbv";

pub const TITLE: &str = "Database Viewer";

/// Events flowing from the terminal loop into [`App::event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16), // resized (width, height)
    Exit,
}

pub struct App {
    commands: CommandRegistry,
    pub session: Session,
    compiler: FilterCompiler,
    theme: Theme,
    needs_redraw: bool,
    last_frame: Option<Frame>,
    pub debug: DebugState,
}

impl App {
    pub fn new(session: Session, commands: CommandRegistry, compiler: FilterCompiler) -> Self {
        Self {
            commands,
            session,
            compiler,
            theme: Theme::default(),
            needs_redraw: true,
            last_frame: None,
            debug: DebugState::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Route one character. Returns whether the loop should keep running.
    ///
    /// While an editor is active it receives every character; when it stops
    /// it is finalized and released. Otherwise the character selects a
    /// command, table scope first when in table mode.
    pub fn handle(&mut self, ch: char) -> bool {
        if let Some(mut editor) = self.session.editor.take() {
            if editor.send_character(ch) {
                self.session.editor = Some(editor);
            } else {
                editor.finish(&mut self.session.view);
                debug!(filter = ?self.session.view.filter_text, "editor finished");
            }
            self.needs_redraw = true;
            return true;
        }

        let Some(command) = self.commands.resolve(self.session.mode, ch) else {
            return true;
        };
        let handler = command.handler;
        debug!(key = %ch, command = command.short_description, scope = %command.scope, "dispatch");
        if self.debug.enabled {
            self.debug.last_command = command.short_description.to_string();
        }

        let mut refresh = false;
        let keep_running = handler(&mut self.session, &mut || refresh = true);
        if refresh {
            self.needs_redraw = true;
        }
        keep_running
    }

    /// Handle an event; a returned event is fed back into the loop.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => {
                if self.debug.enabled {
                    self.debug.on_key(key);
                }
                if keys::is_interrupt(key) {
                    return Some(AppEvent::Exit);
                }
                let ch = keys::key_to_char(key)?;
                if self.handle(ch) {
                    None
                } else {
                    Some(AppEvent::Exit)
                }
            }
            AppEvent::Resize(_, _) => {
                self.needs_redraw = true;
                None
            }
            AppEvent::Exit => None,
        }
    }

    /// Whether a frame was requested since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// The table page produced by the most recent draw in table mode.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    fn color(&self, name: &str) -> ratatui::style::Color {
        self.theme.get(name)
    }

    fn row_styles(&self) -> (Style, Style) {
        let text = self.color("text");
        (
            Style::default().fg(text).bg(self.color("background")),
            Style::default().fg(text).bg(self.color("background_alt")),
        )
    }

    fn render_table(&mut self, area: Rect, buf: &mut Buffer) {
        let editor_visible = self.session.prompt_visible();
        let filter = self.session.effective_filter().map(str::to_string);

        // padding and borders of the panel and table
        let inner_width = area.width.saturating_sub(4 + 2);
        let renderer = TableRenderer::new(&self.compiler);
        let rendered = renderer.render(
            inner_width,
            area.height,
            &mut self.session.view,
            &self.session.source,
            filter.as_deref(),
            editor_visible,
        );
        if self.debug.enabled {
            self.debug.filter_strategy = rendered.strategy.as_str().to_string();
        }

        let panel = Block::default().padding(Padding::new(2, 2, 1, 1));
        let inner = panel.inner(area);
        let mut constraints = vec![Constraint::Fill(1)];
        if editor_visible {
            constraints.insert(0, Constraint::Length(1));
        }
        let areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        if editor_visible {
            let (prompt, editing) = match &self.session.editor {
                Some(editor) => (editor.prompt(), editor.is_editing()),
                None => (session::FILTER_PROMPT, false),
            };
            let value = filter.as_deref().unwrap_or_default();
            let (style, _) = self.row_styles();
            (&PromptLine::new(prompt, value, editing).with_style(style, self.color("cursor")))
                .render(areas[0], buf);
        }

        let (even, odd) = self.row_styles();
        let footer = Style::default()
            .fg(self.color("footer"))
            .bg(self.color("background"));
        (&TableView::new(&rendered.frame)
            .with_row_styles(even, odd)
            .with_footer_style(footer))
            .render(areas[areas.len() - 1], buf);

        self.last_frame = Some(rendered.frame);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let (body_style, odd) = self.row_styles();
        Block::default().style(body_style).render(area, buf);

        let mut constraints = vec![
            Constraint::Length(1), // title
            Constraint::Length(1), // mode line
            Constraint::Fill(1),
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        Paragraph::new(TITLE)
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(self.color("title"))
                    .bg(self.color("background"))
                    .add_modifier(Modifier::BOLD),
            )
            .render(layout[0], buf);

        (&ModeLine::new(self.session.mode)
            .with_colors(self.color("mode_active"), self.color("mode_inactive")))
            .render(layout[1], buf);

        let main = layout[2];
        match self.session.mode {
            view::Mode::Table => self.render_table(main, buf),
            view::Mode::Summary => {
                let inner = Block::default().padding(Padding::new(2, 2, 1, 1)).inner(main);
                (&SummaryView::new(&self.session.source, self.session.total_rows)
                    .with_row_styles(body_style, odd))
                    .render(inner, buf);
            }
            view::Mode::Help => {
                let inner = Block::default().padding(Padding::new(2, 2, 1, 1)).inner(main);
                (&HelpView::new(&self.commands).with_row_styles(body_style, odd))
                    .render(inner, buf);
            }
        }

        if self.debug.enabled {
            (&self.debug).render(layout[3], buf);
        }
    }
}

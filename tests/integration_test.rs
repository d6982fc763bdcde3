use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dbv::commands::Handler;
use dbv::{
    default_registry, evaluator_for, load_paths, App, AppEvent, CommandRegistry, CommandScope,
    DataSource, EvaluatorKind, FilterCompiler, Mode, OpenOptions, RegistryError, Session,
};
use polars::prelude::*;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use tempfile::TempDir;

mod common;

fn app_with(df: DataFrame, evaluator: EvaluatorKind) -> App {
    let source = DataSource::new(df.lazy()).unwrap();
    let session = Session::new(source).unwrap();
    App::new(
        session,
        default_registry().unwrap(),
        FilterCompiler::new(evaluator_for(evaluator)),
    )
}

fn people_app(rows: usize) -> App {
    app_with(common::people(rows), EvaluatorKind::Safe)
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn press(app: &mut App, ch: char) -> Option<AppEvent> {
    app.event(&key(KeyCode::Char(ch)))
}

fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        assert_eq!(press(app, ch), None);
    }
}

fn draw(app: &mut App, width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    Widget::render(&mut *app, area, &mut buf);
    buf
}

fn screen(buf: &Buffer) -> String {
    (0..buf.area.height)
        .map(|y| {
            (0..buf.area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Table viewport width is the terminal width minus padding (4) and borders (2)
const TERMINAL_WIDTH_FOR_40: u16 = 46;

#[test]
fn test_starts_in_table_mode() {
    let mut app = people_app(10);
    assert_eq!(app.session.mode, Mode::Table);
    let text = screen(&draw(&mut app, 80, 24));
    assert!(text.contains("Database Viewer"));
    assert!(text.contains("(t)able"));
    assert!(text.contains("... 10 total rows"));
    assert_eq!(app.last_frame().unwrap().total_rows, 10);

    press(&mut app, 's');
    assert_eq!(app.session.mode, Mode::Summary);
    let text = screen(&draw(&mut app, 80, 24));
    assert!(text.contains("10 rows × 3 columns"));
}

#[test]
fn test_table_fits_three_columns_at_width_40() {
    let mut app = people_app(100);
    press(&mut app, 't');
    assert_eq!(app.session.mode, Mode::Table);
    let text = screen(&draw(&mut app, TERMINAL_WIDTH_FOR_40, 30));

    let frame = app.last_frame().unwrap();
    assert_eq!(frame.headers, vec![" ", "Name", "Age"]);
    assert_eq!(frame.total_rows, 100);
    assert!(text.contains("... 100 total rows"));
    assert!(text.contains("person000"));
    assert!(!text.contains("City"));
}

#[test]
fn test_expression_filter_selects_rows() {
    let mut app = people_app(100);
    press(&mut app, 't');
    press(&mut app, '/');
    assert!(app.session.is_editing());
    type_text(&mut app, "Age > 30");
    assert_eq!(app.event(&key(KeyCode::Enter)), None);
    assert!(app.session.editor.is_none());
    assert_eq!(app.session.view.filter_text.as_deref(), Some("Age > 30"));

    let text = screen(&draw(&mut app, 120, 40));
    let expected = (0..100).filter(|i| 20 + i % 40 > 30).count();
    let frame = app.last_frame().unwrap();
    assert_eq!(frame.total_rows, expected);
    assert!(frame.rows.iter().all(|row| row[2].parse::<i64>().unwrap() > 30));
    assert!(text.contains("filter: Age > 30"));
    assert!(text.contains(&format!("... {} total rows", expected)));
}

#[test]
fn test_unparsable_filter_falls_back_to_substring_search() {
    let mut app = people_app(100);
    press(&mut app, 't');
    press(&mut app, '/');
    type_text(&mut app, "City Name Number 4");
    app.event(&key(KeyCode::Enter));

    draw(&mut app, 160, 40);
    let frame = app.last_frame().unwrap();
    // rows 4 and 40..=49
    assert_eq!(frame.total_rows, 11);
    assert_eq!(frame.rows[0][0], "4");
    assert_eq!(frame.rows[1][0], "40");
}

#[test]
fn test_filter_applies_live_while_typing() {
    let mut app = people_app(100);
    press(&mut app, 't');
    press(&mut app, '/');
    type_text(&mut app, "person01");

    let text = screen(&draw(&mut app, 120, 40));
    assert_eq!(app.last_frame().unwrap().total_rows, 10);
    assert!(text.contains("filter: person01█"));
    // the prompt takes one body row
    assert_eq!(app.session.view.last_page_size, 40 - 2 - 7 - 1);
}

#[test]
fn test_escape_commits_buffer_and_releases_editor() {
    let mut app = people_app(20);
    press(&mut app, 't');
    press(&mut app, '/');
    type_text(&mut app, "Name");
    app.event(&key(KeyCode::Esc));
    assert!(app.session.editor.is_none());
    assert_eq!(app.session.view.filter_text.as_deref(), Some("Name"));

    draw(&mut app, 120, 30);
    let frame = app.last_frame().unwrap();
    assert_eq!(frame.headers, vec![" ", "Name"]);
    assert_eq!(frame.total_rows, 20);

    // keys reach commands again
    press(&mut app, 's');
    assert_eq!(app.session.mode, Mode::Summary);
}

#[test]
fn test_editor_swallows_command_keys() {
    let mut app = people_app(20);
    press(&mut app, 't');
    press(&mut app, '/');
    assert_eq!(press(&mut app, 'q'), None);
    press(&mut app, 's');
    assert_eq!(app.session.mode, Mode::Table);
    app.event(&key(KeyCode::Backspace));
    app.event(&key(KeyCode::Backspace));
    app.event(&key(KeyCode::Enter));
    assert_eq!(app.session.view.filter_text, None);
}

#[test]
fn test_go_to_bottom_uses_last_page_size() {
    let mut app = people_app(55);
    press(&mut app, 't');
    // 2 title/mode rows + 7 chrome + 20 body rows
    draw(&mut app, 120, 29);
    assert_eq!(app.session.view.last_page_size, 20);

    press(&mut app, 'G');
    assert_eq!(app.session.view.startat(), 35);
    draw(&mut app, 120, 29);
    let frame = app.last_frame().unwrap();
    assert_eq!(frame.rows.len(), 20);
    assert_eq!(frame.rows[0][0], "35");

    press(&mut app, 'g');
    assert_eq!(app.session.view.startat(), 0);
}

#[test]
fn test_paging_and_column_scrolling() {
    let mut app = people_app(100);
    press(&mut app, 't');
    draw(&mut app, 120, 29);
    press(&mut app, 'j');
    press(&mut app, 'j');
    assert_eq!(app.session.view.startat(), 40);
    press(&mut app, 'k');
    assert_eq!(app.session.view.startat(), 20);

    press(&mut app, 'l');
    press(&mut app, 'l');
    press(&mut app, 'l');
    assert_eq!(app.session.view.column_start_at(), 2);
    draw(&mut app, 120, 29);
    assert_eq!(app.last_frame().unwrap().headers, vec![" ", "City"]);
    press(&mut app, 'h');
    assert_eq!(app.session.view.column_start_at(), 1);
}

#[test]
fn test_table_keys_ignored_outside_table_mode() {
    let mut app = people_app(100);
    press(&mut app, 's');
    draw(&mut app, 120, 29);
    assert!(app.take_redraw());
    assert_eq!(press(&mut app, 'j'), None);
    assert_eq!(press(&mut app, '/'), None);
    assert!(app.session.editor.is_none());
    assert!(!app.take_redraw());
    assert_eq!(press(&mut app, 'z'), None);
}

#[test]
fn test_quit_and_interrupt() {
    let mut app = people_app(5);
    assert_eq!(press(&mut app, 'q'), Some(AppEvent::Exit));

    let mut app = people_app(5);
    press(&mut app, 't');
    press(&mut app, '/');
    let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(app.event(&ctrl_c), Some(AppEvent::Exit));
}

#[test]
fn test_help_mode_lists_commands() {
    let mut app = people_app(5);
    press(&mut app, '?');
    assert_eq!(app.session.mode, Mode::Help);
    let text = screen(&draw(&mut app, 120, 40));
    assert!(text.contains("Mode Commands"));
    assert!(text.contains("Table Commands"));
    assert!(text.contains("Go to bottom"));
}

#[test]
fn test_resize_requests_redraw() {
    let mut app = people_app(5);
    app.take_redraw();
    assert_eq!(app.event(&AppEvent::Resize(80, 24)), None);
    assert!(app.take_redraw());
}

fn noop(_session: &mut Session, _refresh: &mut dyn FnMut()) -> bool {
    true
}

#[test]
fn test_duplicate_registration_fails_before_the_loop() {
    let handler: Handler = noop;
    let result = CommandRegistry::builder()
        .register(CommandScope::Table, 'g', "top", "", handler)
        .and_then(|b| b.register(CommandScope::Table, 'g', "again", "", handler));
    assert_eq!(
        result.unwrap_err(),
        RegistryError::Duplicate {
            scope: CommandScope::Table,
            key: 'g'
        }
    );
}

#[test]
fn test_loaded_csv_browses_like_in_memory() {
    let dir = TempDir::new().unwrap();
    let path = common::people_csv(dir.path(), 30);
    let source = load_paths(&[path], &OpenOptions::new()).unwrap();
    let session = Session::new(source).unwrap();
    let mut app = App::new(
        session,
        default_registry().unwrap(),
        FilterCompiler::new(evaluator_for(EvaluatorKind::Safe)),
    );
    press(&mut app, 't');
    draw(&mut app, TERMINAL_WIDTH_FOR_40, 20);
    let frame = app.last_frame().unwrap();
    assert_eq!(frame.total_rows, 30);
    assert_eq!(frame.headers, vec![" ", "Name", "Age"]);
}

#[cfg(feature = "sql")]
#[test]
fn test_sql_evaluator_filters() {
    let mut app = app_with(common::people(100), EvaluatorKind::Sql);
    press(&mut app, 't');
    press(&mut app, '/');
    type_text(&mut app, "Age >= 50 AND Name LIKE 'person0%'");
    app.event(&key(KeyCode::Enter));
    draw(&mut app, 160, 40);
    let expected = (0..100).filter(|i| 20 + i % 40 >= 50).count();
    assert_eq!(app.last_frame().unwrap().total_rows, expected);
}

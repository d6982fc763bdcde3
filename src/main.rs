use clap::Parser;
use color_eyre::Result;
use dbv::error_display::user_message_from_report;
use dbv::{
    default_registry, evaluator_for, load_paths, logging, App, AppConfig, AppEvent, Args,
    CacheManager, ConfigManager, FilterCompiler, OpenOptions, Session, Theme, APP_NAME,
};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{error, info};

/// CLI flags override the config file's file_loading section.
fn open_options(args: &Args, config: &AppConfig) -> OpenOptions {
    let mut opts = OpenOptions::new();
    if let Some(skip_lines) = args.skip_lines.or(config.file_loading.skip_lines) {
        opts = opts.with_skip_lines(skip_lines);
    }
    if let Some(skip_rows) = args.skip_rows.or(config.file_loading.skip_rows) {
        opts = opts.with_skip_rows(skip_rows);
    }
    if let Some(no_header) = args.no_header {
        opts = opts.with_has_header(!no_header);
    } else if let Some(has_header) = config.file_loading.has_header {
        opts = opts.with_has_header(has_header);
    }
    if let Some(delimiter) = args.delimiter.or(config.file_loading.delimiter) {
        opts = opts.with_delimiter(delimiter);
    }
    if let Some(compression) = args.compression.or_else(|| config.compression()) {
        opts = opts.with_compression(compression);
    }
    opts
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, mut app: App, poll_interval: Duration) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    render(&mut terminal, &mut app)?;
    app.take_redraw();

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        // Drain everything queued so each keystroke is applied before drawing
        loop {
            match rx.recv_timeout(Duration::from_millis(0)) {
                Ok(AppEvent::Exit) => return Ok(()),
                Ok(event) => {
                    if let Some(event) = app.event(&event) {
                        tx.send(event)?;
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => break,
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        if app.take_redraw() {
            render(&mut terminal, &mut app)?;
        }
    }
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(APP_NAME)?;
        match config_manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let config = match AppConfig::load(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Ok(cache) = CacheManager::new(APP_NAME) {
        logging::init(&cache, &config.logging.level, args.debug);
    }
    info!(paths = ?args.paths, "starting");

    let source = match load_paths(&args.paths, &open_options(&args, &config)) {
        Ok(source) => source,
        Err(e) => {
            let path = (args.paths.len() == 1).then(|| args.paths[0].as_path());
            let msg = user_message_from_report(&e, path);
            error!(error = %e, "load failed");
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
    };
    let mut session = match Session::new(source) {
        Ok(session) => session,
        Err(e) => {
            let msg = dbv::error_display::user_message_from_polars(&e);
            error!(error = %e, "row count failed");
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
    };
    if let Some(filter) = &args.filter {
        session.view.set_filter(filter);
    }

    let commands = match default_registry() {
        Ok(commands) => commands,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let evaluator = args.evaluator.unwrap_or_else(|| config.evaluator());
    let compiler = FilterCompiler::new(evaluator_for(evaluator));
    info!(evaluator = compiler.evaluator_name(), rows = session.total_rows, "ready");

    let theme = Theme::from_config(&config.theme)?;
    let mut app = App::new(session, commands, compiler).with_theme(theme);
    if args.debug {
        app.enable_debug();
    }

    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let terminal = ratatui::init();
    let result = run(terminal, app, poll_interval);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

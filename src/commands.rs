//! Keystroke commands and their registry.
//!
//! Commands live in an insertion-ordered map keyed by `(scope, key)`.
//! Registration order is help order. Registering the same key twice in one
//! scope is an error raised while the registry is built, before the event
//! loop starts.

use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

use crate::session::Session;
use crate::view::Mode;

/// Where a command is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandScope {
    /// Every mode.
    Global,
    /// Table mode only; shadows a global command on the same key.
    Table,
}

impl CommandScope {
    pub const ALL: [CommandScope; 2] = [CommandScope::Global, CommandScope::Table];

    pub fn title(&self) -> &'static str {
        match self {
            CommandScope::Global => "Mode Commands",
            CommandScope::Table => "Table Commands",
        }
    }
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandScope::Global => f.write_str("global"),
            CommandScope::Table => f.write_str("table"),
        }
    }
}

/// Receives the session and a callback requesting a redraw. Returning
/// `false` ends the interactive loop.
pub type Handler = fn(&mut Session, &mut dyn FnMut()) -> bool;

#[derive(Clone)]
pub struct Command {
    pub key: char,
    pub short_description: &'static str,
    pub help: &'static str,
    pub scope: CommandScope,
    pub handler: Handler,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("key", &self.key)
            .field("short_description", &self.short_description)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command key {key:?} registered twice in {scope} scope")]
    Duplicate { scope: CommandScope, key: char },
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    commands: IndexMap<(CommandScope, char), Command>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        scope: CommandScope,
        key: char,
        short_description: &'static str,
        help: &'static str,
        handler: Handler,
    ) -> Result<Self, RegistryError> {
        if self.commands.contains_key(&(scope, key)) {
            return Err(RegistryError::Duplicate { scope, key });
        }
        self.commands.insert(
            (scope, key),
            Command {
                key,
                short_description,
                help,
                scope,
                handler,
            },
        );
        Ok(self)
    }

    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            commands: self.commands,
        }
    }
}

#[derive(Debug)]
pub struct CommandRegistry {
    commands: IndexMap<(CommandScope, char), Command>,
}

impl CommandRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Find the command for `key`: table scope first when in table mode,
    /// then global scope.
    pub fn resolve(&self, mode: Mode, key: char) -> Option<&Command> {
        let table = (mode == Mode::Table)
            .then(|| self.commands.get(&(CommandScope::Table, key)))
            .flatten();
        table.or_else(|| self.commands.get(&(CommandScope::Global, key)))
    }

    /// Commands of one scope in registration order.
    pub fn in_scope(&self, scope: CommandScope) -> impl Iterator<Item = &Command> {
        self.commands.values().filter(move |c| c.scope == scope)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn summary_mode(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.mode = Mode::Summary;
    refresh();
    true
}

fn table_mode(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.mode = Mode::Table;
    refresh();
    true
}

fn quit(_session: &mut Session, _refresh: &mut dyn FnMut()) -> bool {
    false
}

fn show_help(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.mode = Mode::Help;
    refresh();
    true
}

fn edit_filter(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.start_filter();
    refresh();
    true
}

fn scroll_left(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.view.scroll_left();
    refresh();
    true
}

fn scroll_down(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.view.page_down();
    refresh();
    true
}

fn scroll_up(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.view.page_up();
    refresh();
    true
}

fn scroll_right(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.view.scroll_right();
    refresh();
    true
}

fn go_to_top(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.view.go_to_top();
    refresh();
    true
}

fn go_to_bottom(session: &mut Session, refresh: &mut dyn FnMut()) -> bool {
    session.view.go_to_bottom();
    refresh();
    true
}

/// The standard command set.
pub fn default_registry() -> Result<CommandRegistry, RegistryError> {
    use CommandScope::{Global, Table};
    Ok(CommandRegistry::builder()
        .register(Global, 's', "(s)ummary", "Show a summary of the database", summary_mode)?
        .register(Global, 't', "(t)able", "Show the database as a table", table_mode)?
        .register(Global, 'q', "(q)uit", "Quit", quit)?
        .register(Global, '?', "help", "Show this help page", show_help)?
        .register(
            Table,
            '/',
            "filter",
            "Edit the table filter. Text naming a column shows that column; \
             an expression such as `Age > 30` keeps matching rows; anything \
             else searches every cell for the text",
            edit_filter,
        )?
        .register(Table, 'h', "scroll left", "Scroll left one column in the table view", scroll_left)?
        .register(Table, 'j', "scroll down", "Scroll down one page in the table view", scroll_down)?
        .register(Table, 'k', "scroll up", "Scroll up one page in the table view", scroll_up)?
        .register(Table, 'l', "scroll right", "Scroll right one column in the table view", scroll_right)?
        .register(Table, 'g', "Go to top", "Go to the top of the table", go_to_top)?
        .register(Table, 'G', "Go to bottom", "Go to the bottom of the table", go_to_bottom)?
        .build())
}

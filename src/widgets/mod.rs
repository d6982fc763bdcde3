pub mod debug;
pub mod help;
pub mod mode_line;
pub mod prompt;
pub mod summary;
pub mod table;

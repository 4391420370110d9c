//! Message handling - Parsing chat text and routing it to commands

pub mod dispatcher;
pub mod handlers;
pub mod parser;

pub use dispatcher::Dispatcher;
pub use handlers::default_commands;
pub use parser::{clean_command, match_command};

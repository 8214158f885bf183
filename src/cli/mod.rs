pub mod commands;

pub use commands::{build_cli, execute, handle_command};

//! Presentation layer for superai
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, and the HTTP API.

pub mod cli;
pub mod output;
pub mod progress;
pub mod server;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::view::TurnView;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
pub use server::{ApiServer, ApiState};

//! services/app/src/shell/mod.rs
//!
//! The terminal front end: plays the part of the UI for the core's screen
//! controllers.

pub mod app;
pub mod command;
pub mod render;
pub mod router;

pub use app::Shell;
pub use command::{Command, CommandError};
pub use router::ShellNavigator;

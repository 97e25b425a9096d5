//! I/O module
//!
//! Handles the line-oriented user console.
//!
//! # Components
//!
//! - `command` - Parsing one line into a command
//! - `console` - The read-execute-reply session loop

pub mod command;
pub mod console;

pub use command::{parse_amount, Command};
pub use console::{run, SessionStats};

//! Project Synapse - AI Experimental Protocol Generator (TUI Edition)
//!
//! Core library providing the bootstrap / prompt-assembly / generation
//! pipeline plus the terminal chat front-end.

pub mod config;
pub mod core;
pub mod tui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

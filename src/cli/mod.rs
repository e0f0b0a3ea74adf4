//! CLI Interface: keyboard control and terminal rendering
//!
//! # Components
//! - `input.rs`: Key polling using crossterm, mapped to session commands
//! - `display.rs`: Snapshot rendering, summary and JSON output

pub mod display;
pub mod input;

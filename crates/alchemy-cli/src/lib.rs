//! UI Alchemy command-line library.
//!
//! `ui-alchemy serve` exposes the HTTP session API; `ui-alchemy chat` runs
//! the same sessions from a terminal.

pub mod chat;
pub mod cli;
pub mod commands;

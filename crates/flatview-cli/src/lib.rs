//! CLI library components for flatview.

pub mod cli;
pub mod commands;
pub mod diff;
pub mod logging;

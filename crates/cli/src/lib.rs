//! dashprobe CLI internals.

pub mod cli;
pub mod commands;
pub mod logging;

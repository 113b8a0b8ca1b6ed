//! Process wiring for the `og-harvest` binary.
mod app;
mod cli;
mod config;
mod progress;

pub use app::run_app;

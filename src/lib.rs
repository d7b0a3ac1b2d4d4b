#![allow(clippy::uninlined_format_args)]

pub mod api;
pub mod app;
pub mod browser;
pub mod catalog;
pub mod config;
pub mod data;
pub mod hierarchy;
pub mod logging;
pub mod navigation;
pub mod panel;
pub mod player;
pub mod related;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{run, RunOptions};

pub mod app;
pub mod config;
pub mod display;
pub mod edits;
pub mod logging;

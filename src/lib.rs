// Public library interface for EtfView-rs
// This allows the debug CLI tool to use the core modules

pub mod config;
pub mod feed;
pub mod layout;
pub mod model;
pub mod render;
pub mod ui;

// Path: crates/cli/src/commands/mod.rs

pub mod clone;
pub mod config;
pub mod info;
pub mod open;
pub mod rating;
pub mod serve;

pub mod adapters;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod protocol;

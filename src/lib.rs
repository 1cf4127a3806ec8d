pub mod calc;
pub mod cli;
pub mod config;
pub mod data;
pub mod format;
pub mod server;

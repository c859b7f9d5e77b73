//! Nearest vehicle position lookup over a binary position log

pub mod codec;
pub mod config;
pub mod errors;
pub mod models;
pub mod nearest;
pub mod report;

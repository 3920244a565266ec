pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod tui;

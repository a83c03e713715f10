pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod mutation;
pub mod placement;
pub mod tree;
pub mod utils;

// Re-export main API
pub use api::*;
pub use error::{Result, TreeError};

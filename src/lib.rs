pub mod analyzers;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod models;
pub mod processors;
pub mod readers;
pub mod remote;
pub mod utils;
pub mod writers;

pub use error::{PipelineError, Result};

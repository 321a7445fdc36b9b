//! Core configuration, error types, and logging for the Palia wiki Q&A bot.

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;

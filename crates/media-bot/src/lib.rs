//! Chat bot that answers prefixed commands and fetches audio on request.

pub mod commands;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod system_info;
pub mod transport;

pub use config::Config;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{AppError, AppResult};

pub mod command;
pub mod config;
pub mod error;
pub mod services;

pub use command::{CommandEngine, CommandOutcome, CommandResult, CommandType, UserRole};
pub use config::EngineConfig;
pub use error::{CommandError, GatewayError, Result};

//! Processor trait: one strategy per intent.

use crate::command::types::{CommandResult, CommandType};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Recognizes and handles exactly one intent.
///
/// `can_process` is a pure predicate over the utterance. `process` never
/// touches the network; it may be called without a prior `can_process`
/// (the fallback path does that) and must then fall back to parameter
/// defaults instead of failing.
#[async_trait]
pub trait CommandProcessor: Send + Sync {
    fn command_type(&self) -> CommandType;

    fn can_process(&self, text: &str) -> bool;

    async fn process(&self, text: &str, model_id: &str) -> Result<CommandResult>;

    fn name(&self) -> &'static str {
        self.command_type().as_str()
    }
}

pub type SharedProcessor = Arc<dyn CommandProcessor>;

//! Entry point: utterance in, `CommandResult` out.

use crate::command::classifier::CommandClassifier;
use crate::command::extract::normalize;
use crate::command::fallback::{FallbackReason, FallbackResolver, Resolution, Route};
use crate::command::registry::ProcessorCatalog;
use crate::command::types::{Action, CommandResult, CommandType, UserRole};
use crate::config::EngineConfig;
use crate::services::credentials::CredentialStore;
use crate::services::llm::client::LanguageModelGateway;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Returned instead of anything a fault would have produced.
pub const GENERIC_APOLOGY: &str =
    "Sorry, something went wrong while processing your command. Please try again.";

/// A result plus how the engine arrived at it.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub result: CommandResult,
    pub command_type: CommandType,
    pub route: Route,
}

pub struct CommandEngine {
    classifier: CommandClassifier,
    resolver: FallbackResolver,
}

impl CommandEngine {
    pub fn new(catalog: Arc<ProcessorCatalog>, resolver: FallbackResolver) -> Self {
        Self {
            classifier: CommandClassifier::new(catalog),
            resolver,
        }
    }

    /// Default registries wired to the given gateway and credential store.
    pub fn with_services(
        gateway: Arc<dyn LanguageModelGateway>,
        credentials: Arc<dyn CredentialStore>,
        config: EngineConfig,
    ) -> Self {
        let catalog = Arc::new(ProcessorCatalog::default());
        let resolver = FallbackResolver::new(Arc::clone(&catalog), gateway, credentials, config);
        Self::new(catalog, resolver)
    }

    /// Interpret one utterance. Never fails and never panics outward.
    pub async fn process(&self, text: &str, role: UserRole, model_id: &str) -> CommandResult {
        self.process_traced(text, role, model_id).await.result
    }

    pub async fn process_traced(&self, text: &str, role: UserRole, model_id: &str) -> CommandOutcome {
        let request_id = Uuid::new_v4();
        let span = info_span!("command", %request_id, %role);
        let outcome = self.route(text, role, model_id).instrument(span).await;
        CommandOutcome {
            result: presentable(outcome.result),
            ..outcome
        }
    }

    async fn route(&self, text: &str, role: UserRole, model_id: &str) -> CommandOutcome {
        // 1. Normalize
        let text = normalize(text);
        if text.is_empty() {
            info!("blank utterance");
            let resolution = Resolution::help(FallbackReason::EmptyUtterance);
            return CommandOutcome {
                result: resolution.result,
                command_type: resolution.command_type,
                route: resolution.route,
            };
        }

        // 2. Rule-based fast path
        let classification = self.classifier.classify(&text, role);
        if let Some(processor) = classification.processor {
            let command_type = classification.command_type;
            info!(%command_type, "rule match");
            let result = AssertUnwindSafe(processor.process(&text, model_id))
                .catch_unwind()
                .await;
            let result = match result {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    warn!(error = %e, processor = processor.name(), "processor failed");
                    CommandResult::error(GENERIC_APOLOGY)
                }
                Err(_) => {
                    warn!(processor = processor.name(), "processor panicked");
                    CommandResult::error(GENERIC_APOLOGY)
                }
            };
            return CommandOutcome {
                result,
                command_type,
                route: Route::Rule,
            };
        }

        // 3. Fallback, exactly once
        info!("no rule matched, falling back");
        let resolved = AssertUnwindSafe(self.resolver.resolve(&text, role, model_id))
            .catch_unwind()
            .await;
        match resolved {
            Ok(Ok(resolution)) => CommandOutcome {
                result: resolution.result,
                command_type: resolution.command_type,
                route: resolution.route,
            },
            Ok(Err(e)) => {
                warn!(error = %e, "fallback processor failed");
                fault()
            }
            Err(_) => {
                warn!("fallback panicked");
                fault()
            }
        }
    }
}

fn fault() -> CommandOutcome {
    CommandOutcome {
        result: CommandResult::error(GENERIC_APOLOGY),
        command_type: CommandType::Unknown,
        route: Route::Fault,
    }
}

/// Last check before a result leaves the engine.
fn presentable(mut result: CommandResult) -> CommandResult {
    if result.is_well_formed() {
        return result;
    }
    warn!(?result, "repairing malformed result");
    if result.response.trim().is_empty() {
        result.response = GENERIC_APOLOGY.to_string();
    }
    if result.action == Action::Error {
        result.target = None;
    }
    result
}

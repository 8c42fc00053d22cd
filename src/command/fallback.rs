//! Fallback path for utterances no rule recognized.
//!
//! Order of attempts:
//! 1. Ask the language model to pick one intent from a closed, role-scoped menu.
//! 2. Keyword heuristics over the utterance.
//! 3. Static help dialog.
//!
//! Step 1 is skipped when the credential store has nothing for the model.

use crate::command::processor::SharedProcessor;
use crate::command::processors::common::FALLBACK_HELP;
use crate::command::processors::trigger;
use crate::command::registry::ProcessorCatalog;
use crate::command::types::{CommandResult, CommandType, UserRole};
use crate::config::EngineConfig;
use crate::error::{GatewayError, Result};
use crate::services::credentials::CredentialStore;
use crate::services::llm::client::{ClassifyOptions, Completion, LanguageModelGateway};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keyword rows, tried in order. A row names candidate intents; the first one
/// the caller's registry owns wins, otherwise the row is skipped.
static HEURISTICS: Lazy<Vec<(Regex, &'static [CommandType])>> = Lazy::new(|| {
    vec![
        (
            trigger(r"\b(test|quiz)"),
            &[CommandType::GenerateTest, CommandType::StartQuiz][..],
        ),
        (trigger(r"flashcard"), &[CommandType::Flashcards][..]),
        (trigger(r"formula"), &[CommandType::SearchFormula][..]),
        (trigger(r"\breport"), &[CommandType::InstitutionalReport][..]),
    ]
});

/// Why the model's answer was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Nothing to say: the utterance was blank.
    EmptyUtterance,
    MissingCredential,
    /// Gateway failed after the allowed attempts.
    Gateway(String),
    /// The model answered, but not with a name from the menu (or said `unknown`).
    Unmappable(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::EmptyUtterance => f.write_str("empty utterance"),
            FallbackReason::MissingCredential => f.write_str("no credential for model"),
            FallbackReason::Gateway(e) => write!(f, "gateway failure: {}", e),
            FallbackReason::Unmappable(answer) => write!(f, "unmappable answer: {:?}", answer),
        }
    }
}

/// Which step produced the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A processor predicate matched; no fallback involved.
    Rule,
    Model { model: String },
    Heuristic { reason: FallbackReason },
    Help { reason: FallbackReason },
    /// The fallback path itself failed; the result is an error.
    Fault,
}

impl Route {
    /// Whether the gateway was called on the way to this result.
    pub fn model_attempted(&self) -> bool {
        match self {
            Route::Rule | Route::Fault => false,
            Route::Model { .. } => true,
            Route::Heuristic { reason } | Route::Help { reason } => matches!(
                reason,
                FallbackReason::Gateway(_) | FallbackReason::Unmappable(_)
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub result: CommandResult,
    pub command_type: CommandType,
    pub route: Route,
}

impl Resolution {
    /// Static help dialog. Never fails.
    pub fn help(reason: FallbackReason) -> Self {
        Self {
            result: CommandResult::dialog(FALLBACK_HELP),
            command_type: CommandType::Unknown,
            route: Route::Help { reason },
        }
    }
}

pub struct FallbackResolver {
    catalog: Arc<ProcessorCatalog>,
    gateway: Arc<dyn LanguageModelGateway>,
    credentials: Arc<dyn CredentialStore>,
    config: EngineConfig,
}

impl FallbackResolver {
    pub fn new(
        catalog: Arc<ProcessorCatalog>,
        gateway: Arc<dyn LanguageModelGateway>,
        credentials: Arc<dyn CredentialStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            gateway,
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve an utterance the classifier missed.
    ///
    /// Errors only come from the processor finally chosen; every gateway or
    /// mapping failure degrades to heuristics and then help.
    pub async fn resolve(&self, text: &str, role: UserRole, model_id: &str) -> Result<Resolution> {
        // 1. Credential
        let reason = match self.credentials.get(model_id) {
            None => {
                info!(model_id, "no credential, skipping model classification");
                FallbackReason::MissingCredential
            }
            Some(credential) => {
                // 2. Bounded model call
                let prompt = self.build_prompt(text, role);
                match self.ask_model(&prompt, model_id, &credential).await {
                    Ok(completion) => {
                        // 3. Closed-vocabulary mapping
                        match self.map_answer(&completion.content, role) {
                            Some((command_type, processor)) => {
                                info!(%command_type, model = %completion.model, "model classified utterance");
                                let result = processor.process(text, model_id).await?;
                                return Ok(Resolution {
                                    result,
                                    command_type,
                                    route: Route::Model {
                                        model: completion.model,
                                    },
                                });
                            }
                            None => {
                                warn!(answer = %completion.content, "model answer not in menu");
                                FallbackReason::Unmappable(completion.content)
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, model_id, "model classification failed");
                        FallbackReason::Gateway(e.to_string())
                    }
                }
            }
        };

        // 4. Keyword heuristics
        if let Some(processor) = self.heuristic(text, role) {
            let command_type = processor.command_type();
            info!(%command_type, %reason, "heuristic match");
            let result = processor.process(text, model_id).await?;
            return Ok(Resolution {
                result,
                command_type,
                route: Route::Heuristic { reason },
            });
        }

        // 5. Help
        info!(%reason, "falling back to help dialog");
        Ok(Resolution::help(reason))
    }

    /// Menu prompt listing the role's intents plus `help` and `unknown`.
    pub fn build_prompt(&self, text: &str, role: UserRole) -> String {
        let mut prompt = format!(
            "You route voice commands for a {} using an education app.\n\
             Classify the command into exactly one of these intents:\n",
            role
        );
        for command_type in self.menu(role) {
            prompt.push_str(&format!("- {}: {}\n", command_type, command_type.describe()));
        }
        prompt.push_str(&format!(
            "\nCommand: \"{}\"\n\
             Answer with the intent name only, nothing else. \
             If none fits, answer unknown.",
            text
        ));
        prompt
    }

    fn menu(&self, role: UserRole) -> Vec<CommandType> {
        let mut menu = self.catalog.for_role(role).command_types();
        menu.push(CommandType::Help);
        menu.push(CommandType::Unknown);
        menu
    }

    /// Map a raw model answer onto a processor the caller's role owns.
    ///
    /// Exact name first, then an answer that starts with a menu name followed
    /// by `_` (longest name wins). `unknown` never maps.
    pub fn map_answer(&self, answer: &str, role: UserRole) -> Option<(CommandType, SharedProcessor)> {
        let normalized = normalize_answer(answer);
        if normalized.is_empty() {
            return None;
        }

        let menu = self.menu(role);
        let command_type = menu
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .or_else(|| {
                menu.iter()
                    .copied()
                    .filter(|t| {
                        normalized
                            .strip_prefix(t.as_str())
                            .is_some_and(|rest| rest.starts_with('_'))
                    })
                    .max_by_key(|t| t.as_str().len())
            })?;
        debug!(answer, %command_type, "mapped model answer");

        if command_type == CommandType::Unknown {
            return None;
        }
        let processor = self.catalog.resolve(role, command_type)?;
        Some((command_type, Arc::clone(processor)))
    }

    /// First heuristic row whose keyword appears and whose intent the role owns.
    pub fn heuristic(&self, text: &str, role: UserRole) -> Option<SharedProcessor> {
        let registry = self.catalog.for_role(role);
        HEURISTICS
            .iter()
            .filter(|(pattern, _)| pattern.is_match(text))
            .find_map(|(_, candidates)| candidates.iter().find_map(|t| registry.get(*t)))
            .cloned()
    }

    async fn ask_model(
        &self,
        prompt: &str,
        model_id: &str,
        credential: &str,
    ) -> std::result::Result<Completion, GatewayError> {
        let options = ClassifyOptions {
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
        };
        let limit = self.config.gateway_timeout();
        let retries = self.config.max_retries.min(1);
        let mut attempt = 0;

        loop {
            let call = self.gateway.classify(prompt, model_id, credential, &options);
            let err = match tokio::time::timeout(limit, call).await {
                Ok(Ok(completion)) => return Ok(completion),
                Ok(Err(e)) => e,
                Err(_) => GatewayError::Timeout(limit),
            };

            attempt += 1;
            if attempt > retries || !err.is_retryable() {
                return Err(err);
            }
            warn!(error = %err, attempt, "retrying gateway call");
            tokio::time::sleep(self.config.retry_backoff()).await;
        }
    }
}

/// Trim quotes and punctuation, lower-case, map spaces and hyphens to `_`.
/// Only the first line of the answer counts.
fn normalize_answer(answer: &str) -> String {
    let first_line = answer.trim().lines().next().unwrap_or("");
    first_line
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::InMemoryCredentialStore;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl LanguageModelGateway for Unreachable {
        async fn classify(
            &self,
            _prompt: &str,
            _model_id: &str,
            _credential: &str,
            _options: &ClassifyOptions,
        ) -> std::result::Result<Completion, GatewayError> {
            Err(GatewayError::Transport("unreachable".into()))
        }
    }

    fn resolver() -> FallbackResolver {
        FallbackResolver::new(
            Arc::new(ProcessorCatalog::default()),
            Arc::new(Unreachable),
            Arc::new(InMemoryCredentialStore::new()),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer("  \"Generate Test.\" "), "generate_test");
        assert_eq!(normalize_answer("lesson-plan"), "lesson_plan");
        assert_eq!(normalize_answer("flashcards\nbecause the user asked"), "flashcards");
        assert_eq!(normalize_answer("  ...  "), "");
    }

    #[test]
    fn test_map_exact_and_prefix() {
        let r = resolver();
        let (t, _) = r.map_answer("flashcards", UserRole::Teacher).unwrap();
        assert_eq!(t, CommandType::Flashcards);
        let (t, _) = r.map_answer("generate_test (the user wants a paper)", UserRole::Teacher).unwrap();
        assert_eq!(t, CommandType::GenerateTest);
        let (t, _) = r.map_answer("Help", UserRole::Principal).unwrap();
        assert_eq!(t, CommandType::Help);
    }

    #[test]
    fn test_map_rejects_unknown_and_foreign_intents() {
        let r = resolver();
        assert!(r.map_answer("unknown", UserRole::Student).is_none());
        // Belongs to the teacher, not on the student's menu.
        assert!(r.map_answer("generate_test", UserRole::Student).is_none());
        // No substring containment.
        assert!(r.map_answer("I think flashcards", UserRole::Teacher).is_none());
        assert!(r.map_answer("", UserRole::Teacher).is_none());
        // A menu name must end at a word boundary.
        assert!(r.map_answer("helpful", UserRole::Student).is_none());
        assert!(r.map_answer("flashcardsfoo", UserRole::Teacher).is_none());
    }

    #[test]
    fn test_prompt_lists_only_role_menu() {
        let prompt = resolver().build_prompt("do the thing", UserRole::Principal);
        assert!(prompt.contains("- institutional_report:"));
        assert!(prompt.contains("- help:"));
        assert!(prompt.contains("- unknown:"));
        assert!(!prompt.contains("- start_quiz:"));
        assert!(prompt.contains("\"do the thing\""));
    }

    #[test]
    fn test_heuristics_are_role_scoped() {
        let r = resolver();
        let t = |text, role| r.heuristic(text, role).map(|p| p.command_type());
        assert_eq!(t("some test thing", UserRole::Teacher), Some(CommandType::GenerateTest));
        assert_eq!(t("some test thing", UserRole::Student), Some(CommandType::StartQuiz));
        assert_eq!(t("some test thing", UserRole::Principal), None);
        assert_eq!(t("flashcard stuff", UserRole::Student), None);
        assert_eq!(t("that formula", UserRole::Student), Some(CommandType::SearchFormula));
        assert_eq!(t("the report", UserRole::Principal), Some(CommandType::InstitutionalReport));
    }

    #[test]
    fn test_route_model_attempted() {
        assert!(!Route::Help { reason: FallbackReason::MissingCredential }.model_attempted());
        assert!(Route::Heuristic { reason: FallbackReason::Gateway("x".into()) }.model_attempted());
        assert!(!Route::Rule.model_attempted());
    }
}

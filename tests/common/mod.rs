//! Gateway doubles shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_router::command::{FallbackResolver, ProcessorCatalog};
use voice_router::services::credentials::InMemoryCredentialStore;
use voice_router::services::llm::{ClassifyOptions, Completion, LanguageModelGateway};
use voice_router::{CommandEngine, EngineConfig, GatewayError};

pub const MODEL: &str = "gpt-4o";

pub enum Behavior {
    Answer(String),
    Fail(fn() -> GatewayError),
    Hang,
}

/// Counts calls and replies according to `behavior`.
pub struct ScriptedGateway {
    behavior: Behavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(answer: &str) -> Arc<Self> {
        Self::new(Behavior::Answer(answer.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModelGateway for ScriptedGateway {
    async fn classify(
        &self,
        prompt: &str,
        model_id: &str,
        _credential: &str,
        _options: &ClassifyOptions,
    ) -> Result<Completion, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.behavior {
            Behavior::Answer(answer) => Ok(Completion {
                content: answer.clone(),
                model: model_id.to_string(),
                usage: None,
            }),
            Behavior::Fail(make) => Err(make()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Transport("woke up".into()))
            }
        }
    }
}

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        gateway_timeout_ms: 50,
        retry_backoff_ms: 10,
        ..EngineConfig::default()
    }
}

pub fn credentials(with_key: bool) -> Arc<InMemoryCredentialStore> {
    if with_key {
        Arc::new(InMemoryCredentialStore::with_credential(MODEL, "sk-test"))
    } else {
        Arc::new(InMemoryCredentialStore::new())
    }
}

pub fn resolver(gateway: Arc<ScriptedGateway>, with_key: bool) -> FallbackResolver {
    FallbackResolver::new(
        Arc::new(ProcessorCatalog::default()),
        gateway,
        credentials(with_key),
        fast_config(),
    )
}

pub fn engine(gateway: Arc<ScriptedGateway>, with_key: bool) -> CommandEngine {
    CommandEngine::with_services(gateway, credentials(with_key), fast_config())
}

use crate::command::processor::SharedProcessor;
use crate::command::registry::ProcessorCatalog;
use crate::command::types::{CommandType, UserRole};
use std::sync::Arc;

/// Outcome of the rule-based pass.
#[derive(Clone)]
pub struct Classification {
    pub command_type: CommandType,
    pub processor: Option<SharedProcessor>,
}

impl Classification {
    pub fn miss() -> Self {
        Self {
            command_type: CommandType::Unknown,
            processor: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.processor.is_some()
    }
}

impl std::fmt::Debug for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classification")
            .field("command_type", &self.command_type)
            .field("matched", &self.is_match())
            .finish()
    }
}

/// First-match walk over the help predicate, then the role's registry.
pub struct CommandClassifier {
    catalog: Arc<ProcessorCatalog>,
}

impl CommandClassifier {
    pub fn new(catalog: Arc<ProcessorCatalog>) -> Self {
        Self { catalog }
    }

    pub fn classify(&self, text: &str, role: UserRole) -> Classification {
        let found = self
            .catalog
            .common()
            .find_match(text)
            .or_else(|| self.catalog.for_role(role).find_match(text));

        match found {
            Some(processor) => Classification {
                command_type: processor.command_type(),
                processor: Some(Arc::clone(processor)),
            },
            None => Classification::miss(),
        }
    }
}

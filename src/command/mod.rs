//! Command interpretation: classify, extract, route.

pub mod classifier;
pub mod engine;
pub mod extract;
pub mod fallback;
pub mod processor;
pub mod processors;
pub mod registry;
pub mod types;

pub use classifier::{Classification, CommandClassifier};
pub use engine::{CommandEngine, CommandOutcome, GENERIC_APOLOGY};
pub use fallback::{FallbackReason, FallbackResolver, Resolution, Route};
pub use processor::{CommandProcessor, SharedProcessor};
pub use registry::{ProcessorCatalog, RoleProcessorRegistry};
pub use types::{Action, CommandResult, CommandType, Params, UserRole};

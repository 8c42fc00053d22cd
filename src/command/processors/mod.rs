//! Concrete processors, grouped by the role that owns them.

pub mod common;
pub mod principal;
pub mod student;
pub mod teacher;

use crate::command::types::Params;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub use common::HelpProcessor;
pub use principal::{InstitutionalReport, ResultComparison, TeacherPerformance};
pub use student::{DoubtSolver, FormulaFinder, PerformanceFeedback, QuizStarter, ReminderSetter};
pub use teacher::{ClassAnalytics, FlashcardsGenerator, LessonPlanner, RevisionSheetGenerator, TestGenerator};

/// Unwrap a `json!({...})` literal into a params map.
pub(crate) fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// Case-insensitive trigger pattern.
pub(crate) fn trigger(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).expect("trigger patterns are constant")
}

/// Filler left over after trigger words are removed ("me the", "for a").
pub(crate) static FILLER: Lazy<Regex> = Lazy::new(|| {
    trigger(r"\b(me|the|a|an|for|of|please|can you|could you|i want to|i need)\b")
});

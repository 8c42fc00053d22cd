use super::trigger;
use crate::command::processor::CommandProcessor;
use crate::command::types::{CommandResult, CommandType};
use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static HELP: Lazy<Regex> = Lazy::new(|| trigger(r"\bhelp\b|\bwhat can you do\b"));

/// Canned capability summary, identical for every role.
pub const CAPABILITY_SUMMARY: &str = "I can help you with various tasks. For students, I can answer \
doubts, start quizzes, set reminders, find formulas, and show your performance. For teachers, I can \
create tests, show class analytics, and generate lesson plans, revision sheets, and flashcards. For \
principals, I can generate institutional reports, compare results, and show teacher performance data.";

/// Last-resort message when nothing else understood the utterance.
pub const FALLBACK_HELP: &str = "I'm not sure what you want me to do. Try saying 'create a test', \
'show analytics', 'make flashcards', 'start a quiz on physics', or 'help'.";

/// Role-agnostic; checked before any role processor.
pub struct HelpProcessor;

#[async_trait]
impl CommandProcessor for HelpProcessor {
    fn command_type(&self) -> CommandType {
        CommandType::Help
    }

    fn can_process(&self, text: &str) -> bool {
        HELP.is_match(text)
    }

    async fn process(&self, _text: &str, _model_id: &str) -> Result<CommandResult> {
        Ok(CommandResult::dialog(CAPABILITY_SUMMARY))
    }
}

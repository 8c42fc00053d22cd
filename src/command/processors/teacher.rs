use super::{params, trigger};
use crate::command::extract::{self, SubjectTable};
use crate::command::processor::CommandProcessor;
use crate::command::types::{CommandResult, CommandType};
use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::debug;

const TEST_DEFAULT_COUNT: u32 = 10;
const DEFAULT_SECTION: &str = "A";

static LESSON_PLAN: Lazy<Regex> = Lazy::new(|| trigger(r"\b(lesson plans?|teaching plans?)\b"));
static FLASHCARDS: Lazy<Regex> = Lazy::new(|| trigger(r"\b(flash ?cards?|revision cards?)\b"));
static REVISION_SHEET: Lazy<Regex> = Lazy::new(|| trigger(r"\b(revision|cheat ?sheets?|formula sheets?)\b"));
static TEST: Lazy<Regex> = Lazy::new(|| {
    trigger(
        r"\b(create|generate|make|prepare|set)\b.*\b(tests?|quiz|quizzes|exams?|papers?|questions?|mcqs?)\b|\b(test|question) papers?\b",
    )
});
static ANALYTICS: Lazy<Regex> = Lazy::new(|| trigger(r"\b(analytics|performance|weak|struggling|show)\b"));
static MENTIONS_FORMULAS: Lazy<Regex> = Lazy::new(|| trigger(r"\b(formulas?|equations?)\b"));

const MATERIAL_ANCHORS: &[&str] = &["for", "on", "about"];

pub struct LessonPlanner;

#[async_trait]
impl CommandProcessor for LessonPlanner {
    fn command_type(&self) -> CommandType {
        CommandType::LessonPlan
    }

    fn can_process(&self, text: &str) -> bool {
        LESSON_PLAN.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let subject = extract::topic(text, MATERIAL_ANCHORS, "general");

        Ok(CommandResult::navigate(
            "lesson-plan",
            params(json!({ "subject": subject, "type": "lesson-plan" })),
            format!("Creating a lesson plan for {}.", subject),
        ))
    }
}

pub struct FlashcardsGenerator;

#[async_trait]
impl CommandProcessor for FlashcardsGenerator {
    fn command_type(&self) -> CommandType {
        CommandType::Flashcards
    }

    fn can_process(&self, text: &str) -> bool {
        FLASHCARDS.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let subject = extract::topic(text, MATERIAL_ANCHORS, "general");
        let include_formulas = MENTIONS_FORMULAS.is_match(text);

        Ok(CommandResult::navigate(
            "lesson-plan",
            params(json!({
                "subject": subject,
                "type": "flashcards",
                "includeFormulas": include_formulas,
            })),
            format!(
                "Generating flashcards for {}{}.",
                subject,
                if include_formulas { " with formulas" } else { "" }
            ),
        ))
    }
}

/// Revision, cheat and formula sheets. A formula sheet always includes formulas.
pub struct RevisionSheetGenerator;

#[async_trait]
impl CommandProcessor for RevisionSheetGenerator {
    fn command_type(&self) -> CommandType {
        CommandType::RevisionSheet
    }

    fn can_process(&self, text: &str) -> bool {
        REVISION_SHEET.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let subject = extract::topic(text, MATERIAL_ANCHORS, "general");
        let include_formulas = MENTIONS_FORMULAS.is_match(text);

        Ok(CommandResult::navigate(
            "lesson-plan",
            params(json!({
                "subject": subject,
                "type": "revision-sheet",
                "includeFormulas": include_formulas,
            })),
            format!(
                "Preparing a revision sheet for {}{}.",
                subject,
                if include_formulas { " with formulas" } else { "" }
            ),
        ))
    }
}

/// Builds a test ("generate 15 mcq questions on calculus").
pub struct TestGenerator;

#[async_trait]
impl CommandProcessor for TestGenerator {
    fn command_type(&self) -> CommandType {
        CommandType::GenerateTest
    }

    fn can_process(&self, text: &str) -> bool {
        TEST.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let count = extract::count(text, TEST_DEFAULT_COUNT);
        let question_type = extract::question_type(text);
        let subject = extract::topic(text, &["on", "about", "from"], "general");
        let difficulty = extract::difficulty(text);
        debug!(count, question_type, %subject, difficulty = difficulty.as_str(), "test");

        Ok(CommandResult::navigate(
            "test-creator",
            params(json!({
                "count": count,
                "type": question_type,
                "subject": subject,
                "difficulty": difficulty.as_str(),
            })),
            format!(
                "Creating a {} test with {} {} questions on {}.",
                difficulty.as_str(),
                count,
                question_type,
                subject
            ),
        ))
    }
}

pub struct ClassAnalytics;

#[async_trait]
impl CommandProcessor for ClassAnalytics {
    fn command_type(&self) -> CommandType {
        CommandType::ClassAnalytics
    }

    fn can_process(&self, text: &str) -> bool {
        ANALYTICS.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let section = extract::section(text, DEFAULT_SECTION);
        let subject = extract::subject_or(text, SubjectTable::Narrow, "all");

        Ok(CommandResult::navigate(
            "performance-analytics",
            params(json!({ "section": section, "subject": subject })),
            format!("Showing performance analytics for Section {} in {}.", section, subject),
        ))
    }
}

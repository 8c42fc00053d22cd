use super::{params, trigger, FILLER};
use crate::command::extract::{self, Period, SubjectTable};
use crate::command::processor::CommandProcessor;
use crate::command::types::{CommandResult, CommandType};
use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::debug;

const QUIZ_DEFAULT_COUNT: u32 = 10;

static DOUBT: Lazy<Regex> = Lazy::new(|| trigger(r"\b(explain|what is|how to|solve|doubt)\b"));
static QUIZ: Lazy<Regex> = Lazy::new(|| trigger(r"\b(quiz|quizzes|practice|test me)\b"));
static REMINDER: Lazy<Regex> = Lazy::new(|| trigger(r"\b(remind|reminder|schedule)\b"));
static FORMULA: Lazy<Regex> = Lazy::new(|| trigger(r"\b(formulas?|equations?|find)\b"));
static PERFORMANCE: Lazy<Regex> = Lazy::new(|| trigger(r"\b(scores?|how did i|performance|results?)\b"));

/// Answers a conceptual question ("explain electricity circuits").
pub struct DoubtSolver;

#[async_trait]
impl CommandProcessor for DoubtSolver {
    fn command_type(&self) -> CommandType {
        CommandType::DoubtSolving
    }

    fn can_process(&self, text: &str) -> bool {
        DOUBT.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let mut question = extract::strip(text, &DOUBT);
        if question.is_empty() {
            question = extract::normalize(text);
        }
        let subject = extract::subject_or(text, SubjectTable::Broad, "general");
        debug!(%question, %subject, "doubt");

        Ok(CommandResult::navigate(
            "doubt-solver",
            params(json!({ "question": question, "subject": subject })),
            format!("Let me help you understand {}. I'll look that up for you.", question),
        ))
    }
}

/// Starts a practice quiz.
pub struct QuizStarter;

#[async_trait]
impl CommandProcessor for QuizStarter {
    fn command_type(&self) -> CommandType {
        CommandType::StartQuiz
    }

    fn can_process(&self, text: &str) -> bool {
        QUIZ.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let subject = extract::subject(text, SubjectTable::Broad)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| extract::topic(text, &["on", "about"], "general"));
        let difficulty = extract::difficulty(text);
        let count = extract::count(text, QUIZ_DEFAULT_COUNT);

        Ok(CommandResult::navigate(
            "quiz",
            params(json!({
                "subject": subject,
                "difficulty": difficulty.as_str(),
                "count": count,
            })),
            format!("Starting a {} quiz on {}. Good luck!", difficulty.as_str(), subject),
        ))
    }
}

static REMINDER_TASK: Lazy<Regex> = Lazy::new(|| trigger(r"\b(?:to|about)\s+(.+)$"));
static REMINDER_WHEN: Lazy<Regex> = Lazy::new(|| {
    trigger(r"\b(today|tonight|tomorrow|this week|next week)(?:\s|$)|\bat\s+\d{1,2}(:\d{2})?\s*(am|pm|a\.m\.|p\.m\.)?")
});

const REMINDER_DAYS: [Period; 5] = [
    Period::Today,
    Period::Tonight,
    Period::Tomorrow,
    Period::ThisWeek,
    Period::NextWeek,
];

/// Sets a study reminder ("remind me to revise optics tomorrow at 6 pm").
pub struct ReminderSetter;

#[async_trait]
impl CommandProcessor for ReminderSetter {
    fn command_type(&self) -> CommandType {
        CommandType::SetReminder
    }

    fn can_process(&self, text: &str) -> bool {
        REMINDER.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let task = REMINDER_TASK
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| extract::strip(m.as_str(), &REMINDER_WHEN))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| match extract::subject(text, SubjectTable::Broad) {
                Some(subject) => format!("study {}", subject.as_str()),
                None => "study".to_string(),
            });
        let day = extract::period(text, &REMINDER_DAYS, Period::Tomorrow);
        let time = extract::reminder_time(text);

        let when = if time == "anytime" {
            day.spoken()
        } else {
            format!("{} at {}", day.spoken(), time)
        };

        Ok(CommandResult::navigate(
            "reminders",
            params(json!({ "task": task, "day": day.as_str(), "time": time })),
            format!("Okay, I'll remind you to {} {}.", task, when),
        ))
    }
}

/// Looks up formulas ("find the formula for kinetic energy").
pub struct FormulaFinder;

#[async_trait]
impl CommandProcessor for FormulaFinder {
    fn command_type(&self) -> CommandType {
        CommandType::SearchFormula
    }

    fn can_process(&self, text: &str) -> bool {
        FORMULA.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let mut search = extract::strip(&extract::strip(text, &FORMULA), &FILLER);
        if search.is_empty() {
            search = "general".to_string();
        }
        let subject = extract::subject_or(text, SubjectTable::Broad, "general");

        Ok(CommandResult::navigate(
            "flashcards",
            params(json!({ "search": search, "type": "formula", "subject": subject })),
            format!("Searching for formulas related to {}.", search),
        ))
    }
}

const FEEDBACK_PERIODS: [Period; 5] = [
    Period::Today,
    Period::Yesterday,
    Period::ThisWeek,
    Period::LastWeek,
    Period::ThisMonth,
];

/// Shows the student's own results.
pub struct PerformanceFeedback;

#[async_trait]
impl CommandProcessor for PerformanceFeedback {
    fn command_type(&self) -> CommandType {
        CommandType::PerformanceFeedback
    }

    fn can_process(&self, text: &str) -> bool {
        PERFORMANCE.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let period = extract::period(text, &FEEDBACK_PERIODS, Period::Yesterday);
        let subject = extract::subject_or(text, SubjectTable::Narrow, "all");

        Ok(CommandResult::navigate(
            "performance",
            params(json!({ "period": period.as_str(), "subject": subject })),
            format!(
                "Here's your performance data for {} during {}.",
                subject,
                period.spoken()
            ),
        ))
    }
}

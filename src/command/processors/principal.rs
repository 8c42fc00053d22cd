use super::{params, trigger};
use crate::command::extract::{self, Period, SubjectTable};
use crate::command::processor::CommandProcessor;
use crate::command::types::{CommandResult, CommandType};
use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static TEACHER_PERFORMANCE: Lazy<Regex> =
    Lazy::new(|| trigger(r"\bteachers?\b.*\b(performance|evaluations?)\b|\bevaluations?\b"));
static COMPARISON: Lazy<Regex> = Lazy::new(|| trigger(r"\b(compare|comparison|versus|vs)\b"));
static REPORT: Lazy<Regex> = Lazy::new(|| trigger(r"\b(reports?|average|scores?)\b"));

static COMPARE_BY: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (trigger(r"\bsections?\b"), "section"),
        (trigger(r"\bsubjects?\b"), "subject"),
        (trigger(r"\b(years?|annual)\b"), "year"),
    ]
});

const REPORT_PERIODS: [Period; 4] = [
    Period::ThisWeek,
    Period::LastMonth,
    Period::ThisMonth,
    Period::ThisYear,
];

pub struct TeacherPerformance;

#[async_trait]
impl CommandProcessor for TeacherPerformance {
    fn command_type(&self) -> CommandType {
        CommandType::TeacherPerformance
    }

    fn can_process(&self, text: &str) -> bool {
        TEACHER_PERFORMANCE.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let department = extract::subject_or(text, SubjectTable::Narrow, "all");

        Ok(CommandResult::navigate(
            "teacher-performance",
            params(json!({ "department": department })),
            format!(
                "Showing teacher performance statistics for the {} department.",
                department
            ),
        ))
    }
}

/// Compares results across batches (default), sections, subjects or years.
pub struct ResultComparison;

#[async_trait]
impl CommandProcessor for ResultComparison {
    fn command_type(&self) -> CommandType {
        CommandType::ResultComparison
    }

    fn can_process(&self, text: &str) -> bool {
        COMPARISON.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let exam_type = extract::exam_type(text, "all");
        let period = extract::period(text, &REPORT_PERIODS, Period::ThisYear);
        let compare_by = COMPARE_BY
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, by)| *by)
            .unwrap_or("batch");

        Ok(CommandResult::navigate(
            "result-comparison",
            params(json!({
                "examType": exam_type,
                "period": period.as_str(),
                "compareBy": compare_by,
            })),
            format!(
                "Comparing {} results by {} for {}.",
                exam_type,
                compare_by,
                period.spoken()
            ),
        ))
    }
}

pub struct InstitutionalReport;

#[async_trait]
impl CommandProcessor for InstitutionalReport {
    fn command_type(&self) -> CommandType {
        CommandType::InstitutionalReport
    }

    fn can_process(&self, text: &str) -> bool {
        REPORT.is_match(text)
    }

    async fn process(&self, text: &str, _model_id: &str) -> Result<CommandResult> {
        let period = extract::period(text, &REPORT_PERIODS, Period::ThisMonth);
        let exam_type = extract::exam_type(text, "all");

        Ok(CommandResult::navigate(
            "institutional-report",
            params(json!({ "period": period.as_str(), "examType": exam_type })),
            format!(
                "Generating the institutional report for {} {}.",
                exam_type,
                period.spoken()
            ),
        ))
    }
}

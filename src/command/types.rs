use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Ordered key/value parameters handed to the navigation target.
pub type Params = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Principal,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Student, UserRole::Teacher, UserRole::Principal];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Principal => "principal",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "teacher" => Ok(UserRole::Teacher),
            "principal" => Ok(UserRole::Principal),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Closed set of intents. Never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    // Student
    DoubtSolving,
    StartQuiz,
    SetReminder,
    SearchFormula,
    PerformanceFeedback,

    // Teacher
    GenerateTest,
    ClassAnalytics,
    LessonPlan,
    RevisionSheet,
    Flashcards,

    // Principal
    InstitutionalReport,
    TeacherPerformance,
    ResultComparison,

    Help,
    Unknown,
}

impl CommandType {
    pub const ALL: [CommandType; 15] = [
        CommandType::DoubtSolving,
        CommandType::StartQuiz,
        CommandType::SetReminder,
        CommandType::SearchFormula,
        CommandType::PerformanceFeedback,
        CommandType::GenerateTest,
        CommandType::ClassAnalytics,
        CommandType::LessonPlan,
        CommandType::RevisionSheet,
        CommandType::Flashcards,
        CommandType::InstitutionalReport,
        CommandType::TeacherPerformance,
        CommandType::ResultComparison,
        CommandType::Help,
        CommandType::Unknown,
    ];

    /// Wire name, also the token the classification prompt asks the model for.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::DoubtSolving => "doubt_solving",
            CommandType::StartQuiz => "start_quiz",
            CommandType::SetReminder => "set_reminder",
            CommandType::SearchFormula => "search_formula",
            CommandType::PerformanceFeedback => "performance_feedback",
            CommandType::GenerateTest => "generate_test",
            CommandType::ClassAnalytics => "class_analytics",
            CommandType::LessonPlan => "lesson_plan",
            CommandType::RevisionSheet => "revision_sheet",
            CommandType::Flashcards => "flashcards",
            CommandType::InstitutionalReport => "institutional_report",
            CommandType::TeacherPerformance => "teacher_performance",
            CommandType::ResultComparison => "result_comparison",
            CommandType::Help => "help",
            CommandType::Unknown => "unknown",
        }
    }

    /// Role that owns this intent. `None` for the role-agnostic values.
    pub fn role(&self) -> Option<UserRole> {
        match self {
            CommandType::DoubtSolving
            | CommandType::StartQuiz
            | CommandType::SetReminder
            | CommandType::SearchFormula
            | CommandType::PerformanceFeedback => Some(UserRole::Student),
            CommandType::GenerateTest
            | CommandType::ClassAnalytics
            | CommandType::LessonPlan
            | CommandType::RevisionSheet
            | CommandType::Flashcards => Some(UserRole::Teacher),
            CommandType::InstitutionalReport
            | CommandType::TeacherPerformance
            | CommandType::ResultComparison => Some(UserRole::Principal),
            CommandType::Help | CommandType::Unknown => None,
        }
    }

    /// One-line gloss used in the classification menu.
    pub fn describe(&self) -> &'static str {
        match self {
            CommandType::DoubtSolving => "answer an educational doubt or question",
            CommandType::StartQuiz => "start a practice quiz",
            CommandType::SetReminder => "set a study reminder",
            CommandType::SearchFormula => "look up a formula or equation",
            CommandType::PerformanceFeedback => "show the student's own scores and results",
            CommandType::GenerateTest => "generate a test or question paper",
            CommandType::ClassAnalytics => "show class or section analytics",
            CommandType::LessonPlan => "create a lesson plan",
            CommandType::RevisionSheet => "create a revision or formula sheet",
            CommandType::Flashcards => "generate flashcards",
            CommandType::InstitutionalReport => "generate an institution-wide report",
            CommandType::TeacherPerformance => "show teacher performance",
            CommandType::ResultComparison => "compare exam results",
            CommandType::Help => "explain what the assistant can do",
            CommandType::Unknown => "none of the above",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        CommandType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("unknown command type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Navigate,
    Display,
    Dialog,
    Download,
    Error,
}

/// The engine's only output.
///
/// `response` is always something the caller can show the user, and an
/// `Error` result never carries a `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandResult {
    pub fn navigate(target: impl Into<String>, params: Params, response: impl Into<String>) -> Self {
        Self {
            action: Action::Navigate,
            target: Some(target.into()),
            params: Some(params),
            response: response.into(),
            data: None,
        }
    }

    pub fn dialog(response: impl Into<String>) -> Self {
        Self {
            action: Action::Dialog,
            target: None,
            params: None,
            response: response.into(),
            data: None,
        }
    }

    pub fn error(response: impl Into<String>) -> Self {
        Self {
            action: Action::Error,
            target: None,
            params: None,
            response: response.into(),
            data: None,
        }
    }

    /// Look up a string parameter.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.as_ref()?.get(key)?.as_str()
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.as_ref()?.get(key)?.as_u64()
    }

    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.params.as_ref()?.get(key)?.as_bool()
    }

    pub fn is_well_formed(&self) -> bool {
        let has_response = !self.response.trim().is_empty();
        let error_without_target = self.action != Action::Error || self.target.is_none();
        has_response && error_without_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_type_wire_names_round_trip() {
        for t in CommandType::ALL {
            assert_eq!(t.as_str().parse::<CommandType>().unwrap(), t);
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_every_role_owns_intents() {
        for role in UserRole::ALL {
            assert!(CommandType::ALL.iter().any(|t| t.role() == Some(role)));
        }
        assert_eq!(CommandType::Help.role(), None);
        assert_eq!(CommandType::Unknown.role(), None);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(" Teacher ".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert!("janitor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_result_serialization_omits_absent_fields() {
        let result = CommandResult::dialog("Hello");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({ "action": "dialog", "response": "Hello" }));
    }

    #[test]
    fn test_error_result_has_no_target() {
        let result = CommandResult::error("Sorry");
        assert!(result.target.is_none());
        assert!(result.is_well_formed());
    }

    #[test]
    fn test_empty_response_is_not_well_formed() {
        assert!(!CommandResult::dialog("   ").is_well_formed());
    }

    #[test]
    fn test_param_accessors() {
        let mut params = Params::new();
        params.insert("count".into(), json!(15));
        params.insert("subject".into(), json!("calculus"));
        params.insert("includeFormulas".into(), json!(true));
        let result = CommandResult::navigate("test-creator", params, "ok");
        assert_eq!(result.param_u64("count"), Some(15));
        assert_eq!(result.param_str("subject"), Some("calculus"));
        assert_eq!(result.param_bool("includeFormulas"), Some(true));
        assert_eq!(result.param_str("missing"), None);
    }
}

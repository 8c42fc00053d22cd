//! Ordered processor registries
//!
//! Order matters: the classifier stops at the first predicate that matches,
//! so an utterance that satisfies two predicates goes to whichever sits
//! earlier. Specific processors are listed ahead of broad ones.

use crate::command::processor::SharedProcessor;
use crate::command::processors::*;
use crate::command::types::{CommandType, UserRole};
use std::sync::Arc;

/// Processors for one role (or the role-agnostic set), in evaluation order.
pub struct RoleProcessorRegistry {
    role: Option<UserRole>,
    processors: Vec<SharedProcessor>,
}

impl RoleProcessorRegistry {
    pub fn new(role: Option<UserRole>, processors: Vec<SharedProcessor>) -> Self {
        Self { role, processors }
    }

    /// doubt_solving, start_quiz, set_reminder, search_formula, performance_feedback
    pub fn student() -> Self {
        Self::new(
            Some(UserRole::Student),
            vec![
                Arc::new(DoubtSolver) as SharedProcessor,
                Arc::new(QuizStarter) as SharedProcessor,
                Arc::new(ReminderSetter) as SharedProcessor,
                Arc::new(FormulaFinder) as SharedProcessor,
                Arc::new(PerformanceFeedback) as SharedProcessor,
            ],
        )
    }

    /// lesson_plan, flashcards, revision_sheet, generate_test, class_analytics
    pub fn teacher() -> Self {
        Self::new(
            Some(UserRole::Teacher),
            vec![
                Arc::new(LessonPlanner) as SharedProcessor,
                Arc::new(FlashcardsGenerator) as SharedProcessor,
                Arc::new(RevisionSheetGenerator) as SharedProcessor,
                Arc::new(TestGenerator) as SharedProcessor,
                Arc::new(ClassAnalytics) as SharedProcessor,
            ],
        )
    }

    /// teacher_performance, result_comparison, institutional_report
    pub fn principal() -> Self {
        Self::new(
            Some(UserRole::Principal),
            vec![
                Arc::new(TeacherPerformance) as SharedProcessor,
                Arc::new(ResultComparison) as SharedProcessor,
                Arc::new(InstitutionalReport) as SharedProcessor,
            ],
        )
    }

    pub fn common() -> Self {
        Self::new(None, vec![Arc::new(HelpProcessor) as SharedProcessor])
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    /// First processor whose predicate accepts `text`.
    pub fn find_match(&self, text: &str) -> Option<&SharedProcessor> {
        self.processors.iter().find(|p| p.can_process(text))
    }

    pub fn get(&self, command_type: CommandType) -> Option<&SharedProcessor> {
        self.processors.iter().find(|p| p.command_type() == command_type)
    }

    pub fn contains(&self, command_type: CommandType) -> bool {
        self.get(command_type).is_some()
    }

    pub fn command_types(&self) -> Vec<CommandType> {
        self.processors.iter().map(|p| p.command_type()).collect()
    }
}

/// Every registry the engine knows about. Built once, read-only afterwards.
pub struct ProcessorCatalog {
    student: RoleProcessorRegistry,
    teacher: RoleProcessorRegistry,
    principal: RoleProcessorRegistry,
    common: RoleProcessorRegistry,
}

impl ProcessorCatalog {
    pub fn new(
        student: RoleProcessorRegistry,
        teacher: RoleProcessorRegistry,
        principal: RoleProcessorRegistry,
        common: RoleProcessorRegistry,
    ) -> Self {
        Self {
            student,
            teacher,
            principal,
            common,
        }
    }

    pub fn for_role(&self, role: UserRole) -> &RoleProcessorRegistry {
        match role {
            UserRole::Student => &self.student,
            UserRole::Teacher => &self.teacher,
            UserRole::Principal => &self.principal,
        }
    }

    pub fn common(&self) -> &RoleProcessorRegistry {
        &self.common
    }

    /// Processor for `command_type` if the caller's role (or the common
    /// registry) owns it.
    pub fn resolve(&self, role: UserRole, command_type: CommandType) -> Option<&SharedProcessor> {
        self.common
            .get(command_type)
            .or_else(|| self.for_role(role).get(command_type))
    }
}

impl Default for ProcessorCatalog {
    fn default() -> Self {
        Self::new(
            RoleProcessorRegistry::student(),
            RoleProcessorRegistry::teacher(),
            RoleProcessorRegistry::principal(),
            RoleProcessorRegistry::common(),
        )
    }
}

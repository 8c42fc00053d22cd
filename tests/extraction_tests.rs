use proptest::prelude::*;
use voice_router::command::extract::{self, Difficulty, Period, Subject, SubjectTable};

#[test]
fn test_subject_tables() {
    assert_eq!(extract::subject("explain electricity circuits", SubjectTable::Broad), Some(Subject::Physics));
    assert_eq!(extract::subject("explain electricity circuits", SubjectTable::Narrow), None);
    assert_eq!(extract::subject_or("how are my scores", SubjectTable::Narrow, "all"), "all");
}

#[test]
fn test_hard_beats_easy() {
    assert_eq!(extract::difficulty("an easy start then hard questions"), Difficulty::Hard);
    assert_eq!(extract::difficulty("nothing special"), Difficulty::Medium);
}

#[test]
fn test_count_defaults_on_overflow() {
    assert_eq!(extract::count("make 99999999999999 questions", 10), 10);
    assert_eq!(extract::count("make 7 questions", 10), 7);
}

#[test]
fn test_period_respects_accepted_set() {
    let accepted = [Period::ThisWeek, Period::ThisMonth];
    assert_eq!(extract::period("results from yesterday", &accepted, Period::ThisMonth), Period::ThisMonth);
    assert_eq!(extract::period("results this week", &accepted, Period::ThisMonth), Period::ThisWeek);
}

#[test]
fn test_reminder_time_formats() {
    assert_eq!(extract::reminder_time("remind me at 5 PM"), "5:00 pm");
    assert_eq!(extract::reminder_time("remind me at 17:30"), "17:30");
    assert_eq!(extract::reminder_time("remind me at 99"), "anytime");
    assert_eq!(extract::reminder_time("remind me later"), "anytime");
}

#[test]
fn test_topic_after_chapter() {
    assert_eq!(extract::topic("make a test from chapter thermodynamics", &["from"], "general"), "thermodynamics");
    assert_eq!(extract::topic("make a test from chapter 4", &["from"], "general"), "general");
}

proptest! {
    #[test]
    fn extraction_never_panics(text in ".{0,200}") {
        let _ = extract::subject(&text, SubjectTable::Broad);
        let _ = extract::difficulty(&text);
        let _ = extract::count(&text, 10);
        let _ = extract::period(&text, &[Period::Today, Period::ThisWeek], Period::Today);
        let _ = extract::section(&text, "A");
        let _ = extract::exam_type(&text, "all");
        let _ = extract::question_type(&text);
        let _ = extract::reminder_time(&text);
        let _ = extract::normalize(&text);
    }

    #[test]
    fn topic_is_never_empty(text in "[a-z0-9 ]{0,80}") {
        let topic = extract::topic(&text, &["on", "about"], "general");
        prop_assert!(!topic.is_empty());
    }

    #[test]
    fn section_is_uppercase(letter in "[a-z]") {
        let section = extract::section(&format!("show section {}", letter), "A");
        prop_assert_eq!(section, letter.to_ascii_uppercase());
    }

    #[test]
    fn count_is_default_without_digits(text in "[a-z ]{0,80}") {
        prop_assert_eq!(extract::count(&text, 10), 10);
    }
}

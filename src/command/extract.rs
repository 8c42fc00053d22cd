//! Parameter extraction from free text
//!
//! Every rule here is independent: one parameter kind never consumes text
//! another kind needs. Every function returns a value, falling back to the
//! default it was given (or a documented one) when nothing matches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Physics,
    Chemistry,
    Mathematics,
    Biology,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Mathematics => "mathematics",
            Subject::Biology => "biology",
        }
    }
}

/// Which subject table to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectTable {
    /// Subject names plus topic words ("electricity" is physics).
    Broad,
    /// Subject names only.
    Narrow,
}

static BROAD_SUBJECTS: Lazy<Vec<(Regex, Subject)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(physics|mechanics|waves?|optics|electricity|magnetism)\b").expect("valid regex"),
            Subject::Physics,
        ),
        (
            Regex::new(r"(?i)\b(chemistry|organic|inorganic|elements?|compounds?|reactions?)\b").expect("valid regex"),
            Subject::Chemistry,
        ),
        (
            Regex::new(r"(?i)\b(maths?|mathematics|algebra|calculus|geometry|trigonometry)\b").expect("valid regex"),
            Subject::Mathematics,
        ),
        (
            Regex::new(r"(?i)\b(biology|cells?|organisms?|anatomy|physiology)\b").expect("valid regex"),
            Subject::Biology,
        ),
    ]
});

static NARROW_SUBJECTS: Lazy<Vec<(Regex, Subject)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\bphysics\b").expect("valid regex"), Subject::Physics),
        (Regex::new(r"(?i)\bchemistry\b").expect("valid regex"), Subject::Chemistry),
        (Regex::new(r"(?i)\bmath(s|ematics)?\b").expect("valid regex"), Subject::Mathematics),
        (Regex::new(r"(?i)\bbiology\b").expect("valid regex"), Subject::Biology),
    ]
});

/// First subject in table order whose pattern matches.
pub fn subject(text: &str, table: SubjectTable) -> Option<Subject> {
    let rows = match table {
        SubjectTable::Broad => &*BROAD_SUBJECTS,
        SubjectTable::Narrow => &*NARROW_SUBJECTS,
    };
    rows.iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, subject)| *subject)
}

pub fn subject_or(text: &str, table: SubjectTable, default: &str) -> String {
    subject(text, table)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

static HARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(hard|difficult|challenging)\b").expect("valid regex"));
static EASY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(easy|simple|basic)\b").expect("valid regex"));

/// `hard` beats `easy` when both are present.
pub fn difficulty(text: &str) -> Difficulty {
    if HARD.is_match(text) {
        Difficulty::Hard
    } else if EASY.is_match(text) {
        Difficulty::Easy
    } else {
        Difficulty::Medium
    }
}

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// First integer literal in the text. Zero counts as absent.
pub fn count(text: &str, default: u32) -> u32 {
    INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Tonight,
    Tomorrow,
    Yesterday,
    ThisWeek,
    NextWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Tonight => "tonight",
            Period::Tomorrow => "tomorrow",
            Period::Yesterday => "yesterday",
            Period::ThisWeek => "this_week",
            Period::NextWeek => "next_week",
            Period::LastWeek => "last_week",
            Period::ThisMonth => "this_month",
            Period::LastMonth => "last_month",
            Period::ThisYear => "this_year",
        }
    }

    /// Human form for responses ("this week").
    pub fn spoken(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static PERIOD_ANCHORS: Lazy<Vec<(Period, Regex)>> = Lazy::new(|| {
    [
        (Period::Today, r"\btoday\b"),
        (Period::Tonight, r"\btonight\b"),
        (Period::Tomorrow, r"\btomorrow\b"),
        (Period::Yesterday, r"\byesterday\b"),
        (Period::ThisWeek, r"\bthis week\b"),
        (Period::NextWeek, r"\bnext week\b"),
        (Period::LastWeek, r"\blast week\b"),
        (Period::ThisMonth, r"\bthis month\b"),
        (Period::LastMonth, r"\blast month\b"),
        (Period::ThisYear, r"\bthis year\b"),
    ]
    .into_iter()
    .map(|(p, re)| (p, Regex::new(&format!("(?i){}", re)).expect("valid regex")))
    .collect()
});

/// First period from `accepted` (in slice order) whose anchor phrase appears.
pub fn period(text: &str, accepted: &[Period], default: Period) -> Period {
    accepted
        .iter()
        .copied()
        .find(|p| {
            PERIOD_ANCHORS
                .iter()
                .any(|(anchor, pattern)| anchor == p && pattern.is_match(text))
        })
        .unwrap_or(default)
}

static SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsection\s+([a-z0-9]+)\b").expect("valid regex"));

/// `section b` → `B`.
pub fn section(text: &str, default: &str) -> String {
    SECTION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
        .unwrap_or_else(|| default.to_string())
}

static EXAMS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\bjee\b").expect("valid regex"), "JEE"),
        (Regex::new(r"(?i)\bneet\b").expect("valid regex"), "NEET"),
        (Regex::new(r"(?i)\bcet\b").expect("valid regex"), "CET"),
    ]
});

pub fn exam_type(text: &str, default: &str) -> String {
    EXAMS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, exam)| exam.to_string())
        .unwrap_or_else(|| default.to_string())
}

static QUESTION_TYPES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\b(mcqs?|multiple choice)\b").expect("valid regex"), "mcq"),
        (Regex::new(r"(?i)\bshort answers?\b").expect("valid regex"), "short-answer"),
        (Regex::new(r"(?i)\blong answers?\b").expect("valid regex"), "long-answer"),
    ]
});

/// Default `mixed`.
pub fn question_type(text: &str) -> &'static str {
    QUESTION_TYPES
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, kind)| *kind)
        .unwrap_or("mixed")
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "for", "with", "in", "at", "of", "and", "to", "on", "by", "this", "next", "last",
    "section", "class", "please", "questions", "question", "today", "tomorrow",
];

const MAX_TOPIC_WORDS: usize = 2;

const TOPIC_LEAD_INS: &[&str] = &["chapter", "a", "an", "the"];

/// Up to two words following the first anchor word (`on calculus`, `for
/// organic chemistry`). Leading `chapter` and articles are skipped, so
/// `from chapter X` and `on the french revolution` both keep their topic.
pub fn topic(text: &str, anchors: &[&str], default: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|w| !w.is_empty())
        .collect();

    let Some(anchor_at) = words.iter().position(|w| anchors.contains(w)) else {
        return default.to_string();
    };

    let mut rest = &words[anchor_at + 1..];
    while let Some((first, tail)) = rest.split_first() {
        if !TOPIC_LEAD_INS.contains(first) {
            break;
        }
        rest = tail;
    }

    let picked: Vec<&str> = rest
        .iter()
        .take_while(|w| !STOP_WORDS.contains(w) && !w.chars().any(|c| c.is_ascii_digit()))
        .take(MAX_TOPIC_WORDS)
        .copied()
        .collect();

    if picked.is_empty() {
        default.to_string()
    } else {
        picked.join(" ")
    }
}

static REMINDER_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bat\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?").expect("valid regex")
});

/// `at 5 pm` → `5:00 pm`, `at 17:30` → `17:30`. Default `anytime`.
pub fn reminder_time(text: &str) -> String {
    let Some(caps) = REMINDER_TIME.captures(text) else {
        return "anytime".to_string();
    };
    let hour: u32 = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
        Some(h) if h <= 23 => h,
        _ => return "anytime".to_string(),
    };
    let minute = caps.get(2).map(|m| m.as_str()).unwrap_or("00");
    match caps.get(3) {
        Some(m) => format!("{}:{} {}", hour, minute, m.as_str().replace('.', "").to_lowercase()),
        None => format!("{}:{}", hour, minute),
    }
}

/// Remove every match of `pattern` and collapse the remaining whitespace.
pub fn strip(text: &str, pattern: &Regex) -> String {
    normalize(&pattern.replace_all(text, " "))
}

/// Lower-case and collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

use crate::error::{Result, ScratchError};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const LESSONS_HEADER: &str = "# Lessons\n\n";

/// A reusable fact picked up while working: a fixed mistake, a tool quirk,
/// a library version that matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub recorded_on: Option<NaiveDate>,
    pub text: String,
}

impl Lesson {
    fn to_line(&self) -> String {
        match self.recorded_on {
            Some(d) => format!("- ({}) {}\n", d.format("%Y-%m-%d"), self.text),
            None => format!("- {}\n", self.text),
        }
    }
}

static LESSON_RE: OnceLock<Regex> = OnceLock::new();

fn lesson_re() -> &'static Regex {
    LESSON_RE.get_or_init(|| Regex::new(r"^-\s+(?:\((\d{4}-\d{2}-\d{2})\)\s+)?(.+)$").unwrap())
}

/// Parse every `- ` bullet in the lessons document, in file order.
pub fn parse(text: &str) -> Vec<Lesson> {
    text.lines()
        .filter_map(|line| {
            let caps = lesson_re().captures(line.trim())?;
            let recorded_on = caps
                .get(1)
                .and_then(|d| NaiveDate::parse_from_str(d.as_str(), "%Y-%m-%d").ok());
            Some(Lesson {
                recorded_on,
                text: caps[2].trim().to_string(),
            })
        })
        .collect()
}

pub fn list(path: &Path) -> Result<Vec<Lesson>> {
    let text = crate::io::read_or_empty(path)?;
    Ok(parse(&text))
}

/// Append a lesson stamped with today's date. Writes the header first when
/// the file is new.
pub fn add(path: &Path, text: &str) -> Result<Lesson> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Err(ScratchError::EmptyLesson);
    }
    let lesson = Lesson {
        recorded_on: Some(Utc::now().date_naive()),
        text,
    };
    crate::io::write_if_missing(path, LESSONS_HEADER.as_bytes())?;
    let existing = crate::io::read_or_empty(path)?;
    let mut line = lesson.to_line();
    if !existing.is_empty() && !existing.ends_with('\n') {
        line.insert(0, '\n');
    }
    crate::io::append_text(path, &line)?;
    Ok(lesson)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

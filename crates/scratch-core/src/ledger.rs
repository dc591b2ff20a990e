//! The scratchpad task ledger.
//!
//! In memory the ledger is an ordered list of [`Step`]s under an optional
//! task description. It becomes text only at the edges: [`Ledger::render`]
//! produces the checkbox document and [`Ledger::parse`] reads it back.
//!
//! ```text
//! # Scratchpad
//!
//! ## Current Task
//! Task: Port the importer to the new schema
//!
//! Started: 2026-10-18T09:12:44+00:00
//!
//! ## Steps
//! [X] read the old importer
//! [ ] write the migration
//!
//! ## Notes
//! - old importer silently drops NULL rows
//! ```

use crate::error::{Result, ScratchError};
use crate::types::StepStatus;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

const TITLE: &str = "# Scratchpad";
const TASK_HEADING: &str = "## Current Task";
const STEPS_HEADING: &str = "## Steps";
const NOTES_HEADING: &str = "## Notes";
const NO_TASK: &str = "(none)";
const TASK_PREFIX: &str = "Task: ";
const NO_STEPS: &str = "(no steps)";
const STARTED_PREFIX: &str = "Started: ";

pub const MIRROR_BEGIN: &str = "<!-- scratchpad:begin -->";
pub const MIRROR_END: &str = "<!-- scratchpad:end -->";

// ---------------------------------------------------------------------------
// Step / StepRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub text: String,
    pub status: StepStatus,
}

impl Step {
    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: StepStatus::Pending,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == StepStatus::Done
    }
}

/// How a caller names a step: by 1-based position (`3` or `S3`) or by its
/// exact text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRef {
    Position(usize),
    Text(String),
}

impl std::str::FromStr for StepRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix('S')
            .or_else(|| s.strip_prefix('s'))
            .unwrap_or(s);
        match digits.parse::<usize>() {
            Ok(n) => Ok(StepRef::Position(n)),
            Err(_) => Ok(StepRef::Text(s.to_string())),
        }
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepRef::Position(n) => write!(f, "S{n}"),
            StepRef::Text(t) => f.write_str(t),
        }
    }
}

/// Stable id of the step at `index` (0-based) as shown to users.
pub fn step_id(index: usize) -> String {
    format!("S{}", index + 1)
}

/// Result of [`Ledger::mark_done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    AlreadyDone,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub task: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new task, superseding whatever the ledger held before.
    ///
    /// Seed steps are validated up front so a bad seed leaves the previous
    /// ledger untouched.
    pub fn start_task<I, S>(&mut self, description: &str, seed_steps: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let steps = seed_steps
            .into_iter()
            .map(|s| normalize(s.as_ref()).map(Step::pending))
            .collect::<Result<Vec<_>>>()?;
        let description = collapse_whitespace(description);

        *self = Ledger {
            task: (!description.is_empty()).then_some(description),
            started_at: Some(Utc::now()),
            steps,
            notes: Vec::new(),
        };
        Ok(())
    }

    /// Append a pending step. Returns its 1-based position.
    pub fn add_step(&mut self, text: &str) -> Result<usize> {
        let text = normalize(text)?;
        self.steps.push(Step::pending(text));
        Ok(self.steps.len())
    }

    /// Flip a step to done. Unknown references fail without touching the
    /// ledger; marking a finished step again is a no-op.
    pub fn mark_done(&mut self, step: &StepRef) -> Result<MarkOutcome> {
        let index = self.find(step)?;
        let target = &mut self.steps[index];
        if target.is_done() {
            return Ok(MarkOutcome::AlreadyDone);
        }
        target.status = StepStatus::Done;
        Ok(MarkOutcome::Marked)
    }

    pub fn note(&mut self, text: &str) -> Result<()> {
        let text = normalize(text)?;
        self.notes.push(text);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Ledger::default();
    }

    pub fn is_empty(&self) -> bool {
        self.task.is_none() && self.steps.is_empty() && self.notes.is_empty()
    }

    /// Resolve a reference to a 0-based index.
    ///
    /// A number past the end of the list is retried as step text, so a step
    /// literally named `2024` stays reachable.
    pub fn find(&self, step: &StepRef) -> Result<usize> {
        let by_text = |text: &str| {
            let wanted = collapse_whitespace(text);
            self.steps.iter().position(|s| s.text == wanted)
        };
        let found = match step {
            StepRef::Position(n) if *n >= 1 && *n <= self.steps.len() => Some(n - 1),
            StepRef::Position(n) => by_text(&n.to_string()),
            StepRef::Text(text) => by_text(text),
        };
        found.ok_or_else(|| ScratchError::StepNotFound(step.to_string()))
    }

    /// First pending step in planned order, with its 0-based index.
    pub fn next_pending(&self) -> Option<(usize, &Step)> {
        self.steps.iter().enumerate().find(|(_, s)| !s.is_done())
    }

    /// "2/5 steps done"
    pub fn summary(&self) -> String {
        let done = self.steps.iter().filter(|s| s.is_done()).count();
        format!("{done}/{} steps done", self.steps.len())
    }

    /// Full scratchpad document. Nothing is formatted until the view is
    /// displayed.
    pub fn render(&self) -> Render<'_> {
        Render {
            ledger: self,
            full: true,
        }
    }

    /// Task line plus checklist only, for mirroring into a rules file.
    pub fn render_compact(&self) -> Render<'_> {
        Render {
            ledger: self,
            full: false,
        }
    }

    // -----------------------------------------------------------------------
    // Text boundary
    // -----------------------------------------------------------------------

    /// Parse a scratchpad document. Unrecognized lines are ignored, so a
    /// hand-edited file degrades gracefully instead of failing.
    pub fn parse(text: &str) -> Ledger {
        #[derive(Clone, Copy)]
        enum Section {
            Preamble,
            Task,
            Steps,
            Notes,
        }

        let mut ledger = Ledger::default();
        let mut section = Section::Preamble;
        let mut task_lines: Vec<&str> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("## ") {
                section = match trimmed {
                    TASK_HEADING => Section::Task,
                    STEPS_HEADING => Section::Steps,
                    NOTES_HEADING => Section::Notes,
                    _ => Section::Preamble,
                };
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
            match section {
                Section::Preamble => {}
                Section::Task => {
                    // Prefixed lines are always description text, whatever
                    // they look like.
                    if let Some(desc) = trimmed.strip_prefix(TASK_PREFIX) {
                        task_lines.push(desc);
                    } else if let Some(ts) = trimmed.strip_prefix(STARTED_PREFIX) {
                        ledger.started_at = DateTime::parse_from_rfc3339(ts.trim())
                            .ok()
                            .map(|t| t.with_timezone(&Utc));
                    } else if trimmed != NO_TASK {
                        task_lines.push(trimmed);
                    }
                }
                Section::Steps => {
                    if let Some(caps) = step_re().captures(trimmed) {
                        let status = StepStatus::from_marker(&caps[1]).unwrap_or(StepStatus::Pending);
                        let text = collapse_whitespace(&caps[2]);
                        if !text.is_empty() {
                            ledger.steps.push(Step { text, status });
                        }
                    }
                }
                Section::Notes => {
                    if let Some(note) = trimmed.strip_prefix("- ") {
                        let note = collapse_whitespace(note);
                        if !note.is_empty() {
                            ledger.notes.push(note);
                        }
                    }
                }
            }
        }

        if !task_lines.is_empty() {
            ledger.task = Some(task_lines.join(" "));
        }
        ledger
    }

    /// Load from `path`. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        let text = crate::io::read_or_empty(path)?;
        Ok(Self::parse(&text))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.render().to_string();
        crate::io::atomic_write(path, text.as_bytes())
    }

    /// Mirror the compact view into `rules` between the scratchpad markers.
    pub fn mirror_into(&self, rules: &Path) -> Result<crate::io::BlockUpdate> {
        let body = self.render_compact().to_string();
        crate::io::upsert_marked_block(rules, MIRROR_BEGIN, MIRROR_END, &body)
    }
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

/// Borrowed, lazily formatted view of a [`Ledger`].
pub struct Render<'a> {
    ledger: &'a Ledger,
    full: bool,
}

impl fmt::Display for Render<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = self.ledger;
        writeln!(f, "{TITLE}")?;
        writeln!(f)?;
        writeln!(f, "{TASK_HEADING}")?;
        match l.task.as_deref() {
            Some(task) => writeln!(f, "{TASK_PREFIX}{task}")?,
            None => writeln!(f, "{NO_TASK}")?,
        }
        if self.full {
            if let Some(ts) = l.started_at {
                writeln!(f)?;
                writeln!(f, "{STARTED_PREFIX}{}", ts.to_rfc3339())?;
            }
        }
        writeln!(f)?;
        writeln!(f, "{STEPS_HEADING}")?;
        if l.steps.is_empty() {
            writeln!(f, "{NO_STEPS}")?;
        }
        for step in &l.steps {
            writeln!(f, "{} {}", step.status.marker(), step.text)?;
        }
        if self.full && !l.notes.is_empty() {
            writeln!(f)?;
            writeln!(f, "{NOTES_HEADING}")?;
            for note in &l.notes {
                writeln!(f, "- {note}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

static STEP_RE: OnceLock<Regex> = OnceLock::new();

fn step_re() -> &'static Regex {
    STEP_RE.get_or_init(|| Regex::new(r"^(\[[ xX]\])\s+(.+)$").unwrap())
}

/// The document is line oriented, so step and note text is kept on one line.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize(text: &str) -> Result<String> {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return Err(ScratchError::EmptyStep);
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn texts(ledger: &Ledger) -> Vec<&str> {
        ledger.steps.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn render_preserves_insertion_order() {
        let mut ledger = Ledger::new();
        ledger.start_task("ship it", Vec::<String>::new()).unwrap();
        for t in ["one", "two", "three", "four"] {
            ledger.add_step(t).unwrap();
        }
        let out = ledger.render().to_string();
        let one = out.find("[ ] one").unwrap();
        let two = out.find("[ ] two").unwrap();
        let three = out.find("[ ] three").unwrap();
        let four = out.find("[ ] four").unwrap();
        assert!(one < two && two < three && three < four);
    }

    #[test]
    fn mark_done_is_idempotent() {
        let mut ledger = Ledger::new();
        ledger.add_step("write tests").unwrap();

        assert_eq!(ledger.mark_done(&StepRef::Position(1)).unwrap(), MarkOutcome::Marked);
        let once = ledger.clone();
        assert_eq!(
            ledger.mark_done(&StepRef::Position(1)).unwrap(),
            MarkOutcome::AlreadyDone
        );
        assert_eq!(ledger, once);
        assert_eq!(ledger.steps[0].status, StepStatus::Done);
    }

    #[test]
    fn mark_done_unknown_ref_fails_without_mutation() {
        let mut ledger = Ledger::new();
        ledger.add_step("a").unwrap();
        ledger.add_step("b").unwrap();
        ledger.mark_done(&StepRef::Position(2)).unwrap();
        let before = ledger.clone();

        for bad in [
            StepRef::Position(0),
            StepRef::Position(3),
            StepRef::Text("c".into()),
        ] {
            let err = ledger.mark_done(&bad).unwrap_err();
            assert!(matches!(err, ScratchError::StepNotFound(_)));
        }
        assert_eq!(ledger, before);
    }

    #[test]
    fn mark_done_by_text() {
        let mut ledger = Ledger::new();
        ledger.add_step("read   the code").unwrap();
        ledger
            .mark_done(&StepRef::Text("read the code".into()))
            .unwrap();
        assert!(ledger.steps[0].is_done());
    }

    #[test]
    fn start_task_discards_previous_steps() {
        let mut ledger = Ledger::new();
        ledger.start_task("old", ["stale one", "stale two"]).unwrap();
        ledger.note("old note").unwrap();

        ledger.start_task("X", Vec::<String>::new()).unwrap();
        ledger.add_step("fresh").unwrap();

        let out = ledger.render().to_string();
        assert!(out.contains("[ ] fresh"));
        assert!(!out.contains("stale"));
        assert!(!out.contains("old note"));
        assert_eq!(ledger.task.as_deref(), Some("X"));
    }

    #[test]
    fn bad_seed_leaves_ledger_untouched() {
        let mut ledger = Ledger::new();
        ledger.start_task("keep", ["kept"]).unwrap();
        let before = ledger.clone();
        assert!(matches!(
            ledger.start_task("new", ["ok", "   "]),
            Err(ScratchError::EmptyStep)
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn add_step_rejects_blank_text() {
        let mut ledger = Ledger::new();
        assert!(matches!(ledger.add_step(" \n\t"), Err(ScratchError::EmptyStep)));
        assert!(ledger.steps.is_empty());
    }

    #[test]
    fn numeric_step_text_is_reachable() {
        let mut ledger = Ledger::new();
        ledger.start_task("plan", ["2024", "ship"]).unwrap();

        let step: StepRef = "2024".parse().unwrap();
        assert_eq!(ledger.mark_done(&step).unwrap(), MarkOutcome::Marked);
        assert!(ledger.steps[0].is_done());
        assert!(!ledger.steps[1].is_done());

        // In-range positions still win over text.
        ledger.mark_done(&"2".parse().unwrap()).unwrap();
        assert!(ledger.steps[1].is_done());
        assert!(matches!(
            ledger.find(&StepRef::Position(99)),
            Err(ScratchError::StepNotFound(_))
        ));
    }

    #[test]
    fn task_description_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scratchpad.md");
        for desc in [
            "## Notes on the parser",
            "Started: refactor of importer",
            "(none)",
            "Task: nested prefix",
        ] {
            let mut ledger = Ledger::new();
            ledger.start_task(desc, ["a"]).unwrap();
            ledger.save(&path).unwrap();

            let loaded = Ledger::load(&path).unwrap();
            assert_eq!(loaded.task.as_deref(), Some(desc), "description {desc:?}");
            assert_eq!(texts(&loaded), vec!["a"]);
            assert!(loaded.started_at.is_some());
        }
    }

    #[test]
    fn step_ref_parsing() {
        assert_eq!("3".parse::<StepRef>().unwrap(), StepRef::Position(3));
        assert_eq!("S12".parse::<StepRef>().unwrap(), StepRef::Position(12));
        assert_eq!(
            "Start over".parse::<StepRef>().unwrap(),
            StepRef::Text("Start over".into())
        );
    }

    #[test]
    fn parse_reads_rendered_document() {
        let mut ledger = Ledger::new();
        ledger.start_task("Port importer", ["read it", "rewrite it"]).unwrap();
        ledger.mark_done(&StepRef::Position(1)).unwrap();
        ledger.note("rows with NULL ids are dropped").unwrap();

        let parsed = Ledger::parse(&ledger.render().to_string());
        assert_eq!(parsed.task.as_deref(), Some("Port importer"));
        assert_eq!(texts(&parsed), vec!["read it", "rewrite it"]);
        assert!(parsed.steps[0].is_done());
        assert!(!parsed.steps[1].is_done());
        assert_eq!(parsed.notes, vec!["rows with NULL ids are dropped"]);
        assert!(parsed.started_at.is_some());
    }

    #[test]
    fn parse_tolerates_hand_edits() {
        let doc = "\
# Scratchpad
Some preamble the human typed.

## Current Task
Fix the flaky test

## Steps
[x] reproduce locally
random commentary
[ ]   bisect
[?] not a step

## Other
[ ] outside the steps section
";
        let ledger = Ledger::parse(doc);
        assert_eq!(ledger.task.as_deref(), Some("Fix the flaky test"));
        assert_eq!(texts(&ledger), vec!["reproduce locally", "bisect"]);
        assert!(ledger.steps[0].is_done());
        assert!(ledger.started_at.is_none());
    }

    #[test]
    fn empty_ledger_renders_placeholders() {
        let out = Ledger::new().render().to_string();
        assert!(out.contains("(none)"));
        assert!(out.contains("(no steps)"));
        assert!(Ledger::parse(&out).is_empty());
    }

    #[test]
    fn summary_and_next_pending() {
        let mut ledger = Ledger::new();
        ledger.start_task("t", ["a", "b", "c"]).unwrap();
        ledger.mark_done(&StepRef::Position(1)).unwrap();
        assert_eq!(ledger.summary(), "1/3 steps done");
        let (idx, step) = ledger.next_pending().unwrap();
        assert_eq!(step_id(idx), "S2");
        assert_eq!(step.text, "b");
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".scratch/scratchpad.md");
        assert!(Ledger::load(&path).unwrap().is_empty());

        let mut ledger = Ledger::new();
        ledger.start_task("persist me", ["one"]).unwrap();
        ledger.save(&path).unwrap();

        let loaded = Ledger::load(&path).unwrap();
        assert_eq!(loaded.task.as_deref(), Some("persist me"));
        assert_eq!(texts(&loaded), vec!["one"]);
    }

    #[test]
    fn mirror_into_rules_file() {
        let dir = TempDir::new().unwrap();
        let rules = dir.path().join(".cursorrules");
        std::fs::write(&rules, "# Instructions\n").unwrap();

        let mut ledger = Ledger::new();
        ledger.start_task("mirror", ["first"]).unwrap();
        ledger.mirror_into(&rules).unwrap();
        ledger.mark_done(&StepRef::Position(1)).unwrap();
        ledger.mirror_into(&rules).unwrap();

        let content = std::fs::read_to_string(&rules).unwrap();
        assert!(content.starts_with("# Instructions\n"));
        assert_eq!(content.matches(MIRROR_BEGIN).count(), 1);
        assert!(content.contains("[X] first"));
        assert!(!content.contains("[ ] first"));
        assert!(!content.contains("Started:"));
    }
}

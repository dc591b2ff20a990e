use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use scratch_core::{lessons, paths};
use std::path::Path;

#[derive(Subcommand)]
pub enum LessonSubcommand {
    /// Record a lesson (a fixed mistake, a tool quirk, a version that matters)
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List lessons in the order they were recorded
    List,
}

pub fn run(root: &Path, subcmd: LessonSubcommand, json: bool) -> anyhow::Result<()> {
    let path = paths::lessons_path(root);
    match subcmd {
        LessonSubcommand::Add { text } => {
            let lesson = lessons::add(&path, &text.join(" "))?;
            if json {
                print_json(&lesson)?;
            } else {
                println!("Recorded lesson: {}", lesson.text);
            }
        }
        LessonSubcommand::List => {
            let all = lessons::list(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if json {
                print_json(&all)?;
            } else if all.is_empty() {
                println!("No lessons recorded.");
            } else {
                for l in &all {
                    match l.recorded_on {
                        Some(d) => println!("- ({d}) {}", l.text),
                        None => println!("- {}", l.text),
                    }
                }
            }
        }
    }
    Ok(())
}

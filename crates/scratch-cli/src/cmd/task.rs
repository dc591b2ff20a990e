use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use scratch_core::config::Config;
use scratch_core::io::BlockUpdate;
use scratch_core::ledger::{step_id, Ledger, MarkOutcome, StepRef};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Start a new task, replacing the current scratchpad
    Start {
        #[arg(required = true)]
        description: Vec<String>,
        /// Seed a planned step (repeatable, kept in order)
        #[arg(long = "step", value_name = "TEXT")]
        steps: Vec<String>,
    },
    /// Append a pending step
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Mark a step done by position (3 or S3) or exact text
    Done { step: String },
    /// Record a progress note or reflection
    Note {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print the scratchpad
    Show,
    /// Show the next pending step
    Next,
    /// Drop the current task entirely
    Clear,
    /// Mirror the checklist into the rules file
    Sync {
        /// Rules file (default: rules_file from config, else .cursorrules)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let path = config.ledger_path(root);

    match subcmd {
        TaskSubcommand::Start { description, steps } => {
            start(&path, &description.join(" "), &steps, json)
        }
        TaskSubcommand::Add { text } => add(&path, &text.join(" "), json),
        TaskSubcommand::Done { step } => done(&path, &step, json),
        TaskSubcommand::Note { text } => note(&path, &text.join(" "), json),
        TaskSubcommand::Show => show(&path, json),
        TaskSubcommand::Next => next(&path, json),
        TaskSubcommand::Clear => clear(&path, json),
        TaskSubcommand::Sync { file } => {
            let rules = match file {
                Some(f) => scratch_core::paths::resolve(root, &f),
                None => config.rules_path(root),
            };
            sync(&path, &rules, json)
        }
    }
}

fn load(path: &Path) -> anyhow::Result<Ledger> {
    Ledger::load(path).with_context(|| format!("failed to read {}", path.display()))
}

fn save(ledger: &Ledger, path: &Path) -> anyhow::Result<()> {
    ledger
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn ledger_json(ledger: &Ledger) -> serde_json::Value {
    let steps: Vec<serde_json::Value> = ledger
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| {
            serde_json::json!({
                "id": step_id(i),
                "text": s.text,
                "status": s.status,
            })
        })
        .collect();
    serde_json::json!({
        "task": ledger.task,
        "started_at": ledger.started_at,
        "steps": steps,
        "notes": ledger.notes,
        "summary": ledger.summary(),
    })
}

fn start(path: &Path, description: &str, steps: &[String], json: bool) -> anyhow::Result<()> {
    let mut ledger = load(path)?;
    ledger.start_task(description, steps)?;
    save(&ledger, path)?;

    if json {
        print_json(&ledger_json(&ledger))?;
    } else {
        println!(
            "Started task: {} ({} planned steps)",
            ledger.task.as_deref().unwrap_or(""),
            ledger.steps.len()
        );
    }
    Ok(())
}

fn add(path: &Path, text: &str, json: bool) -> anyhow::Result<()> {
    let mut ledger = load(path)?;
    let position = ledger.add_step(text)?;
    save(&ledger, path)?;

    let id = step_id(position - 1);
    let text = &ledger.steps[position - 1].text;
    if json {
        print_json(&serde_json::json!({ "id": id, "text": text, "status": "pending" }))?;
    } else {
        println!("Added step [{id}]: {text}");
    }
    Ok(())
}

fn done(path: &Path, step: &str, json: bool) -> anyhow::Result<()> {
    let step_ref: StepRef = step.parse()?;
    let mut ledger = load(path)?;
    let index = ledger.find(&step_ref)?;
    let outcome = ledger.mark_done(&step_ref)?;
    if outcome == MarkOutcome::Marked {
        save(&ledger, path)?;
    }

    let id = step_id(index);
    let text = &ledger.steps[index].text;
    if json {
        print_json(&serde_json::json!({
            "id": id,
            "text": text,
            "status": "done",
            "changed": outcome == MarkOutcome::Marked,
        }))?;
    } else if outcome == MarkOutcome::Marked {
        println!("Completed step [{id}]: {text}");
    } else {
        println!("Step [{id}] already done: {text}");
    }
    Ok(())
}

fn note(path: &Path, text: &str, json: bool) -> anyhow::Result<()> {
    let mut ledger = load(path)?;
    ledger.note(text)?;
    save(&ledger, path)?;

    if json {
        print_json(&serde_json::json!({ "notes": ledger.notes }))?;
    } else {
        println!("Noted.");
    }
    Ok(())
}

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let ledger = load(path)?;
    if json {
        print_json(&ledger_json(&ledger))?;
    } else {
        print!("{}", ledger.render());
        if !ledger.steps.is_empty() {
            println!();
            println!("{}", ledger.summary());
        }
    }
    Ok(())
}

fn next(path: &Path, json: bool) -> anyhow::Result<()> {
    let ledger = load(path)?;
    let next = ledger.next_pending();

    if json {
        let value = next.map(|(i, s)| serde_json::json!({ "id": step_id(i), "text": s.text }));
        print_json(&serde_json::json!({ "next": value, "summary": ledger.summary() }))?;
        return Ok(());
    }

    match next {
        Some((i, s)) => println!("[{}] {}", step_id(i), s.text),
        None if ledger.steps.is_empty() => println!("No steps planned."),
        None => println!("All steps done ({}).", ledger.summary()),
    }
    Ok(())
}

fn clear(path: &Path, json: bool) -> anyhow::Result<()> {
    let mut ledger = load(path)?;
    let had_task = !ledger.is_empty();
    ledger.clear();
    save(&ledger, path)?;

    if json {
        print_json(&serde_json::json!({ "cleared": had_task }))?;
    } else if had_task {
        println!("Scratchpad cleared.");
    } else {
        println!("Scratchpad was already empty.");
    }
    Ok(())
}

fn sync(path: &Path, rules: &Path, json: bool) -> anyhow::Result<()> {
    let ledger = load(path)?;
    let outcome = ledger
        .mirror_into(rules)
        .with_context(|| format!("failed to update {}", rules.display()))?;

    let action = match outcome {
        BlockUpdate::Replaced => "updated",
        BlockUpdate::Appended => "appended",
    };
    if json {
        print_json(&serde_json::json!({
            "file": rules.display().to_string(),
            "action": action,
        }))?;
    } else {
        println!("Scratchpad {action} in {}", rules.display());
    }
    Ok(())
}

use crate::output::print_json;
use anyhow::Context;
use scratch_core::{config::Config, io, lessons, ledger::Ledger, paths};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut created: Vec<String> = Vec::new();
    let mut existing: Vec<String> = Vec::new();

    let dir = paths::scratch_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    // 1. config.yaml
    let config_path = paths::config_path(root);
    if config_path.exists() {
        existing.push(paths::CONFIG_FILE.to_string());
    } else {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
        created.push(paths::CONFIG_FILE.to_string());
    }

    // 2. scratchpad, wherever the (possibly pre-existing) config points it
    let config = Config::load(root).context("failed to load config")?;
    let ledger_path = config.ledger_path(root);
    let ledger_doc = Ledger::new().render().to_string();
    let label = ledger_path
        .strip_prefix(root)
        .unwrap_or(&ledger_path)
        .display()
        .to_string();
    if io::write_if_missing(&ledger_path, ledger_doc.as_bytes())
        .context("failed to write scratchpad")?
    {
        created.push(label);
    } else {
        existing.push(label);
    }

    // 3. lessons
    if io::write_if_missing(&paths::lessons_path(root), lessons::LESSONS_HEADER.as_bytes())
        .context("failed to write lessons file")?
    {
        created.push(paths::LESSONS_FILE.to_string());
    } else {
        existing.push(paths::LESSONS_FILE.to_string());
    }

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "created": created,
            "existing": existing,
        }))?;
        return Ok(());
    }

    println!("Initializing scratch in: {}", root.display());
    for f in &created {
        println!("  created: {f}");
    }
    for f in &existing {
        println!("  exists:  {f}");
    }
    Ok(())
}

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SCRATCH_DIR: &str = ".scratch";

pub const CONFIG_FILE: &str = ".scratch/config.yaml";
pub const LEDGER_FILE: &str = ".scratch/scratchpad.md";
pub const LESSONS_FILE: &str = ".scratch/lessons.md";

pub const RULES_FILE: &str = ".cursorrules";

/// Env files merged into [`crate::settings::Settings`], highest priority first.
pub const ENV_FILES: &[&str] = &[".env.local", ".env", ".env.example"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn scratch_dir(root: &Path) -> PathBuf {
    root.join(SCRATCH_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn lessons_path(root: &Path) -> PathBuf {
    root.join(LESSONS_FILE)
}

pub fn default_rules_path(root: &Path) -> PathBuf {
    root.join(RULES_FILE)
}

/// Resolve a configured path: absolute paths pass through, relative ones
/// are anchored at the project root.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

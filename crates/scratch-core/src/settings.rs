use crate::error::Result;
use crate::paths;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

/// Key that overrides the configured default provider.
pub const PROVIDER_OVERRIDE_KEY: &str = "SCRATCH_LLM_PROVIDER";

/// Snapshot of the process key/value environment, taken once at startup.
///
/// Sources, lowest priority first: `.env.example`, `.env`, `.env.local`,
/// then the real process environment. Nothing reads `std::env` after the
/// snapshot is built.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: BTreeMap<String, String>,
    loaded_files: Vec<String>,
}

impl Settings {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            loaded_files: Vec::new(),
        }
    }

    /// Merge env files under `root` and then the process environment.
    pub fn load(root: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        for name in paths::ENV_FILES.iter().rev() {
            let path = root.join(name);
            if !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let pairs = parse_env(&content);
            tracing::debug!(file = %name, keys = pairs.len(), "loaded env file");
            settings.values.extend(pairs);
            settings.loaded_files.push((*name).to_string());
        }
        settings.merge_os_vars(std::env::vars_os());
        Ok(settings)
    }

    /// Layer OS environment pairs on top. Keys or values that are not valid
    /// UTF-8 cannot name a credential, so they are skipped.
    pub fn merge_os_vars<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        for (key, value) in vars {
            match (key.into_string(), value.into_string()) {
                (Ok(k), Ok(v)) => {
                    self.values.insert(k, v);
                }
                (key, _) => {
                    let key = key.unwrap_or_else(|k| k.to_string_lossy().into_owned());
                    tracing::debug!(%key, "skipping non-UTF-8 environment variable");
                }
            }
        }
    }

    /// Value for `key`, treating blank values as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Env files that contributed values, lowest priority first.
    pub fn loaded_files(&self) -> &[String] {
        &self.loaded_files
    }
}

/// Parse `KEY=VALUE` lines. Comments, blank lines and lines without `=` are
/// skipped; an `export ` prefix and matching outer quotes are stripped.
pub fn parse_env(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| {
            let l = l.strip_prefix("export ").unwrap_or(l);
            let (k, v) = l.split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), unquote(v.trim()).to_string()))
        })
        .collect()
}

fn unquote(v: &str) -> &str {
    for q in ['"', '\''] {
        if v.len() >= 2 && v.starts_with(q) && v.ends_with(q) {
            return &v[1..v.len() - 1];
        }
    }
    v
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::error::{Result, ScratchError};
use crate::paths;
use crate::settings::Settings;
use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,
    /// Per-provider default model overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<ProviderKind, String>,
    /// Per-provider base URL overrides. Environment keys win over these.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_urls: BTreeMap<ProviderKind, String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_azure_api_version")]
    pub azure_api_version: String,
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_azure_api_version() -> String {
    "2024-08-01-preview".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            models: BTreeMap::new(),
            base_urls: BTreeMap::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            azure_api_version: default_azure_api_version(),
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_file")]
    pub file: PathBuf,
}

fn default_ledger_file() -> PathBuf {
    PathBuf::from(paths::LEDGER_FILE)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            file: default_ledger_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Rules document the ledger is mirrored into by `task sync`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            llm: LlmConfig::default(),
            ledger: LedgerConfig::default(),
            rules_file: None,
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ScratchError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but an uninitialized project gets defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(ScratchError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn ledger_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.ledger.file)
    }

    pub fn rules_path(&self, root: &Path) -> PathBuf {
        match &self.rules_file {
            Some(p) => paths::resolve(root, p),
            None => paths::default_rules_path(root),
        }
    }

    /// Default provider after applying the environment override.
    pub fn effective_default_provider(&self, settings: &Settings) -> Result<ProviderKind> {
        match settings.get(crate::settings::PROVIDER_OVERRIDE_KEY) {
            Some(v) => v.parse(),
            None => Ok(self.llm.default_provider),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, settings: &Settings) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Default provider must be resolvable and usable
        match self.effective_default_provider(settings) {
            Err(e) => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("{}: {e}", crate::settings::PROVIDER_OVERRIDE_KEY),
            }),
            Ok(provider) => {
                if let Some(key) = provider.credential_key() {
                    if !settings.contains(key) {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Warning,
                            message: format!(
                                "default provider '{provider}' has no credential: set {key}"
                            ),
                        });
                    }
                }
                if provider == ProviderKind::Azure
                    && !settings.contains(ProviderKind::Azure.base_url_key())
                    && !self.llm.base_urls.contains_key(&ProviderKind::Azure)
                {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "default provider 'azure' has no endpoint: set {}",
                            ProviderKind::Azure.base_url_key()
                        ),
                    });
                }
            }
        }

        // 2. Base URLs must be http(s)
        for (provider, url) in &self.llm.base_urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "llm.base_urls.{provider} must be an http(s) URL, got '{url}'"
                    ),
                });
            }
        }

        // 3. Blank model overrides
        for (provider, model) in &self.llm.models {
            if model.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("llm.models.{provider} is empty"),
                });
            }
        }

        // 4. Sampling limits
        if self.llm.max_tokens == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "llm.max_tokens must be greater than 0".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "llm.temperature={} is outside the usual 0.0..=2.0 range",
                    self.llm.temperature
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

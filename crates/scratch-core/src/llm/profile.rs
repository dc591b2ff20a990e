use crate::config::Config;
use crate::error::Result;
use crate::settings::Settings;
use crate::types::ProviderKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Static description of one backend, resolved once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub default_model: String,
    /// Environment key the credential is read from, if one is needed.
    pub credential_key: Option<&'static str>,
    #[serde(skip)]
    pub credential: Option<String>,
    pub base_url: Option<String>,
    pub supports_images: bool,
}

impl ProviderProfile {
    pub fn has_credential(&self) -> bool {
        self.credential_key.is_none() || self.credential.is_some()
    }
}

/// Everything the dispatcher reads. Immutable after [`LlmSettings::resolve`].
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub default_provider: ProviderKind,
    pub profiles: BTreeMap<ProviderKind, ProviderProfile>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub azure_api_version: String,
}

impl LlmSettings {
    /// Combine file config and the environment snapshot.
    ///
    /// Model precedence: provider-specific env key (only
    /// `AZURE_OPENAI_MODEL_DEPLOYMENT` today), then `llm.models`, then the
    /// built-in default. Base URL precedence: env key, then
    /// `llm.base_urls`, then the public endpoint.
    pub fn resolve(config: &Config, settings: &Settings) -> Result<Self> {
        let default_provider = config.effective_default_provider(settings)?;

        let profiles = ProviderKind::all()
            .iter()
            .map(|&kind| {
                let default_model = model_env_key(kind)
                    .and_then(|k| settings.get(k))
                    .map(str::to_string)
                    .or_else(|| config.llm.models.get(&kind).cloned())
                    .unwrap_or_else(|| kind.default_model().to_string());

                let credential = kind
                    .credential_key()
                    .or(optional_credential_key(kind))
                    .and_then(|k| settings.get(k))
                    .map(str::to_string);

                let base_url = settings
                    .get(kind.base_url_key())
                    .map(str::to_string)
                    .or_else(|| config.llm.base_urls.get(&kind).cloned())
                    .or_else(|| kind.default_base_url().map(str::to_string))
                    .map(|u| u.trim_end_matches('/').to_string());

                let profile = ProviderProfile {
                    kind,
                    default_model,
                    credential_key: kind.credential_key(),
                    credential,
                    base_url,
                    supports_images: kind.supports_images(),
                };
                (kind, profile)
            })
            .collect::<BTreeMap<_, _>>();

        if let Some(profile) = profiles.get(&default_provider) {
            if let (Some(key), false) = (profile.credential_key, profile.has_credential()) {
                tracing::warn!(
                    provider = %default_provider,
                    key,
                    "default provider has no credential; queries to it will fail"
                );
            }
        }

        Ok(Self {
            default_provider,
            profiles,
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            azure_api_version: config.llm.azure_api_version.clone(),
        })
    }

    pub fn profile(&self, kind: ProviderKind) -> &ProviderProfile {
        // resolve() fills every variant of ProviderKind::all()
        &self.profiles[&kind]
    }
}

fn model_env_key(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::Azure => Some("AZURE_OPENAI_MODEL_DEPLOYMENT"),
        _ => None,
    }
}

/// Providers that work without a key but will send one when present.
fn optional_credential_key(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::Local => Some("LOCAL_LLM_API_KEY"),
        _ => None,
    }
}

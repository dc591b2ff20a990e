//! Provider dispatch: one call signature in front of every LLM backend.
//!
//! [`Dispatcher::dispatch`] resolves provider, model and credential for a
//! [`Request`], checks capabilities, and hands a single [`backend::Call`] to
//! the [`Backend`]. Nothing is retried.

pub mod backend;
pub mod image;
pub mod profile;
pub mod wire;

pub use backend::{Backend, Call, HttpBackend};
pub use profile::{LlmSettings, ProviderProfile};

use crate::error::{Result, ScratchError};
use crate::types::ProviderKind;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub prompt: String,
    pub image: Option<PathBuf>,
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
}

impl Request {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub provider: ProviderKind,
    pub model: String,
    pub text: String,
}

/// Provider and model a request would go to, before any credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route<'a> {
    pub provider: ProviderKind,
    pub model: &'a str,
}

pub struct Dispatcher<'s, B> {
    settings: &'s LlmSettings,
    backend: B,
}

impl<'s, B: Backend> Dispatcher<'s, B> {
    pub fn new(settings: &'s LlmSettings, backend: B) -> Self {
        Self { settings, backend }
    }

    /// Steps 1 and 2: overrides first, then the process-wide defaults.
    pub fn route<'r>(&'r self, request: &'r Request) -> Route<'r> {
        let provider = request.provider.unwrap_or(self.settings.default_provider);
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.settings.profile(provider).default_model);
        Route { provider, model }
    }

    pub fn dispatch(&self, request: &Request) -> Result<Response> {
        let Route { provider, model } = self.route(request);
        let profile = self.settings.profile(provider);
        tracing::debug!(%provider, model, "resolved llm route");

        if let (Some(key), None) = (profile.credential_key, &profile.credential) {
            return Err(ScratchError::MissingCredential {
                provider: provider.to_string(),
                key: key.to_string(),
            });
        }
        let base_url = profile.base_url.as_deref().ok_or_else(|| {
            ScratchError::MissingCredential {
                provider: provider.to_string(),
                key: provider.base_url_key().to_string(),
            }
        })?;

        let image = match &request.image {
            Some(_) if !profile.supports_images => {
                return Err(ScratchError::UnsupportedCapability {
                    provider: provider.to_string(),
                    capability: "image input".to_string(),
                });
            }
            Some(path) => Some(image::load(path)?),
            None => None,
        };

        let call = Call {
            provider,
            model,
            prompt: &request.prompt,
            image: image.as_ref(),
            credential: profile.credential.as_deref(),
            base_url,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            azure_api_version: &self.settings.azure_api_version,
        };
        let text = self.backend.send(&call)?;

        Ok(Response {
            provider,
            model: model.to_string(),
            text,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use scratch_core::config::Config;
use scratch_core::llm::{Dispatcher, HttpBackend, LlmSettings, Request};
use scratch_core::settings::Settings;
use scratch_core::types::ProviderKind;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum LlmSubcommand {
    /// Send one prompt and print the reply
    Query {
        /// Prompt text
        #[arg(long)]
        prompt: String,
        /// Provider: openai, anthropic, deepseek, gemini, azure, local
        #[arg(long)]
        provider: Option<ProviderKind>,
        /// Model (default: the provider's configured default)
        #[arg(long)]
        model: Option<String>,
        /// Image file to attach (providers with image input only)
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List providers, their default models and credential status
    Providers,
}

pub fn run(root: &Path, subcmd: LlmSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let settings = Settings::load(root).context("failed to read environment")?;
    let llm = LlmSettings::resolve(&config, &settings)?;

    match subcmd {
        LlmSubcommand::Query {
            prompt,
            provider,
            model,
            image,
        } => {
            let request = Request {
                prompt,
                image: image.map(|p| scratch_core::paths::resolve(root, &p)),
                provider,
                model,
            };
            query(&llm, &request, json)
        }
        LlmSubcommand::Providers => providers(&llm, json),
    }
}

fn query(llm: &LlmSettings, request: &Request, json: bool) -> anyhow::Result<()> {
    let backend = HttpBackend::new()?;
    let response = Dispatcher::new(llm, backend).dispatch(request)?;

    if json {
        print_json(&response)?;
    } else {
        println!("{}", response.text);
    }
    Ok(())
}

fn providers(llm: &LlmSettings, json: bool) -> anyhow::Result<()> {
    if json {
        let items: Vec<serde_json::Value> = llm
            .profiles
            .values()
            .map(|p| {
                serde_json::json!({
                    "provider": p.kind,
                    "default": p.kind == llm.default_provider,
                    "default_model": p.default_model,
                    "supports_images": p.supports_images,
                    "credential_key": p.credential_key,
                    "credential_set": p.has_credential(),
                    "base_url": p.base_url,
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = llm
        .profiles
        .values()
        .map(|p| {
            let name = if p.kind == llm.default_provider {
                format!("{} (default)", p.kind)
            } else {
                p.kind.to_string()
            };
            let credential = match (p.credential_key, p.has_credential()) {
                (None, _) => "not required".to_string(),
                (Some(_), true) => "set".to_string(),
                (Some(key), false) => format!("missing ({key})"),
            };
            vec![
                name,
                p.default_model.clone(),
                if p.supports_images { "yes" } else { "no" }.to_string(),
                credential,
            ]
        })
        .collect();
    print_table(&["PROVIDER", "DEFAULT MODEL", "IMAGES", "CREDENTIAL"], &rows);
    Ok(())
}

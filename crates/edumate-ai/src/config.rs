//! Configuration file loading and provider construction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use edumate_core::generator::{CurriculumGenerator, GeneratorConfig};
use edumate_core::traits::AiProvider;

use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;

/// Name of the per-project configuration file.
pub const CONFIG_FILE_NAME: &str = "edumate.toml";

/// One configured AI backend.
///
/// `Debug` masks the API key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
}

impl ProviderConfig {
    pub fn api_key(&self) -> &str {
        match self {
            ProviderConfig::Gemini { api_key, .. } | ProviderConfig::OpenAI { api_key, .. } => {
                api_key
            }
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdumateConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// JSON snapshot holding all records.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_data_file() -> PathBuf {
    PathBuf::from("edumate-data.json")
}

impl Default for EdumateConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            data_file: default_data_file(),
        }
    }
}

impl EdumateConfig {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            model: self.default_model.clone(),
            temperature: self.default_temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// The default provider, if it is configured with a key.
    pub fn default_ai_provider(&self) -> Result<Option<Arc<dyn AiProvider>>> {
        match self.providers.get(&self.default_provider) {
            Some(config) if !config.api_key().trim().is_empty() => {
                Ok(Some(create_provider(config)?))
            }
            Some(_) => {
                tracing::warn!(
                    "provider '{}' has no API key, generating sample content",
                    self.default_provider
                );
                Ok(None)
            }
            None => {
                tracing::debug!(
                    "provider '{}' is not configured, generating sample content",
                    self.default_provider
                );
                Ok(None)
            }
        }
    }

    /// A generator wired to the default provider, or an offline one.
    pub fn generator(&self) -> Result<CurriculumGenerator> {
        Ok(CurriculumGenerator::new(
            self.default_ai_provider()?,
            self.generator_config(),
        ))
    }
}

/// Replace `${VAR}` references with environment values; unset variables become empty.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + len + 1..]);
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
            org_id: org_id.as_deref().map(resolve_env_vars),
        },
    }
}

/// Put explicit keys into the `gemini` and `openai` entries, creating them if needed.
fn apply_key_overrides(
    config: &mut EdumateConfig,
    gemini_key: Option<String>,
    openai_key: Option<String>,
) {
    if let Some(key) = gemini_key {
        let entry = config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Gemini { api_key, .. } = entry {
            *api_key = key;
        }
    }
    if let Some(key) = openai_key {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }
}

/// Load configuration from the default locations.
///
/// Search order:
/// 1. `edumate.toml` in the current directory
/// 2. `~/.config/edumate/config.toml`
///
/// `EDUMATE_GEMINI_KEY` and `EDUMATE_OPENAI_KEY` override the file's keys.
pub fn load_config() -> Result<EdumateConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EdumateConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => EdumateConfig::default(),
    };

    apply_key_overrides(
        &mut config,
        std::env::var("EDUMATE_GEMINI_KEY").ok(),
        std::env::var("EDUMATE_OPENAI_KEY").ok(),
    );
    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    // A relative data file lives next to the config file that named it.
    if let Some(dir) = config_path.as_deref().and_then(Path::parent) {
        if config.data_file.is_relative() && !dir.as_os_str().is_empty() {
            config.data_file = dir.join(&config.data_file);
        }
    }

    Ok(config)
}

pub fn parse_config(content: &str) -> Result<EdumateConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("edumate"))
}

/// Build a provider from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn AiProvider>> {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            Ok(Arc::new(GeminiProvider::new(api_key, base_url.clone())?))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Arc::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        )?)),
    }
}

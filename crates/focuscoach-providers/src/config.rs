//! Coach configuration and generator factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use focuscoach_core::curriculum::Curriculum;
use focuscoach_core::pipeline::PipelineConfig;
use focuscoach_core::traits::ContentGenerator;

use crate::gemini::GeminiProvider;
use crate::mock::MockGenerator;
use crate::ollama::{self, OllamaProvider};

/// Environment variable that supplies the Gemini API key.
pub const GEMINI_KEY_VAR: &str = "FOCUSCOACH_GEMINI_KEY";

/// Configuration for a single content generator backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default)]
        model: Option<String>,
    },
    /// Offline sample content generated from the active curriculum.
    Mock {},
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            ProviderConfig::Ollama { base_url, model } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            ProviderConfig::Mock {} => f.debug_struct("Mock").finish(),
        }
    }
}

fn default_ollama_url() -> String {
    ollama::DEFAULT_BASE_URL.to_string()
}

/// Top-level focuscoach configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used when none is named on the command line.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model override; each provider has its own default.
    #[serde(default)]
    pub default_model: Option<String>,
    /// Sampling temperature for generated content.
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Max retries on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Snapshot file for profiles, templates and attempts.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Curriculum file; the embedded reference curriculum when unset.
    #[serde(default)]
    pub curriculum_path: Option<PathBuf>,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./focuscoach-data/store.json")
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: None,
            default_temperature: default_temperature(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            store_path: default_store_path(),
            curriculum_path: None,
        }
    }
}

impl CoachConfig {
    /// Content pipeline settings derived from this config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            model: self.default_model.clone(),
            temperature: self.default_temperature,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Look up a provider by name; `mock` is always available.
    pub fn provider(&self, name: &str) -> Result<ProviderConfig> {
        match self.providers.get(name) {
            Some(config) => Ok(config.clone()),
            None if name == "mock" => Ok(ProviderConfig::Mock {}),
            None => {
                let mut known: Vec<&str> = self.providers.keys().map(String::as_str).collect();
                known.sort_unstable();
                anyhow::bail!(
                    "provider '{name}' is not configured (configured: {})",
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                )
            }
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.clone(),
        },
        ProviderConfig::Ollama { base_url, model } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
            model: model.clone(),
        },
        ProviderConfig::Mock {} => ProviderConfig::Mock {},
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `focuscoach.toml` in the current directory
/// 2. `~/.config/focuscoach/config.toml`
///
/// Environment variable override: `FOCUSCOACH_GEMINI_KEY`.
pub fn load_config() -> Result<CoachConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CoachConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("focuscoach.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CoachConfig::default(),
    };

    if let Ok(key) = std::env::var(GEMINI_KEY_VAR) {
        apply_gemini_key(&mut config, key);
    }

    Ok(config)
}

/// Parse a TOML config and resolve `${VAR}` references in provider entries.
pub fn parse_config_str(content: &str) -> Result<CoachConfig> {
    let mut config: CoachConfig = toml::from_str(content)?;
    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    Ok(config)
}

fn apply_gemini_key(config: &mut CoachConfig, key: String) {
    let entry = config
        .providers
        .entry("gemini".into())
        .or_insert(ProviderConfig::Gemini {
            api_key: String::new(),
            base_url: None,
            model: None,
        });
    if let ProviderConfig::Gemini { api_key, .. } = entry {
        *api_key = key;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("focuscoach"))
}

/// Create a content generator from its configuration.
///
/// The mock backend builds its sample batches from `curriculum`.
pub fn create_provider(
    config: &ProviderConfig,
    curriculum: &Curriculum,
) -> Result<Arc<dyn ContentGenerator>> {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => {
            if api_key.trim().is_empty() {
                anyhow::bail!("gemini api_key is empty; set {GEMINI_KEY_VAR} or api_key in the config");
            }
            Ok(Arc::new(GeminiProvider::new(
                api_key,
                base_url.clone(),
                model.clone(),
            )?))
        }
        ProviderConfig::Ollama { base_url, model } => {
            Ok(Arc::new(OllamaProvider::new(base_url, model.clone())?))
        }
        ProviderConfig::Mock {} => Ok(Arc::new(MockGenerator::for_curriculum(curriculum))),
    }
}

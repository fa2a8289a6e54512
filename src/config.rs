//! Generation settings from `.batt/config.json` and provider credentials.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm::provider::Provider;

/// Directory holding project-level batt files.
pub const CONFIG_DIR: &str = ".batt";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Optional prompt template file inside [`CONFIG_DIR`].
pub const TEMPLATE_FILE: &str = "commit.prompt.txt";

const DEFAULT_PROVIDER: &str = "groq";
const DEFAULT_MAX_TITLE_LENGTH: usize = 72;
const DEFAULT_ALLOWED_TYPES: [&str; 5] = ["feat", "fix", "refactor", "chore", "test"];

/// Settings for one generation run. Loaded once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Provider name as configured (lowercase). Resolved by the dispatcher.
    pub provider: String,
    pub max_title_length: usize,
    pub allowed_types: Vec<String>,
    pub confirm_before_commit: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            confirm_before_commit: true,
        }
    }
}

/// On-disk shape; every field optional so partial files merge over defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    ai_provider: Option<String>,
    max_title_length: Option<usize>,
    confirm_before_commit: Option<bool>,
    allowed_types: Option<Vec<String>>,
}

impl GenerationConfig {
    /// Parse config JSON, merging present fields over the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let provider = raw
            .ai_provider
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.provider);

        let max_title_length = match raw.max_title_length {
            Some(0) => {
                warn!(
                    "maxTitleLength must be positive, using default {}",
                    DEFAULT_MAX_TITLE_LENGTH
                );
                defaults.max_title_length
            }
            Some(len) => len,
            None => defaults.max_title_length,
        };

        let allowed_types = match raw.allowed_types {
            Some(types) => {
                let mut cleaned: Vec<String> = Vec::with_capacity(types.len());
                for t in types.into_iter().map(|t| t.trim().to_string()) {
                    if !t.is_empty() && !cleaned.iter().any(|c| c.eq_ignore_ascii_case(&t)) {
                        cleaned.push(t);
                    }
                }
                if cleaned.is_empty() {
                    warn!("allowedTypes is empty, using default types");
                    defaults.allowed_types
                } else {
                    cleaned
                }
            }
            None => defaults.allowed_types,
        };

        Self {
            provider,
            max_title_length,
            allowed_types,
            confirm_before_commit: raw
                .confirm_before_commit
                .unwrap_or(defaults.confirm_before_commit),
        }
    }

    /// Load `<project_root>/.batt/config.json`.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file is
    /// reported as a warning and also yields the defaults.
    pub fn load(project_root: &Path) -> Self {
        let path = config_path(project_root);
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to load config from {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Path of the config file for a project.
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Path of the optional prompt template for a project.
pub fn template_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(TEMPLATE_FILE)
}

/// Provider API keys, read once by the caller and passed in explicitly.
#[derive(Clone, Default)]
pub struct Credentials {
    groq: Option<String>,
    gemini: Option<String>,
}

impl Credentials {
    /// Read `BATT_GROQ_API_KEY` and `BATT_GEMINI_API_KEY`. Empty values count as unset.
    pub fn from_env() -> Self {
        let read = |provider: Provider| {
            env::var(provider.credential_var())
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            groq: read(Provider::Groq),
            gemini: read(Provider::Gemini),
        }
    }

    /// Set the key for one provider.
    pub fn with(mut self, provider: Provider, key: impl Into<String>) -> Self {
        let key = Some(key.into()).filter(|k| !k.is_empty());
        match provider {
            Provider::Groq => self.groq = key,
            Provider::Gemini => self.gemini = key,
        }
        self
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Groq => self.groq.as_deref(),
            Provider::Gemini => self.gemini.as_deref(),
        }
    }
}

// Keys must never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("groq", &self.groq.as_ref().map(|_| "<set>"))
            .field("gemini", &self.gemini.as_ref().map(|_| "<set>"))
            .finish()
    }
}

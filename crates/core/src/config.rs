//! Configuration management for Bharat Sanchar.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! - Built-in defaults
//! - Config file (`.sanchar/config.yaml` or `SANCHAR_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Runtime state (the scheme database, prompt overrides) lives in `.sanchar/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::provider::ProviderType;
use crate::scheme::MatchPolicy;

/// Environment variable consulted for a Gemini key when no provider config
/// names one.
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .sanchar/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generator provider ("gemini", "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Explicit API key for the provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// SQLite scheme database; defaults to `.sanchar/schemes.sqlite`
    pub database: Option<PathBuf>,

    /// Retrieval settings
    pub retrieval: RetrievalConfig,

    /// Answer composition settings
    pub answer: AnswerConfig,

    /// SMS delivery settings
    pub sms: SmsConfig,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,
}

/// Provider section of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Gemini { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// How the relevance selector queries the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of records used to ground one answer
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Field set searched for the query
    #[serde(rename = "matchPolicy", default)]
    pub match_policy: MatchPolicy,
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Answer composition and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Natural language every answer must be written in
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(rename = "maxTokens", default)]
    pub max_tokens: Option<u32>,
}

fn default_language() -> String {
    "Hindi".to_string()
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Names of the environment variables holding SMS gateway credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(rename = "accountSidEnv", default = "default_sid_env")]
    pub account_sid_env: String,

    #[serde(rename = "authTokenEnv", default = "default_token_env")]
    pub auth_token_env: String,

    #[serde(rename = "fromNumberEnv", default = "default_from_env")]
    pub from_number_env: String,

    /// Override for the gateway base URL
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_sid_env() -> String {
    "TWILIO_SID".to_string()
}

fn default_token_env() -> String {
    "TWILIO_TOKEN".to_string()
}

fn default_from_env() -> String {
    "TWILIO_PHONE".to_string()
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid_env: default_sid_env(),
            auth_token_env: default_token_env(),
            from_number_env: default_from_env(),
            endpoint: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    database: Option<DatabaseConfig>,
    retrieval: Option<RetrievalConfig>,
    answer: Option<AnswerConfig>,
    sms: Option<SmsConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-pro".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            database: None,
            retrieval: RetrievalConfig::default(),
            answer: AnswerConfig::default(),
            sms: SmsConfig::default(),
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment
    /// variables.
    ///
    /// Environment variables:
    /// - `SANCHAR_WORKSPACE`: Override workspace path
    /// - `SANCHAR_CONFIG`: Path to config file
    /// - `SANCHAR_PROVIDER`: Generator provider
    /// - `SANCHAR_MODEL`: Model identifier
    /// - `SANCHAR_API_KEY`: API key
    /// - `SANCHAR_DATABASE`: Scheme database path
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use sanchar_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Database: {:?}", config.database_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// replaces the one named in the environment before the file is read.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("SANCHAR_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("SANCHAR_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.sanchar_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("SANCHAR_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SANCHAR_MODEL") {
            config.model = model;
        }

        if let Ok(database) = std::env::var("SANCHAR_DATABASE") {
            config.database = Some(PathBuf::from(database));
        }

        config.api_key = std::env::var("SANCHAR_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(path) = config_file.database.and_then(|db| db.path) {
            result.database = Some(PathBuf::from(path));
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(answer) = config_file.answer {
            result.answer = answer;
        }

        if let Some(sms) = config_file.sms {
            result.sms = sms;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }
            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .sanchar directory.
    pub fn sanchar_dir(&self) -> PathBuf {
        self.workspace.join(".sanchar")
    }

    /// Ensure the .sanchar directory exists.
    pub fn ensure_sanchar_dir(&self) -> AppResult<()> {
        let dir = self.sanchar_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .sanchar directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolved path of the scheme database.
    pub fn database_path(&self) -> PathBuf {
        match self.database {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => self.workspace.join(path),
            None => self.sanchar_dir().join("schemes.sqlite"),
        }
    }

    /// Get the configuration of a provider, if the config file names it.
    ///
    /// An exact key wins; otherwise the provider's canonical name is tried,
    /// so `Gemini` or `google` find a `gemini` entry.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        let providers = &self.llm.as_ref()?.providers;
        providers.get(provider).or_else(|| {
            ProviderType::parse(provider).and_then(|parsed| providers.get(parsed.as_str()))
        })
    }

    /// Endpoint override for a provider.
    pub fn resolve_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: `SANCHAR_API_KEY`, the variable named by the provider config,
    /// then the Gemini default variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => Some(api_key_env.as_str()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if ProviderType::parse(provider) == Some(ProviderType::Gemini) => {
                Some(DEFAULT_GEMINI_KEY_ENV)
            }
            None => None,
        };

        env_var.and_then(|name| std::env::var(name).ok())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        let Some(provider_type) = ProviderType::parse(provider) else {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                ProviderType::supported()
            )));
        };

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be at least 1".to_string(),
            ));
        }

        if self.answer.language.trim().is_empty() {
            return Err(AppError::Config(
                "answer.language cannot be empty".to_string(),
            ));
        }

        if provider_type.requires_api_key() && self.resolve_api_key(provider).is_none() {
            let env_var = match self.get_provider_config(provider) {
                Some(ProviderConfig::Gemini { api_key_env, .. }) => api_key_env.as_str(),
                _ => DEFAULT_GEMINI_KEY_ENV,
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.match_policy, MatchPolicy::Extended);
        assert_eq!(config.answer.language, "Hindi");
        assert!(!config.verbose);
    }

    #[test]
    fn test_database_path_defaults_into_sanchar_dir() {
        let config = AppConfig::default();
        let path = config.database_path();
        assert!(path.ends_with(".sanchar/schemes.sqlite"));
    }

    #[test]
    fn test_relative_database_path_is_workspace_relative() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/sanchar");
        config.database = Some(PathBuf::from("data/schemes.sqlite"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/sanchar/data/schemes.sqlite")
        );
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.2
retrieval:
  topK: 5
  matchPolicy: legacy
answer:
  language: Marathi
  temperature: 0.2
logging:
  color: false
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "llama3.2");
        assert_eq!(merged.retrieval.top_k, 5);
        assert_eq!(merged.retrieval.match_policy, MatchPolicy::Legacy);
        assert_eq!(merged.answer.language, "Marathi");
        assert_eq!(merged.answer.temperature, Some(0.2));
        assert!(merged.no_color);
        assert_eq!(
            merged.resolve_endpoint("ollama"),
            Some("http://localhost:11434".to_string())
        );
    }

    #[test]
    fn test_untagged_provider_configs() {
        let yaml = r#"
activeProvider: gemini
providers:
  gemini:
    apiKeyEnv: MY_GEMINI_KEY
    model: gemini-pro
  ollama:
    endpoint: http://127.0.0.1:11434
    model: llama3.2
"#;
        let llm: LlmConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            llm.providers.get("gemini"),
            Some(ProviderConfig::Gemini { .. })
        ));
        assert!(matches!(
            llm.providers.get("ollama"),
            Some(ProviderConfig::Ollama { .. })
        ));
    }

    #[test]
    fn test_merge_yaml_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "database:\n  path: /tmp/schemes.sqlite\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.database_path(), PathBuf::from("/tmp/schemes.sqlite"));
    }

    #[test]
    fn test_load_with_explicit_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sanchar.yaml");
        std::fs::write(&path, "answer:\n  language: Marathi\n").unwrap();

        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), Some(path)).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.answer.language, "Marathi");
    }

    #[test]
    fn test_load_with_missing_workspace_fails() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load_with(Some(temp.path().join("missing")), None).is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_gemini_with_explicit_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("test-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_provider_aliases() {
        for provider in ["Gemini", "google", "OLLAMA"] {
            let mut config = AppConfig::default();
            config.provider = provider.to_string();
            config.api_key = Some("test-key".to_string());
            assert!(config.validate().is_ok(), "{} should be accepted", provider);
        }
    }

    #[test]
    fn test_validate_alias_still_requires_key() {
        let llm: LlmConfig = serde_yaml::from_str(
            "activeProvider: gemini\nproviders:\n  gemini:\n    apiKeyEnv: SANCHAR_TEST_UNSET_GEMINI_KEY\n    model: gemini-pro\n",
        )
        .unwrap();
        let mut config = AppConfig::default();
        config.provider = "GOOGLE".to_string();
        config.api_key = None;
        config.llm = Some(llm);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SANCHAR_TEST_UNSET_GEMINI_KEY"));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }
}

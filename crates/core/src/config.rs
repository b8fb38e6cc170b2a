//! Configuration management for Concierge.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - `.env` file (loaded into the process environment first)
//! - Config file (`.concierge/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The resulting `AppConfig` is an explicit value handed to every tool; nothing
//! reads credentials from process-wide state after startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .concierge/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Explicit API key (CONCIERGE_API_KEY), takes precedence over `openai.api_key_env`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Optional log file mirrored from stderr
    pub log_file: Option<PathBuf>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Remote service connection settings
    pub openai: OpenAiConfig,

    /// Query router settings
    pub router: RouterSettings,

    /// Document translation settings
    pub translate: TranslateSettings,

    /// Fine-tuning settings
    pub fine_tune: FineTuneSettings,
}

/// Connection settings for the OpenAI-compatible service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiConfig {
    /// Environment variable that holds the API key
    pub api_key_env: String,

    /// Base URL of the API
    pub endpoint: String,

    /// Environment variable holding the organization id
    pub organization_env: Option<String>,

    /// Environment variable holding the project id
    pub project_env: Option<String>,

    /// HTTP timeout for a single request
    pub timeout_secs: Option<u64>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            organization_env: None,
            project_env: None,
            timeout_secs: None,
        }
    }
}

/// Query router settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterSettings {
    /// Model used by every agent
    pub model: String,

    /// Workflow identifier attached to each remote call
    pub workflow_id: String,

    /// Trace name for the run
    pub trace_name: String,

    /// Vector stores searched by the internal Q&A agent
    pub vector_store_ids: Vec<String>,

    /// Deadline for one stage's remote call
    pub stage_timeout_secs: u64,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            model: "gpt-5".to_string(),
            workflow_id: "wf_estimate_router".to_string(),
            trace_name: "Est_agent".to_string(),
            vector_store_ids: Vec::new(),
            stage_timeout_secs: 300,
        }
    }
}

/// Document translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateSettings {
    /// Source document (Japanese .docx)
    pub input: Option<PathBuf>,

    /// Translation model id
    pub model: Option<String>,

    /// Environment variable holding the translation model id
    pub model_env: Option<String>,

    /// Completion token limit per paragraph
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// System message sent with every paragraph
    pub system_prompt: String,
}

impl Default for TranslateSettings {
    fn default() -> Self {
        Self {
            input: None,
            model: None,
            model_env: None,
            max_tokens: 300,
            temperature: 0.7,
            system_prompt: "You are a translator from Japanese to English.".to_string(),
        }
    }
}

/// Fine-tuning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FineTuneSettings {
    /// Vocabulary spreadsheet (.xlsx)
    pub vocabulary: Option<PathBuf>,

    /// Model that is fine-tuned
    pub base_model: String,

    /// Seconds between job status checks
    pub poll_interval_secs: u64,

    /// Header of the source-language column
    pub source_column: String,

    /// Header of the target-language column
    pub target_column: String,
}

impl Default for FineTuneSettings {
    fn default() -> Self {
        Self {
            vocabulary: None,
            base_model: "gpt-3.5-turbo-0125".to_string(),
            poll_interval_secs: 30,
            source_column: "日本語".to_string(),
            target_column: "英語".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    openai: Option<OpenAiConfig>,
    router: Option<RouterSettings>,
    translate: Option<TranslateSettings>,
    fine_tune: Option<FineTuneSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_key: None,
            log_level: None,
            log_file: None,
            verbose: false,
            no_color: false,
            openai: OpenAiConfig::default(),
            router: RouterSettings::default(),
            translate: TranslateSettings::default(),
            fine_tune: FineTuneSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CONCIERGE_WORKSPACE`: Override workspace path
    /// - `CONCIERGE_CONFIG`: Path to config file
    /// - `CONCIERGE_MODEL`: Router model identifier
    /// - `CONCIERGE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use concierge_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `CONCIERGE_WORKSPACE` and `CONCIERGE_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        // A missing .env is fine; the environment may already be populated
        if let Err(e) = dotenv::dotenv() {
            if !e.not_found() {
                return Err(AppError::Config(format!("Failed to read .env: {}", e)));
            }
        }

        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        } else if let Ok(workspace) = std::env::var("CONCIERGE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        config.config_file = config_file.or_else(|| {
            std::env::var("CONCIERGE_CONFIG").ok().map(PathBuf::from)
        });

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".concierge/config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(model) = std::env::var("CONCIERGE_MODEL") {
            config.router.model = model;
        }

        config.api_key = std::env::var("CONCIERGE_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(file) = logging.file {
                result.log_file = Some(file);
            }
        }

        if let Some(openai) = config_file.openai {
            result.openai = openai;
        }
        if let Some(router) = config_file.router {
            result.router = router;
        }
        if let Some(translate) = config_file.translate {
            result.translate = translate;
        }
        if let Some(fine_tune) = config_file.fine_tune {
            result.fine_tune = fine_tune;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
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

        if let Some(model) = model {
            self.router.model = model;
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

    /// Get the path to the .concierge directory.
    pub fn concierge_dir(&self) -> PathBuf {
        self.workspace.join(".concierge")
    }

    /// Resolve the API key, if any.
    pub fn resolve_api_key(&self) -> Option<String> {
        let non_blank = |key: &str| {
            let key = key.trim();
            (!key.is_empty()).then(|| key.to_string())
        };
        self.api_key
            .as_deref()
            .and_then(non_blank)
            .or_else(|| {
                std::env::var(&self.openai.api_key_env)
                    .ok()
                    .as_deref()
                    .and_then(non_blank)
            })
    }

    /// Resolve the API key or fail with a configuration error.
    ///
    /// Every remote call needs the credential, so tools call this before
    /// doing any work.
    pub fn require_api_key(&self) -> AppResult<String> {
        self.resolve_api_key().ok_or_else(|| {
            AppError::Config(format!(
                "API key not found: set CONCIERGE_API_KEY or the environment variable {}",
                self.openai.api_key_env
            ))
        })
    }

    /// Organization id from the configured environment variable.
    pub fn organization(&self) -> Option<String> {
        self.openai
            .organization_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }

    /// Project id from the configured environment variable.
    pub fn project(&self) -> Option<String> {
        self.openai
            .project_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }

    /// Resolve the translation model from config or its environment variable.
    pub fn translation_model(&self) -> AppResult<String> {
        if let Some(ref model) = self.translate.model {
            return Ok(model.clone());
        }
        if let Some(ref var) = self.translate.model_env {
            if let Ok(model) = std::env::var(var) {
                return Ok(model);
            }
            return Err(AppError::Config(format!(
                "Translation model not found in environment variable: {}",
                var
            )));
        }
        Err(AppError::Config(
            "No translation model configured (translate.model or translate.modelEnv)".to_string(),
        ))
    }

    /// Validate settings that would otherwise fail late.
    pub fn validate(&self) -> AppResult<()> {
        if self.openai.endpoint.trim().is_empty() {
            return Err(AppError::Config("openai.endpoint cannot be empty".to_string()));
        }
        if self.router.model.trim().is_empty() {
            return Err(AppError::Config("router.model cannot be empty".to_string()));
        }
        if self.router.stage_timeout_secs == 0 {
            return Err(AppError::Config(
                "router.stageTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        if self.fine_tune.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "fineTune.pollIntervalSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.router.model, "gpt-5");
        assert_eq!(config.openai.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.translate.max_tokens, 300);
        assert_eq!(config.fine_tune.poll_interval_secs, 30);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_concierge_dir() {
        let config = AppConfig::default();
        assert!(config.concierge_dir().ends_with(".concierge"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("gpt-4.1".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.router.model, "gpt-4.1");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
openai:
  apiKeyEnv: API_9519_TRY
  organizationEnv: OPENAI_ORG_ID
router:
  model: gpt-5-mini
  vectorStoreIds: ["vs_estimates"]
  stageTimeoutSecs: 60
translate:
  input: docs/spec_jp.docx
  modelEnv: OPENAI_API_MODEL_005
logging:
  level: warn
  color: false
  file: use.log
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.openai.api_key_env, "API_9519_TRY");
        assert_eq!(merged.openai.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(merged.router.model, "gpt-5-mini");
        assert_eq!(merged.router.vector_store_ids, vec!["vs_estimates".to_string()]);
        assert_eq!(merged.router.stage_timeout_secs, 60);
        assert_eq!(merged.router.trace_name, "Est_agent");
        assert_eq!(
            merged.translate.input,
            Some(PathBuf::from("docs/spec_jp.docx"))
        );
        assert_eq!(merged.translate.max_tokens, 300);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
        assert_eq!(merged.log_file, Some(PathBuf::from("use.log")));
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let result = AppConfig::default().merge_yaml_str("router: [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_require_api_key_missing() {
        let mut config = AppConfig::default();
        config.openai.api_key_env = "CONCIERGE_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        let err = config.require_api_key().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("CONCIERGE_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-explicit".to_string());
        config.openai.api_key_env = "CONCIERGE_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert_eq!(config.require_api_key().unwrap(), "sk-explicit");
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let mut config = AppConfig::default();
        config.openai.api_key_env = "CONCIERGE_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        for blank in ["", "   ", "\t\n"] {
            config.api_key = Some(blank.to_string());
            assert_eq!(config.resolve_api_key(), None);
            assert!(matches!(config.require_api_key(), Err(AppError::Config(_))));
        }

        config.api_key = Some("  sk-padded \n".to_string());
        assert_eq!(config.require_api_key().unwrap(), "sk-padded");
    }

    #[test]
    fn test_translation_model_from_config() {
        let mut config = AppConfig::default();
        assert!(config.translation_model().is_err());
        config.translate.model = Some("ft:gpt-3.5-turbo-0125:org::abc".to_string());
        assert_eq!(
            config.translation_model().unwrap(),
            "ft:gpt-3.5-turbo-0125:org::abc"
        );
    }

    #[test]
    fn test_load_from_explicit_workspace() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join(".concierge");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "fineTune:\n  baseModel: gpt-4o-mini-2024-07-18\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.fine_tune.base_model, "gpt-4o-mini-2024-07-18");
        assert_eq!(config.fine_tune.source_column, "日本語");
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let result = AppConfig::load_from(Some(PathBuf::from("/nonexistent/concierge/ws")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        config.router.stage_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}

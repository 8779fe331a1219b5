use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{CookieLifetime, CookieNames, CookieScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Default,
    OptIn,
    OptOut,
    Categories,
}

impl Default for Method {
    fn default() -> Self {
        Self::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckboxState {
    #[default]
    Unchecked,
    Checked,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub machine_name: String,
    #[serde(default)]
    pub checkbox_default_state: CheckboxState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JarKind {
    Memory,
    File,
}

fn default_jar_path() -> PathBuf {
    PathBuf::from("./state/cookies.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JarConfig {
    pub kind: JarKind,
    #[serde(default = "default_jar_path")]
    pub path: PathBuf,
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            kind: JarKind::Memory,
            path: default_jar_path(),
        }
    }
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/consentry")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

fn default_enabled_true() -> bool {
    true
}

fn default_cookie_name() -> String {
    "cookie-agreed".to_string()
}

fn default_cookie_lifetime() -> u32 {
    100
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_session_cookie_patterns() -> Vec<String> {
    vec!["SESS*".to_string(), "SSESS*".to_string()]
}

fn default_policy_version() -> String {
    "1".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Master switch: with the popup disabled the tracker still answers
    /// queries but the runtime never prompts or enforces.
    #[serde(default = "default_enabled_true")]
    pub popup_enabled: bool,
    #[serde(default)]
    pub method: Method,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Days of cookie lifetime when `cookie_session` is off.
    #[serde(default = "default_cookie_lifetime")]
    pub cookie_lifetime: u32,
    #[serde(default)]
    pub cookie_session: bool,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub domain_all_sites: bool,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Newline-separated allow-list patterns; `*` globs and
    /// `category:pattern` entries are both accepted.
    #[serde(default)]
    pub allowed_cookies: String,
    #[serde(default = "default_session_cookie_patterns")]
    pub session_cookie_patterns: Vec<String>,
    #[serde(default)]
    pub cookie_categories: BTreeMap<String, CategorySpec>,
    #[serde(default = "default_policy_version")]
    pub cookie_policy_version: String,
    #[serde(default)]
    pub store_consent: bool,
    #[serde(default)]
    pub store_consent_endpoint: Option<String>,
    #[serde(default)]
    pub withdraw_enabled: bool,
    #[serde(default)]
    pub popup_agreed_enabled: bool,
    #[serde(default)]
    pub reload_page: bool,
    #[serde(default)]
    pub disagree_do_not_show_popup: bool,
    #[serde(default = "default_enabled_true")]
    pub automatic_cookies_removal: bool,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default)]
    pub eu_only: bool,
    #[serde(default)]
    pub eu_check_endpoint: Option<String>,
    /// When set, the per-language status cookie from older installations is
    /// migrated at startup.
    #[serde(default)]
    pub popup_language: Option<String>,
    #[serde(default)]
    pub jar: JarConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            popup_enabled: true,
            method: Method::default(),
            cookie_name: default_cookie_name(),
            cookie_lifetime: default_cookie_lifetime(),
            cookie_session: false,
            domain: String::new(),
            domain_all_sites: false,
            base_path: default_base_path(),
            hostname: default_hostname(),
            allowed_cookies: String::new(),
            session_cookie_patterns: default_session_cookie_patterns(),
            cookie_categories: BTreeMap::new(),
            cookie_policy_version: default_policy_version(),
            store_consent: false,
            store_consent_endpoint: None,
            withdraw_enabled: false,
            popup_agreed_enabled: false,
            reload_page: false,
            disagree_do_not_show_popup: false,
            automatic_cookies_removal: true,
            sweep_interval_secs: default_sweep_interval_secs(),
            eu_only: false,
            eu_check_endpoint: None,
            popup_language: None,
            jar: JarConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize config")?;

        if !config.jar.path.is_absolute() {
            config.jar.path = config_base.join(&config.jar.path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that a JSON schema cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.cookie_lifetime == 0 {
            return Err(anyhow!("cookie_lifetime must be at least 1 day"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(anyhow!("sweep_interval_secs must be at least 1"));
        }
        if self.logging.retention_days == 0 {
            return Err(anyhow!("logging.retention_days must be at least 1"));
        }
        if self.cookie_policy_version.trim().is_empty() {
            return Err(anyhow!("cookie_policy_version cannot be empty"));
        }
        if self.store_consent && self.store_consent_endpoint.is_none() {
            return Err(anyhow!(
                "store_consent requires store_consent_endpoint to be set"
            ));
        }
        if self.method == Method::Categories && self.cookie_categories.is_empty() {
            return Err(anyhow!(
                "method 'categories' requires at least one entry in cookie_categories"
            ));
        }
        Ok(())
    }

    pub fn cookie_names(&self) -> CookieNames {
        CookieNames::new(self.cookie_name.clone())
    }

    pub fn cookie_scope(&self) -> CookieScope {
        let domain = if self.domain.is_empty() {
            None
        } else {
            Some(self.domain.clone())
        };
        let mut path = if self.domain_all_sites {
            "/".to_string()
        } else {
            self.base_path.clone()
        };
        // "/site/" and "/site" must scope identically.
        if path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        CookieScope::new(domain, path)
    }

    pub fn lifetime(&self) -> CookieLifetime {
        if self.cookie_session {
            CookieLifetime::Session
        } else {
            CookieLifetime::Days(self.cookie_lifetime)
        }
    }

    pub fn required_categories(&self) -> BTreeSet<String> {
        self.cookie_categories
            .values()
            .filter(|spec| spec.checkbox_default_state == CheckboxState::Required)
            .map(|spec| spec.machine_name.clone())
            .collect()
    }

    pub fn all_categories(&self) -> BTreeSet<String> {
        self.cookie_categories
            .values()
            .map(|spec| spec.machine_name.clone())
            .collect()
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join("consentry.schema.json");
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or consentry.schema.json next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// CRM Configuration Types
//
// Configuration schema for a TurCRM backend node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server binding
// - Storage backend and document root
// - SMS provider settings
// - Observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "turcrm.io/v1";
pub const KIND: &str = "CrmConfig";

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfigManifest {
    /// API version (must be "turcrm.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "CrmConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: CrmConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sms: SmsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,

    /// PostgreSQL connection URL (required for the postgres backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply pending migrations when the server starts
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that holds `deal_<id>/` folders of generated documents
    #[serde(default = "default_document_root")]
    pub document_root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    /// Writes messages to the log instead of sending them
    #[default]
    Log,
    Mobizon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub provider: SmsProvider,

    #[serde(default = "default_sms_endpoint")]
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Message body, `{code}` is replaced by the confirmation code
    #[serde(default = "default_message_template")]
    pub message_template: String,

    #[serde(default = "default_sms_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus exporter port, disabled when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_max_connections() -> u32 {
    5
}

fn default_document_root() -> PathBuf {
    PathBuf::from("./document_storage")
}

fn default_sms_endpoint() -> String {
    "https://api.mobizon.kz".to_string()
}

pub fn default_message_template() -> String {
    "Confirmation code: {code}".to_string()
}

fn default_sms_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Memory,
            url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            document_root: default_document_root(),
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: SmsProvider::Log,
            endpoint: default_sms_endpoint(),
            api_key: None,
            message_template: default_message_template(),
            timeout_seconds: default_sms_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

impl Default for CrmConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "turcrm".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: CrmConfigSpec::default(),
        }
    }
}

impl SmsConfig {
    /// Resolve API key from config (supports "env:VAR_NAME" syntax)
    pub fn resolve_api_key(&self) -> Option<String> {
        match &self.api_key {
            Some(k) if k.starts_with("env:") => {
                let var_name = k.trim_start_matches("env:");
                std::env::var(var_name).ok().filter(|v| !v.is_empty())
            }
            Some(k) if !k.is_empty() => Some(k.clone()),
            _ => None,
        }
    }
}

impl CrmConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. TURCRM_CONFIG_PATH environment variable
    /// 2. ./turcrm-config.yaml (working directory)
    /// 3. ~/.turcrm/config.yaml (user home)
    /// 4. /etc/turcrm/config.yaml
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("TURCRM_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./turcrm-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".turcrm").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/turcrm/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TURCRM_DATABASE_URL") {
            if !url.is_empty() {
                tracing::info!("Environment override: TURCRM_DATABASE_URL (backend=postgres)");
                self.spec.database.url = Some(url);
                self.spec.database.backend = DatabaseBackend::Postgres;
            }
        }

        if let Ok(key) = std::env::var("TURCRM_MOBIZON_API_KEY") {
            if !key.is_empty() {
                tracing::info!("Environment override: TURCRM_MOBIZON_API_KEY");
                self.spec.sms.api_key = Some(key);
            }
        }

        if let Ok(root) = std::env::var("TURCRM_DOCUMENT_ROOT") {
            if !root.is_empty() {
                tracing::info!("Environment override: TURCRM_DOCUMENT_ROOT={}", root);
                self.spec.storage.document_root = PathBuf::from(root);
            }
        }
    }

    /// Storage backend selected by `spec.database`
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.spec.database.backend {
            DatabaseBackend::Memory => Ok(StorageBackend::InMemory),
            DatabaseBackend::Postgres => {
                let url = self
                    .spec
                    .database
                    .url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("spec.database.url is required for the postgres backend"))?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string: url,
                    max_connections: self.spec.database.max_connections,
                }))
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.trim().is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }

        if self.spec.database.backend == DatabaseBackend::Postgres
            && self.spec.database.url.as_deref().is_none_or(str::is_empty)
        {
            anyhow::bail!("spec.database.url is required for the postgres backend");
        }

        if self.spec.database.max_connections == 0 {
            anyhow::bail!("spec.database.max_connections must be at least 1");
        }

        if self.spec.storage.document_root.as_os_str().is_empty() {
            anyhow::bail!("spec.storage.document_root cannot be empty");
        }

        let sms = &self.spec.sms;
        if !sms.message_template.contains("{code}") {
            anyhow::bail!("spec.sms.message_template must contain the {{code}} placeholder");
        }

        if sms.provider == SmsProvider::Mobizon {
            if sms.endpoint.trim().is_empty() {
                anyhow::bail!("spec.sms.endpoint cannot be empty for the mobizon provider");
            }
            if sms.api_key.as_deref().is_none_or(str::is_empty) {
                anyhow::bail!("spec.sms.api_key is required for the mobizon provider");
            }
        }

        if sms.timeout_seconds == 0 {
            anyhow::bail!("spec.sms.timeout_seconds must be at least 1");
        }

        Ok(())
    }
}

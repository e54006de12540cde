// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

const MIN_JWT_SECRET_CHARS: usize = 16;
const MAX_JWT_EXPIRATION_HOURS: u64 = 168;
const MAX_UPLOAD_FILE_SIZE_MB: u64 = 100;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    2
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Campanile".to_string(),
            description: "Department portal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// URL prefix of the manage surface.
    pub path: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            path: "/manage".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub audience: String,
    #[serde(default = "default_jwt_expiration_hours")]
    pub expiration_hours: u64,
    #[serde(default = "default_jwt_cookie_name")]
    pub cookie_name: String,
}

fn default_jwt_issuer() -> String {
    "campanile".to_string()
}

fn default_jwt_audience() -> String {
    "campanile-users".to_string()
}

fn default_jwt_expiration_hours() -> u64 {
    12
}

fn default_jwt_cookie_name() -> String {
    "campanile_auth".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_max_file_size_mb() -> u64 {
    20
}

fn default_allowed_extensions() -> Vec<String> {
    [
        "pdf", "doc", "docx", "odt", "xls", "xlsx", "csv", "ppt", "pptx", "png", "jpg", "jpeg",
        "zip",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default = "default_primary_locale")]
    pub primary: Locale,
}

fn default_primary_locale() -> Locale {
    Locale::ZhTw
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_locale(),
        }
    }
}

/// A configuration that passed [`Config::validate`]. Handlers only ever see
/// this type; an invalid file refuses to boot.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub admin: AdminConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
    pub locale: LocaleConfig,
}

impl ValidatedConfig {
    pub fn max_upload_bytes(&self) -> u64 {
        self.upload.max_file_size_mb * 1024 * 1024
    }

    pub fn primary_locale(&self) -> Locale {
        self.locale.primary
    }
}

impl Config {
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|err| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), err))
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|err| {
            ConfigError::LoadError(format!("Failed to parse {}: {}", path.display(), err))
        })?;
        config.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port must be non-zero"));
        }
        if self.server.workers == 0 {
            return Err(invalid("server.workers must be at least 1"));
        }
        if self.app.name.trim().is_empty() {
            return Err(invalid("app.name is required"));
        }
        if !self.admin.path.starts_with('/') || self.admin.path.len() < 2 {
            return Err(invalid("admin.path must be an absolute path such as /manage"));
        }
        if self.auth.jwt.secret.chars().count() < MIN_JWT_SECRET_CHARS {
            return Err(invalid(format!(
                "auth.jwt.secret must be at least {} characters",
                MIN_JWT_SECRET_CHARS
            )));
        }
        if self.auth.jwt.expiration_hours == 0
            || self.auth.jwt.expiration_hours > MAX_JWT_EXPIRATION_HOURS
        {
            return Err(invalid(format!(
                "auth.jwt.expiration_hours must be between 1 and {}",
                MAX_JWT_EXPIRATION_HOURS
            )));
        }
        if self.auth.jwt.cookie_name.trim().is_empty() {
            return Err(invalid("auth.jwt.cookie_name is required"));
        }
        if self.upload.max_file_size_mb == 0
            || self.upload.max_file_size_mb > MAX_UPLOAD_FILE_SIZE_MB
        {
            return Err(invalid(format!(
                "upload.max_file_size_mb must be between 1 and {}",
                MAX_UPLOAD_FILE_SIZE_MB
            )));
        }
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(invalid(format!(
                    "logging.level '{}' is not one of error|warn|info|debug|trace",
                    other
                )));
            }
        }

        Ok(ValidatedConfig {
            server: self.server,
            app: self.app,
            admin: self.admin,
            auth: self.auth,
            upload: self.upload,
            logging: self.logging,
            locale: self.locale,
        })
    }
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use crate::config::{
    AdminConfig, AppConfig, AuthConfig, JwtConfig, LocaleConfig, LoggingConfig, ServerConfig,
    UploadConfig, ValidatedConfig,
};
use crate::locale::Locale;

pub const TEST_JWT_SECRET: &str = "campanile-test-secret";

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5466,
                    workers: 1,
                },
                app: AppConfig {
                    name: "Test Portal".to_string(),
                    description: "Test Description".to_string(),
                },
                admin: AdminConfig {
                    path: "/manage".to_string(),
                },
                auth: AuthConfig {
                    jwt: JwtConfig {
                        secret: TEST_JWT_SECRET.to_string(),
                        issuer: "campanile".to_string(),
                        audience: "campanile-users".to_string(),
                        expiration_hours: 12,
                        cookie_name: "campanile_auth".to_string(),
                    },
                },
                upload: UploadConfig {
                    max_file_size_mb: 1,
                    allowed_extensions: vec!["pdf".to_string(), "png".to_string()],
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
                locale: LocaleConfig {
                    primary: Locale::ZhTw,
                },
            },
        }
    }

    pub fn with_primary_locale(mut self, primary: Locale) -> Self {
        self.config.locale.primary = primary;
        self
    }

    pub fn with_max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.upload.max_file_size_mb = mb;
        self
    }

    pub fn with_admin_path(mut self, path: &str) -> Self {
        self.config.admin.path = path.to_string();
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}

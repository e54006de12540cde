// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{IamError, UsersData, YamlUser, YamlUsersData};
use crate::store;
use std::path::PathBuf;

pub trait UserStore: Send + Sync {
    fn load(&self) -> Result<UsersData, IamError>;
    fn save(&self, users: &UsersData) -> Result<(), IamError>;
}

pub struct FileUserStore {
    users_file: PathBuf,
}

impl FileUserStore {
    pub fn new(users_file: PathBuf) -> Result<Self, IamError> {
        if users_file.as_os_str().is_empty() {
            return Err(IamError::ConfigurationError(
                "Users file path is empty".to_string(),
            ));
        }
        Ok(Self { users_file })
    }
}

impl UserStore for FileUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        let yaml_users: Option<YamlUsersData> =
            store::read_yaml_file(&self.users_file, "users")
                .map_err(|err| IamError::ParseError(err.to_string()))?;

        let mut users = UsersData::new();
        for (email, record) in yaml_users.unwrap_or_default() {
            users.insert(email.clone(), record.into_user(email));
        }
        Ok(users)
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        let yaml_users: YamlUsersData = users
            .iter()
            .map(|(email, user)| (email.clone(), YamlUser::from_user(user)))
            .collect();
        store::write_yaml_file(&self.users_file, "users", &yaml_users)
            .map_err(|err| IamError::FileError(err.to_string()))
    }
}

/// In-memory store for unit tests.
pub struct MemoryUserStore {
    users: std::sync::RwLock<UsersData>,
}

impl MemoryUserStore {
    pub fn new(users: UsersData) -> Self {
        Self {
            users: std::sync::RwLock::new(users),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        self.users
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| IamError::FileError("User store lock poisoned".to_string()))
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        let mut guard = self
            .users
            .write()
            .map_err(|_| IamError::FileError("User store lock poisoned".to_string()))?;
        *guard = users.clone();
        Ok(())
    }
}

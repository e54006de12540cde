// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::jwt::{Claims, JwtService};
use super::password::{hash_password, verify_password};
use super::store::{FileUserStore, UserStore};
use super::types::{IamError, Role, User, UserStatus, UsersData};
use crate::config::ValidatedConfig;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::RwLock;
use uuid::Uuid;

/// Fields an admin update may touch. `None` leaves the field alone.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

pub struct UserServices {
    store: Box<dyn UserStore>,
    users: RwLock<UsersData>,
    jwt: JwtService,
}

impl UserServices {
    pub fn new(store: Box<dyn UserStore>, jwt: JwtService) -> Result<Self, IamError> {
        let users = store.load()?;
        Ok(Self {
            store,
            users: RwLock::new(users),
            jwt,
        })
    }

    pub fn from_file(config: &ValidatedConfig, users_file: PathBuf) -> Result<Self, IamError> {
        let store = FileUserStore::new(users_file)?;
        Self::new(Box::new(store), JwtService::new(config))
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Verify credentials. Suspended and passwordless accounts always fail;
    /// the caller cannot distinguish which check failed.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<User> {
        let user = self.find_by_email(email)?;
        if !user.is_active() {
            log::info!("Rejected login for suspended account {}", email);
            return None;
        }
        let hash = user.password_hash.as_deref()?;
        if verify_password(password, hash) {
            Some(user)
        } else {
            None
        }
    }

    /// Resolve verified JWT claims back to a live user. Accounts deleted or
    /// suspended after token issue stop validating here.
    pub fn validate_claims(&self, claims: &Claims) -> Option<User> {
        let user = self.find_by_email(&claims.sub)?;
        if user.is_active() { Some(user) } else { None }
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().ok()?.get(email).cloned()
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.users
            .read()
            .ok()?
            .values()
            .find(|user| user.id == id)
            .cloned()
    }

    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .read()
            .map(|guard| guard.values().cloned().collect())
            .unwrap_or_default();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        users
    }

    pub fn count(&self) -> usize {
        self.users.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        password: Option<&str>,
        role: Role,
    ) -> Result<User, IamError> {
        let password_hash = password.map(hash_password).transpose()?;
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            status: UserStatus::Active,
            password_hash,
            created_at: Utc::now(),
        };

        let mut users = self.snapshot()?;
        if users.contains_key(email) {
            return Err(IamError::EmailTaken(email.to_string()));
        }
        users.insert(email.to_string(), user.clone());
        self.persist(users)?;
        Ok(user)
    }

    pub fn update_user(&self, email: &str, update: UserUpdate) -> Result<User, IamError> {
        let mut users = self.snapshot()?;
        let user = users
            .get_mut(email)
            .ok_or_else(|| IamError::UserNotFound(email.to_string()))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(status) = update.status {
            user.status = status;
        }
        let updated = user.clone();
        self.persist(users)?;
        Ok(updated)
    }

    pub fn delete_user(&self, email: &str) -> Result<(), IamError> {
        let mut users = self.snapshot()?;
        if users.remove(email).is_none() {
            return Err(IamError::UserNotFound(email.to_string()));
        }
        self.persist(users)
    }

    pub fn set_password(&self, email: &str, password: &str) -> Result<(), IamError> {
        let hash = hash_password(password)?;
        let mut users = self.snapshot()?;
        let user = users
            .get_mut(email)
            .ok_or_else(|| IamError::UserNotFound(email.to_string()))?;
        user.password_hash = Some(hash);
        self.persist(users)
    }

    fn snapshot(&self) -> Result<UsersData, IamError> {
        self.users
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| IamError::FileError("User table lock poisoned".to_string()))
    }

    fn persist(&self, users: UsersData) -> Result<(), IamError> {
        self.store.save(&users)?;
        let mut guard = self
            .users
            .write()
            .map_err(|_| IamError::FileError("User table lock poisoned".to_string()))?;
        *guard = users;
        Ok(())
    }
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Portal roles. `Manager` is the departmental office staff role; it shares
/// most administrative grants with `Admin` but not user management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Teacher,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Teacher => "teacher",
            Role::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "teacher" => Some(Role::Teacher),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// Staff roles see the manage surface.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Teacher)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<UserStatus> {
        match value {
            "active" => Some(UserStatus::Active),
            "suspended" => Some(UserStatus::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: UserStatus,
    /// Argon2 PHC string. Absent for provisioned accounts that have not
    /// claimed a password yet; such accounts cannot authenticate.
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

// The users.yaml file shape: email -> record, id and email split out so the
// file stays keyed the way operators expect to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YamlUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    #[serde(default = "default_status")]
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_status() -> UserStatus {
    UserStatus::Active
}

impl YamlUser {
    pub fn into_user(self, email: String) -> User {
        User {
            id: self.id,
            email,
            name: self.name,
            role: self.role,
            status: self.status,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            status: user.status,
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        }
    }
}

pub type YamlUsersData = HashMap<String, YamlUser>;
pub type UsersData = HashMap<String, User>;

#[derive(Debug, Clone)]
pub enum IamError {
    UserNotFound(String),
    EmailTaken(String),
    ConfigurationError(String),
    FileError(String),
    ParseError(String),
    PasswordError(String),
}

impl std::fmt::Display for IamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IamError::UserNotFound(email) => write!(f, "User not found: {}", email),
            IamError::EmailTaken(email) => write!(f, "Email already registered: {}", email),
            IamError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            IamError::FileError(msg) => write!(f, "File error: {}", msg),
            IamError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            IamError::PasswordError(msg) => write!(f, "Password error: {}", msg),
        }
    }
}

impl std::error::Error for IamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_user_defaults_status_to_active() {
        let yaml = format!(
            "id: {}\nname: Some Teacher\nrole: teacher\ncreated_at: 2025-09-01T00:00:00Z\n",
            Uuid::new_v4()
        );
        let record: YamlUser = serde_yaml::from_str(&yaml).expect("user should deserialize");
        assert_eq!(record.status, UserStatus::Active);
        assert!(record.password_hash.is_none());
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Admin, Role::Manager, Role::Teacher, Role::User] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn staff_roles_exclude_plain_users() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(Role::Teacher.is_staff());
        assert!(!Role::User.is_staff());
    }
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! The people directory: teachers, administrative staff and research labs.

pub mod forms;
pub mod store;

use crate::locale::{Locale, LocalizedText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherRecord {
    pub id: u64,
    /// The portal account that owns this record, once claimed. Ownership
    /// grants the account update rights over the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub bio: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub expertise: LocalizedText,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffRecord {
    pub id: u64,
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub bio: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lab {
    pub id: u64,
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub description: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Member teacher record ids.
    #[serde(default)]
    pub teacher_ids: Vec<u64>,
    #[serde(default)]
    pub tag_ids: Vec<u64>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

/// Sort key for public listings: explicit order first, resolved name as the
/// tie-breaker.
pub fn directory_sort_key(sort_order: i32, name: &LocalizedText, primary: Locale) -> (i32, String) {
    (sort_order, name.resolve(primary).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_breaks_ties_by_name() {
        let a = directory_sort_key(
            1,
            &LocalizedText::new(None, Some("Chen".to_string())),
            Locale::En,
        );
        let b = directory_sort_key(
            1,
            &LocalizedText::new(None, Some("Wang".to_string())),
            Locale::En,
        );
        let c = directory_sort_key(
            0,
            &LocalizedText::new(None, Some("Wu".to_string())),
            Locale::En,
        );
        assert!(c < a && a < b);
    }
}

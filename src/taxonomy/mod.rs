// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Tags and the maintenance operations over them (merge, split).

pub mod forms;
pub mod service;
pub mod store;

use crate::locale::LocalizedText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The surface a tag classifies. Tags never cross contexts; a merge or a
/// lookup is always scoped to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagContext {
    Academic,
    Course,
    Event,
    Admin,
    Lab,
}

impl TagContext {
    pub fn as_str(self) -> &'static str {
        match self {
            TagContext::Academic => "academic",
            TagContext::Course => "course",
            TagContext::Event => "event",
            TagContext::Admin => "admin",
            TagContext::Lab => "lab",
        }
    }

    pub fn parse(value: &str) -> Option<TagContext> {
        match value {
            "academic" => Some(TagContext::Academic),
            "course" => Some(TagContext::Course),
            "event" => Some(TagContext::Event),
            "admin" => Some(TagContext::Admin),
            "lab" => Some(TagContext::Lab),
            _ => None,
        }
    }

    pub const ALL: &'static [TagContext] = &[
        TagContext::Academic,
        TagContext::Course,
        TagContext::Event,
        TagContext::Admin,
        TagContext::Lab,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub context: TagContext,
    pub name: LocalizedText,
    /// Lowercase, unique within the context.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// A tag color is either a hex code (3 to 8 hex digits, `#` optional) or a
/// bare palette identifier like `sky-500`, at most 32 characters.
pub fn color_is_valid(value: &str) -> bool {
    if value.is_empty() || value.chars().count() > 32 {
        return false;
    }
    let hex = value.strip_prefix('#').unwrap_or(value);
    let hex_like =
        (3..=8).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if hex_like {
        return true;
    }
    // Palette identifiers start with a letter and never with '#'.
    value.starts_with(|c: char| c.is_ascii_alphabetic())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

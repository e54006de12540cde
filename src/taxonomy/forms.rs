// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{TagContext, color_is_valid};
use crate::locale::LocalizedText;
use crate::validation::{FieldErrors, parse_delimited_names, trim_to_option};
use serde::Deserialize;

pub const MAX_TAG_NAME_CHARS: usize = 256;
pub const MAX_SPLIT_NAMES: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct TagPayload {
    pub context: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TagPayload {
    pub fn validate(&self) -> Result<TagContext, FieldErrors> {
        let mut errors = FieldErrors::new();

        let context = TagContext::parse(&self.context);
        if context.is_none() {
            errors.add("context", "Unknown tag context");
        }

        if self.name.is_empty() {
            errors.add("name", "Tag name is required in at least one language");
        }
        for value in [self.name.get(crate::locale::Locale::ZhTw), self.name.get(crate::locale::Locale::En)]
            .into_iter()
            .flatten()
        {
            if value.chars().count() > MAX_TAG_NAME_CHARS {
                errors.add(
                    "name",
                    format!("Tag name must be at most {} characters", MAX_TAG_NAME_CHARS),
                );
                break;
            }
        }

        if let Some(color) = trim_to_option(self.color.as_deref())
            && !color_is_valid(&color)
        {
            errors.add("color", "Color must be a hex code or a palette identifier");
        }

        if let Some(slug) = trim_to_option(self.slug.as_deref())
            && !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            errors.add("slug", "Slug may only contain lowercase letters, digits and hyphens");
        }

        match context {
            Some(context) if errors.is_empty() => Ok(context),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeTagsPayload {
    pub target_id: u64,
    #[serde(default)]
    pub source_ids: Vec<u64>,
}

impl MergeTagsPayload {
    /// Shape checks only; existence and context agreement need the store.
    /// The target id is silently dropped from the source set, but the set
    /// must not end up empty.
    pub fn validate(&self) -> Result<Vec<u64>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let sources: Vec<u64> = crate::validation::dedup_ids(&self.source_ids)
            .into_iter()
            .filter(|id| *id != self.target_id)
            .collect();
        if sources.is_empty() {
            errors.add("source_ids", "At least one source tag other than the target is required");
        }
        errors.into_result(sources)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitTagPayload {
    /// Comma or newline separated new names.
    pub names: String,
    #[serde(default)]
    pub keep_original: bool,
    #[serde(default)]
    pub color: Option<String>,
}

impl SplitTagPayload {
    pub fn validate(&self) -> Result<Vec<String>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let names = parse_delimited_names(&self.names);
        if names.is_empty() {
            errors.add("names", "At least one new tag name is required");
        }
        if names.len() > MAX_SPLIT_NAMES {
            errors.add(
                "names",
                format!("A split may produce at most {} tags", MAX_SPLIT_NAMES),
            );
        }
        if names
            .iter()
            .any(|name| name.chars().count() > MAX_TAG_NAME_CHARS)
        {
            errors.add(
                "names",
                format!("Tag names must be at most {} characters", MAX_TAG_NAME_CHARS),
            );
        }
        if let Some(color) = trim_to_option(self.color.as_deref())
            && !color_is_valid(&color)
        {
            errors.add("color", "Color must be a hex code or a palette identifier");
        }
        errors.into_result(names)
    }
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{PostStatus, PostVisibility};
use crate::attachments::{MAX_ATTACHMENTS_PER_OWNER, MAX_LINK_URL_CHARS, MAX_TITLE_CHARS};
use crate::locale::{Locale, LocalizedText};
use crate::validation::{FieldErrors, dedup_ids, trim_to_option};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const MAX_POST_TITLE_CHARS: usize = 255;
pub const MAX_POST_SLUG_CHARS: usize = 255;

#[derive(Debug, Clone, Deserialize)]
pub struct NewFilePayload {
    pub filename: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64-encoded file body.
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLinkPayload {
    pub title: String,
    pub external_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostPayload {
    pub title: LocalizedText,
    #[serde(default)]
    pub summary: LocalizedText,
    pub content: LocalizedText,
    #[serde(default)]
    pub slug: Option<String>,
    pub status: String,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub tag_ids: Vec<u64>,
    /// Attachment ids to keep on update; everything else is removed.
    #[serde(default)]
    pub kept_attachment_ids: Vec<u64>,
    #[serde(default)]
    pub new_files: Vec<NewFilePayload>,
    #[serde(default)]
    pub new_links: Vec<NewLinkPayload>,
}

/// Normalized output of a successful validation, ready to apply to a post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: LocalizedText,
    pub summary: LocalizedText,
    pub content: LocalizedText,
    /// `None` means derive from the title.
    pub slug: Option<String>,
    pub status: PostStatus,
    pub visibility: PostVisibility,
    pub publish_at: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub pinned: bool,
    pub category_id: Option<u64>,
    pub tag_ids: Vec<u64>,
    pub kept_attachment_ids: Vec<u64>,
}

/// Store lookups the validation rules need, passed as closures so the form
/// stays decoupled from the store types.
pub struct PostFormContext<'a> {
    pub exclude_id: Option<u64>,
    pub primary: Locale,
    pub now: DateTime<Utc>,
    pub max_file_bytes: u64,
    pub slug_taken: &'a dyn Fn(&str) -> bool,
    pub category_exists: &'a dyn Fn(u64) -> bool,
    pub tag_exists: &'a dyn Fn(u64) -> bool,
}

impl PostPayload {
    /// Runs every rule and aggregates failures; nothing short-circuits.
    pub fn validate(&self, ctx: &PostFormContext<'_>) -> Result<PostDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.title.get(ctx.primary).is_none() {
            errors.add("title", "Title is required in the primary language");
        }
        for value in [self.title.get(Locale::ZhTw), self.title.get(Locale::En)]
            .into_iter()
            .flatten()
        {
            if value.chars().count() > MAX_POST_TITLE_CHARS {
                errors.add(
                    "title",
                    format!("Title must be at most {} characters", MAX_POST_TITLE_CHARS),
                );
                break;
            }
        }
        if self.content.get(ctx.primary).is_none() {
            errors.add("content", "Content is required in the primary language");
        }

        let slug = trim_to_option(self.slug.as_deref());
        if let Some(slug) = &slug {
            if slug.chars().count() > MAX_POST_SLUG_CHARS {
                errors.add(
                    "slug",
                    format!("Slug must be at most {} characters", MAX_POST_SLUG_CHARS),
                );
            }
            if !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                errors.add(
                    "slug",
                    "Slug may only contain lowercase letters, digits and hyphens",
                );
            }
            if (ctx.slug_taken)(slug) {
                errors.add("slug", "Slug already in use");
            }
        }

        let status = PostStatus::parse(&self.status);
        if status.is_none() {
            errors.add("status", "Unknown post status");
        }
        let visibility = match self.visibility.as_deref() {
            None => Some(PostVisibility::Public),
            Some(value) => {
                let parsed = PostVisibility::parse(value);
                if parsed.is_none() {
                    errors.add("visibility", "Unknown visibility");
                }
                parsed
            }
        };

        if status == Some(PostStatus::Scheduled) {
            match self.published_at {
                None => {
                    errors.add("published_at", "A publish date is required for scheduled posts")
                }
                Some(at) if at <= ctx.now => {
                    errors.add("published_at", "The publish date must be in the future")
                }
                Some(_) => {}
            }
        }
        if let (Some(publish), Some(expire)) = (self.published_at, self.expire_at)
            && expire <= publish
        {
            errors.add("expire_at", "The expiry date must be after the publish date");
        }

        if let Some(category_id) = self.category_id
            && !(ctx.category_exists)(category_id)
        {
            errors.add("category_id", "Category does not exist");
        }

        let tag_ids = dedup_ids(&self.tag_ids);
        for tag_id in &tag_ids {
            if !(ctx.tag_exists)(*tag_id) {
                errors.add("tag_ids", format!("Tag {} does not exist", tag_id));
            }
        }

        let kept_attachment_ids = dedup_ids(&self.kept_attachment_ids);
        let attachment_total =
            kept_attachment_ids.len() + self.new_files.len() + self.new_links.len();
        if attachment_total > MAX_ATTACHMENTS_PER_OWNER {
            // One aggregate error, not one per item.
            errors.add(
                "attachments",
                format!(
                    "A post may carry at most {} attachments ({} requested)",
                    MAX_ATTACHMENTS_PER_OWNER, attachment_total
                ),
            );
        }
        for link in &self.new_links {
            if trim_to_option(Some(&link.title)).is_none() {
                errors.add("new_links", "Link attachments require a title");
            } else if link.title.chars().count() > MAX_TITLE_CHARS {
                errors.add(
                    "new_links",
                    format!("Link titles must be at most {} characters", MAX_TITLE_CHARS),
                );
            }
            if link.external_url.chars().count() > MAX_LINK_URL_CHARS {
                errors.add(
                    "new_links",
                    format!("Link URLs must be at most {} characters", MAX_LINK_URL_CHARS),
                );
            }
            if !(link.external_url.starts_with("http://")
                || link.external_url.starts_with("https://"))
            {
                errors.add("new_links", "Link URLs must use http or https");
            }
        }
        for file in &self.new_files {
            if trim_to_option(Some(&file.filename)).is_none() {
                errors.add("new_files", "File attachments require a filename");
            }
            if file.content.is_empty() {
                errors.add("new_files", "File attachments require content");
            }
            // Base64 inflates by 4/3; compare in encoded space to avoid
            // decoding oversized bodies.
            let max_encoded = ctx.max_file_bytes.saturating_mul(4) / 3 + 4;
            if file.content.len() as u64 > max_encoded {
                errors.add(
                    "new_files",
                    format!(
                        "Files must be at most {} bytes",
                        ctx.max_file_bytes
                    ),
                );
            }
        }

        let (Some(status), Some(visibility)) = (status, visibility) else {
            return Err(errors);
        };
        errors.into_result(PostDraft {
            title: self.title.clone(),
            summary: self.summary.clone(),
            content: self.content.clone(),
            slug,
            status,
            visibility,
            publish_at: self.published_at,
            expire_at: self.expire_at,
            pinned: self.pinned,
            category_id: self.category_id,
            tag_ids,
            kept_attachment_ids,
        })
    }
}

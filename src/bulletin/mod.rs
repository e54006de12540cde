// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Bulletin posts: the department's announcement stream.

pub mod forms;
pub mod store;

use crate::locale::LocalizedText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
    Hidden,
    Archived,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Hidden => "hidden",
            PostStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<PostStatus> {
        match value {
            "draft" => Some(PostStatus::Draft),
            "scheduled" => Some(PostStatus::Scheduled),
            "published" => Some(PostStatus::Published),
            "hidden" => Some(PostStatus::Hidden),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }

    /// Allowed status moves. Archived is terminal; hidden and published
    /// swap freely.
    pub fn can_transition_to(self, next: PostStatus) -> bool {
        use PostStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Draft, Scheduled)
                | (Draft, Published)
                | (Scheduled, Published)
                | (Scheduled, Draft)
                | (Published, Hidden)
                | (Published, Archived)
                | (Hidden, Published)
                | (Hidden, Archived)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostVisibility {
    Public,
    Internal,
}

impl PostVisibility {
    pub fn parse(value: &str) -> Option<PostVisibility> {
        match value {
            "public" => Some(PostVisibility::Public),
            "internal" => Some(PostVisibility::Internal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub summary: LocalizedText,
    pub content: LocalizedText,
    pub status: PostStatus,
    pub visibility: PostVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub tag_ids: Vec<u64>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Derived, never stored. `publish_at == now` is visible;
    /// `expire_at == now` is not.
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        !self.is_deleted()
            && self.visibility == PostVisibility::Public
            && self.status == PostStatus::Published
            && self.publish_at.is_none_or(|at| at <= now)
            && self.expire_at.is_none_or(|at| at > now)
    }
}

/// Categories form a small tree via `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCategory {
    pub id: u64,
    pub name: LocalizedText,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub sort_order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post_with_window(
        status: PostStatus,
        publish_at: Option<DateTime<Utc>>,
        expire_at: Option<DateTime<Utc>>,
    ) -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            slug: "orientation".to_string(),
            title: LocalizedText::new(None, Some("Orientation".to_string())),
            summary: LocalizedText::default(),
            content: LocalizedText::new(None, Some("Welcome".to_string())),
            status,
            visibility: PostVisibility::Public,
            publish_at,
            expire_at,
            pinned: false,
            category_id: None,
            tag_ids: vec![],
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn visibility_boundary_semantics() {
        let now = Utc::now();
        // publish_at == now: visible.
        let post = post_with_window(PostStatus::Published, Some(now), None);
        assert!(post.is_publicly_visible(now));
        // expire_at == now: no longer visible.
        let post = post_with_window(
            PostStatus::Published,
            Some(now - Duration::hours(1)),
            Some(now),
        );
        assert!(!post.is_publicly_visible(now));
        // Open-ended window with a past publish date.
        let post = post_with_window(
            PostStatus::Published,
            Some(now - Duration::hours(1)),
            Some(now + Duration::seconds(1)),
        );
        assert!(post.is_publicly_visible(now));
    }

    #[test]
    fn future_publish_date_hides_published_post() {
        let now = Utc::now();
        let post = post_with_window(PostStatus::Published, Some(now + Duration::minutes(5)), None);
        assert!(!post.is_publicly_visible(now));
    }

    #[test]
    fn non_published_statuses_are_never_visible() {
        let now = Utc::now();
        for status in [
            PostStatus::Draft,
            PostStatus::Scheduled,
            PostStatus::Hidden,
            PostStatus::Archived,
        ] {
            let post = post_with_window(status, Some(now - Duration::hours(1)), None);
            assert!(!post.is_publicly_visible(now), "{:?}", status);
        }
    }

    #[test]
    fn internal_and_deleted_posts_are_hidden() {
        let now = Utc::now();
        let mut post = post_with_window(PostStatus::Published, Some(now), None);
        post.visibility = PostVisibility::Internal;
        assert!(!post.is_publicly_visible(now));

        let mut post = post_with_window(PostStatus::Published, Some(now), None);
        post.deleted_at = Some(now);
        assert!(!post.is_publicly_visible(now));
    }

    #[test]
    fn archived_is_terminal() {
        for next in [
            PostStatus::Draft,
            PostStatus::Scheduled,
            PostStatus::Published,
            PostStatus::Hidden,
        ] {
            assert!(!PostStatus::Archived.can_transition_to(next), "{:?}", next);
        }
        assert!(PostStatus::Archived.can_transition_to(PostStatus::Archived));
    }

    #[test]
    fn hidden_and_published_swap_both_ways() {
        assert!(PostStatus::Published.can_transition_to(PostStatus::Hidden));
        assert!(PostStatus::Hidden.can_transition_to(PostStatus::Published));
        assert!(!PostStatus::Hidden.can_transition_to(PostStatus::Draft));
        assert!(!PostStatus::Published.can_transition_to(PostStatus::Scheduled));
    }
}

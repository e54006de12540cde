// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{Post, PostCategory, PostStatus};
use crate::store::{self, StoreError};
use crate::taxonomy::service::TaggedCollection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const POSTS_FILE_NAME: &str = "posts.yaml";
const CATEGORIES_FILE_NAME: &str = "categories.yaml";

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Offset pagination envelope shared by the listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

impl<T> Page<T> {
    pub fn slice(mut items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let total = items.len();
        let start = (page - 1).saturating_mul(per_page).min(total);
        let end = start.saturating_add(per_page).min(total);
        let items = items.drain(start..end).collect();
        Page {
            items,
            total,
            page,
            per_page,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

impl PostQuery {
    fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> usize {
        self.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug)]
pub struct PostStoreError {
    message: String,
}

impl PostStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for PostStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PostStoreError {}

impl From<StoreError> for PostStoreError {
    fn from(err: StoreError) -> Self {
        PostStoreError::new(err.to_string())
    }
}

pub struct PostStore {
    posts_file: PathBuf,
    posts: RwLock<BTreeMap<u64, Post>>,
}

impl PostStore {
    pub fn new(state_dir: &Path) -> Result<Self, PostStoreError> {
        let posts_file = state_dir.join(POSTS_FILE_NAME);
        let raw: Option<BTreeMap<u64, Post>> = store::read_yaml_file(&posts_file, "posts")?;
        Ok(Self {
            posts_file,
            posts: RwLock::new(raw.unwrap_or_default()),
        })
    }

    pub fn snapshot(&self) -> Result<BTreeMap<u64, Post>, PostStoreError> {
        self.posts
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))
    }

    pub fn persist(&self, posts: BTreeMap<u64, Post>) -> Result<(), PostStoreError> {
        store::write_yaml_file(&self.posts_file, "posts", &posts)?;
        let mut guard = self
            .posts
            .write()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        *guard = posts;
        Ok(())
    }

    pub fn next_id(&self) -> Result<u64, PostStoreError> {
        let guard = self
            .posts
            .read()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        Ok(guard.keys().next_back().copied().unwrap_or(0) + 1)
    }

    pub fn get(&self, id: u64) -> Result<Option<Post>, PostStoreError> {
        let guard = self
            .posts
            .read()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        Ok(guard.get(&id).filter(|post| !post.is_deleted()).cloned())
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, PostStoreError> {
        let guard = self
            .posts
            .read()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        Ok(guard
            .values()
            .find(|post| post.slug == slug && !post.is_deleted())
            .cloned())
    }

    /// Uniqueness ignores soft-deleted rows and, on update, the record
    /// itself.
    pub fn slug_exists(&self, slug: &str, exclude_id: Option<u64>) -> Result<bool, PostStoreError> {
        let guard = self
            .posts
            .read()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        Ok(guard.values().any(|post| {
            post.slug == slug && !post.is_deleted() && Some(post.id) != exclude_id
        }))
    }

    pub fn soft_delete(&self, id: u64) -> Result<bool, PostStoreError> {
        let mut posts = self.snapshot()?;
        let Some(post) = posts.get_mut(&id).filter(|post| !post.is_deleted()) else {
            return Ok(false);
        };
        post.deleted_at = Some(Utc::now());
        self.persist(posts)?;
        Ok(true)
    }

    /// Filtering happens inside the query, never on a materialized public
    /// list. Sort is pinned first, then newest publish date.
    pub fn public_page(
        &self,
        query: &PostQuery,
        now: DateTime<Utc>,
    ) -> Result<Page<Post>, PostStoreError> {
        let needle = query.search.as_deref().map(str::to_lowercase);
        let guard = self
            .posts
            .read()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        let mut items: Vec<Post> = guard
            .values()
            .filter(|post| post.is_publicly_visible(now))
            .filter(|post| query.category_id.is_none_or(|c| post.category_id == Some(c)))
            .filter(|post| match &needle {
                None => true,
                Some(needle) => {
                    post.title.matches(needle) || post.summary.matches(needle)
                }
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.pinned.cmp(&a.pinned).then_with(|| {
                let a_date = a.publish_at.unwrap_or(a.created_at);
                let b_date = b.publish_at.unwrap_or(b.created_at);
                b_date.cmp(&a_date)
            })
        });
        Ok(Page::slice(items, query.page(), query.per_page()))
    }

    /// Manage listing: soft-deleted rows excluded, optional status filter,
    /// newest update first.
    pub fn manage_page(&self, query: &PostQuery) -> Result<Page<Post>, PostStoreError> {
        let status = query.status.as_deref().and_then(PostStatus::parse);
        let needle = query.search.as_deref().map(str::to_lowercase);
        let guard = self
            .posts
            .read()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        let mut items: Vec<Post> = guard
            .values()
            .filter(|post| !post.is_deleted())
            .filter(|post| status.is_none_or(|s| post.status == s))
            .filter(|post| query.category_id.is_none_or(|c| post.category_id == Some(c)))
            .filter(|post| match &needle {
                None => true,
                Some(needle) => {
                    post.title.matches(needle) || post.summary.matches(needle)
                }
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(Page::slice(items, query.page(), query.per_page()))
    }

    pub fn count_by_status(&self) -> Result<BTreeMap<&'static str, usize>, PostStoreError> {
        let guard = self
            .posts
            .read()
            .map_err(|_| PostStoreError::new("Post store lock poisoned"))?;
        let mut counts = BTreeMap::new();
        for post in guard.values().filter(|post| !post.is_deleted()) {
            *counts.entry(post.status.as_str()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

impl TaggedCollection for PostStore {
    fn label(&self) -> &'static str {
        "posts"
    }

    fn reassign_tag(&self, sources: &[u64], target: u64) -> Result<usize, String> {
        let mut posts = self.snapshot().map_err(|err| err.to_string())?;
        let mut affected = 0;
        for post in posts.values_mut() {
            if !post.tag_ids.iter().any(|tag| sources.contains(tag)) {
                continue;
            }
            let mut seen = std::collections::HashSet::new();
            post.tag_ids = post
                .tag_ids
                .iter()
                .map(|tag| if sources.contains(tag) { target } else { *tag })
                .filter(|tag| seen.insert(*tag))
                .collect();
            post.updated_at = Utc::now();
            affected += 1;
        }
        if affected > 0 {
            self.persist(posts).map_err(|err| err.to_string())?;
        }
        Ok(affected)
    }

    fn count_for_tag(&self, tag_id: u64) -> Result<usize, String> {
        let posts = self.snapshot().map_err(|err| err.to_string())?;
        Ok(posts
            .values()
            .filter(|post| !post.is_deleted() && post.tag_ids.contains(&tag_id))
            .count())
    }
}

pub struct CategoryStore {
    categories_file: PathBuf,
    categories: RwLock<BTreeMap<u64, PostCategory>>,
}

impl CategoryStore {
    pub fn new(state_dir: &Path) -> Result<Self, PostStoreError> {
        let categories_file = state_dir.join(CATEGORIES_FILE_NAME);
        let raw: Option<BTreeMap<u64, PostCategory>> =
            store::read_yaml_file(&categories_file, "categories")?;
        Ok(Self {
            categories_file,
            categories: RwLock::new(raw.unwrap_or_default()),
        })
    }

    pub fn snapshot(&self) -> Result<BTreeMap<u64, PostCategory>, PostStoreError> {
        self.categories
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| PostStoreError::new("Category store lock poisoned"))
    }

    pub fn persist(&self, categories: BTreeMap<u64, PostCategory>) -> Result<(), PostStoreError> {
        store::write_yaml_file(&self.categories_file, "categories", &categories)?;
        let mut guard = self
            .categories
            .write()
            .map_err(|_| PostStoreError::new("Category store lock poisoned"))?;
        *guard = categories;
        Ok(())
    }

    pub fn exists(&self, id: u64) -> Result<bool, PostStoreError> {
        Ok(self.snapshot()?.contains_key(&id))
    }

    /// Flat list ordered as a tree walk: roots by sort order, children
    /// after their parent.
    pub fn list_tree(&self) -> Result<Vec<PostCategory>, PostStoreError> {
        let categories = self.snapshot()?;
        let mut roots: Vec<&PostCategory> = categories
            .values()
            .filter(|category| category.parent_id.is_none())
            .collect();
        roots.sort_by_key(|category| (category.sort_order, category.id));
        let mut ordered = Vec::with_capacity(categories.len());
        for root in roots {
            ordered.push(root.clone());
            let mut children: Vec<&PostCategory> = categories
                .values()
                .filter(|category| category.parent_id == Some(root.id))
                .collect();
            children.sort_by_key(|category| (category.sort_order, category.id));
            ordered.extend(children.into_iter().cloned());
        }
        Ok(ordered)
    }
}

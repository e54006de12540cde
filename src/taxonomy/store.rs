// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{Tag, TagContext};
use crate::store::{self, StoreError};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const TAGS_FILE_NAME: &str = "tags.yaml";
const MAX_TAG_COUNT: usize = 10000;

#[derive(Debug)]
pub struct TagStoreError {
    message: String,
}

impl TagStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TagStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TagStoreError {}

impl From<StoreError> for TagStoreError {
    fn from(err: StoreError) -> Self {
        TagStoreError::new(err.to_string())
    }
}

pub struct TagStore {
    tags_file: PathBuf,
    tags: RwLock<BTreeMap<u64, Tag>>,
}

impl TagStore {
    pub fn new(state_dir: &Path) -> Result<Self, TagStoreError> {
        let tags_file = state_dir.join(TAGS_FILE_NAME);
        let tags = Self::load_from_disk(&tags_file)?;
        Ok(Self {
            tags_file,
            tags: RwLock::new(tags),
        })
    }

    pub fn snapshot(&self) -> Result<BTreeMap<u64, Tag>, TagStoreError> {
        self.tags
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| TagStoreError::new("Tag store lock poisoned"))
    }

    pub fn persist(&self, tags: BTreeMap<u64, Tag>) -> Result<(), TagStoreError> {
        if tags.len() > MAX_TAG_COUNT {
            return Err(TagStoreError::new(format!(
                "Tags must be at most {} entries",
                MAX_TAG_COUNT
            )));
        }
        store::write_yaml_file(&self.tags_file, "tags", &tags)?;
        let mut guard = self
            .tags
            .write()
            .map_err(|_| TagStoreError::new("Tag store lock poisoned"))?;
        *guard = tags;
        Ok(())
    }

    /// Ids are monotonic per file; the successor of the highest id on disk.
    pub fn next_id(&self) -> Result<u64, TagStoreError> {
        let guard = self
            .tags
            .read()
            .map_err(|_| TagStoreError::new("Tag store lock poisoned"))?;
        Ok(guard.keys().next_back().copied().unwrap_or(0) + 1)
    }

    pub fn get(&self, id: u64) -> Result<Option<Tag>, TagStoreError> {
        let guard = self
            .tags
            .read()
            .map_err(|_| TagStoreError::new("Tag store lock poisoned"))?;
        Ok(guard.get(&id).cloned())
    }

    /// Tags for one context, active only unless asked otherwise, ordered by
    /// sort order then slug.
    pub fn list(
        &self,
        context: Option<TagContext>,
        include_inactive: bool,
    ) -> Result<Vec<Tag>, TagStoreError> {
        let guard = self
            .tags
            .read()
            .map_err(|_| TagStoreError::new("Tag store lock poisoned"))?;
        let mut tags: Vec<Tag> = guard
            .values()
            .filter(|tag| context.is_none_or(|c| tag.context == c))
            .filter(|tag| include_inactive || tag.is_active)
            .cloned()
            .collect();
        tags.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(tags)
    }

    pub fn slug_exists(
        &self,
        context: TagContext,
        slug: &str,
        exclude_id: Option<u64>,
    ) -> Result<bool, TagStoreError> {
        let guard = self
            .tags
            .read()
            .map_err(|_| TagStoreError::new("Tag store lock poisoned"))?;
        Ok(guard.values().any(|tag| {
            tag.context == context && tag.slug == slug && Some(tag.id) != exclude_id
        }))
    }

    /// Case-insensitive exact name match within a context, any locale.
    pub fn find_by_name(
        &self,
        context: TagContext,
        name: &str,
    ) -> Result<Option<Tag>, TagStoreError> {
        let needle = name.to_lowercase();
        let guard = self
            .tags
            .read()
            .map_err(|_| TagStoreError::new("Tag store lock poisoned"))?;
        Ok(guard
            .values()
            .find(|tag| tag.context == context && tag.name.equals_ignore_case(&needle))
            .cloned())
    }

    pub fn generate_unique_slug(
        &self,
        context: TagContext,
        base: &str,
    ) -> Result<String, TagStoreError> {
        let base = slugify(base);
        if !self.slug_exists(context, &base, None)? {
            return Ok(base);
        }
        for n in 2.. {
            let candidate = format!("{}-{}", base, n);
            if !self.slug_exists(context, &candidate, None)? {
                return Ok(candidate);
            }
        }
        unreachable!()
    }

    fn load_from_disk(tags_file: &Path) -> Result<BTreeMap<u64, Tag>, TagStoreError> {
        let raw: Option<BTreeMap<u64, Tag>> = store::read_yaml_file(tags_file, "tags")?;
        Ok(raw.unwrap_or_default())
    }
}

/// Lowercase ASCII alphanumerics, runs of everything else collapse to one
/// hyphen. Non-ASCII names fall back to `tag`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_hyphen = true;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "tag".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocalizedText;
    use crate::util::test_fixtures::TestFixtureRoot;
    use chrono::Utc;

    pub(crate) fn sample_tag(id: u64, context: TagContext, en_name: &str) -> Tag {
        let now = Utc::now();
        Tag {
            id,
            context,
            name: LocalizedText {
                zh_tw: None,
                en: Some(en_name.to_string()),
            },
            slug: slugify(en_name),
            color: None,
            sort_order: 0,
            is_active: true,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Machine Learning"), "machine-learning");
        assert_eq!(slugify("  AI / ML  "), "ai-ml");
        assert_eq!(slugify("C++"), "c");
        assert_eq!(slugify("資訊工程"), "tag");
    }

    #[test]
    fn store_persists_and_reloads() {
        let fixture = TestFixtureRoot::new_unique("tag-store-persist").unwrap();
        let store = TagStore::new(fixture.state_dir()).unwrap();

        let mut tags = BTreeMap::new();
        tags.insert(1, sample_tag(1, TagContext::Course, "Algorithms"));
        tags.insert(7, sample_tag(7, TagContext::Event, "Seminar"));
        store.persist(tags).unwrap();
        assert_eq!(store.next_id().unwrap(), 8);

        let reloaded = TagStore::new(fixture.state_dir()).unwrap();
        assert_eq!(reloaded.snapshot().unwrap().len(), 2);
        assert_eq!(reloaded.next_id().unwrap(), 8);
    }

    #[test]
    fn list_filters_context_and_inactive() {
        let fixture = TestFixtureRoot::new_unique("tag-store-list").unwrap();
        let store = TagStore::new(fixture.state_dir()).unwrap();

        let mut tags = BTreeMap::new();
        tags.insert(1, sample_tag(1, TagContext::Course, "Algorithms"));
        let mut retired = sample_tag(2, TagContext::Course, "Pascal");
        retired.is_active = false;
        tags.insert(2, retired);
        tags.insert(3, sample_tag(3, TagContext::Event, "Seminar"));
        store.persist(tags).unwrap();

        let active = store.list(Some(TagContext::Course), false).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].slug, "algorithms");

        let all_course = store.list(Some(TagContext::Course), true).unwrap();
        assert_eq!(all_course.len(), 2);

        let everything = store.list(None, true).unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn unique_slug_appends_counter() {
        let fixture = TestFixtureRoot::new_unique("tag-store-slug").unwrap();
        let store = TagStore::new(fixture.state_dir()).unwrap();

        let mut tags = BTreeMap::new();
        tags.insert(1, sample_tag(1, TagContext::Course, "Algorithms"));
        store.persist(tags).unwrap();

        let slug = store
            .generate_unique_slug(TagContext::Course, "Algorithms")
            .unwrap();
        assert_eq!(slug, "algorithms-2");
        // Same name in another context stays untouched.
        let other = store
            .generate_unique_slug(TagContext::Event, "Algorithms")
            .unwrap();
        assert_eq!(other, "algorithms");
    }

    #[test]
    fn find_by_name_ignores_case_across_locales() {
        let fixture = TestFixtureRoot::new_unique("tag-store-find").unwrap();
        let store = TagStore::new(fixture.state_dir()).unwrap();

        let mut tags = BTreeMap::new();
        tags.insert(1, sample_tag(1, TagContext::Course, "Machine Learning"));
        store.persist(tags).unwrap();

        assert!(
            store
                .find_by_name(TagContext::Course, "machine learning")
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_by_name(TagContext::Event, "machine learning")
                .unwrap()
                .is_none()
        );
        // Partial names never match.
        assert!(
            store
                .find_by_name(TagContext::Course, "machine")
                .unwrap()
                .is_none()
        );
    }
}

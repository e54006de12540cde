// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Tag maintenance: merge duplicates into one canonical tag, split an
//! overloaded tag into several.

use super::store::{TagStore, slugify};
use super::{Tag, TagContext};
use crate::locale::LocalizedText;
use crate::validation::{FieldErrors, trim_to_option};
use chrono::Utc;
use std::fmt;

/// A resource collection whose records carry tag id lists. Merging re-points
/// every collection registered with the service.
pub trait TaggedCollection: Send + Sync {
    fn label(&self) -> &'static str;

    /// Replace any of `sources` with `target` in each record, collapsing
    /// duplicates. Returns the number of records changed.
    fn reassign_tag(&self, sources: &[u64], target: u64) -> Result<usize, String>;

    /// How many records currently reference the tag.
    fn count_for_tag(&self, tag_id: u64) -> Result<usize, String>;
}

#[derive(Debug)]
pub enum TaxonomyError {
    Validation(FieldErrors),
    NotFound,
    Store(String),
}

impl fmt::Display for TaxonomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            TaxonomyError::NotFound => write!(f, "Tag not found"),
            TaxonomyError::Store(msg) => write!(f, "Tag store error: {}", msg),
        }
    }
}

impl std::error::Error for TaxonomyError {}

impl From<super::store::TagStoreError> for TaxonomyError {
    fn from(err: super::store::TagStoreError) -> Self {
        TaxonomyError::Store(err.to_string())
    }
}

impl From<FieldErrors> for TaxonomyError {
    fn from(errors: FieldErrors) -> Self {
        TaxonomyError::Validation(errors)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MergeOutcome {
    pub affected_resources: usize,
    pub deactivated_tags: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SplitOutcome {
    pub tags: Vec<Tag>,
    pub original_deactivated: bool,
}

/// Merge `sources` into `target`: every record pointing at a source is
/// re-pointed at the target, then the sources are deactivated. All
/// validation completes before the first write; a rejected merge leaves
/// both the tag file and the collections untouched.
pub fn merge_tags(
    store: &TagStore,
    collections: &[&dyn TaggedCollection],
    target_id: u64,
    source_ids: &[u64],
) -> Result<MergeOutcome, TaxonomyError> {
    let mut tags = store.snapshot()?;

    let mut errors = FieldErrors::new();
    let target_context = match tags.get(&target_id) {
        Some(target) => Some(target.context),
        None => {
            errors.add("target_id", "Target tag does not exist");
            None
        }
    };
    for source_id in source_ids {
        match tags.get(source_id) {
            None => errors.add("source_ids", format!("Tag {} does not exist", source_id)),
            Some(source) => {
                if let Some(context) = target_context
                    && source.context != context
                {
                    errors.add(
                        "source_ids",
                        format!(
                            "Tag {} belongs to the {} context, not {}",
                            source_id,
                            source.context.as_str(),
                            context.as_str()
                        ),
                    );
                }
            }
        }
    }
    errors.into_result(())?;

    let mut affected_resources = 0;
    for collection in collections {
        affected_resources += collection
            .reassign_tag(source_ids, target_id)
            .map_err(|err| {
                TaxonomyError::Store(format!(
                    "Failed to re-point {} records: {}",
                    collection.label(),
                    err
                ))
            })?;
    }

    let now = Utc::now();
    for source_id in source_ids {
        if let Some(source) = tags.get_mut(source_id) {
            source.is_active = false;
            source.updated_at = now;
        }
    }
    if let Some(target) = tags.get_mut(&target_id) {
        target.last_used_at = Some(now);
        target.updated_at = now;
    }
    store.persist(tags)?;

    log::info!(
        "Merged {} tags into tag {} ({} resources re-pointed)",
        source_ids.len(),
        target_id,
        affected_resources
    );
    Ok(MergeOutcome {
        affected_resources,
        deactivated_tags: source_ids.len(),
    })
}

/// Split a tag into several named tags within the same context. Names that
/// match an existing tag case-insensitively reuse it (reactivating it when
/// needed); the rest become new tags. The original is deactivated unless
/// `keep_original` is set.
pub fn split_tag(
    store: &TagStore,
    tag_id: u64,
    names: &[String],
    keep_original: bool,
    color: Option<&str>,
) -> Result<SplitOutcome, TaxonomyError> {
    let mut tags = store.snapshot()?;
    let original = tags.get(&tag_id).cloned().ok_or(TaxonomyError::NotFound)?;
    let context = original.context;
    let inherited_color = trim_to_option(color).or_else(|| original.color.clone());

    let now = Utc::now();
    let mut next_id = tags.keys().next_back().copied().unwrap_or(0) + 1;
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let needle = name.to_lowercase();
        let existing = tags
            .values()
            .find(|tag| {
                tag.context == context && tag.name.equals_ignore_case(&needle) && tag.id != tag_id
            })
            .map(|tag| tag.id);

        match existing {
            Some(id) => {
                let tag = tags.get_mut(&id).ok_or(TaxonomyError::NotFound)?;
                if !tag.is_active {
                    tag.is_active = true;
                    tag.updated_at = now;
                }
                result.push(tag.clone());
            }
            None => {
                let slug = unique_slug_in(&tags, context, name);
                let tag = Tag {
                    id: next_id,
                    context,
                    name: localized_name(name),
                    slug,
                    color: inherited_color.clone(),
                    sort_order: original.sort_order,
                    is_active: true,
                    last_used_at: None,
                    created_at: now,
                    updated_at: now,
                };
                next_id += 1;
                result.push(tag.clone());
                tags.insert(tag.id, tag);
            }
        }
    }

    let original_deactivated = !keep_original;
    if original_deactivated
        && let Some(tag) = tags.get_mut(&tag_id)
    {
        tag.is_active = false;
        tag.updated_at = now;
    }
    store.persist(tags)?;

    log::info!(
        "Split tag {} into {} tags (original {})",
        tag_id,
        result.len(),
        if original_deactivated { "deactivated" } else { "kept" }
    );
    Ok(SplitOutcome {
        tags: result,
        original_deactivated,
    })
}

pub fn create_tag(
    store: &TagStore,
    context: TagContext,
    payload: &super::forms::TagPayload,
) -> Result<Tag, TaxonomyError> {
    let mut tags = store.snapshot()?;
    let now = Utc::now();

    let slug = match trim_to_option(payload.slug.as_deref()) {
        Some(slug) => {
            if tags
                .values()
                .any(|tag| tag.context == context && tag.slug == slug)
            {
                let mut errors = FieldErrors::new();
                errors.add("slug", "Slug already in use for this context");
                return Err(TaxonomyError::Validation(errors));
            }
            slug
        }
        None => {
            let base = payload.name.resolve(crate::locale::Locale::En);
            unique_slug_in(&tags, context, base)
        }
    };

    let tag = Tag {
        id: tags.keys().next_back().copied().unwrap_or(0) + 1,
        context,
        name: payload.name.clone(),
        slug,
        color: trim_to_option(payload.color.as_deref()),
        sort_order: payload.sort_order.unwrap_or(0),
        is_active: payload.is_active.unwrap_or(true),
        last_used_at: None,
        created_at: now,
        updated_at: now,
    };
    tags.insert(tag.id, tag.clone());
    store.persist(tags)?;
    Ok(tag)
}

pub fn update_tag(
    store: &TagStore,
    tag_id: u64,
    payload: &super::forms::TagPayload,
) -> Result<Tag, TaxonomyError> {
    let mut tags = store.snapshot()?;
    let existing = tags.get(&tag_id).cloned().ok_or(TaxonomyError::NotFound)?;

    let slug = match trim_to_option(payload.slug.as_deref()) {
        Some(slug) => {
            if tags.values().any(|tag| {
                tag.context == existing.context && tag.slug == slug && tag.id != tag_id
            }) {
                let mut errors = FieldErrors::new();
                errors.add("slug", "Slug already in use for this context");
                return Err(TaxonomyError::Validation(errors));
            }
            slug
        }
        None => existing.slug.clone(),
    };

    let tag = tags.get_mut(&tag_id).ok_or(TaxonomyError::NotFound)?;
    tag.name = payload.name.clone();
    tag.slug = slug;
    tag.color = trim_to_option(payload.color.as_deref());
    if let Some(sort_order) = payload.sort_order {
        tag.sort_order = sort_order;
    }
    if let Some(is_active) = payload.is_active {
        tag.is_active = is_active;
    }
    tag.updated_at = Utc::now();
    let updated = tag.clone();
    store.persist(tags)?;
    Ok(updated)
}

fn localized_name(name: &str) -> LocalizedText {
    if name.is_ascii() {
        LocalizedText::new(None, Some(name.to_string()))
    } else {
        LocalizedText::from_zh_tw(name)
    }
}

fn unique_slug_in(
    tags: &std::collections::BTreeMap<u64, Tag>,
    context: TagContext,
    base: &str,
) -> String {
    let base = slugify(base);
    let taken = |candidate: &str| {
        tags.values()
            .any(|tag| tag.context == context && tag.slug == candidate)
    };
    if !taken(&base) {
        return base;
    }
    for n in 2.. {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
    }
    unreachable!()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;
    use std::collections::BTreeMap;
    use std::sync::RwLock;

    struct FakeCollection {
        label: &'static str,
        records: RwLock<Vec<Vec<u64>>>,
    }

    impl FakeCollection {
        fn new(label: &'static str, records: Vec<Vec<u64>>) -> Self {
            Self {
                label,
                records: RwLock::new(records),
            }
        }

        fn records(&self) -> Vec<Vec<u64>> {
            self.records.read().unwrap().clone()
        }
    }

    impl TaggedCollection for FakeCollection {
        fn label(&self) -> &'static str {
            self.label
        }

        fn reassign_tag(&self, sources: &[u64], target: u64) -> Result<usize, String> {
            let mut records = self.records.write().map_err(|_| "poisoned".to_string())?;
            let mut affected = 0;
            for tags in records.iter_mut() {
                if !tags.iter().any(|tag| sources.contains(tag)) {
                    continue;
                }
                let mut seen = std::collections::HashSet::new();
                *tags = tags
                    .iter()
                    .map(|tag| if sources.contains(tag) { target } else { *tag })
                    .filter(|tag| seen.insert(*tag))
                    .collect();
                affected += 1;
            }
            Ok(affected)
        }

        fn count_for_tag(&self, tag_id: u64) -> Result<usize, String> {
            Ok(self
                .records
                .read()
                .map_err(|_| "poisoned".to_string())?
                .iter()
                .filter(|tags| tags.contains(&tag_id))
                .count())
        }
    }

    fn seeded_store(fixture: &TestFixtureRoot, tags: Vec<Tag>) -> TagStore {
        let store = TagStore::new(fixture.state_dir()).unwrap();
        let map: BTreeMap<u64, Tag> = tags.into_iter().map(|tag| (tag.id, tag)).collect();
        store.persist(map).unwrap();
        store
    }

    fn tag(id: u64, context: TagContext, en_name: &str) -> Tag {
        let now = Utc::now();
        Tag {
            id,
            context,
            name: LocalizedText::new(None, Some(en_name.to_string())),
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
    fn merge_repoints_collapses_and_deactivates() {
        let fixture = TestFixtureRoot::new_unique("merge-basic").unwrap();
        let store = seeded_store(
            &fixture,
            vec![
                tag(1, TagContext::Course, "AI"),
                tag(2, TagContext::Course, "Artificial Intelligence"),
                tag(3, TagContext::Course, "Machine Intelligence"),
            ],
        );
        // Record 0 carries target and source: the merge must collapse the
        // duplicate instead of producing [1, 1].
        let posts = FakeCollection::new("posts", vec![vec![1, 2], vec![3], vec![9]]);

        let outcome = merge_tags(&store, &[&posts], 1, &[2, 3]).unwrap();
        assert_eq!(outcome.affected_resources, 2);
        assert_eq!(outcome.deactivated_tags, 2);
        assert_eq!(posts.records(), vec![vec![1], vec![1], vec![9]]);

        let tags = store.snapshot().unwrap();
        assert!(tags[&1].is_active);
        assert!(!tags[&2].is_active);
        assert!(!tags[&3].is_active);
        assert!(tags[&1].last_used_at.is_some());
    }

    #[test]
    fn merge_rejects_cross_context_without_writing() {
        let fixture = TestFixtureRoot::new_unique("merge-context").unwrap();
        let store = seeded_store(
            &fixture,
            vec![
                tag(1, TagContext::Course, "AI"),
                tag(2, TagContext::Event, "AI Day"),
            ],
        );
        let posts = FakeCollection::new("posts", vec![vec![2]]);

        let err = merge_tags(&store, &[&posts], 1, &[2]).unwrap_err();
        match err {
            TaxonomyError::Validation(errors) => assert!(errors.has("source_ids")),
            other => panic!("expected validation error, got {}", other),
        }
        // No side effects on either store.
        assert_eq!(posts.records(), vec![vec![2]]);
        let tags = store.snapshot().unwrap();
        assert!(tags[&2].is_active);
    }

    #[test]
    fn merge_rejects_missing_tags_without_writing() {
        let fixture = TestFixtureRoot::new_unique("merge-missing").unwrap();
        let store = seeded_store(&fixture, vec![tag(1, TagContext::Course, "AI")]);
        let posts = FakeCollection::new("posts", vec![vec![1]]);

        let err = merge_tags(&store, &[&posts], 1, &[42]).unwrap_err();
        assert!(matches!(err, TaxonomyError::Validation(_)));
        assert_eq!(posts.records(), vec![vec![1]]);
    }

    #[test]
    fn split_reuses_existing_names_case_insensitively() {
        let fixture = TestFixtureRoot::new_unique("split-reuse").unwrap();
        let mut dormant = tag(2, TagContext::Course, "Robotics");
        dormant.is_active = false;
        let store = seeded_store(
            &fixture,
            vec![tag(1, TagContext::Course, "AI and Robotics"), dormant],
        );

        let names = vec!["ai".to_string(), "ROBOTICS".to_string()];
        let outcome = split_tag(&store, 1, &names, false, None).unwrap();

        assert_eq!(outcome.tags.len(), 2);
        // "ROBOTICS" matched tag 2 and reactivated it instead of minting a
        // new tag.
        assert_eq!(outcome.tags[1].id, 2);
        assert!(outcome.tags[1].is_active);
        // "ai" is new.
        assert_eq!(outcome.tags[0].slug, "ai");
        assert!(outcome.original_deactivated);

        let tags = store.snapshot().unwrap();
        assert!(!tags[&1].is_active);
    }

    #[test]
    fn split_reuse_requires_the_whole_name_to_match() {
        let fixture = TestFixtureRoot::new_unique("split-exact").unwrap();
        let store = seeded_store(
            &fixture,
            vec![
                tag(1, TagContext::Course, "AI and Robotics"),
                tag(2, TagContext::Course, "Taiwan Studies"),
            ],
        );

        // "ai" is contained in "Taiwan Studies" but names them differently;
        // a new tag must be minted instead of reusing tag 2.
        let names = vec!["ai".to_string()];
        let outcome = split_tag(&store, 1, &names, false, None).unwrap();

        assert_eq!(outcome.tags.len(), 1);
        assert_ne!(outcome.tags[0].id, 2);
        assert_eq!(outcome.tags[0].slug, "ai");
        let tags = store.snapshot().unwrap();
        assert_eq!(tags[&2].slug, "taiwan-studies");
        assert!(tags[&2].is_active);
    }

    #[test]
    fn split_keep_original_leaves_source_active() {
        let fixture = TestFixtureRoot::new_unique("split-keep").unwrap();
        let store = seeded_store(&fixture, vec![tag(1, TagContext::Event, "Workshops")]);

        let names = vec!["seminar".to_string(), "hackathon".to_string()];
        let outcome = split_tag(&store, 1, &names, true, Some("#aabbcc")).unwrap();

        assert!(!outcome.original_deactivated);
        let tags = store.snapshot().unwrap();
        assert!(tags[&1].is_active);
        for created in &outcome.tags {
            assert_eq!(tags[&created.id].color.as_deref(), Some("#aabbcc"));
            assert_eq!(tags[&created.id].context, TagContext::Event);
        }
    }

    #[test]
    fn split_of_missing_tag_is_not_found() {
        let fixture = TestFixtureRoot::new_unique("split-missing").unwrap();
        let store = seeded_store(&fixture, vec![]);
        let err = split_tag(&store, 5, &["x".to_string()], false, None).unwrap_err();
        assert!(matches!(err, TaxonomyError::NotFound));
    }

    #[test]
    fn create_tag_generates_unique_slug() {
        let fixture = TestFixtureRoot::new_unique("create-slug").unwrap();
        let store = seeded_store(&fixture, vec![tag(1, TagContext::Course, "Compilers")]);

        let payload = super::super::forms::TagPayload {
            context: "course".to_string(),
            name: LocalizedText::new(None, Some("Compilers".to_string())),
            slug: None,
            color: None,
            sort_order: None,
            is_active: None,
        };
        let created = create_tag(&store, TagContext::Course, &payload).unwrap();
        assert_eq!(created.slug, "compilers-2");
    }

    #[test]
    fn update_tag_clears_color_when_blank() {
        let fixture = TestFixtureRoot::new_unique("update-color").unwrap();
        let mut colored = tag(1, TagContext::Course, "Compilers");
        colored.color = Some("#aabbcc".to_string());
        let store = seeded_store(&fixture, vec![colored]);

        let payload = super::super::forms::TagPayload {
            context: "course".to_string(),
            name: LocalizedText::new(None, Some("Compilers".to_string())),
            slug: None,
            color: Some("  ".to_string()),
            sort_order: None,
            is_active: None,
        };
        let updated = update_tag(&store, 1, &payload).unwrap();
        assert_eq!(updated.color, None);
        assert_eq!(store.snapshot().unwrap()[&1].color, None);
    }

    #[test]
    fn update_tag_rejects_duplicate_slug() {
        let fixture = TestFixtureRoot::new_unique("update-slug").unwrap();
        let store = seeded_store(
            &fixture,
            vec![
                tag(1, TagContext::Course, "Compilers"),
                tag(2, TagContext::Course, "Networks"),
            ],
        );

        let payload = super::super::forms::TagPayload {
            context: "course".to_string(),
            name: LocalizedText::new(None, Some("Networks".to_string())),
            slug: Some("compilers".to_string()),
            color: None,
            sort_order: None,
            is_active: None,
        };
        let err = update_tag(&store, 2, &payload).unwrap_err();
        assert!(matches!(err, TaxonomyError::Validation(_)));
    }
}

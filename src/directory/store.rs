// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{Lab, StaffRecord, TeacherRecord, directory_sort_key};
use crate::locale::Locale;
use crate::store::{self, StoreError};
use crate::taxonomy::service::TaggedCollection;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

const TEACHERS_FILE_NAME: &str = "teachers.yaml";
const STAFF_FILE_NAME: &str = "staff.yaml";
const LABS_FILE_NAME: &str = "labs.yaml";

#[derive(Debug)]
pub struct DirectoryStoreError {
    message: String,
}

impl DirectoryStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DirectoryStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DirectoryStoreError {}

impl From<StoreError> for DirectoryStoreError {
    fn from(err: StoreError) -> Self {
        DirectoryStoreError::new(err.to_string())
    }
}

macro_rules! directory_store {
    ($store:ident, $record:ty, $file:expr, $label:expr) => {
        pub struct $store {
            file: PathBuf,
            records: RwLock<BTreeMap<u64, $record>>,
        }

        impl $store {
            pub fn new(state_dir: &Path) -> Result<Self, DirectoryStoreError> {
                let file = state_dir.join($file);
                let raw: Option<BTreeMap<u64, $record>> = store::read_yaml_file(&file, $label)?;
                Ok(Self {
                    file,
                    records: RwLock::new(raw.unwrap_or_default()),
                })
            }

            pub fn snapshot(&self) -> Result<BTreeMap<u64, $record>, DirectoryStoreError> {
                self.records
                    .read()
                    .map(|guard| guard.clone())
                    .map_err(|_| DirectoryStoreError::new(concat!($label, " store lock poisoned")))
            }

            pub fn persist(
                &self,
                records: BTreeMap<u64, $record>,
            ) -> Result<(), DirectoryStoreError> {
                store::write_yaml_file(&self.file, $label, &records)?;
                let mut guard = self.records.write().map_err(|_| {
                    DirectoryStoreError::new(concat!($label, " store lock poisoned"))
                })?;
                *guard = records;
                Ok(())
            }

            pub fn next_id(&self) -> Result<u64, DirectoryStoreError> {
                let guard = self.records.read().map_err(|_| {
                    DirectoryStoreError::new(concat!($label, " store lock poisoned"))
                })?;
                Ok(guard.keys().next_back().copied().unwrap_or(0) + 1)
            }

            pub fn get(&self, id: u64) -> Result<Option<$record>, DirectoryStoreError> {
                Ok(self.snapshot()?.get(&id).cloned())
            }

            pub fn remove(&self, id: u64) -> Result<bool, DirectoryStoreError> {
                let mut records = self.snapshot()?;
                let removed = records.remove(&id).is_some();
                if removed {
                    self.persist(records)?;
                }
                Ok(removed)
            }
        }
    };
}

directory_store!(TeacherStore, TeacherRecord, TEACHERS_FILE_NAME, "teachers");
directory_store!(StaffStore, StaffRecord, STAFF_FILE_NAME, "staff");
directory_store!(LabStore, Lab, LABS_FILE_NAME, "labs");

impl TeacherStore {
    /// Public listing: visible records ordered by sort order then resolved
    /// name; the optional search matches names (both locales) and email.
    pub fn public_list(
        &self,
        search: Option<&str>,
        primary: Locale,
    ) -> Result<Vec<TeacherRecord>, DirectoryStoreError> {
        let needle = search.map(str::to_lowercase);
        let mut records: Vec<TeacherRecord> = self
            .snapshot()?
            .into_values()
            .filter(|record| record.visible)
            .filter(|record| match &needle {
                None => true,
                Some(needle) => {
                    record.name.matches(needle)
                        || record
                            .email
                            .as_deref()
                            .is_some_and(|email| email.to_lowercase().contains(needle))
                }
            })
            .collect();
        records.sort_by_key(|record| directory_sort_key(record.sort_order, &record.name, primary));
        Ok(records)
    }

    pub fn find_by_user(&self, user_id: Uuid) -> Result<Option<TeacherRecord>, DirectoryStoreError> {
        Ok(self
            .snapshot()?
            .into_values()
            .find(|record| record.user_id == Some(user_id)))
    }
}

impl StaffStore {
    pub fn public_list(
        &self,
        search: Option<&str>,
        primary: Locale,
    ) -> Result<Vec<StaffRecord>, DirectoryStoreError> {
        let needle = search.map(str::to_lowercase);
        let mut records: Vec<StaffRecord> = self
            .snapshot()?
            .into_values()
            .filter(|record| record.visible)
            .filter(|record| match &needle {
                None => true,
                Some(needle) => {
                    record.name.matches(needle)
                        || record
                            .email
                            .as_deref()
                            .is_some_and(|email| email.to_lowercase().contains(needle))
                }
            })
            .collect();
        records.sort_by_key(|record| directory_sort_key(record.sort_order, &record.name, primary));
        Ok(records)
    }
}

impl LabStore {
    pub fn public_list(&self, primary: Locale) -> Result<Vec<Lab>, DirectoryStoreError> {
        let mut labs: Vec<Lab> = self
            .snapshot()?
            .into_values()
            .filter(|lab| lab.visible)
            .collect();
        labs.sort_by_key(|lab| directory_sort_key(lab.sort_order, &lab.name, primary));
        Ok(labs)
    }

    /// Resolve a lab's member teacher records to their owning user accounts
    /// for the ownership-based update grant.
    pub fn member_user_ids(
        &self,
        lab: &Lab,
        teachers: &TeacherStore,
    ) -> Result<Vec<Uuid>, DirectoryStoreError> {
        let records = teachers.snapshot()?;
        Ok(lab
            .teacher_ids
            .iter()
            .filter_map(|id| records.get(id).and_then(|record| record.user_id))
            .collect())
    }
}

impl TaggedCollection for LabStore {
    fn label(&self) -> &'static str {
        "labs"
    }

    fn reassign_tag(&self, sources: &[u64], target: u64) -> Result<usize, String> {
        let mut labs = self.snapshot().map_err(|err| err.to_string())?;
        let mut affected = 0;
        for lab in labs.values_mut() {
            if !lab.tag_ids.iter().any(|tag| sources.contains(tag)) {
                continue;
            }
            let mut seen = std::collections::HashSet::new();
            lab.tag_ids = lab
                .tag_ids
                .iter()
                .map(|tag| if sources.contains(tag) { target } else { *tag })
                .filter(|tag| seen.insert(*tag))
                .collect();
            lab.updated_at = Utc::now();
            affected += 1;
        }
        if affected > 0 {
            self.persist(labs).map_err(|err| err.to_string())?;
        }
        Ok(affected)
    }

    fn count_for_tag(&self, tag_id: u64) -> Result<usize, String> {
        let labs = self.snapshot().map_err(|err| err.to_string())?;
        Ok(labs
            .values()
            .filter(|lab| lab.tag_ids.contains(&tag_id))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocalizedText;
    use crate::util::test_fixtures::TestFixtureRoot;

    pub(crate) fn teacher(id: u64, en_name: &str, sort_order: i32) -> TeacherRecord {
        let now = Utc::now();
        TeacherRecord {
            id,
            user_id: None,
            name: LocalizedText::new(None, Some(en_name.to_string())),
            title: LocalizedText::default(),
            bio: LocalizedText::default(),
            email: Some(format!("{}@example.edu", en_name.to_lowercase())),
            office: None,
            expertise: LocalizedText::default(),
            visible: true,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn lab(id: u64, en_name: &str, teacher_ids: Vec<u64>) -> Lab {
        let now = Utc::now();
        Lab {
            id,
            name: LocalizedText::new(None, Some(en_name.to_string())),
            description: LocalizedText::default(),
            website: None,
            teacher_ids,
            tag_ids: vec![],
            visible: true,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_list_hides_invisible_and_sorts() {
        let fixture = TestFixtureRoot::new_unique("dir-teachers").unwrap();
        let store = TeacherStore::new(fixture.state_dir()).unwrap();
        let mut records = BTreeMap::new();
        records.insert(1, teacher(1, "Wang", 1));
        records.insert(2, teacher(2, "Chen", 1));
        let mut hidden = teacher(3, "Lin", 0);
        hidden.visible = false;
        records.insert(3, hidden);
        store.persist(records).unwrap();

        let list = store.public_list(None, Locale::En).unwrap();
        let names: Vec<&str> = list.iter().map(|r| r.name.resolve(Locale::En)).collect();
        assert_eq!(names, vec!["Chen", "Wang"]);
    }

    #[test]
    fn search_covers_name_and_email() {
        let fixture = TestFixtureRoot::new_unique("dir-search").unwrap();
        let store = TeacherStore::new(fixture.state_dir()).unwrap();
        let mut records = BTreeMap::new();
        records.insert(1, teacher(1, "Wang", 0));
        records.insert(2, teacher(2, "Chen", 0));
        store.persist(records).unwrap();

        let by_name = store.public_list(Some("wan"), Locale::En).unwrap();
        assert_eq!(by_name.len(), 1);
        let by_email = store
            .public_list(Some("chen@example.edu"), Locale::En)
            .unwrap();
        assert_eq!(by_email.len(), 1);
    }

    #[test]
    fn member_user_ids_skip_unclaimed_records() {
        let fixture = TestFixtureRoot::new_unique("dir-members").unwrap();
        let teachers = TeacherStore::new(fixture.state_dir()).unwrap();
        let labs = LabStore::new(fixture.state_dir()).unwrap();

        let owner = Uuid::new_v4();
        let mut claimed = teacher(1, "Wang", 0);
        claimed.user_id = Some(owner);
        let unclaimed = teacher(2, "Chen", 0);
        let mut records = BTreeMap::new();
        records.insert(1, claimed);
        records.insert(2, unclaimed);
        teachers.persist(records).unwrap();

        let lab = lab(1, "Vision Lab", vec![1, 2]);
        let members = labs.member_user_ids(&lab, &teachers).unwrap();
        assert_eq!(members, vec![owner]);
    }

    #[test]
    fn lab_reassign_tag_collapses_duplicates() {
        let fixture = TestFixtureRoot::new_unique("dir-lab-tags").unwrap();
        let store = LabStore::new(fixture.state_dir()).unwrap();
        let mut with_both = lab(1, "AI Lab", vec![]);
        with_both.tag_ids = vec![5, 6];
        let mut records = BTreeMap::new();
        records.insert(1, with_both);
        store.persist(records).unwrap();

        assert_eq!(store.reassign_tag(&[6], 5).unwrap(), 1);
        assert_eq!(store.snapshot().unwrap()[&1].tag_ids, vec![5]);
    }
}

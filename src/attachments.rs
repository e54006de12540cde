// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Attachments belong to exactly one owning record and are either a stored
//! file or an external link, never both.

use crate::authz::{Capability, STAFF_ROLES};
use crate::store::{self, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const ATTACHMENTS_FILE_NAME: &str = "attachments.yaml";

pub const MAX_ATTACHMENTS_PER_OWNER: usize = 10;
pub const MAX_LINK_URL_CHARS: usize = 2048;
pub const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum AttachmentOwner {
    Post(u64),
    Lab(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttachmentKind {
    File {
        /// Path relative to the uploads directory.
        disk_path: String,
        filename: String,
        mime_type: String,
        size: u64,
    },
    Link {
        external_url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentVisibility {
    Public,
    Authorized,
    Private,
}

impl AttachmentVisibility {
    pub fn required_capability(self) -> Capability {
        match self {
            AttachmentVisibility::Public => Capability::Anyone,
            AttachmentVisibility::Authorized => Capability::Authenticated,
            AttachmentVisibility::Private => Capability::Roles(STAFF_ROLES),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub owner: AttachmentOwner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub kind: AttachmentKind,
    pub visibility: AttachmentVisibility,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    pub fn is_link(&self) -> bool {
        matches!(self.kind, AttachmentKind::Link { .. })
    }

    /// The URL clients use: the download endpoint for stored files, the
    /// external URL passed through for links.
    pub fn public_url(&self) -> String {
        match &self.kind {
            AttachmentKind::Link { external_url } => external_url.clone(),
            AttachmentKind::File { .. } => format!("/attachments/{}/download", self.id),
        }
    }
}

/// What the download endpoint should do for an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResolution {
    Redirect(String),
    /// Absolute path, download filename, mime type.
    ServeFile(PathBuf, String, String),
    Missing,
}

pub fn resolve_download(attachment: &Attachment, uploads_dir: &Path) -> DownloadResolution {
    match &attachment.kind {
        AttachmentKind::Link { external_url } => {
            DownloadResolution::Redirect(external_url.clone())
        }
        AttachmentKind::File {
            disk_path,
            filename,
            mime_type,
            ..
        } => {
            let path = uploads_dir.join(disk_path);
            if path.is_file() {
                DownloadResolution::ServeFile(path, filename.clone(), mime_type.clone())
            } else {
                DownloadResolution::Missing
            }
        }
    }
}

#[derive(Debug)]
pub struct AttachmentStoreError {
    message: String,
}

impl AttachmentStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for AttachmentStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AttachmentStoreError {}

impl From<StoreError> for AttachmentStoreError {
    fn from(err: StoreError) -> Self {
        AttachmentStoreError::new(err.to_string())
    }
}

pub struct AttachmentStore {
    attachments_file: PathBuf,
    attachments: RwLock<BTreeMap<u64, Attachment>>,
}

impl AttachmentStore {
    pub fn new(state_dir: &Path) -> Result<Self, AttachmentStoreError> {
        let attachments_file = state_dir.join(ATTACHMENTS_FILE_NAME);
        let raw: Option<BTreeMap<u64, Attachment>> =
            store::read_yaml_file(&attachments_file, "attachments")?;
        Ok(Self {
            attachments_file,
            attachments: RwLock::new(raw.unwrap_or_default()),
        })
    }

    pub fn snapshot(&self) -> Result<BTreeMap<u64, Attachment>, AttachmentStoreError> {
        self.attachments
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| AttachmentStoreError::new("Attachment store lock poisoned"))
    }

    pub fn persist(
        &self,
        attachments: BTreeMap<u64, Attachment>,
    ) -> Result<(), AttachmentStoreError> {
        store::write_yaml_file(&self.attachments_file, "attachments", &attachments)?;
        let mut guard = self
            .attachments
            .write()
            .map_err(|_| AttachmentStoreError::new("Attachment store lock poisoned"))?;
        *guard = attachments;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Result<Option<Attachment>, AttachmentStoreError> {
        Ok(self.snapshot()?.get(&id).cloned())
    }

    pub fn list_for_owner(
        &self,
        owner: AttachmentOwner,
    ) -> Result<Vec<Attachment>, AttachmentStoreError> {
        let mut list: Vec<Attachment> = self
            .snapshot()?
            .into_values()
            .filter(|attachment| attachment.owner == owner)
            .collect();
        list.sort_by_key(|attachment| attachment.id);
        Ok(list)
    }

    pub fn count_for_owner(&self, owner: AttachmentOwner) -> Result<usize, AttachmentStoreError> {
        Ok(self.list_for_owner(owner)?.len())
    }

    pub fn next_id(&self) -> Result<u64, AttachmentStoreError> {
        let guard = self
            .attachments
            .read()
            .map_err(|_| AttachmentStoreError::new("Attachment store lock poisoned"))?;
        Ok(guard.keys().next_back().copied().unwrap_or(0) + 1)
    }

    /// Drop every attachment not in `kept_ids` for the owner, returning the
    /// removed file paths so callers can unlink the blobs.
    pub fn retain_for_owner(
        &self,
        owner: AttachmentOwner,
        kept_ids: &[u64],
    ) -> Result<Vec<String>, AttachmentStoreError> {
        let mut attachments = self.snapshot()?;
        let mut removed_paths = Vec::new();
        attachments.retain(|id, attachment| {
            if attachment.owner != owner || kept_ids.contains(id) {
                return true;
            }
            if let AttachmentKind::File { disk_path, .. } = &attachment.kind {
                removed_paths.push(disk_path.clone());
            }
            false
        });
        self.persist(attachments)?;
        Ok(removed_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    fn file_attachment(id: u64, owner: AttachmentOwner, disk_path: &str) -> Attachment {
        Attachment {
            id,
            owner,
            title: Some("Syllabus".to_string()),
            kind: AttachmentKind::File {
                disk_path: disk_path.to_string(),
                filename: "syllabus.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size: 1024,
            },
            visibility: AttachmentVisibility::Public,
            created_at: Utc::now(),
        }
    }

    fn link_attachment(id: u64, owner: AttachmentOwner, url: &str) -> Attachment {
        Attachment {
            id,
            owner,
            title: None,
            kind: AttachmentKind::Link {
                external_url: url.to_string(),
            },
            visibility: AttachmentVisibility::Public,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn download_resolution_redirects_links() {
        let fixture = TestFixtureRoot::new_unique("attach-redirect").unwrap();
        let attachment =
            link_attachment(1, AttachmentOwner::Post(1), "https://example.edu/paper.pdf");
        assert_eq!(
            resolve_download(&attachment, fixture.uploads_dir()),
            DownloadResolution::Redirect("https://example.edu/paper.pdf".to_string())
        );
    }

    #[test]
    fn download_resolution_serves_existing_file() {
        let fixture = TestFixtureRoot::new_unique("attach-serve").unwrap();
        std::fs::write(fixture.uploads_dir().join("syllabus.pdf"), b"pdf").unwrap();
        let attachment = file_attachment(1, AttachmentOwner::Post(1), "syllabus.pdf");
        match resolve_download(&attachment, fixture.uploads_dir()) {
            DownloadResolution::ServeFile(path, filename, mime) => {
                assert!(path.ends_with("syllabus.pdf"));
                assert_eq!(filename, "syllabus.pdf");
                assert_eq!(mime, "application/pdf");
            }
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn download_resolution_reports_missing_backing_file() {
        let fixture = TestFixtureRoot::new_unique("attach-missing").unwrap();
        let attachment = file_attachment(1, AttachmentOwner::Post(1), "gone.pdf");
        assert_eq!(
            resolve_download(&attachment, fixture.uploads_dir()),
            DownloadResolution::Missing
        );
    }

    #[test]
    fn retain_for_owner_drops_only_unkept() {
        let fixture = TestFixtureRoot::new_unique("attach-retain").unwrap();
        let store = AttachmentStore::new(fixture.state_dir()).unwrap();

        let mut attachments = BTreeMap::new();
        attachments.insert(1, file_attachment(1, AttachmentOwner::Post(7), "a.pdf"));
        attachments.insert(2, file_attachment(2, AttachmentOwner::Post(7), "b.pdf"));
        attachments.insert(3, file_attachment(3, AttachmentOwner::Lab(7), "c.pdf"));
        store.persist(attachments).unwrap();

        let removed = store
            .retain_for_owner(AttachmentOwner::Post(7), &[2])
            .unwrap();
        assert_eq!(removed, vec!["a.pdf".to_string()]);

        let remaining = store.snapshot().unwrap();
        assert!(remaining.contains_key(&2));
        assert!(remaining.contains_key(&3));
        assert!(!remaining.contains_key(&1));
    }

    #[test]
    fn owner_union_round_trips_through_yaml() {
        let attachment = link_attachment(4, AttachmentOwner::Lab(12), "https://lab.example.edu");
        let yaml = serde_yaml::to_string(&attachment).unwrap();
        let back: Attachment = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.owner, AttachmentOwner::Lab(12));
        assert!(back.is_link());
    }

    #[test]
    fn public_url_distinguishes_files_and_links() {
        let file = file_attachment(9, AttachmentOwner::Post(1), "x.pdf");
        assert_eq!(file.public_url(), "/attachments/9/download");
        let link = link_attachment(10, AttachmentOwner::Post(1), "https://example.edu");
        assert_eq!(link.public_url(), "https://example.edu");
    }
}

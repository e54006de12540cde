// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::attachments::AttachmentStore;
use crate::bulletin::store::{CategoryStore, PostStore};
use crate::config::ValidatedConfig;
use crate::directory::store::{LabStore, StaffStore, TeacherStore};
use crate::runtime_paths::RuntimePaths;
use crate::support::{MessageStore, TicketStore};
use crate::taxonomy::service::TaggedCollection;
use crate::taxonomy::store::TagStore;

/// Shared per-process state. Every store loads its YAML file once at boot
/// and serializes writes behind its own lock.
pub struct AppState {
    pub config: Arc<ValidatedConfig>,
    pub runtime_paths: RuntimePaths,
    pub tags: TagStore,
    pub posts: PostStore,
    pub categories: CategoryStore,
    pub attachments: AttachmentStore,
    pub teachers: TeacherStore,
    pub staff: StaffStore,
    pub labs: LabStore,
    pub tickets: TicketStore,
    pub messages: MessageStore,
}

impl AppState {
    pub fn new(
        config: Arc<ValidatedConfig>,
        runtime_paths: RuntimePaths,
    ) -> Result<Self, String> {
        let state_dir = runtime_paths.state_dir.clone();
        Ok(Self {
            config,
            runtime_paths,
            tags: TagStore::new(&state_dir).map_err(|e| e.to_string())?,
            posts: PostStore::new(&state_dir).map_err(|e| e.to_string())?,
            categories: CategoryStore::new(&state_dir).map_err(|e| e.to_string())?,
            attachments: AttachmentStore::new(&state_dir).map_err(|e| e.to_string())?,
            teachers: TeacherStore::new(&state_dir).map_err(|e| e.to_string())?,
            staff: StaffStore::new(&state_dir).map_err(|e| e.to_string())?,
            labs: LabStore::new(&state_dir).map_err(|e| e.to_string())?,
            tickets: TicketStore::new(&state_dir).map_err(|e| e.to_string())?,
            messages: MessageStore::new(&state_dir).map_err(|e| e.to_string())?,
        })
    }

    /// Every collection that carries tag id lists; tag merges re-point all
    /// of them.
    pub fn tagged_collections(&self) -> Vec<&dyn TaggedCollection> {
        vec![&self.posts, &self.labs]
    }
}

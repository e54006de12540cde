// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::runtime_paths::RuntimePaths;

/// A throwaway portal root under `target/test-fixtures` with the standard
/// layout (`state/`, `uploads/`) already created. Removed on drop.
#[derive(Debug)]
pub struct TestFixtureRoot {
    path: PathBuf,
    state_dir: PathBuf,
    uploads_dir: PathBuf,
}

impl TestFixtureRoot {
    pub fn new_fixed(name: &str) -> std::io::Result<Self> {
        let root = fixtures_root().join(name);
        if root.exists() {
            fs::remove_dir_all(&root)?;
        }
        let state_dir = root.join("state");
        let uploads_dir = root.join("uploads");
        fs::create_dir_all(&state_dir)?;
        fs::create_dir_all(&uploads_dir)?;
        Ok(Self {
            path: root,
            state_dir,
            uploads_dir,
        })
    }

    pub fn new_unique(prefix: &str) -> std::io::Result<Self> {
        let name = format!("{}-{}", prefix, Uuid::new_v4());
        Self::new_fixed(&name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.path.join("config.yaml")
    }

    pub fn users_file(&self) -> PathBuf {
        self.path.join("users.yaml")
    }

    pub fn runtime_paths(&self) -> std::io::Result<RuntimePaths> {
        let root = self.path.canonicalize()?;
        Ok(RuntimePaths {
            config_file: root.join("config.yaml"),
            users_file: root.join("users.yaml"),
            state_dir: self.state_dir.canonicalize()?,
            uploads_dir: self.uploads_dir.canonicalize()?,
            logs_dir: root.join("logs"),
            root,
        })
    }
}

impl Drop for TestFixtureRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn fixtures_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.join("target").join("test-fixtures")
}

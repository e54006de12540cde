// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Campanile is a department content portal: bulletins, a people
//! directory, research labs, a shared tag taxonomy and a small support
//! desk, all persisted as YAML files under a runtime directory.

pub mod admin;
pub mod app_state;
pub mod attachments;
pub mod authz;
pub mod bulletin;
pub mod config;
pub mod directory;
pub mod iam;
pub mod locale;
pub mod public;
pub mod runtime_paths;
pub mod store;
pub mod support;
pub mod taxonomy;
pub mod util;
pub mod validation;

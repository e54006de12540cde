// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod store;
pub mod types;

pub use jwt::{Claims, JwtError, JwtService};
pub use middleware::{AuthRequest, JwtAuthMiddlewareFactory};
pub use service::{UserServices, UserUpdate};
pub use store::{FileUserStore, MemoryUserStore, UserStore};
pub use types::{IamError, Role, User, UserStatus, UsersData, YamlUser, YamlUsersData};

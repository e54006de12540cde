// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Access control for the manage and public surfaces.
//!
//! Every guarded operation maps to an [`Action`]; each action resolves to a
//! single [`Capability`] which is then checked against the requesting user.
//! Handlers never branch on roles directly.

use crate::iam::{Role, User};
use uuid::Uuid;

pub const STAFF_ROLES: &[Role] = &[Role::Admin, Role::Manager, Role::Teacher];
pub const EDITOR_ROLES: &[Role] = &[Role::Admin, Role::Teacher];
pub const OFFICE_ROLES: &[Role] = &[Role::Admin, Role::Manager];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial(pub &'static str);

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a guarded operation requires of the caller.
#[derive(Debug, Clone)]
pub enum Capability {
    /// Open to everyone, including anonymous visitors.
    Anyone,
    /// Any authenticated account.
    Authenticated,
    /// One of the listed roles.
    Roles(&'static [Role]),
    /// One of the listed roles, or an account whose id is in `owners`.
    RolesOrOwner {
        roles: &'static [Role],
        owners: Vec<Uuid>,
    },
    /// One of the listed roles, except the account named by `forbidden`.
    RolesExceptSelf {
        roles: &'static [Role],
        forbidden: Uuid,
    },
}

impl Capability {
    pub fn check(&self, user: Option<&User>) -> Result<(), Denial> {
        match self {
            Capability::Anyone => Ok(()),
            Capability::Authenticated => match user {
                Some(_) => Ok(()),
                None => Err(Denial("Authentication required")),
            },
            Capability::Roles(roles) => {
                let user = user.ok_or(Denial("Authentication required"))?;
                if roles.contains(&user.role) {
                    Ok(())
                } else {
                    Err(Denial("Insufficient role"))
                }
            }
            Capability::RolesOrOwner { roles, owners } => {
                let user = user.ok_or(Denial("Authentication required"))?;
                if roles.contains(&user.role) || owners.contains(&user.id) {
                    Ok(())
                } else {
                    Err(Denial("Not the owner"))
                }
            }
            Capability::RolesExceptSelf { roles, forbidden } => {
                let user = user.ok_or(Denial("Authentication required"))?;
                if user.id == *forbidden {
                    Err(Denial("Operation not permitted on own account"))
                } else if roles.contains(&user.role) {
                    Ok(())
                } else {
                    Err(Denial("Insufficient role"))
                }
            }
        }
    }
}

/// Guarded operations across the portal.
#[derive(Debug, Clone)]
pub enum Action {
    // Bulletins
    ListPosts,
    ViewPost { publicly_visible: bool },
    CreatePost,
    UpdatePost,
    DeletePost { author: Option<Uuid> },

    // Taxonomy. Deliberately role-gated as a whole; tag surgery (merge,
    // split, renames) ripples across every tagged resource.
    ManageTags,

    // Directory
    UpdateTeacherRecord { owner: Option<Uuid> },
    ManageStaffRecords,
    ViewLab,
    UpdateLab { member_user_ids: Vec<Uuid> },
    ManageLabs,

    // Accounts
    ManageUsers,
    ViewUser { target: Uuid },
    UpdateUser { target: Uuid },
    DeleteUser { target: Uuid },

    // Inbound mail and tickets
    ProcessContactMessages,
    ViewTicket { requester: Option<Uuid> },
    ManageTickets,

    ViewDashboard,
}

impl Action {
    pub fn capability(&self) -> Capability {
        match self {
            // The public listing is open; drafts are filtered out of the
            // read model before anonymous callers see them.
            Action::ListPosts => Capability::Anyone,
            Action::ViewPost { publicly_visible } => {
                if *publicly_visible {
                    Capability::Anyone
                } else {
                    Capability::Roles(STAFF_ROLES)
                }
            }
            Action::CreatePost | Action::UpdatePost => Capability::Roles(EDITOR_ROLES),
            Action::DeletePost { author } => Capability::RolesOrOwner {
                roles: &[Role::Admin],
                owners: author.into_iter().copied().collect(),
            },

            Action::ManageTags => Capability::Roles(&[Role::Admin]),

            // Update stays with the record's owner (and admin); the office
            // roles only create, delete and reassign ownership.
            Action::UpdateTeacherRecord { owner } => Capability::RolesOrOwner {
                roles: &[Role::Admin],
                owners: owner.into_iter().copied().collect(),
            },
            Action::ManageStaffRecords => Capability::Roles(OFFICE_ROLES),
            Action::ViewLab => Capability::Roles(STAFF_ROLES),
            Action::UpdateLab { member_user_ids } => Capability::RolesOrOwner {
                roles: OFFICE_ROLES,
                owners: member_user_ids.clone(),
            },
            Action::ManageLabs => Capability::Roles(OFFICE_ROLES),

            Action::ManageUsers => Capability::Roles(&[Role::Admin]),
            Action::ViewUser { target } | Action::UpdateUser { target } => {
                Capability::RolesOrOwner {
                    roles: &[Role::Admin],
                    owners: vec![*target],
                }
            }
            Action::DeleteUser { target } => Capability::RolesExceptSelf {
                roles: &[Role::Admin],
                forbidden: *target,
            },

            Action::ProcessContactMessages => Capability::Roles(OFFICE_ROLES),
            Action::ViewTicket { requester } => Capability::RolesOrOwner {
                roles: STAFF_ROLES,
                owners: requester.into_iter().copied().collect(),
            },
            Action::ManageTickets => Capability::Roles(STAFF_ROLES),

            Action::ViewDashboard => Capability::Roles(STAFF_ROLES),
        }
    }
}

pub fn authorize(user: Option<&User>, action: &Action) -> Result<(), Denial> {
    let result = action.capability().check(user);
    if let Err(denial) = &result {
        log::debug!(
            "Denied {:?} for {}: {}",
            action,
            user.map(|u| u.email.as_str()).unwrap_or("anonymous"),
            denial
        );
    }
    result
}

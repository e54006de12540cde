// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::{Action, authorize};
use crate::iam::{AuthRequest, IamError, Role, User, UserServices, UserStatus, UserUpdate};
use crate::validation::{FieldErrors, forbidden, internal_error, not_found, trim_to_option, unauthorized};

const MIN_PASSWORD_CHARS: usize = 8;

/// The wire shape of an account; the password hash never leaves the store.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: &'static str,
    pub status: &'static str,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}

impl UserDto {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str(),
            status: user.status.as_str(),
            has_password: user.password_hash.is_some(),
            created_at: user.created_at,
        }
    }
}

pub async fn list(req: HttpRequest, users: web::Data<UserServices>) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageUsers).is_err() {
        return forbidden();
    }
    let list: Vec<UserDto> = users.list().iter().map(UserDto::from_user).collect();
    HttpResponse::Ok().json(list)
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: String,
}

pub async fn create(
    req: HttpRequest,
    users: web::Data<UserServices>,
    payload: web::Json<CreateUserPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageUsers).is_err() {
        return forbidden();
    }

    let mut errors = FieldErrors::new();
    let email = trim_to_option(Some(&payload.email));
    match &email {
        None => errors.add("email", "An email address is required"),
        Some(email) => {
            let plausible = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !plausible {
                errors.add("email", "The email address is not valid");
            }
        }
    }
    let name = trim_to_option(Some(&payload.name));
    if name.is_none() {
        errors.add("name", "A name is required");
    }
    let role = Role::parse(&payload.role);
    if role.is_none() {
        errors.add("role", "Unknown role");
    }
    if let Some(password) = &payload.password
        && password.chars().count() < MIN_PASSWORD_CHARS
    {
        errors.add(
            "password",
            format!("Passwords must be at least {} characters", MIN_PASSWORD_CHARS),
        );
    }
    let (Some(email), Some(name), Some(role)) = (email, name, role) else {
        return errors.to_response();
    };
    if let Err(errors) = errors.into_result(()) {
        return errors.to_response();
    }

    match users.create_user(&email, &name, payload.password.as_deref(), role) {
        Ok(user) => HttpResponse::Created().json(UserDto::from_user(&user)),
        Err(IamError::EmailTaken(_)) => {
            let mut errors = FieldErrors::new();
            errors.add("email", "Email already registered");
            errors.to_response()
        }
        Err(err) => internal_error("Failed to create user", err),
    }
}

pub async fn get(
    req: HttpRequest,
    users: web::Data<UserServices>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let Some(caller) = req.user_info() else {
        return unauthorized();
    };
    let Some(target) = users.find_by_id(path.into_inner()) else {
        return not_found();
    };
    if authorize(Some(&caller), &Action::ViewUser { target: target.id }).is_err() {
        return forbidden();
    }
    HttpResponse::Ok().json(UserDto::from_user(&target))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

pub async fn update(
    req: HttpRequest,
    users: web::Data<UserServices>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateUserPayload>,
) -> HttpResponse {
    let Some(caller) = req.user_info() else {
        return unauthorized();
    };
    let Some(target) = users.find_by_id(path.into_inner()) else {
        return not_found();
    };
    if authorize(Some(&caller), &Action::UpdateUser { target: target.id }).is_err() {
        return forbidden();
    }

    let mut errors = FieldErrors::new();
    // Role and status changes stay admin-only even on one's own record.
    let touches_grants = payload.role.is_some() || payload.status.is_some();
    if touches_grants && authorize(Some(&caller), &Action::ManageUsers).is_err() {
        return forbidden();
    }

    let role = match payload.role.as_deref() {
        None => None,
        Some(value) => {
            let parsed = Role::parse(value);
            if parsed.is_none() {
                errors.add("role", "Unknown role");
            }
            parsed
        }
    };
    let status = match payload.status.as_deref() {
        None => None,
        Some(value) => {
            let parsed = UserStatus::parse(value);
            if parsed.is_none() {
                errors.add("status", "Unknown status");
            }
            parsed
        }
    };
    // An admin cannot lock themselves out by demoting or suspending their
    // own account.
    if caller.id == target.id {
        if role.is_some_and(|role| role != Role::Admin) && caller.is_admin() {
            errors.add("role", "You cannot demote your own account");
        }
        if status == Some(UserStatus::Suspended) {
            errors.add("status", "You cannot suspend your own account");
        }
    }
    if let Some(password) = &payload.password
        && password.chars().count() < MIN_PASSWORD_CHARS
    {
        errors.add(
            "password",
            format!("Passwords must be at least {} characters", MIN_PASSWORD_CHARS),
        );
    }
    if let Err(errors) = errors.into_result(()) {
        return errors.to_response();
    }

    let update = UserUpdate {
        name: payload.name.clone(),
        role,
        status,
    };
    let updated = match users.update_user(&target.email, update) {
        Ok(user) => user,
        Err(IamError::UserNotFound(_)) => return not_found(),
        Err(err) => return internal_error("Failed to update user", err),
    };
    if let Some(password) = &payload.password
        && let Err(err) = users.set_password(&target.email, password)
    {
        return internal_error("Failed to set password", err);
    }
    HttpResponse::Ok().json(UserDto::from_user(&updated))
}

pub async fn delete(
    req: HttpRequest,
    users: web::Data<UserServices>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let Some(caller) = req.user_info() else {
        return unauthorized();
    };
    let Some(target) = users.find_by_id(path.into_inner()) else {
        return not_found();
    };
    if authorize(Some(&caller), &Action::DeleteUser { target: target.id }).is_err() {
        return forbidden();
    }
    match users.delete_user(&target.email) {
        Ok(()) => {
            log::info!("Deleted account {}", target.email);
            HttpResponse::NoContent().finish()
        }
        Err(IamError::UserNotFound(_)) => not_found(),
        Err(err) => internal_error("Failed to delete user", err),
    }
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::iam::{AuthRequest, UserServices};
use crate::validation::{FieldErrors, internal_error, trim_to_option, unauthorized};

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    name: String,
    email: String,
    role: &'static str,
}

pub async fn login(users: web::Data<UserServices>, payload: web::Json<LoginPayload>) -> HttpResponse {
    // Identical failure shape for unknown accounts and bad passwords.
    let Some(user) = users.authenticate(&payload.email, &payload.password) else {
        return HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "Invalid email or password" }));
    };
    let token = match users.jwt().create_token(&user) {
        Ok(token) => token,
        Err(err) => {
            warn!("Failed to issue token for {}: {}", user.email, err);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Login failed" }));
        }
    };
    info!("Login for {}", user.email);
    HttpResponse::Ok()
        .cookie(users.jwt().create_auth_cookie(&token))
        .json(LoginResponse {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.as_str(),
        })
}

pub async fn logout(users: web::Data<UserServices>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(users.jwt().create_logout_cookie())
        .json(serde_json::json!({ "message": "Logged out" }))
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manage_path: Option<String>,
}

/// Session probe for the front end. Staff additionally learn where the
/// manage surface is mounted.
pub async fn profile(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match req.user_info() {
        Some(user) => {
            let manage_path = user
                .role
                .is_staff()
                .then(|| state.config.admin.path.clone());
            HttpResponse::Ok().json(ProfileResponse {
                authenticated: true,
                name: Some(user.name.clone()),
                email: Some(user.email.clone()),
                role: Some(user.role.as_str()),
                manage_path,
            })
        }
        None => HttpResponse::Ok().json(ProfileResponse {
            authenticated: false,
            name: None,
            email: None,
            role: None,
            manage_path: None,
        }),
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdatePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub current_password: Option<String>,
}

/// Self-service profile edit: display name and password only. Role and
/// status changes go through the manage surface.
pub async fn update_profile(
    req: HttpRequest,
    users: web::Data<UserServices>,
    payload: web::Json<ProfileUpdatePayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };

    let mut errors = FieldErrors::new();
    let name = match payload.name.as_deref() {
        None => None,
        Some(value) => {
            let trimmed = trim_to_option(Some(value));
            if trimmed.is_none() {
                errors.add("name", "Name must not be empty");
            }
            trimmed
        }
    };
    let password = payload.password.as_deref().filter(|p| !p.is_empty());
    if let Some(password) = password {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            errors.add(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_CHARS),
            );
        }
        let current = payload.current_password.as_deref().unwrap_or("");
        if users.authenticate(&user.email, current).is_none() {
            errors.add("current_password", "Current password is incorrect");
        }
    }
    if let Err(errors) = errors.into_result(()) {
        return errors.to_response();
    }

    if let Some(name) = name {
        let update = crate::iam::UserUpdate {
            name: Some(name),
            role: None,
            status: None,
        };
        if let Err(err) = users.update_user(&user.email, update) {
            return internal_error("Failed to update profile", err);
        }
    }
    if let Some(password) = password {
        if let Err(err) = users.set_password(&user.email, password) {
            return internal_error("Failed to update password", err);
        }
        info!("Password changed for {}", user.email);
    }

    let updated = users.find_by_email(&user.email).unwrap_or(user);
    HttpResponse::Ok().json(LoginResponse {
        name: updated.name,
        email: updated.email,
        role: updated.role.as_str(),
    })
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::iam::AuthRequest;
use crate::support::MessageStatus;
use crate::validation::{FieldErrors, forbidden, internal_error, not_found, unauthorized};

#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<MessageListQuery>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ProcessContactMessages).is_err() {
        return forbidden();
    }
    let status = match query.status.as_deref() {
        None => None,
        Some(value) => match MessageStatus::parse(value) {
            Some(status) => Some(status),
            None => {
                let mut errors = FieldErrors::new();
                errors.add("status", "Unknown message status");
                return errors.to_response();
            }
        },
    };
    match state.messages.list(status) {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(err) => internal_error("Failed to list messages", err),
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageStatusPayload {
    pub status: String,
}

pub async fn set_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<MessageStatusPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    if authorize(Some(&user), &Action::ProcessContactMessages).is_err() {
        return forbidden();
    }
    let Some(status) = MessageStatus::parse(&payload.status) else {
        let mut errors = FieldErrors::new();
        errors.add("status", "Unknown message status");
        return errors.to_response();
    };
    match state.messages.set_status(path.into_inner(), status, user.id) {
        Ok(Some(message)) => HttpResponse::Ok().json(message),
        Ok(None) => not_found(),
        Err(err) => internal_error("Failed to update message", err),
    }
}

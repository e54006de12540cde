// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::iam::AuthRequest;
use crate::support::{ReplyPayload, TicketPriority, TicketStatus};
use crate::validation::{FieldErrors, forbidden, internal_error, not_found, unauthorized};

pub async fn list(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTickets).is_err() {
        return forbidden();
    }
    match state.tickets.list_for(None) {
        Ok(tickets) => HttpResponse::Ok().json(tickets),
        Err(err) => internal_error("Failed to list tickets", err),
    }
}

pub async fn get(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    let ticket = match state.tickets.get(path.into_inner()) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load ticket", err),
    };
    let action = Action::ViewTicket {
        requester: Some(ticket.created_by),
    };
    if authorize(Some(&user), &action).is_err() {
        return forbidden();
    }
    HttpResponse::Ok().json(ticket)
}

pub async fn reply(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<ReplyPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    if authorize(Some(&user), &Action::ManageTickets).is_err() {
        return forbidden();
    }
    let body = match payload.validate() {
        Ok(body) => body,
        Err(errors) => return errors.to_response(),
    };
    match state.tickets.add_reply(path.into_inner(), user.id, body, true) {
        Ok(Some(ticket)) => HttpResponse::Ok().json(ticket),
        Ok(None) => not_found(),
        Err(err) => internal_error("Failed to save reply", err),
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketUpdatePayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<TicketUpdatePayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTickets).is_err() {
        return forbidden();
    }

    let mut errors = FieldErrors::new();
    let status = match payload.status.as_deref() {
        None => None,
        Some(value) => {
            let parsed = TicketStatus::parse(value);
            if parsed.is_none() {
                errors.add("status", "Unknown ticket status");
            }
            parsed
        }
    };
    let priority = match payload.priority.as_deref() {
        None => None,
        Some(value) => {
            let parsed = TicketPriority::parse(value);
            if parsed.is_none() {
                errors.add("priority", "Unknown priority");
            }
            parsed
        }
    };
    if let Err(errors) = errors.into_result(()) {
        return errors.to_response();
    }

    match state.tickets.update(path.into_inner(), status, priority) {
        Ok(Some(ticket)) => HttpResponse::Ok().json(ticket),
        Ok(None) => not_found(),
        Err(err) => internal_error("Failed to update ticket", err),
    }
}

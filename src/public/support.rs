// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use log::info;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::iam::AuthRequest;
use crate::support::{ContactPayload, NewTicketPayload, ReplyPayload};
use crate::validation::{forbidden, internal_error, not_found, unauthorized};

/// Anonymous contact form. The message lands in the office inbox.
pub async fn contact(state: web::Data<AppState>, payload: web::Json<ContactPayload>) -> HttpResponse {
    let (name, email, subject, body) = match payload.validate() {
        Ok(fields) => fields,
        Err(errors) => return errors.to_response(),
    };
    match state.messages.create(name, email, subject, body) {
        Ok(message) => {
            info!("Contact message {} received", message.id);
            HttpResponse::Created().json(serde_json::json!({ "id": message.id }))
        }
        Err(err) => internal_error("Failed to save contact message", err),
    }
}

pub async fn list_tickets(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    match state.tickets.list_for(Some(user.id)) {
        Ok(tickets) => HttpResponse::Ok().json(tickets),
        Err(err) => internal_error("Failed to list tickets", err),
    }
}

pub async fn create_ticket(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<NewTicketPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    let (subject, body, priority) = match payload.validate() {
        Ok(fields) => fields,
        Err(errors) => return errors.to_response(),
    };
    match state.tickets.create(user.id, subject, body, priority) {
        Ok(ticket) => HttpResponse::Created().json(ticket),
        Err(err) => internal_error("Failed to create ticket", err),
    }
}

pub async fn get_ticket(
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

pub async fn reply_ticket(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<ReplyPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    let id = path.into_inner();
    let ticket = match state.tickets.get(id) {
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
    let body = match payload.validate() {
        Ok(body) => body,
        Err(errors) => return errors.to_response(),
    };
    match state
        .tickets
        .add_reply(id, user.id, body, user.role.is_staff())
    {
        Ok(Some(ticket)) => HttpResponse::Ok().json(ticket),
        Ok(None) => not_found(),
        Err(err) => internal_error("Failed to save reply", err),
    }
}

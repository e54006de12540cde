// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::iam::{AuthRequest, UserServices};
use crate::taxonomy::TagContext;
use crate::validation::{forbidden, internal_error};

#[derive(Debug, Serialize)]
struct DashboardSummary {
    posts_by_status: BTreeMap<&'static str, usize>,
    open_tickets: usize,
    new_messages: usize,
    active_tags_by_context: BTreeMap<&'static str, usize>,
    teachers: usize,
    staff: usize,
    labs: usize,
    accounts: usize,
}

pub async fn summary(
    req: HttpRequest,
    state: web::Data<AppState>,
    users: web::Data<UserServices>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ViewDashboard).is_err() {
        return forbidden();
    }

    let posts_by_status = match state.posts.count_by_status() {
        Ok(counts) => counts,
        Err(err) => return internal_error("Failed to count posts", err),
    };
    let open_tickets = match state.tickets.open_count() {
        Ok(count) => count,
        Err(err) => return internal_error("Failed to count tickets", err),
    };
    let new_messages = match state.messages.new_count() {
        Ok(count) => count,
        Err(err) => return internal_error("Failed to count messages", err),
    };

    let mut active_tags_by_context = BTreeMap::new();
    for context in TagContext::ALL {
        match state.tags.list(Some(*context), false) {
            Ok(tags) => {
                active_tags_by_context.insert(context.as_str(), tags.len());
            }
            Err(err) => return internal_error("Failed to count tags", err),
        }
    }

    let teachers = match state.teachers.snapshot() {
        Ok(records) => records.len(),
        Err(err) => return internal_error("Failed to count teachers", err),
    };
    let staff = match state.staff.snapshot() {
        Ok(records) => records.len(),
        Err(err) => return internal_error("Failed to count staff", err),
    };
    let labs = match state.labs.snapshot() {
        Ok(records) => records.len(),
        Err(err) => return internal_error("Failed to count labs", err),
    };

    HttpResponse::Ok().json(DashboardSummary {
        posts_by_status,
        open_tickets,
        new_messages,
        active_tags_by_context,
        teachers,
        staff,
        labs,
        accounts: users.count(),
    })
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::directory::TeacherRecord;
use crate::directory::forms::TeacherPayload;
use crate::iam::AuthRequest;
use crate::validation::{forbidden, internal_error, not_found, unauthorized};

/// Manage listing includes hidden records.
pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    match state.teachers.snapshot() {
        Ok(records) => {
            let mut list: Vec<TeacherRecord> = records.into_values().collect();
            list.sort_by_key(|record| (record.sort_order, record.id));
            HttpResponse::Ok().json(list)
        }
        Err(err) => internal_error("Failed to list teachers", err),
    }
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<TeacherPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageStaffRecords).is_err() {
        return forbidden();
    }
    let normalized = match payload.validate() {
        Ok(normalized) => normalized,
        Err(errors) => return errors.to_response(),
    };

    let mut records = match state.teachers.snapshot() {
        Ok(records) => records,
        Err(err) => return internal_error("Failed to load teachers", err),
    };
    let now = Utc::now();
    let record = TeacherRecord {
        id: records.keys().next_back().copied().unwrap_or(0) + 1,
        user_id: payload.user_id,
        name: payload.name.clone(),
        title: payload.title.clone(),
        bio: payload.bio.clone(),
        email: normalized.email,
        office: normalized.office,
        expertise: payload.expertise.clone(),
        visible: payload.visible.unwrap_or(true),
        sort_order: payload.sort_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };
    records.insert(record.id, record.clone());
    match state.teachers.persist(records) {
        Ok(()) => HttpResponse::Created().json(record),
        Err(err) => internal_error("Failed to save teacher record", err),
    }
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<TeacherPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    let id = path.into_inner();
    let existing = match state.teachers.get(id) {
        Ok(Some(record)) => record,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load teacher record", err),
    };
    // The owning account may edit its own record; reassigning ownership
    // stays an office concern.
    let action = Action::UpdateTeacherRecord {
        owner: existing.user_id,
    };
    if authorize(Some(&user), &action).is_err() {
        return forbidden();
    }
    if payload.user_id != existing.user_id
        && authorize(Some(&user), &Action::ManageStaffRecords).is_err()
    {
        return forbidden();
    }

    let normalized = match payload.validate() {
        Ok(normalized) => normalized,
        Err(errors) => return errors.to_response(),
    };

    let mut records = match state.teachers.snapshot() {
        Ok(records) => records,
        Err(err) => return internal_error("Failed to load teachers", err),
    };
    let Some(record) = records.get_mut(&id) else {
        return not_found();
    };
    record.user_id = payload.user_id;
    record.name = payload.name.clone();
    record.title = payload.title.clone();
    record.bio = payload.bio.clone();
    record.email = normalized.email;
    record.office = normalized.office;
    record.expertise = payload.expertise.clone();
    if let Some(visible) = payload.visible {
        record.visible = visible;
    }
    if let Some(sort_order) = payload.sort_order {
        record.sort_order = sort_order;
    }
    record.updated_at = Utc::now();
    let updated = record.clone();
    match state.teachers.persist(records) {
        Ok(()) => HttpResponse::Ok().json(updated),
        Err(err) => internal_error("Failed to save teacher record", err),
    }
}

pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageStaffRecords).is_err() {
        return forbidden();
    }
    match state.teachers.remove(path.into_inner()) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => not_found(),
        Err(err) => internal_error("Failed to delete teacher record", err),
    }
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::directory::StaffRecord;
use crate::directory::forms::StaffPayload;
use crate::iam::AuthRequest;
use crate::validation::{forbidden, internal_error, not_found};

pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    match state.staff.snapshot() {
        Ok(records) => {
            let mut list: Vec<StaffRecord> = records.into_values().collect();
            list.sort_by_key(|record| (record.sort_order, record.id));
            HttpResponse::Ok().json(list)
        }
        Err(err) => internal_error("Failed to list staff", err),
    }
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<StaffPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageStaffRecords).is_err() {
        return forbidden();
    }
    let email = match payload.validate() {
        Ok(email) => email,
        Err(errors) => return errors.to_response(),
    };

    let mut records = match state.staff.snapshot() {
        Ok(records) => records,
        Err(err) => return internal_error("Failed to load staff", err),
    };
    let now = Utc::now();
    let record = StaffRecord {
        id: records.keys().next_back().copied().unwrap_or(0) + 1,
        name: payload.name.clone(),
        title: payload.title.clone(),
        bio: payload.bio.clone(),
        email,
        visible: payload.visible.unwrap_or(true),
        sort_order: payload.sort_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };
    records.insert(record.id, record.clone());
    match state.staff.persist(records) {
        Ok(()) => HttpResponse::Created().json(record),
        Err(err) => internal_error("Failed to save staff record", err),
    }
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<StaffPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageStaffRecords).is_err() {
        return forbidden();
    }
    let email = match payload.validate() {
        Ok(email) => email,
        Err(errors) => return errors.to_response(),
    };

    let id = path.into_inner();
    let mut records = match state.staff.snapshot() {
        Ok(records) => records,
        Err(err) => return internal_error("Failed to load staff", err),
    };
    let Some(record) = records.get_mut(&id) else {
        return not_found();
    };
    record.name = payload.name.clone();
    record.title = payload.title.clone();
    record.bio = payload.bio.clone();
    record.email = email;
    if let Some(visible) = payload.visible {
        record.visible = visible;
    }
    if let Some(sort_order) = payload.sort_order {
        record.sort_order = sort_order;
    }
    record.updated_at = Utc::now();
    let updated = record.clone();
    match state.staff.persist(records) {
        Ok(()) => HttpResponse::Ok().json(updated),
        Err(err) => internal_error("Failed to save staff record", err),
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
    match state.staff.remove(path.into_inner()) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => not_found(),
        Err(err) => internal_error("Failed to delete staff record", err),
    }
}

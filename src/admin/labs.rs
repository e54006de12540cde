// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::directory::Lab;
use crate::directory::forms::LabPayload;
use crate::iam::AuthRequest;
use crate::validation::{forbidden, internal_error, not_found, unauthorized};

pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    match state.labs.snapshot() {
        Ok(labs) => {
            let mut list: Vec<Lab> = labs.into_values().collect();
            list.sort_by_key(|lab| (lab.sort_order, lab.id));
            HttpResponse::Ok().json(list)
        }
        Err(err) => internal_error("Failed to list labs", err),
    }
}

fn validate(state: &AppState, payload: &LabPayload) -> Result<crate::directory::forms::NormalizedLab, HttpResponse> {
    let teacher_exists = |id: u64| matches!(state.teachers.get(id), Ok(Some(_)));
    let tag_exists = |id: u64| matches!(state.tags.get(id), Ok(Some(_)));
    payload
        .validate(&teacher_exists, &tag_exists)
        .map_err(|errors| errors.to_response())
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<LabPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageLabs).is_err() {
        return forbidden();
    }
    let normalized = match validate(&state, &payload) {
        Ok(normalized) => normalized,
        Err(response) => return response,
    };

    let mut labs = match state.labs.snapshot() {
        Ok(labs) => labs,
        Err(err) => return internal_error("Failed to load labs", err),
    };
    let now = Utc::now();
    let lab = Lab {
        id: labs.keys().next_back().copied().unwrap_or(0) + 1,
        name: payload.name.clone(),
        description: payload.description.clone(),
        website: normalized.website,
        teacher_ids: normalized.teacher_ids,
        tag_ids: normalized.tag_ids,
        visible: payload.visible.unwrap_or(true),
        sort_order: payload.sort_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };
    labs.insert(lab.id, lab.clone());
    match state.labs.persist(labs) {
        Ok(()) => HttpResponse::Created().json(lab),
        Err(err) => internal_error("Failed to save lab", err),
    }
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<LabPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    let id = path.into_inner();
    let existing = match state.labs.get(id) {
        Ok(Some(lab)) => lab,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load lab", err),
    };
    // Members edit their own lab; the membership grant resolves through the
    // teacher records that claimed a portal account.
    let member_user_ids = match state.labs.member_user_ids(&existing, &state.teachers) {
        Ok(ids) => ids,
        Err(err) => return internal_error("Failed to resolve lab members", err),
    };
    if authorize(Some(&user), &Action::UpdateLab { member_user_ids }).is_err() {
        return forbidden();
    }

    let normalized = match validate(&state, &payload) {
        Ok(normalized) => normalized,
        Err(response) => return response,
    };

    let mut labs = match state.labs.snapshot() {
        Ok(labs) => labs,
        Err(err) => return internal_error("Failed to load labs", err),
    };
    let Some(lab) = labs.get_mut(&id) else {
        return not_found();
    };
    lab.name = payload.name.clone();
    lab.description = payload.description.clone();
    lab.website = normalized.website;
    lab.teacher_ids = normalized.teacher_ids;
    lab.tag_ids = normalized.tag_ids;
    if let Some(visible) = payload.visible {
        lab.visible = visible;
    }
    if let Some(sort_order) = payload.sort_order {
        lab.sort_order = sort_order;
    }
    lab.updated_at = Utc::now();
    let updated = lab.clone();
    match state.labs.persist(labs) {
        Ok(()) => HttpResponse::Ok().json(updated),
        Err(err) => internal_error("Failed to save lab", err),
    }
}

pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageLabs).is_err() {
        return forbidden();
    }
    match state.labs.remove(path.into_inner()) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => not_found(),
        Err(err) => internal_error("Failed to delete lab", err),
    }
}

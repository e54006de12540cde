// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::authz::{Action, authorize};
use crate::iam::AuthRequest;
use crate::taxonomy::forms::{MergeTagsPayload, SplitTagPayload, TagPayload};
use crate::taxonomy::service::{self, TaxonomyError};
use crate::taxonomy::TagContext;
use crate::validation::{forbidden, internal_error, not_found};

#[derive(Debug, Deserialize)]
pub struct TagListQuery {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub include_inactive: Option<bool>,
}

fn taxonomy_error_response(err: TaxonomyError) -> HttpResponse {
    match err {
        TaxonomyError::Validation(errors) => errors.to_response(),
        TaxonomyError::NotFound => not_found(),
        TaxonomyError::Store(msg) => internal_error("Tag operation failed", msg),
    }
}

/// The whole tag surface is admin-gated, reads included. Other staff see
/// tags only through the resources that carry them.
pub async fn list(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<TagListQuery>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTags).is_err() {
        return forbidden();
    }
    let context = match query.context.as_deref() {
        None => None,
        Some(value) => match TagContext::parse(value) {
            Some(context) => Some(context),
            None => return not_found(),
        },
    };
    match state
        .tags
        .list(context, query.include_inactive.unwrap_or(false))
    {
        Ok(tags) => HttpResponse::Ok().json(tags),
        Err(err) => internal_error("Failed to list tags", err),
    }
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<TagPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTags).is_err() {
        return forbidden();
    }
    let context = match payload.validate() {
        Ok(context) => context,
        Err(errors) => return errors.to_response(),
    };
    match service::create_tag(&state.tags, context, &payload) {
        Ok(tag) => HttpResponse::Created().json(tag),
        Err(err) => taxonomy_error_response(err),
    }
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<TagPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTags).is_err() {
        return forbidden();
    }
    if let Err(errors) = payload.validate() {
        return errors.to_response();
    }
    match service::update_tag(&state.tags, path.into_inner(), &payload) {
        Ok(tag) => HttpResponse::Ok().json(tag),
        Err(err) => taxonomy_error_response(err),
    }
}

pub async fn merge(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<MergeTagsPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTags).is_err() {
        return forbidden();
    }
    let source_ids = match payload.validate() {
        Ok(source_ids) => source_ids,
        Err(errors) => return errors.to_response(),
    };
    let collections = state.tagged_collections();
    match service::merge_tags(&state.tags, &collections, payload.target_id, &source_ids) {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => taxonomy_error_response(err),
    }
}

pub async fn split(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<SplitTagPayload>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTags).is_err() {
        return forbidden();
    }
    let names = match payload.validate() {
        Ok(names) => names,
        Err(errors) => return errors.to_response(),
    };
    match service::split_tag(
        &state.tags,
        path.into_inner(),
        &names,
        payload.keep_original,
        payload.color.as_deref(),
    ) {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => taxonomy_error_response(err),
    }
}

/// Deletion is reserved for unused tags; anything referenced must be
/// merged away instead so associations never dangle.
pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTags).is_err() {
        return forbidden();
    }
    let tag_id = path.into_inner();
    match state.tags.get(tag_id) {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load tag", err),
    }
    for collection in state.tagged_collections() {
        match collection.count_for_tag(tag_id) {
            Ok(0) => {}
            Ok(_) => {
                let mut errors = crate::validation::FieldErrors::new();
                errors.add("tag", "Tag is still in use; merge it into another tag first");
                return errors.to_response();
            }
            Err(err) => return internal_error("Failed to count tag usage", err),
        }
    }
    let mut tags = match state.tags.snapshot() {
        Ok(tags) => tags,
        Err(err) => return internal_error("Failed to load tags", err),
    };
    tags.remove(&tag_id);
    match state.tags.persist(tags) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => internal_error("Failed to delete tag", err),
    }
}

/// Per-collection reference counts for a tag, consulted before a merge.
pub async fn usage(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> HttpResponse {
    if authorize(req.user_info().as_ref(), &Action::ManageTags).is_err() {
        return forbidden();
    }
    let tag_id = path.into_inner();
    match state.tags.get(tag_id) {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load tag", err),
    }
    let mut counts = serde_json::Map::new();
    for collection in state.tagged_collections() {
        match collection.count_for_tag(tag_id) {
            Ok(count) => {
                counts.insert(collection.label().to_string(), count.into());
            }
            Err(err) => return internal_error("Failed to count tag usage", err),
        }
    }
    HttpResponse::Ok().json(serde_json::json!({ "tag_id": tag_id, "usage": counts }))
}

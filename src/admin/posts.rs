// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::attachments::{
    Attachment, AttachmentKind, AttachmentOwner, AttachmentVisibility,
};
use crate::authz::{Action, authorize};
use crate::bulletin::forms::{NewFilePayload, NewLinkPayload, PostFormContext, PostPayload};
use crate::bulletin::store::PostQuery;
use crate::bulletin::{Post, PostStatus, PostVisibility};
use crate::iam::AuthRequest;
use crate::taxonomy::store::slugify;
use crate::validation::{FieldErrors, forbidden, internal_error, not_found, unauthorized};

#[derive(Debug, Serialize)]
struct ManagedPost {
    #[serde(flatten)]
    post: Post,
    attachments: Vec<Attachment>,
}

fn managed_post(state: &AppState, post: Post) -> Result<ManagedPost, HttpResponse> {
    let attachments = state
        .attachments
        .list_for_owner(AttachmentOwner::Post(post.id))
        .map_err(|err| internal_error("Failed to load attachments", err))?;
    Ok(ManagedPost { post, attachments })
}

pub async fn list(state: web::Data<AppState>, query: web::Query<PostQuery>) -> HttpResponse {
    match state.posts.manage_page(&query) {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => internal_error("Failed to list posts", err),
    }
}

pub async fn get(state: web::Data<AppState>, path: web::Path<u64>) -> HttpResponse {
    match state.posts.get(path.into_inner()) {
        Ok(Some(post)) => match managed_post(&state, post) {
            Ok(body) => HttpResponse::Ok().json(body),
            Err(response) => response,
        },
        Ok(None) => not_found(),
        Err(err) => internal_error("Failed to load post", err),
    }
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<PostPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    if authorize(Some(&user), &Action::CreatePost).is_err() {
        return forbidden();
    }

    let draft = match validate_payload(&state, &payload, None) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    let id = match state.posts.next_id() {
        Ok(id) => id,
        Err(err) => return internal_error("Failed to allocate post id", err),
    };
    let slug = match draft.slug.clone() {
        Some(slug) => slug,
        None => match derive_slug(&state, &draft.title, state.config.primary_locale(), None) {
            Ok(slug) => slug,
            Err(response) => return response,
        },
    };

    let now = Utc::now();
    let post = Post {
        id,
        slug,
        title: draft.title.clone(),
        summary: draft.summary.clone(),
        content: draft.content.clone(),
        status: draft.status,
        visibility: draft.visibility,
        publish_at: draft.publish_at,
        expire_at: draft.expire_at,
        pinned: draft.pinned,
        category_id: draft.category_id,
        tag_ids: draft.tag_ids.clone(),
        created_by: user.id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let mut posts = match state.posts.snapshot() {
        Ok(posts) => posts,
        Err(err) => return internal_error("Failed to load posts", err),
    };
    posts.insert(post.id, post.clone());
    if let Err(err) = state.posts.persist(posts) {
        return internal_error("Failed to save post", err);
    }

    if let Err(response) = apply_attachments(
        &state,
        AttachmentOwner::Post(post.id),
        post.visibility,
        &draft.kept_attachment_ids,
        &payload.new_files,
        &payload.new_links,
    ) {
        return response;
    }

    log::info!("Created post {} ({})", post.id, post.slug);
    match managed_post(&state, post) {
        Ok(body) => HttpResponse::Created().json(body),
        Err(response) => response,
    }
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<PostPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    if authorize(Some(&user), &Action::UpdatePost).is_err() {
        return forbidden();
    }

    let id = path.into_inner();
    let existing = match state.posts.get(id) {
        Ok(Some(post)) => post,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load post", err),
    };

    let draft = match validate_payload(&state, &payload, Some(id)) {
        Ok(draft) => draft,
        Err(response) => return response,
    };
    if !existing.status.can_transition_to(draft.status) {
        let mut errors = FieldErrors::new();
        errors.add(
            "status",
            format!(
                "A {} post cannot move to {}",
                existing.status.as_str(),
                draft.status.as_str()
            ),
        );
        return errors.to_response();
    }

    let slug = match draft.slug.clone() {
        Some(slug) => slug,
        None => existing.slug.clone(),
    };

    let mut posts = match state.posts.snapshot() {
        Ok(posts) => posts,
        Err(err) => return internal_error("Failed to load posts", err),
    };
    let Some(post) = posts.get_mut(&id) else {
        return not_found();
    };
    post.slug = slug;
    post.title = draft.title.clone();
    post.summary = draft.summary.clone();
    post.content = draft.content.clone();
    post.status = draft.status;
    post.visibility = draft.visibility;
    post.publish_at = draft.publish_at;
    post.expire_at = draft.expire_at;
    post.pinned = draft.pinned;
    post.category_id = draft.category_id;
    post.tag_ids = draft.tag_ids.clone();
    post.updated_at = Utc::now();
    let updated = post.clone();
    if let Err(err) = state.posts.persist(posts) {
        return internal_error("Failed to save post", err);
    }

    if let Err(response) = apply_attachments(
        &state,
        AttachmentOwner::Post(id),
        updated.visibility,
        &draft.kept_attachment_ids,
        &payload.new_files,
        &payload.new_links,
    ) {
        return response;
    }

    match managed_post(&state, updated) {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(response) => response,
    }
}

pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    let id = path.into_inner();
    let existing = match state.posts.get(id) {
        Ok(Some(post)) => post,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load post", err),
    };
    let action = Action::DeletePost {
        author: Some(existing.created_by),
    };
    if authorize(Some(&user), &action).is_err() {
        return forbidden();
    }
    match state.posts.soft_delete(id) {
        Ok(true) => {
            log::info!("Deleted post {} ({})", id, existing.slug);
            HttpResponse::NoContent().finish()
        }
        Ok(false) => not_found(),
        Err(err) => internal_error("Failed to delete post", err),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

pub async fn set_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<StatusPayload>,
) -> HttpResponse {
    let Some(user) = req.user_info() else {
        return unauthorized();
    };
    if authorize(Some(&user), &Action::UpdatePost).is_err() {
        return forbidden();
    }

    let id = path.into_inner();
    let existing = match state.posts.get(id) {
        Ok(Some(post)) => post,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load post", err),
    };

    let mut errors = FieldErrors::new();
    let Some(next) = PostStatus::parse(&payload.status) else {
        errors.add("status", "Unknown post status");
        return errors.to_response();
    };
    if !existing.status.can_transition_to(next) {
        errors.add(
            "status",
            format!(
                "A {} post cannot move to {}",
                existing.status.as_str(),
                next.as_str()
            ),
        );
    }
    // Moving into scheduled needs a publish date that is still ahead.
    if next == PostStatus::Scheduled
        && existing.publish_at.is_none_or(|at| at <= Utc::now())
    {
        errors.add(
            "published_at",
            "A future publish date is required for scheduled posts",
        );
    }
    if let Err(errors) = errors.into_result(()) {
        return errors.to_response();
    }

    let mut posts = match state.posts.snapshot() {
        Ok(posts) => posts,
        Err(err) => return internal_error("Failed to load posts", err),
    };
    let Some(post) = posts.get_mut(&id) else {
        return not_found();
    };
    post.status = next;
    post.updated_at = Utc::now();
    let updated = post.clone();
    if let Err(err) = state.posts.persist(posts) {
        return internal_error("Failed to save post", err);
    }
    HttpResponse::Ok().json(updated)
}

fn validate_payload(
    state: &AppState,
    payload: &PostPayload,
    exclude_id: Option<u64>,
) -> Result<crate::bulletin::forms::PostDraft, HttpResponse> {
    let slug_taken = |slug: &str| state.posts.slug_exists(slug, exclude_id).unwrap_or(true);
    let category_exists = |id: u64| state.categories.exists(id).unwrap_or(false);
    let tag_exists = |id: u64| matches!(state.tags.get(id), Ok(Some(_)));
    let ctx = PostFormContext {
        exclude_id,
        primary: state.config.primary_locale(),
        now: Utc::now(),
        max_file_bytes: state.config.max_upload_bytes(),
        slug_taken: &slug_taken,
        category_exists: &category_exists,
        tag_exists: &tag_exists,
    };
    payload.validate(&ctx).map_err(|errors| errors.to_response())
}

fn derive_slug(
    state: &AppState,
    title: &crate::locale::LocalizedText,
    primary: crate::locale::Locale,
    exclude_id: Option<u64>,
) -> Result<String, HttpResponse> {
    // Prefer the English title for ASCII slugs; the primary-locale title is
    // often entirely non-ASCII and would slugify to nothing.
    let base = match title.get(crate::locale::Locale::En) {
        Some(en) => slugify(en),
        None => slugify(title.resolve(primary)),
    };
    let base = if base == "tag" || base.is_empty() {
        format!("post-{}", Utc::now().format("%Y%m%d%H%M%S"))
    } else {
        base
    };
    let taken = |candidate: &str| {
        state
            .posts
            .slug_exists(candidate, exclude_id)
            .map_err(|err| internal_error("Failed to check slug", err))
    };
    if !taken(&base)? {
        return Ok(base);
    }
    for n in 2.. {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate)? {
            return Ok(candidate);
        }
    }
    unreachable!()
}

/// Apply the attachment delta for an owner: drop everything not kept, then
/// store new files and links. File visibility follows the post's.
fn apply_attachments(
    state: &AppState,
    owner: AttachmentOwner,
    visibility: PostVisibility,
    kept_ids: &[u64],
    new_files: &[NewFilePayload],
    new_links: &[NewLinkPayload],
) -> Result<(), HttpResponse> {
    let removed = state
        .attachments
        .retain_for_owner(owner, kept_ids)
        .map_err(|err| internal_error("Failed to prune attachments", err))?;
    for disk_path in removed {
        let path = state.runtime_paths.upload_path(&disk_path);
        if let Err(err) = std::fs::remove_file(&path) {
            log::warn!("Failed to unlink {}: {}", path.display(), err);
        }
    }

    let attachment_visibility = match visibility {
        PostVisibility::Public => AttachmentVisibility::Public,
        PostVisibility::Internal => AttachmentVisibility::Authorized,
    };

    let mut attachments = state
        .attachments
        .snapshot()
        .map_err(|err| internal_error("Failed to load attachments", err))?;
    let mut next_id = attachments.keys().next_back().copied().unwrap_or(0) + 1;
    let now = Utc::now();

    for file in new_files {
        let bytes = BASE64.decode(file.content.as_bytes()).map_err(|_| {
            let mut errors = FieldErrors::new();
            errors.add("new_files", "File content is not valid base64");
            errors.to_response()
        })?;
        let filename = sanitize_filename(&file.filename);
        let disk_path = format!("{}-{}", Uuid::new_v4(), filename);
        let path = state.runtime_paths.upload_path(&disk_path);
        std::fs::write(&path, &bytes)
            .map_err(|err| internal_error("Failed to store upload", err))?;

        let mime_type = file.mime_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string()
        });
        attachments.insert(
            next_id,
            Attachment {
                id: next_id,
                owner,
                title: Some(file.filename.clone()),
                kind: AttachmentKind::File {
                    disk_path,
                    filename,
                    mime_type,
                    size: bytes.len() as u64,
                },
                visibility: attachment_visibility,
                created_at: now,
            },
        );
        next_id += 1;
    }
    for link in new_links {
        attachments.insert(
            next_id,
            Attachment {
                id: next_id,
                owner,
                title: Some(link.title.clone()),
                kind: AttachmentKind::Link {
                    external_url: link.external_url.clone(),
                },
                visibility: attachment_visibility,
                created_at: now,
            },
        );
        next_id += 1;
    }

    state
        .attachments
        .persist(attachments)
        .map_err(|err| internal_error("Failed to save attachments", err))?;
    Ok(())
}

/// Keep only a safe subset of the client filename for on-disk names.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_strips_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("syllabus (v2).pdf"), "syllabus__v2_.pdf");
        assert_eq!(sanitize_filename("///"), "upload");
    }
}

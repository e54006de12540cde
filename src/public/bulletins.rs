// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::app_state::AppState;
use crate::attachments::{Attachment, AttachmentOwner};
use crate::authz::{Action, authorize};
use crate::bulletin::Post;
use crate::bulletin::store::{Page, PostQuery};
use crate::iam::AuthRequest;
use crate::locale::LocalizedText;
use crate::taxonomy::Tag;
use crate::validation::{internal_error, not_found};

#[derive(Debug, Serialize)]
struct TagSummary {
    id: u64,
    name: LocalizedText,
    slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

impl TagSummary {
    fn from_tag(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
            slug: tag.slug.clone(),
            color: tag.color.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AttachmentSummary {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    url: String,
    is_link: bool,
}

impl AttachmentSummary {
    fn from_attachment(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id,
            title: attachment.title.clone(),
            url: attachment.public_url(),
            is_link: attachment.is_link(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BulletinListItem {
    id: u64,
    slug: String,
    title: LocalizedText,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    summary: LocalizedText,
    pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<u64>,
    tags: Vec<TagSummary>,
}

#[derive(Debug, Serialize)]
struct BulletinDetail {
    id: u64,
    slug: String,
    title: LocalizedText,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    summary: LocalizedText,
    content: LocalizedText,
    pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<u64>,
    tags: Vec<TagSummary>,
    attachments: Vec<AttachmentSummary>,
}

fn tag_summaries(tags: &BTreeMap<u64, Tag>, tag_ids: &[u64]) -> Vec<TagSummary> {
    tag_ids
        .iter()
        .filter_map(|id| tags.get(id))
        .map(TagSummary::from_tag)
        .collect()
}

pub async fn list(state: web::Data<AppState>, query: web::Query<PostQuery>) -> HttpResponse {
    let now = Utc::now();
    let page = match state.posts.public_page(&query, now) {
        Ok(page) => page,
        Err(err) => return internal_error("Failed to list bulletins", err),
    };
    let tags = match state.tags.snapshot() {
        Ok(tags) => tags,
        Err(err) => return internal_error("Failed to load tags", err),
    };
    let items: Vec<BulletinListItem> = page
        .items
        .iter()
        .map(|post| BulletinListItem {
            id: post.id,
            slug: post.slug.clone(),
            title: post.title.clone(),
            summary: post.summary.clone(),
            pinned: post.pinned,
            publish_at: post.publish_at,
            category_id: post.category_id,
            tags: tag_summaries(&tags, &post.tag_ids),
        })
        .collect();
    HttpResponse::Ok().json(Page {
        items,
        total: page.total,
        page: page.page,
        per_page: page.per_page,
    })
}

pub async fn detail(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let post = match state.posts.get_by_slug(&path) {
        Ok(Some(post)) => post,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load bulletin", err),
    };
    let action = Action::ViewPost {
        publicly_visible: post.is_publicly_visible(Utc::now()),
    };
    // A denied lookup reads exactly like a missing one.
    if authorize(req.user_info().as_ref(), &action).is_err() {
        return not_found();
    }
    match detail_body(&state, &post) {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(response) => response,
    }
}

fn detail_body(state: &AppState, post: &Post) -> Result<BulletinDetail, HttpResponse> {
    let tags = state
        .tags
        .snapshot()
        .map_err(|err| internal_error("Failed to load tags", err))?;
    let attachments = state
        .attachments
        .list_for_owner(AttachmentOwner::Post(post.id))
        .map_err(|err| internal_error("Failed to load attachments", err))?;
    Ok(BulletinDetail {
        id: post.id,
        slug: post.slug.clone(),
        title: post.title.clone(),
        summary: post.summary.clone(),
        content: post.content.clone(),
        pinned: post.pinned,
        publish_at: post.publish_at,
        expire_at: post.expire_at,
        category_id: post.category_id,
        tags: tag_summaries(&tags, &post.tag_ids),
        attachments: attachments
            .iter()
            .map(AttachmentSummary::from_attachment)
            .collect(),
    })
}

pub async fn categories(state: web::Data<AppState>) -> HttpResponse {
    match state.categories.list_tree() {
        Ok(tree) => HttpResponse::Ok().json(tree),
        Err(err) => internal_error("Failed to list categories", err),
    }
}

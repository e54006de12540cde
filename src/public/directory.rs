// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::directory::{StaffRecord, TeacherRecord};
use crate::locale::LocalizedText;
use crate::validation::internal_error;

#[derive(Debug, Deserialize)]
pub struct PeopleQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// Public teacher card. Account ownership stays internal.
#[derive(Debug, Serialize)]
struct TeacherView {
    id: u64,
    name: LocalizedText,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    title: LocalizedText,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    bio: LocalizedText,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    office: Option<String>,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    expertise: LocalizedText,
}

impl TeacherView {
    fn from_record(record: TeacherRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            title: record.title,
            bio: record.bio,
            email: record.email,
            office: record.office,
            expertise: record.expertise,
        }
    }
}

#[derive(Debug, Serialize)]
struct StaffView {
    id: u64,
    name: LocalizedText,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    title: LocalizedText,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    bio: LocalizedText,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl StaffView {
    fn from_record(record: StaffRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            title: record.title,
            bio: record.bio,
            email: record.email,
        }
    }
}

#[derive(Debug, Serialize)]
struct PeopleResponse {
    teachers: Vec<TeacherView>,
    staff: Vec<StaffView>,
}

pub async fn people(state: web::Data<AppState>, query: web::Query<PeopleQuery>) -> HttpResponse {
    let primary = state.config.primary_locale();
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let teachers = match state.teachers.public_list(search, primary) {
        Ok(records) => records.into_iter().map(TeacherView::from_record).collect(),
        Err(err) => return internal_error("Failed to list teachers", err),
    };
    let staff = match state.staff.public_list(search, primary) {
        Ok(records) => records.into_iter().map(StaffView::from_record).collect(),
        Err(err) => return internal_error("Failed to list staff", err),
    };
    HttpResponse::Ok().json(PeopleResponse { teachers, staff })
}

#[derive(Debug, Serialize)]
struct LabMember {
    id: u64,
    name: LocalizedText,
}

#[derive(Debug, Serialize)]
struct LabTag {
    id: u64,
    name: LocalizedText,
    slug: String,
}

#[derive(Debug, Serialize)]
struct LabView {
    id: u64,
    name: LocalizedText,
    #[serde(skip_serializing_if = "LocalizedText::is_empty")]
    description: LocalizedText,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<String>,
    members: Vec<LabMember>,
    tags: Vec<LabTag>,
}

pub async fn labs(state: web::Data<AppState>) -> HttpResponse {
    let primary = state.config.primary_locale();
    let labs = match state.labs.public_list(primary) {
        Ok(labs) => labs,
        Err(err) => return internal_error("Failed to list labs", err),
    };
    let teachers = match state.teachers.snapshot() {
        Ok(records) => records,
        Err(err) => return internal_error("Failed to load teachers", err),
    };
    let tags = match state.tags.snapshot() {
        Ok(tags) => tags,
        Err(err) => return internal_error("Failed to load tags", err),
    };

    let views: Vec<LabView> = labs
        .into_iter()
        .map(|lab| {
            let members = lab
                .teacher_ids
                .iter()
                .filter_map(|id| teachers.get(id))
                .filter(|record| record.visible)
                .map(|record| LabMember {
                    id: record.id,
                    name: record.name.clone(),
                })
                .collect();
            let lab_tags = lab
                .tag_ids
                .iter()
                .filter_map(|id| tags.get(id))
                .map(|tag| LabTag {
                    id: tag.id,
                    name: tag.name.clone(),
                    slug: tag.slug.clone(),
                })
                .collect();
            LabView {
                id: lab.id,
                name: lab.name,
                description: lab.description,
                website: lab.website,
                members,
                tags: lab_tags,
            }
        })
        .collect();
    HttpResponse::Ok().json(views)
}

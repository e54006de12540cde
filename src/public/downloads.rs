// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use log::warn;
use std::fs;

use crate::app_state::AppState;
use crate::attachments::{DownloadResolution, resolve_download};
use crate::iam::AuthRequest;
use crate::validation::{forbidden, internal_error, not_found, unauthorized};

pub async fn download(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> HttpResponse {
    let attachment = match state.attachments.get(path.into_inner()) {
        Ok(Some(attachment)) => attachment,
        Ok(None) => return not_found(),
        Err(err) => return internal_error("Failed to load attachment", err),
    };

    let user = req.user_info();
    if attachment
        .visibility
        .required_capability()
        .check(user.as_ref())
        .is_err()
    {
        return if user.is_none() { unauthorized() } else { forbidden() };
    }

    match resolve_download(&attachment, &state.runtime_paths.uploads_dir) {
        DownloadResolution::Redirect(url) => HttpResponse::Found()
            .insert_header((header::LOCATION, url))
            .finish(),
        DownloadResolution::ServeFile(path, filename, mime_type) => match fs::read(&path) {
            Ok(bytes) => HttpResponse::Ok()
                .content_type(mime_type)
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                        filename.replace('"', ""),
                        urlencoding::encode(&filename)
                    ),
                ))
                .body(bytes),
            Err(err) => internal_error("Failed to read attachment file", err),
        },
        DownloadResolution::Missing => {
            warn!("Attachment {} references a missing file", attachment.id);
            not_found()
        }
    }
}

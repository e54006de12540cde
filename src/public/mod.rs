// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! The public surface: bulletins, the people directory, attachment
//! downloads, the contact form and the ticket desk.

pub mod auth;
pub mod bulletins;
pub mod directory;
pub mod downloads;
pub mod support;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/bulletins", web::get().to(bulletins::list))
        .route("/bulletins/categories", web::get().to(bulletins::categories))
        .route("/bulletins/{slug}", web::get().to(bulletins::detail))
        .route("/people", web::get().to(directory::people))
        .route("/labs", web::get().to(directory::labs))
        .route("/attachments/{id}/download", web::get().to(downloads::download))
        .route("/contact", web::post().to(support::contact))
        .route("/support/tickets", web::get().to(support::list_tickets))
        .route("/support/tickets", web::post().to(support::create_ticket))
        .route("/support/tickets/{id}", web::get().to(support::get_ticket))
        .route(
            "/support/tickets/{id}/replies",
            web::post().to(support::reply_ticket),
        )
        .route("/login/api", web::post().to(auth::login))
        .route("/login/logout-api", web::post().to(auth::logout))
        .route("/api/profile", web::get().to(auth::profile))
        .route("/api/profile", web::put().to(auth::update_profile));
}

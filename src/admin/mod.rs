// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! The manage surface: staff-only JSON endpoints mounted under the
//! configured admin path.

pub mod dashboard;
pub mod labs;
pub mod messages;
pub mod middleware;
pub mod posts;
pub mod staff;
pub mod tags;
pub mod teachers;
pub mod tickets;
pub mod users;

use actix_web::dev::HttpServiceFactory;
use actix_web::web;

use middleware::RequireStaffMiddleware;

/// The manage scope. The path comes from `admin.path` in the configuration;
/// the scope owns a copy, so the returned factory captures nothing.
pub fn manage_scope(path: &str) -> impl HttpServiceFactory + use<> {
    web::scope(path)
        .wrap(RequireStaffMiddleware)
        .route("/dashboard", web::get().to(dashboard::summary))
        .route("/posts", web::get().to(posts::list))
        .route("/posts", web::post().to(posts::create))
        .route("/posts/{id}", web::get().to(posts::get))
        .route("/posts/{id}", web::put().to(posts::update))
        .route("/posts/{id}", web::delete().to(posts::delete))
        .route("/posts/{id}/status", web::put().to(posts::set_status))
        .route("/tags", web::get().to(tags::list))
        .route("/tags", web::post().to(tags::create))
        .route("/tags/{id}", web::put().to(tags::update))
        .route("/tags/{id}", web::delete().to(tags::delete))
        .route("/tags/{id}/usage", web::get().to(tags::usage))
        .route("/tags/{id}/split", web::post().to(tags::split))
        .route("/tags/merge", web::post().to(tags::merge))
        .route("/teachers", web::get().to(teachers::list))
        .route("/teachers", web::post().to(teachers::create))
        .route("/teachers/{id}", web::put().to(teachers::update))
        .route("/teachers/{id}", web::delete().to(teachers::delete))
        .route("/staff", web::get().to(staff::list))
        .route("/staff", web::post().to(staff::create))
        .route("/staff/{id}", web::put().to(staff::update))
        .route("/staff/{id}", web::delete().to(staff::delete))
        .route("/labs", web::get().to(labs::list))
        .route("/labs", web::post().to(labs::create))
        .route("/labs/{id}", web::put().to(labs::update))
        .route("/labs/{id}", web::delete().to(labs::delete))
        .route("/users", web::get().to(users::list))
        .route("/users", web::post().to(users::create))
        .route("/users/{id}", web::get().to(users::get))
        .route("/users/{id}", web::put().to(users::update))
        .route("/users/{id}", web::delete().to(users::delete))
        .route("/tickets", web::get().to(tickets::list))
        .route("/tickets/{id}", web::get().to(tickets::get))
        .route("/tickets/{id}", web::put().to(tickets::update))
        .route("/tickets/{id}/replies", web::post().to(tickets::reply))
        .route("/messages", web::get().to(messages::list))
        .route("/messages/{id}/status", web::put().to(messages::set_status))
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use campanile::app_state::AppState;
use campanile::config::ValidatedConfig;
use campanile::iam::middleware::JwtAuthMiddlewareFactory;
use campanile::iam::{JwtService, MemoryUserStore, Role, User, UserServices};
use campanile::runtime_paths::RuntimePaths;
use campanile::util::TestFixtureRoot;
use campanile::util::test_config;
use campanile::{admin, public};
use std::collections::HashMap;
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@example.edu";
pub const MANAGER_EMAIL: &str = "manager@example.edu";
pub const TEACHER_EMAIL: &str = "teacher@example.edu";
pub const MEMBER_EMAIL: &str = "member@example.edu";
pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestHarness {
    pub fixture: TestFixtureRoot,
    pub config: Arc<ValidatedConfig>,
    pub runtime_paths: RuntimePaths,
    pub app_state: Arc<AppState>,
    pub user_services: Arc<UserServices>,
}

#[derive(Clone)]
pub struct AppBundle {
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
    pub user_services: Arc<UserServices>,
    pub admin_path: String,
}

impl TestHarness {
    pub fn new() -> Self {
        let fixture = TestFixtureRoot::new_unique("http-suite").expect("fixture root");
        let config = Arc::new(test_config());
        let runtime_paths = fixture.runtime_paths().expect("runtime paths");

        let user_services = Arc::new(
            UserServices::new(
                Box::new(MemoryUserStore::new(HashMap::new())),
                JwtService::new(&config),
            )
            .expect("user services"),
        );
        for (email, name, role) in [
            (ADMIN_EMAIL, "Site Admin", Role::Admin),
            (MANAGER_EMAIL, "Office Manager", Role::Manager),
            (TEACHER_EMAIL, "Prof. Lin", Role::Teacher),
            (MEMBER_EMAIL, "Plain Member", Role::User),
        ] {
            user_services
                .create_user(email, name, Some(PASSWORD), role)
                .expect("seed user");
        }

        let app_state = Arc::new(
            AppState::new(config.clone(), runtime_paths.clone()).expect("app state"),
        );

        Self {
            fixture,
            config,
            runtime_paths,
            app_state,
            user_services,
        }
    }

    pub fn user(&self, email: &str) -> User {
        self.user_services.find_by_email(email).expect("seeded user")
    }

    pub fn auth_cookie(&self, email: &str) -> actix_web::cookie::Cookie<'static> {
        let user = self.user(email);
        let token = self
            .user_services
            .jwt()
            .create_token(&user)
            .expect("jwt token");
        self.user_services
            .jwt()
            .create_auth_cookie(&token)
            .into_owned()
    }

    pub fn app_bundle(&self) -> AppBundle {
        AppBundle {
            config: self.config.clone(),
            app_state: self.app_state.clone(),
            user_services: self.user_services.clone(),
            admin_path: self.config.admin.path.clone(),
        }
    }
}

pub fn build_test_app(
    bundle: AppBundle,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::from(bundle.config))
        .app_data(web::Data::from(bundle.app_state))
        .app_data(web::Data::from(bundle.user_services))
        .wrap(JwtAuthMiddlewareFactory)
        .service(admin::manage_scope(&bundle.admin_path))
        .configure(public::configure)
}

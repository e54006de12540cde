// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

#[actix_web::test]
async fn account_listing_never_leaks_hashes() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::get()
        .uri("/manage/users")
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users: Value = test::read_body_json(resp).await;
    let users = users.as_array().expect("user array");
    assert_eq!(users.len(), 4);
    for user in users {
        assert!(user.get("password_hash").is_none());
        assert_eq!(user["has_password"], json!(true));
    }
}

#[actix_web::test]
async fn duplicate_email_is_a_field_error() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::post()
        .uri("/manage/users")
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({
            "email": common::MEMBER_EMAIL,
            "name": "Duplicate",
            "role": "user",
            "password": "another-password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["email"].is_array());
}

#[actix_web::test]
async fn admins_cannot_remove_or_suspend_themselves() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;
    let admin_id = harness.user(common::ADMIN_EMAIL).id;

    let req = test::TestRequest::delete()
        .uri(&format!("/manage/users/{}", admin_id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri(&format!("/manage/users/{}", admin_id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({ "status": "suspended" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["status"].is_array());
}

#[actix_web::test]
async fn suspended_accounts_cannot_log_in() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;
    let member_id = harness.user(common::MEMBER_EMAIL).id;

    // A working login first.
    let req = test::TestRequest::post()
        .uri("/login/api")
        .set_json(json!({ "email": common::MEMBER_EMAIL, "password": common::PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.response()
            .cookies()
            .any(|cookie| cookie.name() == "campanile_auth")
    );

    let req = test::TestRequest::put()
        .uri(&format!("/manage/users/{}", member_id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({ "status": "suspended" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/login/api")
        .set_json(json!({ "email": common::MEMBER_EMAIL, "password": common::PASSWORD }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn bad_credentials_fail_uniformly() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    for (email, password) in [
        (common::MEMBER_EMAIL, "wrong-password"),
        ("nobody@example.edu", common::PASSWORD),
    ] {
        let req = test::TestRequest::post()
            .uri("/login/api")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("Invalid email or password"));
    }
}

#[actix_web::test]
async fn role_changes_are_reserved_to_admins() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;
    let member_id = harness.user(common::MEMBER_EMAIL).id;

    let req = test::TestRequest::put()
        .uri(&format!("/manage/users/{}", member_id))
        .cookie(harness.auth_cookie(common::MANAGER_EMAIL))
        .set_json(json!({ "role": "teacher" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri(&format!("/manage/users/{}", member_id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({ "role": "teacher" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["role"], json!("teacher"));
}

// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

#[actix_web::test]
async fn scheduled_post_without_publish_date_is_rejected() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::post()
        .uri("/manage/posts")
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({
            "title": { "zh-TW": "期中考" },
            "content": { "zh-TW": "內容" },
            "status": "scheduled"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["published_at"].is_array());
}

#[actix_web::test]
async fn archived_posts_refuse_further_transitions() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::post()
        .uri("/manage/posts")
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({
            "title": { "zh-TW": "舊公告" },
            "content": { "zh-TW": "內容" },
            "status": "published"
        }))
        .to_request();
    let post: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = post["id"].as_u64().expect("post id");

    let req = test::TestRequest::put()
        .uri(&format!("/manage/posts/{}/status", id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({ "status": "archived" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::OK
    );

    let req = test::TestRequest::put()
        .uri(&format!("/manage/posts/{}/status", id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({ "status": "published" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["status"].is_array());
}

#[actix_web::test]
async fn uploaded_files_round_trip_through_the_download_endpoint() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::post()
        .uri("/manage/posts")
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({
            "title": { "zh-TW": "課程大綱" },
            "content": { "zh-TW": "內容" },
            "status": "published",
            "new_files": [{ "filename": "syllabus.pdf", "content": "aGVsbG8=" }],
            "new_links": [{ "title": "Course site", "external_url": "https://example.edu/course" }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Value = test::read_body_json(resp).await;
    let attachments = post["attachments"].as_array().expect("attachments");
    assert_eq!(attachments.len(), 2);

    let file = attachments
        .iter()
        .find(|a| a["type"] == json!("file"))
        .expect("file attachment");
    assert_eq!(file["filename"], json!("syllabus.pdf"));
    let file_id = file["id"].as_u64().expect("attachment id");

    let req = test::TestRequest::get()
        .uri(&format!("/attachments/{}/download", file_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"hello");
}

#[actix_web::test]
async fn only_the_author_or_an_admin_may_delete() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::post()
        .uri("/manage/posts")
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .set_json(json!({
            "title": { "zh-TW": "公告" },
            "content": { "zh-TW": "內容" },
            "status": "draft"
        }))
        .to_request();
    let post: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = post["id"].as_u64().expect("post id");

    let req = test::TestRequest::delete()
        .uri(&format!("/manage/posts/{}", id))
        .cookie(harness.auth_cookie(common::TEACHER_EMAIL))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/manage/posts/{}", id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    // Soft deleted posts vanish from the manage listing.
    let req = test::TestRequest::get()
        .uri(&format!("/manage/posts/{}", id))
        .cookie(harness.auth_cookie(common::ADMIN_EMAIL))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

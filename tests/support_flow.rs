// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

#[actix_web::test]
async fn contact_form_feeds_the_office_inbox() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    // Aggregated validation first.
    let req = test::TestRequest::post()
        .uri("/contact")
        .set_json(json!({ "name": "", "email": "not-an-email", "subject": "", "body": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    for field in ["name", "email", "subject", "body"] {
        assert!(body["errors"][field].is_array(), "missing error for {}", field);
    }

    let req = test::TestRequest::post()
        .uri("/contact")
        .set_json(json!({
            "name": "Prospective Student",
            "email": "prospect@example.com",
            "subject": "Program question",
            "body": "When do applications open?"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let message_id = created["id"].as_u64().expect("message id");

    // Office roles see the inbox; teachers do not.
    let req = test::TestRequest::get()
        .uri("/manage/messages")
        .cookie(harness.auth_cookie(common::TEACHER_EMAIL))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/manage/messages?status=new")
        .cookie(harness.auth_cookie(common::MANAGER_EMAIL))
        .to_request();
    let messages: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(messages.as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::put()
        .uri(&format!("/manage/messages/{}/status", message_id))
        .cookie(harness.auth_cookie(common::MANAGER_EMAIL))
        .set_json(json!({ "status": "processing" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let message: Value = test::read_body_json(resp).await;
    assert_eq!(message["status"], json!("processing"));
    assert_eq!(
        message["processed_by"].as_str(),
        Some(harness.user(common::MANAGER_EMAIL).id.to_string().as_str())
    );
}

#[actix_web::test]
async fn tickets_stay_private_to_their_requester() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::post()
        .uri("/support/tickets")
        .cookie(harness.auth_cookie(common::MEMBER_EMAIL))
        .set_json(json!({ "subject": "Cannot reset my password", "body": "The email never arrives." }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let ticket: Value = test::read_body_json(resp).await;
    let ticket_id = ticket["id"].as_u64().expect("ticket id");
    assert_eq!(ticket["status"], json!("open"));
    assert_eq!(ticket["priority"], json!("normal"));

    // Anonymous users have no ticket desk.
    let req = test::TestRequest::get().uri("/support/tickets").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // Another non-staff account cannot read it.
    let req = test::TestRequest::post()
        .uri("/support/tickets")
        .cookie(harness.auth_cookie(common::TEACHER_EMAIL))
        .set_json(json!({ "subject": "Projector broken", "body": "Room 204." }))
        .to_request();
    let other: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let other_id = other["id"].as_u64().expect("ticket id");

    let req = test::TestRequest::get()
        .uri(&format!("/support/tickets/{}", other_id))
        .cookie(harness.auth_cookie(common::MEMBER_EMAIL))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    // The member's listing carries only their own ticket.
    let req = test::TestRequest::get()
        .uri("/support/tickets")
        .cookie(harness.auth_cookie(common::MEMBER_EMAIL))
        .to_request();
    let tickets: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let tickets = tickets.as_array().expect("ticket array");
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["id"].as_u64(), Some(ticket_id));
}

#[actix_web::test]
async fn staff_replies_move_tickets_into_progress() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::post()
        .uri("/support/tickets")
        .cookie(harness.auth_cookie(common::MEMBER_EMAIL))
        .set_json(json!({ "subject": "Wrong name on roster", "body": "Please fix the spelling.", "priority": "high" }))
        .to_request();
    let ticket: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let ticket_id = ticket["id"].as_u64().expect("ticket id");
    assert_eq!(ticket["priority"], json!("high"));

    let req = test::TestRequest::post()
        .uri(&format!("/manage/tickets/{}/replies", ticket_id))
        .cookie(harness.auth_cookie(common::MANAGER_EMAIL))
        .set_json(json!({ "body": "Corrected, please verify." }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ticket: Value = test::read_body_json(resp).await;
    assert_eq!(ticket["status"], json!("in_progress"));
    let replies = ticket["replies"].as_array().expect("replies");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["is_staff"], json!(true));

    // The requester answers through the public endpoint.
    let req = test::TestRequest::post()
        .uri(&format!("/support/tickets/{}/replies", ticket_id))
        .cookie(harness.auth_cookie(common::MEMBER_EMAIL))
        .set_json(json!({ "body": "Looks right now, thanks." }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ticket: Value = test::read_body_json(resp).await;
    assert_eq!(ticket["replies"].as_array().map(Vec::len), Some(2));

    // Staff close it out.
    let req = test::TestRequest::put()
        .uri(&format!("/manage/tickets/{}", ticket_id))
        .cookie(harness.auth_cookie(common::MANAGER_EMAIL))
        .set_json(json!({ "status": "resolved" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ticket: Value = test::read_body_json(resp).await;
    assert_eq!(ticket["status"], json!("resolved"));
}

//! Contractors, site photos, the dashboard overview and the calendar feed.

mod common;

use axum::http::{Method, StatusCode};
use common::{PASSWORD, TestRequest, create_test_app, get, login, login_admin, send};
use serde_json::{Value, json};

fn sparky() -> Value {
    json!({
        "company": "Sparky Co",
        "trade": "Electrical",
        "contactName": "Sam Volt",
        "phone": "0400 111 222",
        "email": "sam@sparky.example",
        "rating": 4,
        "insuranceExpiry": "2027-06-30"
    })
}

async fn post(app: &axum::Router, uri: &str, token: &str, body: Value) -> common::TestResponse {
    send(app, TestRequest::new(Method::POST, uri).bearer(token).json(body)).await
}

async fn create_project(app: &axum::Router, admin: &str, reference: &str) -> i64 {
    let response = post(
        app,
        "/api/projects",
        admin,
        json!({ "ref": reference, "address": "1 Site Rd" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_contractor_lifecycle() {
    let app = create_test_app().await;
    let (foreman, _) = login(&app.router, "pat@tbs.local", PASSWORD).await;
    let admin = login_admin(&app.router).await;

    let created = post(&app.router, "/api/contractors", &foreman, sparky()).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["contact_name"], "Sam Volt");
    assert_eq!(created.json["insurance_expiry"], "2027-06-30");
    assert_eq!(created.json["status"], "active");
    let uri = format!("/api/contractors/{}", created.json["id"]);

    let duplicate = post(&app.router, "/api/contractors", &admin, sparky()).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(
        duplicate.json["error"],
        "Contractor with this company and contact person already exists"
    );

    let updated = send(
        &app.router,
        TestRequest::new(Method::PUT, &uri)
            .bearer(&foreman)
            .json(json!({ "rating": 5, "status": "inactive" })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["rating"], 5);
    assert_eq!(updated.json["status"], "inactive");
    assert_eq!(updated.json["company"], "Sparky Co");

    let foreman_delete = send(&app.router, TestRequest::new(Method::DELETE, &uri).bearer(&foreman)).await;
    assert_eq!(foreman_delete.status, StatusCode::FORBIDDEN);

    let deleted = send(&app.router, TestRequest::new(Method::DELETE, &uri).bearer(&admin)).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let missing = get(&app.router, &uri, &admin).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json["error"], "Contractor not found");
}

#[tokio::test]
async fn test_contractor_validation_and_roles() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let (labourer, _) = login(&app.router, "charlie@tbs.local", PASSWORD).await;

    let forbidden = post(&app.router, "/api/contractors", &labourer, sparky()).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let mut bad_rating = sparky();
    bad_rating["rating"] = json!(6);
    let response = post(&app.router, "/api/contractors", &admin, bad_rating).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["error"], "rating: must be between 1 and 5");

    let mut bad_date = sparky();
    bad_date["insuranceExpiry"] = json!("June 2027");
    let response = post(&app.router, "/api/contractors", &admin, bad_date).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json["error"],
        "insurance_expiry: must be a date (YYYY-MM-DD)"
    );

    let list = get(&app.router, "/api/contractors", &labourer).await;
    assert_eq!(list.status, StatusCode::OK);
    assert!(list.json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_renaming_into_existing_contact_conflicts() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;

    post(&app.router, "/api/contractors", &admin, sparky()).await;
    let mut other = sparky();
    other["contactName"] = json!("Alex Amp");
    let alex = post(&app.router, "/api/contractors", &admin, other).await;

    let response = send(
        &app.router,
        TestRequest::new(Method::PUT, &format!("/api/contractors/{}", alex.json["id"]))
            .bearer(&admin)
            .json(json!({ "contact_name": "Sam Volt" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_photo_records() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let (foreman, _) = login(&app.router, "pat@tbs.local", PASSWORD).await;
    let (labourer, _) = login(&app.router, "charlie@tbs.local", PASSWORD).await;
    let project = create_project(&app.router, &admin, "TBS-300").await;

    let missing_project = post(
        &app.router,
        "/api/photos",
        &foreman,
        json!({ "projectId": 999, "caption": "Nowhere" }),
    )
    .await;
    assert_eq!(missing_project.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_project.json["error"], "Project not found");

    let before = post(
        &app.router,
        "/api/photos",
        &foreman,
        json!({ "projectId": project, "caption": "Old kitchen", "tag": "before" }),
    )
    .await;
    assert_eq!(before.status, StatusCode::CREATED);
    assert_eq!(before.json["uploader_name"], "Pat");
    assert_eq!(before.json["project_ref"], "TBS-300");

    let during = post(
        &app.router,
        "/api/photos",
        &admin,
        json!({ "project_id": project }),
    )
    .await;
    assert_eq!(during.json["tag"], "during");

    let labourer_post = post(&app.router, "/api/photos", &labourer, json!({ "projectId": project })).await;
    assert_eq!(labourer_post.status, StatusCode::FORBIDDEN);

    let tagged = get(&app.router, "/api/photos?tag=before", &labourer).await;
    assert_eq!(tagged.status, StatusCode::OK);
    assert_eq!(tagged.json.as_array().unwrap().len(), 1);
    assert_eq!(tagged.json[0]["caption"], "Old kitchen");

    let all = get(&app.router, &format!("/api/photos?project_id={}", project), &labourer).await;
    assert_eq!(all.json.as_array().unwrap().len(), 2);

    let uri = format!("/api/photos/{}", before.json["id"]);
    let retagged = send(
        &app.router,
        TestRequest::new(Method::PUT, &uri)
            .bearer(&foreman)
            .json(json!({ "tag": "after" })),
    )
    .await;
    assert_eq!(retagged.status, StatusCode::OK);
    assert_eq!(retagged.json["tag"], "after");
    assert_eq!(retagged.json["caption"], "Old kitchen");

    let foreman_delete = send(&app.router, TestRequest::new(Method::DELETE, &uri).bearer(&foreman)).await;
    assert_eq!(foreman_delete.status, StatusCode::FORBIDDEN);
    let deleted = send(&app.router, TestRequest::new(Method::DELETE, &uri).bearer(&admin)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(get(&app.router, &uri, &admin).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_overview() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let (labourer, _) = login(&app.router, "charlie@tbs.local", PASSWORD).await;
    let project = create_project(&app.router, &admin, "TBS-400").await;
    post(
        &app.router,
        "/api/tasks",
        &admin,
        json!({ "project_id": project, "title": "Demolition" }),
    )
    .await;
    post(&app.router, "/api/contractors", &admin, sparky()).await;

    let response = get(&app.router, "/api/metrics/overview", &labourer).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = &response.json;
    assert_eq!(body["projects"]["total"], 1);
    assert_eq!(body["projects"]["byStatus"]["planned"], 1);
    assert_eq!(body["tasks"]["total"], 1);
    assert_eq!(body["tasks"]["byStatus"]["todo"], 1);
    assert_eq!(body["staff"]["total"], 4);
    assert_eq!(body["staff"]["byRole"]["foreman"], 2);
    assert_eq!(body["contractors"]["active"], 1);

    let activity = body["recentActivity"].as_array().unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0]["type"], "project_created");
    assert_eq!(activity[0]["description"], "New project 'TBS-400' started");
    assert_eq!(activity[0]["user"], "System");

    let anonymous = send(&app.router, TestRequest::new(Method::GET, "/api/metrics/overview")).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_calendar_events_from_tasks() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let project = create_project(&app.router, &admin, "TBS-500").await;

    for body in [
        json!({ "project_id": project, "title": "Roofing", "start_date": "2026-11-02", "end_date": "2026-11-06" }),
        json!({ "project_id": project, "title": "Inspection", "due_date": "2026-11-20" }),
        json!({ "project_id": project, "title": "Handover", "due_date": "2027-01-15" }),
        json!({ "project_id": project, "title": "Someday" }),
    ] {
        let response = post(&app.router, "/api/tasks", &admin, body).await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let november = get(
        &app.router,
        "/api/calendar/events?from=2026-11-01&to=2026-11-30",
        &admin,
    )
    .await;
    assert_eq!(november.status, StatusCode::OK);
    let events = november.json.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["title"], "Roofing");
    assert_eq!(events[0]["start"], "2026-11-02");
    assert_eq!(events[0]["end"], "2026-11-06");
    assert_eq!(events[0]["project_ref"], "TBS-500");
    assert_eq!(events[1]["title"], "Inspection");
    assert_eq!(events[1]["start"], "2026-11-20");
    assert_eq!(events[1]["end"], "2026-11-20");

    let everything = get(&app.router, "/api/calendar/events", &admin).await;
    assert_eq!(everything.json.as_array().unwrap().len(), 3);

    let reversed = get(
        &app.router,
        "/api/calendar/events?from=2026-12-01&to=2026-11-01",
        &admin,
    )
    .await;
    assert_eq!(reversed.status, StatusCode::BAD_REQUEST);

    let garbled = get(&app.router, "/api/calendar/events?from=soon", &admin).await;
    assert_eq!(garbled.status, StatusCode::BAD_REQUEST);
    assert_eq!(garbled.json["error"], "from: must be a date (YYYY-MM-DD)");
}

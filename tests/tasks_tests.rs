//! Task endpoints: filters, assignee checks, role gates, soft delete.

mod common;

use axum::http::{Method, StatusCode};
use common::{PASSWORD, TestRequest, create_test_app, get, login, login_admin, send, user_id};
use serde_json::{Value, json};

async fn create_project(app: &axum::Router, admin: &str, reference: &str) -> i64 {
    let response = send(
        app,
        TestRequest::new(Method::POST, "/api/projects")
            .bearer(admin)
            .json(json!({ "ref": reference, "address": "1 Site Rd" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json["id"].as_i64().unwrap()
}

async fn create_task(app: &axum::Router, token: &str, body: Value) -> (StatusCode, Value) {
    let response = send(
        app,
        TestRequest::new(Method::POST, "/api/tasks")
            .bearer(token)
            .json(body),
    )
    .await;
    (response.status, response.json)
}

fn ids(json: &Value) -> Vec<i64> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_create_and_filter_tasks() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let first = create_project(&app.router, &admin, "TBS-100").await;
    let second = create_project(&app.router, &admin, "TBS-200").await;
    let pat = user_id(&app.db, "pat@tbs.local").await;

    let (status, framing) = create_task(
        &app.router,
        &admin,
        json!({
            "project_id": first,
            "title": "Frame walls",
            "priority": "high",
            "assignee_staff_id": pat,
            "due_date": "2026-11-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(framing["status"], "todo");
    assert_eq!(framing["project_ref"], "TBS-100");
    assert_eq!(framing["staff_name"], "Pat");

    let (_, sweep) = create_task(
        &app.router,
        &admin,
        json!({ "project_id": first, "title": "Sweep", "priority": "low", "status": "blocked" }),
    )
    .await;
    let (_, survey) = create_task(
        &app.router,
        &admin,
        json!({ "project_id": second, "title": "Survey" }),
    )
    .await;
    assert_eq!(survey["priority"], "medium");

    let all = get(&app.router, "/api/tasks", &admin).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(
        ids(&all.json),
        vec![
            framing["id"].as_i64().unwrap(),
            survey["id"].as_i64().unwrap(),
            sweep["id"].as_i64().unwrap()
        ]
    );

    let by_project = get(&app.router, &format!("/api/tasks?project_id={}", first), &admin).await;
    assert_eq!(by_project.json.as_array().unwrap().len(), 2);

    let nested = get(&app.router, &format!("/api/projects/{}/tasks", second), &admin).await;
    assert_eq!(ids(&nested.json), vec![survey["id"].as_i64().unwrap()]);

    let blocked = get(&app.router, "/api/tasks?status=blocked", &admin).await;
    assert_eq!(ids(&blocked.json), vec![sweep["id"].as_i64().unwrap()]);

    let mine = get(&app.router, &format!("/api/tasks?assignee_staff_id={}", pat), &admin).await;
    assert_eq!(ids(&mine.json), vec![framing["id"].as_i64().unwrap()]);

    let bad_status = get(&app.router, "/api/tasks?status=later", &admin).await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_status.json["error"], "Invalid query parameter");

    let missing_project = get(&app.router, "/api/projects/999/tasks", &admin).await;
    assert_eq!(missing_project.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_checks_references() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let project = create_project(&app.router, &admin, "TBS-100").await;

    let (status, body) =
        create_task(&app.router, &admin, json!({ "project_id": 999, "title": "Ghost" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Project not found");

    let (status, body) = create_task(
        &app.router,
        &admin,
        json!({ "project_id": project, "title": "Ghost", "assignee_staff_id": 999 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Staff member not found");

    let (status, body) = create_task(
        &app.router,
        &admin,
        json!({ "project_id": project, "title": "Ghost", "assignee_contractor_id": 999 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Contractor not found");

    let (status, _) = create_task(&app.router, &admin, json!({ "title": "No project" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = create_task(
        &app.router,
        &admin,
        json!({ "project_id": project, "title": "Bad date", "due_date": "2026-02-30" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "due_date: must be a date (YYYY-MM-DD)");

    let (status, body) = create_task(
        &app.router,
        &admin,
        json!({
            "project_id": project,
            "title": "Backwards",
            "start_date": "2026-03-02",
            "end_date": "2026-03-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "start_date: must not be after end_date");

    assert!(get(&app.router, "/api/tasks", &admin).await.json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_worker_updates_but_cannot_create_or_delete() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let project = create_project(&app.router, &admin, "TBS-100").await;

    let created = send(
        &app.router,
        TestRequest::new(Method::POST, "/api/staff")
            .bearer(&admin)
            .json(json!({
                "name": "Wes",
                "email": "wes@tbs.local",
                "role": "worker",
                "position": "Carpenter",
                "password": PASSWORD
            })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let (worker, _) = login(&app.router, "wes@tbs.local", PASSWORD).await;
    let (labourer, _) = login(&app.router, "charlie@tbs.local", PASSWORD).await;

    let (_, task) = create_task(
        &app.router,
        &admin,
        json!({ "project_id": project, "title": "Hang doors" }),
    )
    .await;
    let uri = format!("/api/tasks/{}", task["id"]);

    let (status, _) = create_task(
        &app.router,
        &worker,
        json!({ "project_id": project, "title": "Not mine to add" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let updated = send(
        &app.router,
        TestRequest::new(Method::PUT, &uri)
            .bearer(&worker)
            .json(json!({ "status": "in_progress", "notes": "Half done" })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["status"], "in_progress");
    assert_eq!(updated.json["notes"], "Half done");
    assert_eq!(updated.json["title"], "Hang doors");

    let labourer_update = send(
        &app.router,
        TestRequest::new(Method::PUT, &uri)
            .bearer(&labourer)
            .json(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(labourer_update.status, StatusCode::FORBIDDEN);

    let delete = send(&app.router, TestRequest::new(Method::DELETE, &uri).bearer(&worker)).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let task = get(&app.router, &uri, &labourer).await;
    assert_eq!(task.status, StatusCode::OK);
    assert_eq!(task.json["status"], "in_progress");
}

#[tokio::test]
async fn test_update_assignees() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let project = create_project(&app.router, &admin, "TBS-100").await;
    let pat = user_id(&app.db, "pat@tbs.local").await;

    let (_, task) = create_task(
        &app.router,
        &admin,
        json!({ "project_id": project, "title": "Tile bathroom", "assignee_staff_id": pat }),
    )
    .await;
    let uri = format!("/api/tasks/{}", task["id"]);

    let unknown = send(
        &app.router,
        TestRequest::new(Method::PUT, &uri)
            .bearer(&admin)
            .json(json!({ "assignee_staff_id": 999 })),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.json["error"], "Staff member not found");

    let kept = send(
        &app.router,
        TestRequest::new(Method::PUT, &uri)
            .bearer(&admin)
            .json(json!({ "priority": "high" })),
    )
    .await;
    assert_eq!(kept.json["assignee_staff_id"], pat);

    let cleared = send(
        &app.router,
        TestRequest::new(Method::PUT, &uri)
            .bearer(&admin)
            .json(json!({ "assignee_staff_id": null })),
    )
    .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert!(cleared.json["assignee_staff_id"].is_null());
    assert!(cleared.json["staff_name"].is_null());
    assert_eq!(cleared.json["priority"], "high");

    let missing = send(
        &app.router,
        TestRequest::new(Method::PUT, "/api/tasks/999")
            .bearer(&admin)
            .json(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json["error"], "Task not found");
}

#[tokio::test]
async fn test_delete_is_soft_by_default() {
    let app = create_test_app().await;
    let admin = login_admin(&app.router).await;
    let (foreman, _) = login(&app.router, "pat@tbs.local", PASSWORD).await;
    let project = create_project(&app.router, &admin, "TBS-100").await;

    let (_, task) = create_task(
        &app.router,
        &foreman,
        json!({ "project_id": project, "title": "Clean site" }),
    )
    .await;
    let uri = format!("/api/tasks/{}", task["id"]);

    let soft = send(&app.router, TestRequest::new(Method::DELETE, &uri).bearer(&foreman)).await;
    assert_eq!(soft.status, StatusCode::OK);
    assert_eq!(soft.json["status"], "done");
    assert_eq!(get(&app.router, &uri, &foreman).await.status, StatusCode::OK);

    let hard_uri = format!("{}?soft=false", uri);
    let hard = send(&app.router, TestRequest::new(Method::DELETE, &hard_uri).bearer(&foreman)).await;
    assert_eq!(hard.status, StatusCode::OK);
    assert_eq!(get(&app.router, &uri, &foreman).await.status, StatusCode::NOT_FOUND);

    let again = send(&app.router, TestRequest::new(Method::DELETE, &uri).bearer(&foreman)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tasks_require_a_session() {
    let app = create_test_app().await;

    let response = send(&app.router, TestRequest::new(Method::GET, "/api/tasks")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

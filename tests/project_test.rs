mod common;

use axum::http::StatusCode;
use serde_json::json;
use taskdeck::repositories::{
    CommentRepository, MilestoneRepository, Repository, TaskRepository,
};

use common::{Factory, TestApp};

#[tokio::test]
async fn test_create_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "title": "My New Project",
            "description": "This is a test project"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["title"].as_str().unwrap(), "My New Project");
    assert_eq!(body["description"].as_str().unwrap(), "This is a test project");
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["milestones"], json!([]));
    assert_eq!(body["tasks"], json!([]));
    assert!(body["createdAt"].is_array());
}

#[tokio::test]
async fn test_create_project_blank_title() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "title": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], json!("Validation error"));
    assert_eq!(body["details"], json!("Title is required"));
}

#[tokio::test]
async fn test_create_project_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/projects")
        .json(&json!({ "title": "My Project" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_projects_empty() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .get("/api/projects")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_projects_nests_milestones_and_tasks() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let project = factory.create_project(auth.user_id).await;
    let milestone = factory.create_milestone(project.id).await;
    let inside = factory.create_task(project.id, Some(milestone.id)).await;
    let loose = factory.create_task(project.id, None).await;

    let response = app
        .server
        .get("/api/projects")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    let listed = &body[0];
    assert_eq!(listed["id"], json!(project.id));

    let task_ids: Vec<i64> = listed["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(task_ids, vec![inside.id, loose.id]);

    let milestones = listed["milestones"].as_array().unwrap();
    assert_eq!(milestones.len(), 1);
    assert_eq!(milestones[0]["projectId"], json!(project.id));
    assert_eq!(milestones[0]["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(milestones[0]["tasks"][0]["id"], json!(inside.id));
}

#[tokio::test]
async fn test_list_projects_only_own() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);

    let auth1 = factory.create_user().await;
    factory.create_project(auth1.user_id).await;
    factory.create_project(auth1.user_id).await;

    let auth2 = factory.create_user().await;
    factory.create_project(auth2.user_id).await;

    let response = app
        .server
        .get("/api/projects")
        .add_header("Authorization", auth1.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_project_other_user() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);

    let auth1 = factory.create_user().await;
    let project = factory.create_project(auth1.user_id).await;

    let auth2 = factory.create_user().await;
    let response = app
        .server
        .get(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth2.auth_header())
        .await;

    // Not exposing that the project exists
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project(auth.user_id).await;

    let response = app
        .server
        .put(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({
            "id": project.id,
            "title": "Updated Project Title",
            "description": "Updated description",
            "milestones": [],
            "tasks": []
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["title"].as_str().unwrap(), "Updated Project Title");
    assert_eq!(body["description"].as_str().unwrap(), "Updated description");
}

#[tokio::test]
async fn test_update_project_other_user() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);

    let auth1 = factory.create_user().await;
    let project = factory.create_project(auth1.user_id).await;

    let auth2 = factory.create_user().await;
    let response = app
        .server
        .put(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth2.auth_header())
        .json(&json!({ "title": "Hacked!" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_project_cascades() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project(auth.user_id).await;
    let milestone = factory.create_milestone(project.id).await;
    let task = factory.create_task(project.id, Some(milestone.id)).await;
    CommentRepository::create(&app.state.db, task.id, auth.user_id, "note")
        .await
        .unwrap();

    let response = app
        .server
        .delete(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert_eq!(MilestoneRepository::count(&app.state.db).await.unwrap(), 0);
    assert_eq!(TaskRepository::count(&app.state.db).await.unwrap(), 0);
    assert_eq!(CommentRepository::count(&app.state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_project_other_user() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);

    let auth1 = factory.create_user().await;
    let project = factory.create_project(auth1.user_id).await;

    let auth2 = factory.create_user().await;
    let response = app
        .server
        .delete(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth2.auth_header())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    app.server
        .get(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", auth1.auth_header())
        .await
        .assert_status(StatusCode::OK);
}

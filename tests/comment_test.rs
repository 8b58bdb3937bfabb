mod common;

use axum::http::StatusCode;
use serde_json::json;
use taskdeck::repositories::CommentRepository;

use common::{Factory, TestApp};

#[tokio::test]
async fn test_create_and_list_comments() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project(auth.user_id).await;
    let task = factory.create_task(project.id, None).await;
    let path = format!("/api/projects/{}/tasks/{}/comments", project.id, task.id);

    let response = app
        .server
        .post(&path)
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "content": "Looks good" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["content"], json!("Looks good"));
    assert_eq!(body["taskId"], json!(task.id));
    assert_eq!(body["userId"], json!(auth.user_id));
    assert_eq!(body["userName"], json!("Test User"));

    let response = app
        .server
        .get(&path)
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["content"], json!("Looks good"));
}

#[tokio::test]
async fn test_create_comment_blank() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project(auth.user_id).await;
    let task = factory.create_task(project.id, None).await;

    let response = app
        .server
        .post(&format!(
            "/api/projects/{}/tasks/{}/comments",
            project.id, task.id
        ))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "content": " " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_on_task_of_other_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project(auth.user_id).await;
    let other_project = factory.create_project(auth.user_id).await;
    let task = factory.create_task(other_project.id, None).await;

    let response = app
        .server
        .get(&format!(
            "/api/projects/{}/tasks/{}/comments",
            project.id, task.id
        ))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_author_can_edit() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let author = factory.create_user().await;
    let project = factory.create_project(author.user_id).await;
    let task = factory.create_task(project.id, None).await;

    // Written by someone else, e.g. before the project changed hands
    let stranger = factory.create_user().await;
    let comment = CommentRepository::create(&app.state.db, task.id, stranger.user_id, "mine")
        .await
        .unwrap();
    let path = format!(
        "/api/projects/{}/tasks/{}/comments/{}",
        project.id, task.id, comment.id
    );

    app.server
        .put(&path)
        .add_header("Authorization", author.auth_header())
        .json(&json!({ "content": "edited" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&path)
        .add_header("Authorization", author.auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_and_delete_own_comment() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let project = factory.create_project(auth.user_id).await;
    let task = factory.create_task(project.id, None).await;
    let comment = CommentRepository::create(&app.state.db, task.id, auth.user_id, "draft")
        .await
        .unwrap();
    let path = format!(
        "/api/projects/{}/tasks/{}/comments/{}",
        project.id, task.id, comment.id
    );

    let response = app
        .server
        .put(&path)
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "content": "final" }))
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<serde_json::Value>()["content"], json!("final"));

    app.server
        .delete(&path)
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .delete(&path)
        .add_header("Authorization", auth.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

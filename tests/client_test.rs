mod common;

use std::sync::Arc;

use axum::routing::put;
use axum::Router;
use futures::future::join_all;
use taskdeck::client::{ApiClient, FileTokenStore, Session};
use taskdeck::error::ClientError;
use taskdeck::models::{NewProject, Project, RegisterRequest};
use taskdeck::repositories::UserRepository;
use tokio::net::TcpListener;

use common::factory::PASSWORD;
use common::{Factory, LiveServer};

fn anonymous_client(server: &LiveServer) -> ApiClient {
    ApiClient::new(&server.client_config(), Session::in_memory()).unwrap()
}

#[tokio::test]
async fn test_register_and_login_store_tokens() {
    let server = LiveServer::start().await;
    let client = anonymous_client(&server);

    let user = client
        .register(&RegisterRequest {
            email: "client@example.com".to_string(),
            password: "password123".to_string(),
            name: "Client User".to_string(),
        })
        .await
        .unwrap();
    assert!(user.authenticated);
    assert_eq!(user.name.as_deref(), Some("Client User"));
    assert!(client.session().refresh_token().is_some());

    client.session().clear();
    let user = client.login("client@example.com", "password123").await.unwrap();
    assert_eq!(user.email.as_deref(), Some("client@example.com"));
    assert!(client.session().is_authenticated());

    let projects = client.list_projects().await.unwrap();
    assert!(projects.is_empty());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = LiveServer::start().await;
    let factory = Factory::new(&server.state);
    let auth = factory.create_user().await;
    let client = anonymous_client(&server);

    let err = client.login(&auth.email, "wrong-password").await.unwrap_err();

    assert!(matches!(err, ClientError::Http { status: 401, .. }));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_missing_token_fails_before_request() {
    let server = LiveServer::start().await;
    let client = anonymous_client(&server);

    let err = client.list_projects().await.unwrap_err();

    assert_eq!(err, ClientError::Unauthorized);
    assert!(err.requires_login());
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_retried() {
    let server = LiveServer::start().await;
    let factory = Factory::new(&server.state);
    let auth = factory.create_user().await;
    factory.create_project(auth.user_id).await;

    let client = server.client("stale-access-token", Some(&auth.refresh_token));
    let projects = client.list_projects().await.unwrap();

    assert_eq!(projects.len(), 1);
    let access = client.session().access_token().unwrap();
    let refresh = client.session().refresh_token().unwrap();
    assert_ne!(access, "stale-access-token");
    assert_ne!(refresh, auth.refresh_token);

    // The old refresh token was spent by the rotation
    assert!(
        UserRepository::take_refresh_token(&server.state.db, &auth.refresh_token)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_failed_refresh_expires_session() {
    let server = LiveServer::start().await;
    let client = server.client("stale-access-token", Some("not-a-refresh-token"));

    let err = client.list_projects().await.unwrap_err();

    assert_eq!(err, ClientError::SessionExpired);
    assert!(client.session().access_token().is_none());
    assert!(client.session().refresh_token().is_none());
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let server = LiveServer::start().await;
    let factory = Factory::new(&server.state);
    let auth = factory.create_user().await;

    let client = server.client("stale-access-token", Some(&auth.refresh_token));
    let results = join_all((0..3).map(|_| client.list_projects())).await;

    // A second refresh would present the spent token and fail
    assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);
}

#[tokio::test]
async fn test_current_user_and_logout() {
    let server = LiveServer::start().await;
    let factory = Factory::new(&server.state);
    let auth = factory.create_user().await;
    let client = server.client(&auth.token, Some(&auth.refresh_token));

    let user = client.current_user().await.unwrap();
    assert!(user.authenticated);
    assert_eq!(user.email.as_deref(), Some(auth.email.as_str()));

    client.logout().await.unwrap();
    assert!(!client.session().is_authenticated());

    let user = client.current_user().await.unwrap();
    assert!(!user.authenticated);

    // Server side, the refresh token no longer works
    let replay = server.client("stale-access-token", Some(&auth.refresh_token));
    assert_eq!(
        replay.list_projects().await.unwrap_err(),
        ClientError::SessionExpired
    );
}

#[tokio::test]
async fn test_tokens_persist_in_file_store() {
    let server = LiveServer::start().await;
    let factory = Factory::new(&server.state);
    let auth = factory.create_user().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    {
        let session = Session::new(Arc::new(FileTokenStore::open(&path)));
        let client = ApiClient::new(&server.client_config(), session).unwrap();
        client.login(&auth.email, PASSWORD).await.unwrap();
    }

    let session = Session::new(Arc::new(FileTokenStore::open(&path)));
    let client = ApiClient::new(&server.client_config(), session).unwrap();
    let created = client
        .create_project(&NewProject::new("Persisted"))
        .await
        .unwrap();
    assert_eq!(created.title, "Persisted");
}

#[tokio::test]
async fn test_http_error_carries_server_message() {
    let server = LiveServer::start().await;
    let factory = Factory::new(&server.state);
    let auth = factory.create_user().await;
    let client = server.client(&auth.token, None);

    let err = client.get_project(999_999).await.unwrap_err();

    match err {
        ClientError::Http { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_update_acknowledged_without_entity() {
    let router = Router::new().route(
        "/api/projects/{id}",
        put(|| async { "Project updated" }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = taskdeck::config::ClientConfig::with_base_url(format!("http://{}", addr));
    let session = Session::in_memory();
    session.set_tokens("any-token", None);
    let client = ApiClient::new(&config, session).unwrap();

    let project = Project {
        id: 7,
        title: "Echoed".to_string(),
        description: Some("sent as is".to_string()),
        milestones: vec![],
        tasks: vec![],
        created_at: None,
        updated_at: None,
    };
    let updated = client.update_project(&project).await.unwrap();

    assert_eq!(updated, project);
    handle.abort();
}

use std::sync::Arc;

use axum_test::TestServer;
use taskdeck::build_router;
use taskdeck::client::{ApiClient, Session};
use taskdeck::config::{ClientConfig, ServerConfig};
use taskdeck::dates::DateFormat;
use taskdeck::models::MilestoneDeletePolicy;
use taskdeck::state::AppState;
use taskdeck::store::EntityStore;
use taskdeck::telemetry::LogFormat;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Test configuration
pub fn test_config() -> ServerConfig {
    dotenvy::dotenv().ok();

    ServerConfig {
        jwt_secret: "test-jwt-secret-that-is-at-least-32-characters-long".to_string(),
        jwt_expiration_hours: 24,
        refresh_expiration_hours: 168,
        host: "127.0.0.1".to_string(),
        port: 0,
        date_format: DateFormat::Array,
        milestone_delete_policy: MilestoneDeletePolicy::Unlink,
        log_format: LogFormat::Pretty,
    }
}

/// Test application wrapper around an in-process router
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let state = AppState::new(config);

        let router = build_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, state }
    }
}

/// The backend listening on a loopback port, for tests that go through
/// the real HTTP client
pub struct LiveServer {
    pub base_url: String,
    pub state: AppState,
    handle: JoinHandle<()>,
}

impl LiveServer {
    pub async fn start() -> Self {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let state = AppState::new(config);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        let router = build_router(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.base_url)
    }

    /// A client whose session holds the given tokens
    pub fn client(&self, access_token: &str, refresh_token: Option<&str>) -> Arc<ApiClient> {
        let session = Session::in_memory();
        session.set_tokens(access_token, refresh_token);
        Arc::new(ApiClient::new(&self.client_config(), session).expect("Failed to build client"))
    }

    /// A store over a client holding the given tokens
    pub fn store(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        policy: MilestoneDeletePolicy,
    ) -> EntityStore {
        EntityStore::new(self.client(access_token, refresh_token), policy)
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

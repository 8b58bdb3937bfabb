use std::sync::atomic::{AtomicU64, Ordering};

use taskdeck::entity::{milestone, project, task, user};
use taskdeck::models::TaskStatus;
use taskdeck::repositories::{
    MilestoneRepository, ProjectRepository, TaskRepository, UserRepository,
};
use taskdeck::services::AuthService;
use taskdeck::state::AppState;

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn unique() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

pub const PASSWORD: &str = "TestPassword123!";

/// Authentication info for tests
pub struct TestAuth {
    pub user_id: i64,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

impl TestAuth {
    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create a test user and return auth info
    pub async fn create_user(&self) -> TestAuth {
        let n = unique();
        let email = format!("test-{}@example.com", n);
        let user = self.create_user_with_email(&email, PASSWORD).await;

        let pair = AuthService::generate_pair(user.id, &email, &self.state.config).unwrap();
        UserRepository::store_refresh_token(&self.state.db, user.id, &pair.refresh_token)
            .await
            .unwrap();

        TestAuth {
            user_id: user.id,
            email,
            token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }

    /// Create a test user with specific email
    pub async fn create_user_with_email(&self, email: &str, password: &str) -> user::Model {
        let password_hash = AuthService::hash_password(password).unwrap();
        UserRepository::create(&self.state.db, email, &password_hash, "Test User")
            .await
            .unwrap()
    }

    /// Create a test project
    pub async fn create_project(&self, user_id: i64) -> project::Model {
        self.create_project_with_title(user_id, &format!("Test Project {}", unique()))
            .await
    }

    pub async fn create_project_with_title(&self, user_id: i64, title: &str) -> project::Model {
        let input = project::Input {
            title: title.to_string(),
            description: Some("Test project description".to_string()),
        };

        ProjectRepository::create(&self.state.db, user_id, &input)
            .await
            .unwrap()
    }

    /// Create a test milestone
    pub async fn create_milestone(&self, project_id: i64) -> milestone::Model {
        let input = milestone::Input {
            title: format!("Test Milestone {}", unique()),
            ..Default::default()
        };

        MilestoneRepository::create(&self.state.db, project_id, &input)
            .await
            .unwrap()
    }

    /// Create a test task, optionally inside a milestone
    pub async fn create_task(&self, project_id: i64, milestone_id: Option<i64>) -> task::Model {
        let input = task::Input {
            title: format!("Test Task {}", unique()),
            status: TaskStatus::Todo,
            milestone_id,
            ..Default::default()
        };

        TaskRepository::create(&self.state.db, project_id, &input)
            .await
            .unwrap()
    }
}

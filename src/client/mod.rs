//! Typed client for the project-management REST API.

pub mod resource;
pub mod session;

pub use resource::{ParentIds, ResourceKind};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    AuthResponse, Comment, CurrentUser, LoginRequest, Milestone, NewComment, NewMilestone,
    NewProject, NewTask, Project, RefreshRequest, RegisterRequest, Task, TokenRefreshResponse,
};

/// Whether a request needs the bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Fails before the network without a token; 401 triggers a refresh
    Required,
    /// Token attached when present, 401 passed through
    Optional,
    None,
}

/// HTTP client bound to one API base URL and one session
pub struct ApiClient {
    http: Client,
    api_root: String,
    session: Session,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Create a client for the configured API using the given session
    pub fn new(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_root: format!("{}/api", config.api_base_url.trim_end_matches('/')),
            session,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ============ Transport ============

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ClientResult<Response> {
        tracing::debug!(method = %method, path, "Sending request");

        let mut request = self
            .http
            .request(method, format!("{}{}", self.api_root, path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> ClientResult<Response> {
        let token = match auth {
            Auth::Required => Some(self.session.access_token().ok_or(ClientError::Unauthorized)?),
            Auth::Optional => self.session.access_token(),
            Auth::None => None,
        };

        let response = self
            .send(method.clone(), path, body.as_ref(), token.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED || auth != Auth::Required {
            return Self::check(response).await;
        }

        tracing::debug!(path, "Access token rejected, refreshing");
        if !self.refresh_after_rejection(token.as_deref()).await {
            return Err(self.expire_session());
        }

        let token = self
            .session
            .access_token()
            .ok_or_else(|| self.expire_session())?;
        let retry = self
            .send(method, path, body.as_ref(), Some(&token))
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(self.expire_session());
        }

        Self::check(retry).await
    }

    fn expire_session(&self) -> ClientError {
        tracing::warn!("Session expired, clearing stored credentials");
        self.session.clear();
        ClientError::SessionExpired
    }

    /// Refresh once for a batch of concurrent rejections
    async fn refresh_after_rejection(&self, rejected: Option<&str>) -> bool {
        let _guard = self.refresh_lock.lock().await;

        // Someone else already refreshed while we were waiting
        if let Some(current) = self.session.access_token() {
            if Some(current.as_str()) != rejected {
                return true;
            }
        }

        match self.refresh_tokens().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                false
            }
        }
    }

    async fn refresh_tokens(&self) -> ClientResult<()> {
        let refresh_token = self
            .session
            .refresh_token()
            .ok_or(ClientError::Unauthorized)?;

        let body = serde_json::to_value(RefreshRequest {
            refresh_token: &refresh_token,
        })?;
        let response = self
            .send(Method::POST, "/auth/refresh", Some(&body), None)
            .await?;
        let tokens: TokenRefreshResponse = Self::read_json(Self::check(response).await?).await?;

        self.session
            .set_tokens(&tokens.access_token, tokens.refresh_token.as_deref());
        tracing::info!("Access token refreshed");
        Ok(())
    }

    /// Turn non-2xx responses into `ClientError::Http`
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| {
                ["message", "details", "error"]
                    .iter()
                    .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
            })
            .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

        tracing::debug!(status = status.as_u16(), "Request failed: {}", message);
        Err(ClientError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ============ Generic resource operations ============

    /// GET a collection
    pub async fn list<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        parents: &ParentIds,
    ) -> ClientResult<Vec<T>> {
        let path = kind.collection_path(parents)?;
        let response = self.execute(Method::GET, &path, None, Auth::Required).await?;
        Self::read_json(response).await
    }

    /// GET a single resource
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        parents: &ParentIds,
        id: i64,
    ) -> ClientResult<T> {
        let path = kind.item_path(parents, id)?;
        let response = self.execute(Method::GET, &path, None, Auth::Required).await?;
        Self::read_json(response).await
    }

    /// POST a new resource and return what the server created
    pub async fn create<P, T>(
        &self,
        kind: ResourceKind,
        parents: &ParentIds,
        payload: &P,
    ) -> ClientResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = kind.collection_path(parents)?;
        let body = serde_json::to_value(payload)?;
        let response = self
            .execute(Method::POST, &path, Some(body), Auth::Required)
            .await?;
        Self::read_json(response).await
    }

    /// PUT a full entity and return the server's copy.
    ///
    /// Some endpoints acknowledge with a bare message instead of the entity;
    /// the sent entity is returned in that case.
    pub async fn update<T>(
        &self,
        kind: ResourceKind,
        parents: &ParentIds,
        id: i64,
        entity: &T,
    ) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let path = kind.item_path(parents, id)?;
        let body = serde_json::to_value(entity)?;
        let response = self
            .execute(Method::PUT, &path, Some(body), Auth::Required)
            .await?;

        match Self::read_json::<T>(response).await {
            Ok(updated) => Ok(updated),
            Err(ClientError::Decode(e)) => {
                tracing::debug!(path, "Update acknowledged without entity body: {}", e);
                Ok(entity.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// DELETE a resource
    pub async fn delete(&self, kind: ResourceKind, parents: &ParentIds, id: i64) -> ClientResult<()> {
        let path = kind.item_path(parents, id)?;
        self.execute(Method::DELETE, &path, None, Auth::Required)
            .await?;
        Ok(())
    }

    // ============ Projects ============

    pub async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        self.list(ResourceKind::Project, &ParentIds::none()).await
    }

    pub async fn get_project(&self, project_id: i64) -> ClientResult<Project> {
        self.get(ResourceKind::Project, &ParentIds::none(), project_id)
            .await
    }

    pub async fn create_project(&self, draft: &NewProject) -> ClientResult<Project> {
        self.create(ResourceKind::Project, &ParentIds::none(), draft)
            .await
    }

    pub async fn update_project(&self, project: &Project) -> ClientResult<Project> {
        self.update(ResourceKind::Project, &ParentIds::none(), project.id, project)
            .await
    }

    pub async fn delete_project(&self, project_id: i64) -> ClientResult<()> {
        self.delete(ResourceKind::Project, &ParentIds::none(), project_id)
            .await
    }

    // ============ Milestones ============

    pub async fn list_milestones(&self, project_id: i64) -> ClientResult<Vec<Milestone>> {
        self.list(ResourceKind::Milestone, &ParentIds::project(project_id))
            .await
    }

    pub async fn get_milestone(&self, project_id: i64, milestone_id: i64) -> ClientResult<Milestone> {
        self.get(
            ResourceKind::Milestone,
            &ParentIds::project(project_id),
            milestone_id,
        )
        .await
    }

    pub async fn create_milestone(
        &self,
        project_id: i64,
        draft: &NewMilestone,
    ) -> ClientResult<Milestone> {
        self.create(ResourceKind::Milestone, &ParentIds::project(project_id), draft)
            .await
    }

    pub async fn update_milestone(&self, milestone: &Milestone) -> ClientResult<Milestone> {
        self.update(
            ResourceKind::Milestone,
            &ParentIds::project(milestone.project_id),
            milestone.id,
            milestone,
        )
        .await
    }

    pub async fn delete_milestone(&self, project_id: i64, milestone_id: i64) -> ClientResult<()> {
        self.delete(
            ResourceKind::Milestone,
            &ParentIds::project(project_id),
            milestone_id,
        )
        .await
    }

    pub async fn list_milestone_tasks(
        &self,
        project_id: i64,
        milestone_id: i64,
    ) -> ClientResult<Vec<Task>> {
        self.list(
            ResourceKind::MilestoneTask,
            &ParentIds::milestone(project_id, milestone_id),
        )
        .await
    }

    // ============ Tasks ============

    pub async fn list_tasks(&self, project_id: i64) -> ClientResult<Vec<Task>> {
        self.list(ResourceKind::Task, &ParentIds::project(project_id))
            .await
    }

    pub async fn get_task(&self, project_id: i64, task_id: i64) -> ClientResult<Task> {
        self.get(ResourceKind::Task, &ParentIds::project(project_id), task_id)
            .await
    }

    pub async fn create_task(&self, project_id: i64, draft: &NewTask) -> ClientResult<Task> {
        self.create(ResourceKind::Task, &ParentIds::project(project_id), draft)
            .await
    }

    pub async fn update_task(&self, task: &Task) -> ClientResult<Task> {
        self.update(
            ResourceKind::Task,
            &ParentIds::project(task.project_id),
            task.id,
            task,
        )
        .await
    }

    pub async fn delete_task(&self, project_id: i64, task_id: i64) -> ClientResult<()> {
        self.delete(ResourceKind::Task, &ParentIds::project(project_id), task_id)
            .await
    }

    // ============ Comments ============

    pub async fn list_comments(&self, project_id: i64, task_id: i64) -> ClientResult<Vec<Comment>> {
        self.list(ResourceKind::Comment, &ParentIds::task(project_id, task_id))
            .await
    }

    pub async fn create_comment(
        &self,
        project_id: i64,
        task_id: i64,
        draft: &NewComment,
    ) -> ClientResult<Comment> {
        self.create(ResourceKind::Comment, &ParentIds::task(project_id, task_id), draft)
            .await
    }

    pub async fn update_comment(
        &self,
        project_id: i64,
        task_id: i64,
        comment_id: i64,
        draft: &NewComment,
    ) -> ClientResult<Comment> {
        let path = ResourceKind::Comment.item_path(&ParentIds::task(project_id, task_id), comment_id)?;
        let body = serde_json::to_value(draft)?;
        let response = self
            .execute(Method::PUT, &path, Some(body), Auth::Required)
            .await?;
        Self::read_json(response).await
    }

    pub async fn delete_comment(
        &self,
        project_id: i64,
        task_id: i64,
        comment_id: i64,
    ) -> ClientResult<()> {
        self.delete(
            ResourceKind::Comment,
            &ParentIds::task(project_id, task_id),
            comment_id,
        )
        .await
    }

    // ============ Auth ============

    async fn authenticate(&self, path: &str, body: Value) -> ClientResult<CurrentUser> {
        let response = self.execute(Method::POST, path, Some(body), Auth::None).await?;
        let auth: AuthResponse = Self::read_json(response).await?;

        self.session
            .set_tokens(&auth.token, auth.refresh_token.as_deref());
        tracing::info!(email = ?auth.email, "Signed in");
        Ok(auth.user())
    }

    /// Sign in and persist the issued tokens
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<CurrentUser> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        self.authenticate("/auth/login", body).await
    }

    /// Create an account and persist the issued tokens
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<CurrentUser> {
        self.authenticate("/auth/register", serde_json::to_value(request)?)
            .await
    }

    /// Who the server thinks we are; unauthenticated on any HTTP failure
    pub async fn current_user(&self) -> ClientResult<CurrentUser> {
        match self
            .execute(Method::GET, "/auth/user", None, Auth::Optional)
            .await
        {
            Ok(response) => Self::read_json(response).await,
            Err(ClientError::Http { status, .. }) => {
                tracing::debug!(status, "No authenticated user");
                Ok(CurrentUser::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Sign out on the server; local credentials are cleared either way
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self
            .execute(Method::POST, "/auth/logout", None, Auth::Optional)
            .await;
        self.session.clear();
        result.map(|_| ())
    }

    /// Exchange the refresh token for a new access token.
    /// Clears the session when the exchange fails.
    pub async fn refresh(&self) -> ClientResult<()> {
        let _guard = self.refresh_lock.lock().await;
        match self.refresh_tokens().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.session.clear();
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root", &self.api_root)
            .field("session", &self.session)
            .finish()
    }
}

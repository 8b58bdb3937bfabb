//! In-memory mirror of the server's project tree.
//!
//! Writes are confirmed: local state changes only after the request that
//! authorizes it succeeds. The two completion toggles are the exception; they
//! apply immediately and roll back through [`optimistic::MutationTracker`].
//! The state lock is never held across a network call, so concurrent
//! operations interleave and the last response applied wins.

pub mod comments;
pub mod optimistic;
pub mod reconcile;

pub use comments::{CommentState, CommentStore};
pub use optimistic::{EntityKey, MutationState, MutationTracker, Snapshot};

use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::client::{ApiClient, Session};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    require_title, Milestone, MilestoneDeletePolicy, NewMilestone, NewProject, NewTask, Project,
    Task,
};

/// Everything the view layer reads
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub projects: Vec<Project>,
    pub loading: bool,
    pub error: Option<String>,
    pub mutations: MutationTracker,
}

impl StoreState {
    pub fn project(&self, project_id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: i64) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }
}

fn project_not_found(project_id: i64) -> ClientError {
    ClientError::NotFound(format!("Project {}", project_id))
}

/// Entity store shared by every view of one session
#[derive(Clone)]
pub struct EntityStore {
    client: Arc<ApiClient>,
    policy: MilestoneDeletePolicy,
    state: Arc<RwLock<StoreState>>,
    version: Arc<watch::Sender<u64>>,
}

impl EntityStore {
    pub fn new(client: Arc<ApiClient>, policy: MilestoneDeletePolicy) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            client,
            policy,
            state: Arc::new(RwLock::new(StoreState::default())),
            version: Arc::new(version),
        }
    }

    /// Build the client and session described by the configuration
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let client = ApiClient::new(config, Session::from_config(config))?;
        Ok(Self::new(Arc::new(client), config.milestone_delete_policy))
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn delete_policy(&self) -> MilestoneDeletePolicy {
        self.policy
    }

    // ============ Reads ============

    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.clone()
    }

    pub async fn project(&self, project_id: i64) -> Option<Project> {
        self.state.read().await.project(project_id).cloned()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn mutation_state(&self, key: EntityKey) -> MutationState<Snapshot> {
        self.state.read().await.mutations.state(key)
    }

    /// Version counter bumped after every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    // ============ Internals ============

    async fn commit<R>(&self, apply: impl FnOnce(&mut StoreState) -> R) -> R {
        let result = {
            let mut state = self.state.write().await;
            apply(&mut state)
        };
        self.version.send_modify(|v| *v += 1);
        result
    }

    /// Record the error for the view and hand it back to the caller
    async fn fail<T>(&self, err: ClientError) -> ClientResult<T> {
        tracing::warn!("Store operation failed: {}", err);
        let message = err.to_string();
        self.commit(|s| s.error = Some(message)).await;
        Err(err)
    }

    async fn require_project(&self, project_id: i64) -> ClientResult<()> {
        if self.state.read().await.project(project_id).is_some() {
            Ok(())
        } else {
            Err(project_not_found(project_id))
        }
    }

    /// Run the local checks of a mutation, recording any failure
    async fn precheck(&self, checks: ClientResult<()>) -> ClientResult<()> {
        match checks {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e).await,
        }
    }

    // ============ Projects ============

    /// Replace the whole tree with the server's.
    /// On failure the previous tree is kept.
    pub async fn load_projects(&self) -> ClientResult<Vec<Project>> {
        self.commit(|s| s.loading = true).await;

        match self.client.list_projects().await {
            Ok(mut projects) => {
                projects.iter_mut().for_each(reconcile::normalize_project);
                tracing::info!(count = projects.len(), "Projects loaded");
                let loaded = projects.clone();
                self.commit(|s| {
                    s.projects = projects;
                    s.mutations.clear_settled();
                    s.loading = false;
                    s.error = None;
                })
                .await;
                Ok(loaded)
            }
            Err(e) => {
                self.commit(|s| s.loading = false).await;
                self.fail(e).await
            }
        }
    }

    /// Re-fetch one project and swap it into the tree
    pub async fn refresh_project(&self, project_id: i64) -> ClientResult<Project> {
        let mut project = match self.client.get_project(project_id).await {
            Ok(project) => project,
            Err(e) => return self.fail(e).await,
        };
        reconcile::normalize_project(&mut project);

        let stored = project.clone();
        self.commit(|s| match s.project_mut(project_id) {
            Some(existing) => *existing = project,
            None => s.projects.push(project),
        })
        .await;
        Ok(stored)
    }

    pub async fn create_project(&self, draft: NewProject) -> ClientResult<Project> {
        self.precheck(draft.validate()).await?;

        let mut project = match self.client.create_project(&draft).await {
            Ok(project) => project,
            Err(e) => return self.fail(e).await,
        };
        reconcile::normalize_project(&mut project);
        tracing::info!(project_id = project.id, "Project created");

        let created = project.clone();
        self.commit(|s| s.projects.push(project)).await;
        Ok(created)
    }

    pub async fn update_project(&self, project: Project) -> ClientResult<Project> {
        self.precheck(require_title("Project", &project.title))
            .await?;

        let mut updated = match self.client.update_project(&project).await {
            Ok(updated) => updated,
            Err(e) => return self.fail(e).await,
        };
        reconcile::normalize_project(&mut updated);

        let stored = updated.clone();
        self.commit(|s| match s.project_mut(updated.id) {
            Some(existing) => *existing = updated,
            None => tracing::warn!(project_id = updated.id, "Updated project is no longer loaded"),
        })
        .await;
        Ok(stored)
    }

    pub async fn delete_project(&self, project_id: i64) -> ClientResult<()> {
        if let Err(e) = self.client.delete_project(project_id).await {
            return self.fail(e).await;
        }

        self.commit(|s| {
            s.projects.retain(|p| p.id != project_id);
            s.mutations.forget(EntityKey::Project(project_id));
        })
        .await;
        tracing::info!(project_id, "Project deleted");
        Ok(())
    }

    // ============ Milestones ============

    pub async fn create_milestone(
        &self,
        project_id: i64,
        draft: NewMilestone,
    ) -> ClientResult<Milestone> {
        let checks = match self.require_project(project_id).await {
            Ok(()) => draft.validate(),
            Err(e) => Err(e),
        };
        self.precheck(checks).await?;

        let milestone = match self.client.create_milestone(project_id, &draft).await {
            Ok(milestone) => milestone,
            Err(e) => return self.fail(e).await,
        };
        let milestone_id = milestone.id;

        let stored = self
            .commit(|s| {
                let project = s.project_mut(project_id)?;
                reconcile::insert_milestone(project, milestone.clone());
                project.milestone(milestone_id).cloned()
            })
            .await;
        Ok(stored.unwrap_or(milestone))
    }

    /// Replace a milestone's fields. Its task list is owned by the task
    /// operations and is not taken from the response.
    pub async fn update_milestone(&self, milestone: Milestone) -> ClientResult<Milestone> {
        let project_id = milestone.project_id;
        let checks = match self.require_project(project_id).await {
            Ok(()) => require_title("Milestone", &milestone.title),
            Err(e) => Err(e),
        };
        self.precheck(checks).await?;

        let updated = match self.client.update_milestone(&milestone).await {
            Ok(updated) => updated,
            Err(e) => return self.fail(e).await,
        };

        let stored = self
            .commit(|s| {
                let project = s.project_mut(project_id)?;
                reconcile::replace_milestone(project, updated.clone());
                project.milestone(updated.id).cloned()
            })
            .await;
        Ok(stored.unwrap_or(updated))
    }

    /// Delete a milestone and apply the store's delete policy to its tasks.
    /// Returns the ids of the tasks that were unlinked or removed.
    pub async fn delete_milestone(&self, project_id: i64, milestone_id: i64) -> ClientResult<Vec<i64>> {
        self.precheck(self.require_project(project_id).await)
            .await?;

        if let Err(e) = self.client.delete_milestone(project_id, milestone_id).await {
            return self.fail(e).await;
        }

        let policy = self.policy;
        let affected = self
            .commit(|s| {
                let affected = s
                    .project_mut(project_id)
                    .map(|p| reconcile::remove_milestone(p, milestone_id, policy))
                    .unwrap_or_default();

                s.mutations.forget(EntityKey::Milestone(milestone_id));
                if policy == MilestoneDeletePolicy::Cascade {
                    for task_id in &affected {
                        s.mutations.forget(EntityKey::Task(*task_id));
                    }
                }
                affected
            })
            .await;

        tracing::info!(project_id, milestone_id, ?policy, tasks = affected.len(), "Milestone deleted");
        Ok(affected)
    }

    /// Re-fetch the tasks listed under a milestone and reconcile each one
    pub async fn refresh_milestone_tasks(
        &self,
        project_id: i64,
        milestone_id: i64,
    ) -> ClientResult<Vec<Task>> {
        self.precheck(self.require_project(project_id).await)
            .await?;

        let tasks = match self.client.list_milestone_tasks(project_id, milestone_id).await {
            Ok(tasks) => tasks,
            Err(e) => return self.fail(e).await,
        };

        let fetched = tasks.clone();
        self.commit(|s| {
            if let Some(project) = s.project_mut(project_id) {
                for mut task in tasks {
                    task.project_id = project_id;
                    reconcile::replace_task(project, task);
                }
            }
        })
        .await;
        Ok(fetched)
    }

    // ============ Tasks ============

    pub async fn create_task(&self, project_id: i64, draft: NewTask) -> ClientResult<Task> {
        let checks = match self.require_project(project_id).await {
            Ok(()) => draft.validate(),
            Err(e) => Err(e),
        };
        self.precheck(checks).await?;

        let mut task = match self.client.create_task(project_id, &draft).await {
            Ok(task) => task,
            Err(e) => return self.fail(e).await,
        };
        task.project_id = project_id;
        tracing::debug!(project_id, task_id = task.id, milestone_id = ?task.milestone_id, "Task created");

        let created = task.clone();
        self.commit(|s| {
            if let Some(project) = s.project_mut(project_id) {
                reconcile::insert_task(project, task);
            }
        })
        .await;
        Ok(created)
    }

    /// Save a task and move it between milestone lists as needed
    pub async fn update_task(&self, task: Task) -> ClientResult<Task> {
        let project_id = task.project_id;
        let checks = match self.require_project(project_id).await {
            Ok(()) => require_title("Task", &task.title),
            Err(e) => Err(e),
        };
        self.precheck(checks).await?;

        let mut updated = match self.client.update_task(&task).await {
            Ok(updated) => updated,
            Err(e) => return self.fail(e).await,
        };
        updated.project_id = project_id;

        let stored = updated.clone();
        self.commit(|s| {
            if let Some(project) = s.project_mut(project_id) {
                reconcile::replace_task(project, updated);
            }
        })
        .await;
        Ok(stored)
    }

    /// Delete a task from the server and from every local list holding it
    pub async fn delete_task(&self, project_id: i64, task_id: i64) -> ClientResult<()> {
        self.precheck(self.require_project(project_id).await)
            .await?;

        if let Err(e) = self.client.delete_task(project_id, task_id).await {
            return self.fail(e).await;
        }

        self.commit(|s| {
            if let Some(project) = s.project_mut(project_id) {
                reconcile::remove_task(project, task_id);
            }
            s.mutations.forget(EntityKey::Task(task_id));
        })
        .await;
        Ok(())
    }

    // ============ Optimistic toggles ============

    /// Flip a milestone's completed flag immediately, then confirm with the
    /// server. A rejection restores the previous milestone.
    pub async fn toggle_milestone_completed(
        &self,
        project_id: i64,
        milestone_id: i64,
    ) -> ClientResult<Milestone> {
        let key = EntityKey::Milestone(milestone_id);

        let staged = self
            .commit(|s| -> ClientResult<Milestone> {
                let project = s
                    .projects
                    .iter_mut()
                    .find(|p| p.id == project_id)
                    .ok_or_else(|| project_not_found(project_id))?;
                let milestone = project.milestone_mut(milestone_id).ok_or_else(|| {
                    ClientError::NotFound(format!("Milestone {}", milestone_id))
                })?;

                s.mutations
                    .begin(key, Snapshot::Milestone(milestone.clone()))?;
                milestone.completed = !milestone.completed;
                Ok(milestone.clone())
            })
            .await;
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => return self.fail(e).await,
        };

        match self.client.update_milestone(&staged).await {
            Ok(confirmed) => {
                let stored = self
                    .commit(|s| {
                        s.mutations.commit(key);
                        let project = s.project_mut(project_id)?;
                        reconcile::replace_milestone(project, confirmed.clone());
                        project.milestone(milestone_id).cloned()
                    })
                    .await;
                Ok(stored.unwrap_or(confirmed))
            }
            Err(e) => {
                self.commit(|s| {
                    if let Some(Snapshot::Milestone(previous)) = s.mutations.rollback(key) {
                        if let Some(project) = s.project_mut(project_id) {
                            reconcile::replace_milestone(project, previous);
                        }
                    }
                })
                .await;
                tracing::warn!(project_id, milestone_id, "Milestone toggle rolled back");
                self.fail(e).await
            }
        }
    }

    /// Flip a task between completed and to-do immediately, in every list that
    /// holds it, then confirm with the server. A rejection restores every copy.
    pub async fn toggle_task_completed(&self, project_id: i64, task_id: i64) -> ClientResult<Task> {
        let key = EntityKey::Task(task_id);

        let staged = self
            .commit(|s| -> ClientResult<Task> {
                let project = s
                    .projects
                    .iter_mut()
                    .find(|p| p.id == project_id)
                    .ok_or_else(|| project_not_found(project_id))?;
                let previous = project
                    .task(task_id)
                    .cloned()
                    .ok_or_else(|| ClientError::NotFound(format!("Task {}", task_id)))?;

                s.mutations.begin(key, Snapshot::Task(previous.clone()))?;
                let staged = Task {
                    status: previous.status.toggled(),
                    ..previous
                };
                reconcile::replace_task(project, staged.clone());
                Ok(staged)
            })
            .await;
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => return self.fail(e).await,
        };

        match self.client.update_task(&staged).await {
            Ok(mut confirmed) => {
                confirmed.project_id = project_id;
                let stored = confirmed.clone();
                self.commit(|s| {
                    s.mutations.commit(key);
                    if let Some(project) = s.project_mut(project_id) {
                        reconcile::replace_task(project, confirmed);
                    }
                })
                .await;
                Ok(stored)
            }
            Err(e) => {
                self.commit(|s| {
                    if let Some(Snapshot::Task(previous)) = s.mutations.rollback(key) {
                        if let Some(project) = s.project_mut(project_id) {
                            reconcile::replace_task(project, previous);
                        }
                    }
                })
                .await;
                tracing::warn!(project_id, task_id, "Task toggle rolled back");
                self.fail(e).await
            }
        }
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("client", &self.client)
            .field("policy", &self.policy)
            .finish()
    }
}

//! Comments for the task currently open in the view.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{Comment, NewComment};

#[derive(Debug, Clone, Default)]
pub struct CommentState {
    /// `(project_id, task_id)` of the loaded list
    pub task: Option<(i64, i64)>,
    pub comments: Vec<Comment>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CommentState {
    fn holds(&self, project_id: i64, task_id: i64) -> bool {
        self.task == Some((project_id, task_id))
    }
}

#[derive(Clone)]
pub struct CommentStore {
    client: Arc<ApiClient>,
    state: Arc<RwLock<CommentState>>,
    version: Arc<watch::Sender<u64>>,
}

impl CommentStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            client,
            state: Arc::new(RwLock::new(CommentState::default())),
            version: Arc::new(version),
        }
    }

    pub async fn snapshot(&self) -> CommentState {
        self.state.read().await.clone()
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.state.read().await.comments.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    async fn commit<R>(&self, apply: impl FnOnce(&mut CommentState) -> R) -> R {
        let result = {
            let mut state = self.state.write().await;
            apply(&mut state)
        };
        self.version.send_modify(|v| *v += 1);
        result
    }

    async fn fail<T>(&self, err: ClientError) -> ClientResult<T> {
        tracing::warn!("Comment operation failed: {}", err);
        let message = err.to_string();
        self.commit(|s| s.error = Some(message)).await;
        Err(err)
    }

    /// Load the comments of a task, replacing whatever list was loaded
    pub async fn fetch_comments(&self, project_id: i64, task_id: i64) -> ClientResult<Vec<Comment>> {
        self.commit(|s| s.loading = true).await;

        match self.client.list_comments(project_id, task_id).await {
            Ok(comments) => {
                let loaded = comments.clone();
                self.commit(|s| {
                    s.task = Some((project_id, task_id));
                    s.comments = comments;
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

    pub async fn add_comment(
        &self,
        project_id: i64,
        task_id: i64,
        draft: NewComment,
    ) -> ClientResult<Comment> {
        if let Err(e) = draft.validate() {
            return self.fail(e).await;
        }

        let comment = match self.client.create_comment(project_id, task_id, &draft).await {
            Ok(comment) => comment,
            Err(e) => return self.fail(e).await,
        };

        let created = comment.clone();
        self.commit(|s| {
            if s.holds(project_id, task_id) {
                s.comments.push(comment);
            }
        })
        .await;
        Ok(created)
    }

    pub async fn update_comment(
        &self,
        project_id: i64,
        task_id: i64,
        comment_id: i64,
        draft: NewComment,
    ) -> ClientResult<Comment> {
        if let Err(e) = draft.validate() {
            return self.fail(e).await;
        }

        let comment = match self
            .client
            .update_comment(project_id, task_id, comment_id, &draft)
            .await
        {
            Ok(comment) => comment,
            Err(e) => return self.fail(e).await,
        };

        let updated = comment.clone();
        self.commit(|s| {
            if let Some(existing) = s.comments.iter_mut().find(|c| c.id == comment_id) {
                *existing = comment;
            }
        })
        .await;
        Ok(updated)
    }

    pub async fn delete_comment(
        &self,
        project_id: i64,
        task_id: i64,
        comment_id: i64,
    ) -> ClientResult<()> {
        if let Err(e) = self
            .client
            .delete_comment(project_id, task_id, comment_id)
            .await
        {
            return self.fail(e).await;
        }

        self.commit(|s| s.comments.retain(|c| c.id != comment_id))
            .await;
        Ok(())
    }
}

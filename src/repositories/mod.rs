pub mod comment;
pub mod milestone;
pub mod project;
pub mod task;
pub mod user;

pub use comment::CommentRepository;
pub use milestone::MilestoneRepository;
pub use project::ProjectRepository;
pub use task::TaskRepository;
pub use user::UserRepository;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entity;
use crate::error::AppResult;

/// Every table of the backend. Ids come from one shared sequence.
#[derive(Debug, Default)]
pub struct Tables {
    sequence: i64,
    pub users: BTreeMap<i64, entity::user::Model>,
    pub projects: BTreeMap<i64, entity::project::Model>,
    pub milestones: BTreeMap<i64, entity::milestone::Model>,
    pub tasks: BTreeMap<i64, entity::task::Model>,
    pub comments: BTreeMap<i64, entity::comment::Model>,
    /// Outstanding refresh tokens and the user they were issued to
    pub refresh_tokens: HashMap<String, i64>,
}

impl Tables {
    pub fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Handle to the in-memory tables, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}

/// Base repository trait for common operations
#[async_trait]
pub trait Repository<T>
where
    T: Send + Sync,
{
    /// Find entity by ID
    async fn find_by_id(db: &Database, id: i64) -> AppResult<T>;

    /// Count total entities
    async fn count(db: &Database) -> AppResult<u64>;
}

/// Remove tasks and the comments attached to them
pub(crate) fn purge_tasks(tables: &mut Tables, task_ids: &[i64]) {
    for id in task_ids {
        tables.tasks.remove(id);
    }
    tables.comments.retain(|_, c| !task_ids.contains(&c.task_id));
}

use time::PrimitiveDateTime;

use crate::models::TaskStatus;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub id: i64,
    pub project_id: i64,
    pub milestone_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<PrimitiveDateTime>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

/// Writable columns
#[derive(Clone, Debug, Default)]
pub struct Input {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub milestone_id: Option<i64>,
    pub due_date: Option<PrimitiveDateTime>,
}

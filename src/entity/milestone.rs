use time::PrimitiveDateTime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<PrimitiveDateTime>,
    pub due_date: Option<PrimitiveDateTime>,
    pub completed: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

/// Writable columns
#[derive(Clone, Debug, Default)]
pub struct Input {
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<PrimitiveDateTime>,
    pub due_date: Option<PrimitiveDateTime>,
    pub completed: bool,
}

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub task_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, with = "crate::dates::lenient")]
    pub created_at: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::dates::lenient")]
    pub updated_at: Option<PrimitiveDateTime>,
}

/// Payload for creating or editing a comment
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub content: String,
}

impl NewComment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.content.trim().is_empty() {
            return Err(ClientError::Validation(
                "Comment content is required".to_string(),
            ));
        }
        Ok(())
    }
}

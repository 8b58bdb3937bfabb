use serde::Serialize;
use time::PrimitiveDateTime;
use utoipa::ToSchema;

use crate::dates::{DateFormat, WireDate};
use crate::error::{AppError, AppResult};

/// Plain acknowledgement body
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reject missing or blank required fields
pub fn validate_required(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Trim an optional text field, treating blank as absent
pub fn validate_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn wire_datetime(format: DateFormat, value: Option<PrimitiveDateTime>) -> Option<WireDate> {
    value.map(|dt| format.datetime(dt))
}

pub(crate) fn wire_date(format: DateFormat, value: Option<PrimitiveDateTime>) -> Option<WireDate> {
    value.map(|dt| format.date(dt.date()))
}

//! API module - HTTP handlers over the conversation engine and tutor

pub mod chat_api;
pub mod health_api;
pub mod history_api;
pub mod profile_api;
pub mod scenario_api;
pub mod tutor_api;

use validator::ValidationError;

/// Rejects strings that are empty after trimming.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Trimmed value, `None` when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn default_true() -> bool {
    true
}

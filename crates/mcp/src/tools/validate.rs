//! Field checks shared by the tool request types.

use std::ops::RangeInclusive;

use crate::handler::ToolError;

/// Page sizes accepted by listing tools.
pub const LIMIT_RANGE: RangeInclusive<u32> = 1..=250;

/// Reject empty, blank or dot-segment identifiers, returning the trimmed id.
///
/// Ids end up as URL path segments, where `.` and `..` would be resolved
/// away instead of naming a resource.
pub fn require_id(field: &str, value: &str) -> Result<String, ToolError> {
    let trimmed = require_text(field, value)?;
    if matches!(trimmed.as_str(), "." | "..") {
        return Err(ToolError::validation(format!("{field} must not be '{trimmed}'")));
    }
    Ok(trimmed)
}

/// Reject blank free-text fields such as names.
pub fn require_text(field: &str, value: &str) -> Result<String, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub fn check_limit(limit: Option<u32>) -> Result<Option<u32>, ToolError> {
    match limit {
        Some(limit) if !LIMIT_RANGE.contains(&limit) => Err(ToolError::validation(format!(
            "limit must be between {} and {}, got {limit}",
            LIMIT_RANGE.start(),
            LIMIT_RANGE.end()
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_trimmed_and_required() {
        assert_eq!(require_id("id", " 42 ").expect("id"), "42");
        assert!(require_id("id", "\t").is_err());
    }

    #[test]
    fn dot_segments_are_not_ids() {
        for id in [".", "..", " .. "] {
            let error = require_id("executionId", id).expect_err(id);
            assert!(matches!(error, ToolError::Validation { .. }), "{id} gave {error:?}");
        }
        assert_eq!(require_id("credentialTypeName", "n8n.api").expect("dotted name"), "n8n.api");
        assert_eq!(require_text("name", "..").expect("free text"), "..");
    }

    #[test]
    fn limits_are_bounded() {
        assert_eq!(check_limit(None).expect("absent"), None);
        assert_eq!(check_limit(Some(250)).expect("max"), Some(250));
        assert!(check_limit(Some(0)).is_err());
        assert!(check_limit(Some(251)).is_err());
    }
}

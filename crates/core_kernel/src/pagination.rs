//! Offset/limit pagination for criteria queries

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Window applied after ordering; `None` leaves that side unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self { offset, limit }
    }

    /// Only the first `limit` rows
    pub fn first(limit: i64) -> Self {
        Self {
            offset: None,
            limit: Some(limit),
        }
    }

    /// No window at all: every matching row is returned
    pub fn is_unbounded(&self) -> bool {
        self.offset.is_none() && self.limit.is_none()
    }

    /// Rejects negative bounds, which the store would otherwise report as a
    /// query failure
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(offset) = self.offset.filter(|o| *o < 0) {
            return Err(CoreError::invalid_criteria(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }
        if let Some(limit) = self.limit.filter(|l| *l < 0) {
            return Err(CoreError::invalid_criteria(format!(
                "limit must not be negative, got {}",
                limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert!(Pagination::default().validate().is_ok());
        assert!(Pagination::first(0).validate().is_ok());
        assert!(Pagination::new(Some(-1), None).validate().is_err());
        assert!(Pagination::new(None, Some(-5)).validate().is_err());
    }

    #[test]
    fn test_unbounded_only_without_offset_and_limit() {
        assert!(Pagination::default().is_unbounded());
        assert!(!Pagination::first(10).is_unbounded());
        assert!(!Pagination::new(Some(5), None).is_unbounded());
    }
}

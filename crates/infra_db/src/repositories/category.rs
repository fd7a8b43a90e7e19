//! Category tree

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};
use validator::Validate;

use core_kernel::{CategoryId, Pagination, Predicate, Sort, TextPredicate};

use crate::entity::{Criteria, Entity};
use crate::query::Filter;

/// A node in the category tree; roots have no parent
///
/// The parent reference is enforced by the store
/// (`category_parent_id_fkey`), not checked on insert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow, Validate)]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn child_of(parent: CategoryId, name: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Entity for Category {
    type Id = CategoryId;
    type Criteria = CategoryCriteria;

    const KIND: &'static str = "category";
    const TABLE: &'static str = "category";
    const COLUMNS: &'static [&'static str] =
        &["id", "parent_id", "name", "created_at", "updated_at"];
    const INSERT_COLUMNS: &'static [&'static str] = &["parent_id", "name"];

    fn id(&self) -> CategoryId {
        self.id
    }

    fn bind_insert<'args>(&self, values: &mut Separated<'_, 'args, Postgres, &'static str>) {
        values
            .push_bind(self.parent_id)
            .push_bind(self.name.clone());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCriteria {
    pub id: Option<Predicate<CategoryId>>,
    pub parent_id: Option<Predicate<CategoryId>>,
    pub name: Option<TextPredicate>,
    pub created_at: Option<Predicate<DateTime<Utc>>>,
    pub updated_at: Option<Predicate<DateTime<Utc>>>,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub pagination: Pagination,
}

impl CategoryCriteria {
    /// Direct children of `parent`
    pub fn children_of(parent: CategoryId) -> Self {
        Self {
            parent_id: Some(Predicate::Equal(parent)),
            ..Default::default()
        }
    }

    pub fn roots() -> Self {
        Self {
            parent_id: Some(Predicate::IsNull),
            ..Default::default()
        }
    }
}

impl Criteria for CategoryCriteria {
    fn push_filters(&self, filter: &mut Filter<'_, '_>) {
        filter
            .push("id", self.id.as_ref())
            .push("parent_id", self.parent_id.as_ref())
            .push("name", self.name.as_ref())
            .push("created_at", self.created_at.as_ref())
            .push("updated_at", self.updated_at.as_ref());
    }

    fn sort(&self) -> &Sort {
        &self.sort
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

//! News articles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};
use validator::Validate;

use core_kernel::{NewsId, Pagination, Predicate, Sort, TextPredicate};

use crate::entity::{Criteria, Entity};
use crate::query::Filter;

/// A published article; `title` is unique across all news
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow, Validate)]
pub struct News {
    pub id: NewsId,
    #[validate(length(min = 1, max = 255, message = "title must be 1 to 255 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "lead must be at most 1000 characters"))]
    pub lead: Option<String>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl News {
    /// An unsaved article with no lead and a zero score
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_lead(mut self, lead: impl Into<String>) -> Self {
        self.lead = Some(lead.into());
        self
    }
}

impl Entity for News {
    type Id = NewsId;
    type Criteria = NewsCriteria;

    const KIND: &'static str = "news";
    const TABLE: &'static str = "news";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "lead",
        "content",
        "score",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &["title", "lead", "content", "score"];

    fn id(&self) -> NewsId {
        self.id
    }

    fn bind_insert<'args>(&self, values: &mut Separated<'_, 'args, Postgres, &'static str>) {
        values
            .push_bind(self.title.clone())
            .push_bind(self.lead.clone())
            .push_bind(self.content.clone())
            .push_bind(self.score);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsCriteria {
    pub id: Option<Predicate<NewsId>>,
    pub title: Option<TextPredicate>,
    pub lead: Option<TextPredicate>,
    pub content: Option<TextPredicate>,
    pub score: Option<Predicate<i32>>,
    pub created_at: Option<Predicate<DateTime<Utc>>>,
    pub updated_at: Option<Predicate<DateTime<Utc>>>,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub pagination: Pagination,
}

impl Criteria for NewsCriteria {
    fn push_filters(&self, filter: &mut Filter<'_, '_>) {
        filter
            .push("id", self.id.as_ref())
            .push("title", self.title.as_ref())
            .push("lead", self.lead.as_ref())
            .push("content", self.content.as_ref())
            .push("score", self.score.as_ref())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_news_is_unsaved() {
        let news = News::new("Lorem Ipsum", "Body").with_lead("Neque porro");
        assert!(!news.id.is_assigned());
        assert_eq!(news.score, 0);
        assert_eq!(news.lead.as_deref(), Some("Neque porro"));
        assert!(news.validate().is_ok());
    }

    #[test]
    fn test_empty_title_fails_validation() {
        let news = News::new("", "Body");
        let errors = news.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_filter_columns_are_whitelisted() {
        let criteria = NewsCriteria {
            id: Some(Predicate::GreaterThan(NewsId::new(1))),
            title: Some(TextPredicate::equal("a")),
            lead: Some(TextPredicate::Is(Predicate::IsNull)),
            content: Some(TextPredicate::Contains("b".into())),
            score: Some(Predicate::GreaterThanOrEqual(5)),
            created_at: Some(Predicate::IsNotNull),
            updated_at: Some(Predicate::IsNull),
            ..Default::default()
        };
        let mut builder = sqlx::QueryBuilder::<Postgres>::new("");
        let mut filter = Filter::new(&mut builder);
        criteria.push_filters(&mut filter);
        assert_eq!(filter.len(), 7);

        let sql = builder.sql().to_string();
        for column in News::COLUMNS {
            assert!(sql.contains(column), "{} missing from {}", column, sql);
        }
    }
}

//! Reader comments on news

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};
use validator::Validate;

use core_kernel::{CommentId, NewsId, Pagination, Predicate, Sort, TextPredicate};

use crate::entity::{Criteria, Entity};
use crate::query::Filter;

use super::News;

/// A comment attached to one news article
///
/// `news_title` is copied from the article when the comment is created and is
/// not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
pub struct Comment {
    pub id: CommentId,
    pub news_id: NewsId,
    #[validate(length(min = 1, max = 255, message = "news title must be 1 to 255 characters"))]
    pub news_title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Comment {
    fn default() -> Self {
        Self {
            id: CommentId::UNASSIGNED,
            news_id: NewsId::UNASSIGNED,
            news_title: String::new(),
            content: String::new(),
            is_visible: true,
            created_at: DateTime::<Utc>::default(),
            updated_at: None,
        }
    }
}

impl Comment {
    /// An unsaved, visible comment on `news`
    pub fn for_news(news: &News, content: impl Into<String>) -> Self {
        Self {
            news_id: news.id,
            news_title: news.title.clone(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }
}

impl Entity for Comment {
    type Id = CommentId;
    type Criteria = CommentCriteria;

    const KIND: &'static str = "comment";
    const TABLE: &'static str = "comment";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "news_id",
        "news_title",
        "content",
        "is_visible",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] =
        &["news_id", "news_title", "content", "is_visible"];

    fn id(&self) -> CommentId {
        self.id
    }

    fn bind_insert<'args>(&self, values: &mut Separated<'_, 'args, Postgres, &'static str>) {
        values
            .push_bind(self.news_id)
            .push_bind(self.news_title.clone())
            .push_bind(self.content.clone())
            .push_bind(self.is_visible);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentCriteria {
    pub id: Option<Predicate<CommentId>>,
    pub news_id: Option<Predicate<NewsId>>,
    pub news_title: Option<TextPredicate>,
    pub content: Option<TextPredicate>,
    pub is_visible: Option<Predicate<bool>>,
    pub created_at: Option<Predicate<DateTime<Utc>>>,
    pub updated_at: Option<Predicate<DateTime<Utc>>>,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub pagination: Pagination,
}

impl CommentCriteria {
    /// All comments on one article
    pub fn for_news(news_id: NewsId) -> Self {
        Self {
            news_id: Some(Predicate::Equal(news_id)),
            ..Default::default()
        }
    }
}

impl Criteria for CommentCriteria {
    fn push_filters(&self, filter: &mut Filter<'_, '_>) {
        filter
            .push("id", self.id.as_ref())
            .push("news_id", self.news_id.as_ref())
            .push("news_title", self.news_title.as_ref())
            .push("content", self.content.as_ref())
            .push("is_visible", self.is_visible.as_ref())
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

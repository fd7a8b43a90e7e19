//! The end-to-end demo scenario
//!
//! Each step either succeeds or returns a [`DemoError`] describing which
//! expectation failed. The scenario never exits the process.

use std::collections::HashMap;

use core_kernel::{CategoryId, Sort};
use infra_db::repositories::{Category, CategoryCriteria, Comment, CommentCriteria, News, NewsCriteria};
use infra_db::{error_constraint, Constraint, Repositories};
use tracing::{debug, info, instrument};

use crate::error::DemoError;

const NEWS_TITLE: &str = "Lorem Ipsum";
const NEWS_LEAD: &str =
    "Neque porro quisquam est qui dolorem ipsum quia dolor sit amet, consectetur, adipisci velit...";
const NEWS_CONTENT: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Nullam a felis \
    vel erat gravida luctus at id nisi. Cum sociis natoque penatibus et magnis dis parturient montes, \
    nascetur ridiculus mus. Vivamus a nibh massa.";
const COMMENT_CONTENT: &str = "Etiam eget nunc vel tellus placerat accumsan. Quisque dictum commodo \
    orci, a eleifend nulla viverra malesuada. Etiam dui purus, dapibus a risus sed, porta scelerisque \
    lorem.";

/// How much data the scenario writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioOptions {
    pub comments: usize,
    pub children: usize,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            comments: 20,
            children: 20,
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub news_before: i64,
    pub news: News,
    pub comments_streamed: usize,
    pub parent_category: CategoryId,
    pub children_counted: i64,
}

pub struct Scenario {
    repos: Repositories,
    options: ScenarioOptions,
    title: String,
}

impl Scenario {
    pub fn new(repos: Repositories, options: ScenarioOptions) -> Self {
        Self {
            repos,
            options,
            title: NEWS_TITLE.to_string(),
        }
    }

    /// Overrides the article title, which must be unique in the store
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Runs every step in order, stopping at the first failure
    #[instrument(skip(self), fields(title = %self.title))]
    pub async fn run(&self) -> Result<ScenarioReport, DemoError> {
        let news_before = self.repos.news.count(&NewsCriteria::default()).await?;
        debug!(count = news_before, "number of news fetched");

        let news = self.insert_news().await?;
        self.insert_comments(&news).await?;
        let comments_streamed = self.stream_comments(&news).await?;

        let parent = self.repos.category.insert(&Category::root("parent")).await?;
        let children_counted = self.insert_children(parent.id).await?;

        self.insert_orphan_category().await?;

        Ok(ScenarioReport {
            news_before,
            news,
            comments_streamed,
            parent_category: parent.id,
            children_counted,
        })
    }

    async fn insert_news(&self) -> Result<News, DemoError> {
        let draft = News::new(self.title.clone(), NEWS_CONTENT).with_lead(NEWS_LEAD);

        match self.repos.news.insert(&draft).await {
            Ok(news) => Ok(news),
            Err(e) if error_constraint(&e) == Some(Constraint::NewsTitleUnique) => {
                Err(DemoError::DuplicateTitle(draft.title))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_comments(&self, news: &News) -> Result<(), DemoError> {
        for _ in 0..self.options.comments {
            self.repos
                .comment
                .insert(&Comment::for_news(news, COMMENT_CONTENT))
                .await?;
        }
        Ok(())
    }

    /// Streams the article's comments back, sorting on a column that does not
    /// exist alongside the identity
    async fn stream_comments(&self, news: &News) -> Result<usize, DemoError> {
        let criteria = CommentCriteria {
            sort: Sort::from(HashMap::from([
                ("id", false),
                ("non_existing_column", true),
            ])),
            ..CommentCriteria::for_news(news.id)
        };

        let mut iter = self.repos.comment.find_iter(&criteria).await?;
        let mut got = 0;
        while iter.next().await {
            let comment = iter.entity()?;
            debug!(comment_id = %comment.id, "comment fetched");
            got += 1;
        }
        if let Some(e) = iter.take_err() {
            return Err(e.into());
        }

        if got != self.options.comments {
            return Err(DemoError::count_mismatch(
                "comments",
                self.options.comments,
                got as i64,
            ));
        }
        info!(count = got, "proper number of comments");
        Ok(got)
    }

    async fn insert_children(&self, parent: CategoryId) -> Result<i64, DemoError> {
        for i in 0..self.options.children {
            let child = Category::child_of(parent, format!("child_category{}", i));
            self.repos.category.insert(&child).await?;
        }

        let count = self
            .repos
            .category
            .count(&CategoryCriteria::children_of(parent))
            .await?;
        if count != self.options.children as i64 {
            return Err(DemoError::count_mismatch(
                "categories",
                self.options.children,
                count,
            ));
        }
        info!(count, "proper number of categories");
        Ok(count)
    }

    /// Inserts a category under a parent that cannot exist and expects the
    /// store to refuse it
    async fn insert_orphan_category(&self) -> Result<(), DemoError> {
        let expected = Constraint::CategoryParentIdFkey;
        let orphan = Category::child_of(CategoryId::new(i64::MAX - 1), "does not work");

        match self.repos.category.insert(&orphan).await {
            Ok(_) => Err(DemoError::ConstraintNotEnforced { constraint: expected }),
            Err(e) => match error_constraint(&e) {
                Some(got) if got == expected => {
                    info!(
                        constraint = %expected,
                        "category parent id constraint properly caught, category with such id does not exist"
                    );
                    Ok(())
                }
                got => Err(DemoError::UnexpectedConstraint { expected, got }),
            },
        }
    }
}

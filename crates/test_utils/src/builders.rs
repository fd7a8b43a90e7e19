//! Test Data Builders
//!
//! Provides builder patterns for constructing unsaved entities with sensible
//! defaults. Tests set only the fields they care about.

use core_kernel::{CategoryId, NewsId};
use infra_db::repositories::{Category, Comment, News};

use crate::fixtures::TextFixtures;

/// Builder for unsaved news
pub struct NewsBuilder {
    news: News,
}

impl Default for NewsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsBuilder {
    /// Creates a builder with a unique title and fixed content
    pub fn new() -> Self {
        Self {
            news: News::new(
                TextFixtures::unique_title("News"),
                TextFixtures::news_content(),
            ),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.news.title = title.into();
        self
    }

    pub fn with_lead(mut self, lead: impl Into<String>) -> Self {
        self.news.lead = Some(lead.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.news.content = content.into();
        self
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.news.score = score;
        self
    }

    /// Sets an identity, which makes the entity invalid for insert
    pub fn with_id(mut self, id: NewsId) -> Self {
        self.news.id = id;
        self
    }

    pub fn build(self) -> News {
        self.news
    }
}

/// Builder for unsaved comments
pub struct CommentBuilder {
    comment: Comment,
}

impl CommentBuilder {
    /// Creates a visible comment on `news`
    pub fn on(news: &News) -> Self {
        Self {
            comment: Comment::for_news(news, TextFixtures::comment_content()),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.comment.content = content.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.comment.is_visible = false;
        self
    }

    pub fn build(self) -> Comment {
        self.comment
    }

    /// `count` comments numbered in their content
    pub fn many(news: &News, count: usize) -> Vec<Comment> {
        (0..count)
            .map(|i| {
                CommentBuilder::on(news)
                    .with_content(format!("{} #{}", TextFixtures::comment_content(), i))
                    .build()
            })
            .collect()
    }
}

/// Builder for unsaved categories
pub struct CategoryBuilder {
    category: Category,
}

impl Default for CategoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryBuilder {
    /// Creates a root category with a unique name
    pub fn new() -> Self {
        Self {
            category: Category::root(TextFixtures::unique_title("category")),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.category.name = name.into();
        self
    }

    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.category.parent_id = Some(parent);
        self
    }

    pub fn build(self) -> Category {
        self.category
    }

    /// `count` children of `parent` named `child_category0..`
    pub fn children(parent: CategoryId, count: usize) -> Vec<Category> {
        (0..count)
            .map(|i| Category::child_of(parent, format!("child_category{}", i)))
            .collect()
    }
}

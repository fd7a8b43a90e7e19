//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for news, comments and categories. Text is
//! fixed where a test compares it and generated where only uniqueness
//! matters.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{CategoryId, NewsId};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::Fake;
use infra_db::repositories::{Category, Comment, News};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Distinguishes rows written by this test process from earlier runs that
/// share the database
static RUN_TAG: Lazy<String> = Lazy::new(|| format!("{:x}", Utc::now().timestamp_micros()));

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Fixture for text test data
pub struct TextFixtures;

impl TextFixtures {
    pub fn news_title() -> &'static str {
        "Lorem Ipsum"
    }

    pub fn news_lead() -> &'static str {
        "Neque porro quisquam est qui dolorem ipsum quia dolor sit amet, consectetur, adipisci velit..."
    }

    pub fn news_content() -> &'static str {
        "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Nullam a felis vel erat gravida luctus at id nisi."
    }

    pub fn comment_content() -> &'static str {
        "Etiam eget nunc vel tellus placerat accumsan. Quisque dictum commodo orci, a eleifend nulla viverra malesuada."
    }

    /// A title no other call in this process or earlier runs has returned
    pub fn unique_title(prefix: &str) -> String {
        let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{} {}-{}", prefix, RUN_TAG.as_str(), n)
    }

    /// Random lorem sentence
    pub fn sentence() -> String {
        Sentence(3..8).fake()
    }

    /// Random lorem paragraph
    pub fn paragraph() -> String {
        Paragraph(2..5).fake()
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }

    pub fn jan_1_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// Far enough ahead that no row's `created_at` reaches it
    pub fn far_future() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// A category identity no test database will ever reach
    pub fn missing_category_id() -> CategoryId {
        CategoryId::new(i64::MAX - 1)
    }

    pub fn missing_news_id() -> NewsId {
        NewsId::new(i64::MAX - 1)
    }
}

/// Fixture for unsaved entities
pub struct EntityFixtures;

impl EntityFixtures {
    /// An unsaved article with a unique title and a lead
    pub fn news() -> News {
        News::new(
            TextFixtures::unique_title(TextFixtures::news_title()),
            TextFixtures::news_content(),
        )
        .with_lead(TextFixtures::news_lead())
    }

    pub fn comment_on(news: &News) -> Comment {
        Comment::for_news(news, TextFixtures::comment_content())
    }

    pub fn root_category() -> Category {
        Category::root(TextFixtures::unique_title("parent"))
    }

    /// A category pointing at a parent that does not exist
    pub fn orphan_category() -> Category {
        Category::child_of(IdFixtures::missing_category_id(), "does not work")
    }
}

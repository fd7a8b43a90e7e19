//! Newsroom entities and their repositories
//!
//! Each submodule defines one entity kind, its criteria and its column
//! whitelist. [`Repositories`] bundles one repository per kind over a shared
//! pool.

pub mod category;
pub mod comment;
pub mod news;

pub use category::{Category, CategoryCriteria};
pub use comment::{Comment, CommentCriteria};
pub use news::{News, NewsCriteria};

use sqlx::PgPool;

use crate::repository::{Repository, RepositoryConfig};

pub type NewsRepository = Repository<News>;
pub type CommentRepository = Repository<Comment>;
pub type CategoryRepository = Repository<Category>;

/// One repository per entity kind, sharing a pool and configuration
#[derive(Debug, Clone)]
pub struct Repositories {
    pub news: NewsRepository,
    pub comment: CommentRepository,
    pub category: CategoryRepository,
}

impl Repositories {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, RepositoryConfig::default())
    }

    pub fn with_config(pool: PgPool, config: RepositoryConfig) -> Self {
        Self {
            news: Repository::with_config(pool.clone(), config),
            comment: Repository::with_config(pool.clone(), config),
            category: Repository::with_config(pool, config),
        }
    }
}

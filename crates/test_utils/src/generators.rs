//! Property-Based Test Generators
//!
//! Provides proptest strategies for sort requests and entity content.

use core_kernel::{Direction, Sort, SortKey};
use infra_db::repositories::News;
use proptest::prelude::*;

/// Strategy for sort directions
pub fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Asc), Just(Direction::Desc)]
}

/// Strategy for column names that are never in a whitelist
pub fn unknown_column_strategy() -> impl Strategy<Value = String> {
    "zz_[a-z]{1,10}"
}

/// Strategy for column names drawn from `whitelist` or made up
pub fn column_strategy(whitelist: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop_oneof![
        3 => proptest::sample::select(whitelist).prop_map(str::to_string),
        1 => unknown_column_strategy(),
    ]
}

/// Strategy for ordered sort requests over `whitelist`
pub fn sort_strategy(whitelist: &'static [&'static str]) -> impl Strategy<Value = Sort> {
    prop::collection::vec((column_strategy(whitelist), direction_strategy()), 0..6).prop_map(
        |pairs| {
            pairs
                .into_iter()
                .map(|(column, direction)| SortKey::new(column, direction))
                .collect::<Sort>()
        },
    )
}

/// Strategy for unordered (map-like) sort requests over `whitelist`
pub fn unordered_pairs_strategy(
    whitelist: &'static [&'static str],
) -> impl Strategy<Value = Vec<(String, bool)>> {
    prop::collection::hash_map(column_strategy(whitelist), any::<bool>(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

/// Strategy for text that exercises `LIKE` metacharacters
pub fn needle_strategy() -> impl Strategy<Value = String> {
    "[a-z%_\\\\]{0,12}"
}

/// Strategy for unsaved news that passes validation
pub fn news_strategy() -> impl Strategy<Value = News> {
    ("[A-Za-z ]{1,60}", "[A-Za-z .]{1,200}", -100i32..100).prop_map(|(title, content, score)| {
        News {
            score,
            ..News::new(title, content)
        }
    })
}

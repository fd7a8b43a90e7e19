//! Sort requests
//!
//! Callers describe the order they want as (column, direction) pairs. The
//! columns are checked against an entity's whitelist when the query is
//! compiled: unknown columns are dropped rather than failing the read, and the
//! identity column is always appended last so the resulting order is total and
//! repeatable.
//!
//! A `Sort` built from an unordered map (`from_unordered`) carries no caller
//! order at all, so its surviving keys are put into whitelist order instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sort direction for one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Maps a `descending` flag to a direction
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }

    pub fn is_descending(self) -> bool {
        self == Direction::Desc
    }

    /// SQL keyword for this direction
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One requested sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortKey {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum KeyOrder {
    #[default]
    AsGiven,
    Whitelist,
}

/// A requested ordering, validated only at query compile time
///
/// # Example
///
/// ```rust
/// use core_kernel::{Direction, Sort};
///
/// let sort = Sort::new().desc("created_at").asc("no_such_column");
/// let resolved = sort.resolve(&["id", "created_at"], "id");
///
/// assert_eq!(resolved.keys, vec![("created_at", Direction::Desc), ("id", Direction::Asc)]);
/// assert_eq!(resolved.discarded, vec!["no_such_column".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SortKey>", into = "Vec<SortKey>")]
pub struct Sort {
    keys: Vec<SortKey>,
    order: KeyOrder,
}

impl Sort {
    /// An empty sort, which resolves to ascending identity order
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ascending key
    pub fn asc(self, column: impl Into<String>) -> Self {
        self.by(column, Direction::Asc)
    }

    /// Appends a descending key
    pub fn desc(self, column: impl Into<String>) -> Self {
        self.by(column, Direction::Desc)
    }

    /// Appends a key with an explicit direction
    pub fn by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.keys.push(SortKey::new(column, direction));
        self
    }

    /// Builds a sort from (column, descending) pairs whose iteration order is
    /// meaningless, such as a `HashMap`
    ///
    /// The surviving keys are applied in whitelist order.
    pub fn from_unordered<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        Self {
            keys: pairs
                .into_iter()
                .map(|(column, descending)| {
                    SortKey::new(column, Direction::from_descending(descending))
                })
                .collect(),
            order: KeyOrder::Whitelist,
        }
    }

    /// The keys as requested, before validation
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validates the keys against `whitelist` and produces the final order
    ///
    /// Unknown columns are discarded, repeated columns keep their first
    /// occurrence, and `identity` ascending is appended unless it is already
    /// one of the keys.
    pub fn resolve(&self, whitelist: &[&'static str], identity: &'static str) -> ResolvedSort {
        let mut keys: Vec<(&'static str, Direction)> = Vec::with_capacity(self.keys.len() + 1);
        let mut discarded = Vec::new();

        for key in &self.keys {
            match whitelist.iter().find(|column| **column == key.column) {
                Some(column) if keys.iter().all(|(seen, _)| seen != column) => {
                    keys.push((*column, key.direction));
                }
                Some(_) => {}
                None => discarded.push(key.column.clone()),
            }
        }

        if self.order == KeyOrder::Whitelist {
            keys.sort_by_key(|(column, _)| whitelist.iter().position(|c| c == column));
            discarded.sort();
        }

        if keys.iter().all(|(column, _)| *column != identity) {
            keys.push((identity, Direction::Asc));
        }

        ResolvedSort { keys, discarded }
    }
}

impl FromIterator<SortKey> for Sort {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
            order: KeyOrder::AsGiven,
        }
    }
}

impl<K: Into<String>> From<HashMap<K, bool>> for Sort {
    fn from(map: HashMap<K, bool>) -> Self {
        Sort::from_unordered(map)
    }
}

impl From<Vec<SortKey>> for Sort {
    fn from(keys: Vec<SortKey>) -> Self {
        Self {
            keys,
            order: KeyOrder::AsGiven,
        }
    }
}

impl From<Sort> for Vec<SortKey> {
    fn from(sort: Sort) -> Self {
        sort.keys
    }
}

/// The validated, total order a query will use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSort {
    /// Whitelisted keys in application order, identity last
    pub keys: Vec<(&'static str, Direction)>,
    /// Requested columns that are not in the whitelist
    pub discarded: Vec<String>,
}

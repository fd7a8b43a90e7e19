//! Filter predicates
//!
//! A criteria struct holds one `Option<Predicate<T>>` per filterable column.
//! `None` means the column is not filtered at all; a present predicate
//! contributes one conjunct to the query. There is deliberately no OR.

use serde::{Deserialize, Serialize};

/// A comparison against a single column value
///
/// # Example
///
/// ```rust
/// use core_kernel::{NewsId, Predicate};
///
/// let by_news = Predicate::Equal(NewsId::new(3));
/// let recent = Predicate::Between(10_i64, 20_i64);
/// let any = Predicate::any_of([NewsId::new(1), NewsId::new(2)]);
/// assert!(matches!(any, Predicate::In(ref ids) if ids.len() == 2));
/// # let _ = (by_news, recent);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Predicate<T> {
    Equal(T),
    NotEqual(T),
    GreaterThan(T),
    GreaterThanOrEqual(T),
    LessThan(T),
    LessThanOrEqual(T),
    /// Inclusive on both ends
    Between(T, T),
    /// Matches any of the listed values; an empty list matches nothing
    In(Vec<T>),
    IsNull,
    IsNotNull,
}

impl<T> Predicate<T> {
    /// Builds an `In` predicate from any collection of values
    pub fn any_of(values: impl IntoIterator<Item = T>) -> Self {
        Predicate::In(values.into_iter().collect())
    }

    /// Converts the operand type, keeping the comparison
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Predicate<U> {
        match self {
            Predicate::Equal(v) => Predicate::Equal(f(v)),
            Predicate::NotEqual(v) => Predicate::NotEqual(f(v)),
            Predicate::GreaterThan(v) => Predicate::GreaterThan(f(v)),
            Predicate::GreaterThanOrEqual(v) => Predicate::GreaterThanOrEqual(f(v)),
            Predicate::LessThan(v) => Predicate::LessThan(f(v)),
            Predicate::LessThanOrEqual(v) => Predicate::LessThanOrEqual(f(v)),
            Predicate::Between(lo, hi) => Predicate::Between(f(lo), f(hi)),
            Predicate::In(values) => Predicate::In(values.into_iter().map(f).collect()),
            Predicate::IsNull => Predicate::IsNull,
            Predicate::IsNotNull => Predicate::IsNotNull,
        }
    }
}

/// A predicate over a text column
///
/// Pattern variants match literally: `%`, `_` and `\` in the needle are
/// escaped before the `LIKE` pattern is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum TextPredicate {
    Is(Predicate<String>),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
}

impl TextPredicate {
    /// Exact match shorthand
    pub fn equal(value: impl Into<String>) -> Self {
        TextPredicate::Is(Predicate::Equal(value.into()))
    }

    /// Returns the `LIKE` pattern for the pattern variants
    pub fn like_pattern(&self) -> Option<String> {
        match self {
            TextPredicate::Is(_) => None,
            TextPredicate::Contains(needle) => Some(format!("%{}%", escape_like(needle))),
            TextPredicate::StartsWith(needle) => Some(format!("{}%", escape_like(needle))),
            TextPredicate::EndsWith(needle) => Some(format!("%{}", escape_like(needle))),
        }
    }
}

impl From<Predicate<String>> for TextPredicate {
    fn from(predicate: Predicate<String>) -> Self {
        TextPredicate::Is(predicate)
    }
}

/// Escapes `LIKE` wildcards using backslash, PostgreSQL's default escape
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_like_patterns() {
        assert_eq!(
            TextPredicate::Contains("50%".into()).like_pattern().as_deref(),
            Some("%50\\%%")
        );
        assert_eq!(
            TextPredicate::StartsWith("a_b".into()).like_pattern().as_deref(),
            Some("a\\_b%")
        );
        assert_eq!(
            TextPredicate::EndsWith("x".into()).like_pattern().as_deref(),
            Some("%x")
        );
        assert_eq!(TextPredicate::equal("x").like_pattern(), None);
    }

    #[test]
    fn test_map_keeps_comparison() {
        let mapped = Predicate::Between(1, 5).map(|v| v * 10);
        assert_eq!(mapped, Predicate::Between(10, 50));

        let empty: Predicate<i64> = Predicate::any_of(Vec::new());
        assert_eq!(empty, Predicate::In(vec![]));
    }

    proptest! {
        #[test]
        fn escaped_needle_has_no_bare_wildcards(raw in ".*") {
            let escaped = escape_like(&raw);
            let mut chars = escaped.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    let next = chars.next();
                    prop_assert!(matches!(next, Some('%') | Some('_') | Some('\\')));
                } else {
                    prop_assert!(c != '%' && c != '_');
                }
            }
        }
    }
}

//! Strongly-typed identifiers for stored entities
//!
//! Identities are assigned by the store (`BIGSERIAL`) and are strictly
//! positive. The zero value means "not yet assigned" and is the only value
//! accepted on insert. Newtype wrappers keep a `NewsId` from being passed
//! where a `CategoryId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(i64);

        impl $name {
            /// The identity of an entity that has not been stored yet
            pub const UNASSIGNED: Self = Self(0);

            /// Wraps a raw identity value
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identity value
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Whether the store has assigned this identity
            pub const fn is_assigned(self) -> bool {
                self.0 > 0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(NewsId, "NEWS");
define_id!(CommentId, "CMT");
define_id!(CategoryId, "CAT");

pub mod bookmarks;

use serde::{Serialize, Serializer};
use std::fmt::Display;

/// Column filter matching rows whose value equals `T` (`eq.<value>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equals<T>(pub T);

impl<T: Display> Display for Equals<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "eq.{}", self.0)
    }
}

impl<T: Display> Serialize for Equals<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    #[default]
    Descending,
}

/// Ordering clause, serialized as `column.asc` / `column.desc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn ascending(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: Direction::Descending,
        }
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}.asc", self.column),
            Direction::Descending => write!(f, "{}.desc", self.column),
        }
    }
}

impl Serialize for OrderBy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

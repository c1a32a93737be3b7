//! Query safety screening.
//!
//! Two independent checks run on every submitted statement: a prefix-based
//! kind classifier, and a whole-string deny-list for schema-level keywords.
//! Neither parses SQL.

mod classifier;
mod danger;

pub use classifier::classify_statement;
pub use danger::{DangerFilter, BLOCKED_KEYWORDS};

use serde::{Serialize, Serializer};
use std::fmt;

/// The kind of SQL statement, derived from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything that does not start with one of the four keywords above.
    Unknown,
}

impl StatementKind {
    /// Returns the kind as an upper-case SQL keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns true for statements that change data.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }

    /// Returns true if the caller must confirm before this kind runs.
    pub fn requires_confirmation(&self) -> bool {
        self.is_mutation()
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

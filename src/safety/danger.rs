//! Destructive keyword deny-list.
//!
//! Scans the whole statement, not just its prefix, for schema-level keywords
//! as whole words in any case. A match blocks the statement whatever its kind,
//! including SELECTs that merely mention one of the words.

use crate::error::{RelayError, Result};
use regex::Regex;

/// Keywords that block a statement outright.
pub const BLOCKED_KEYWORDS: [&str; 4] = ["DROP", "TRUNCATE", "ALTER", "CREATE"];

const DENY_PATTERN: &str = r"(?i)\b(DROP|TRUNCATE|ALTER|CREATE)\b";

/// Whole-string keyword filter. The pattern is compiled once per instance.
#[derive(Debug, Clone)]
pub struct DangerFilter {
    pattern: Regex,
}

impl DangerFilter {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(DENY_PATTERN).expect("deny-list pattern is valid"),
        }
    }

    /// Returns the first blocked keyword found in `sql`, upper-cased.
    pub fn find_blocked_keyword(&self, sql: &str) -> Option<&'static str> {
        let found = self.pattern.find(sql)?;
        BLOCKED_KEYWORDS
            .into_iter()
            .find(|kw| kw.eq_ignore_ascii_case(found.as_str()))
    }

    /// Returns true if `sql` contains any blocked keyword.
    pub fn is_dangerous(&self, sql: &str) -> bool {
        self.pattern.is_match(sql)
    }

    /// Fails with `PermissionDenied` if `sql` contains a blocked keyword.
    pub fn check(&self, sql: &str) -> Result<()> {
        match self.find_blocked_keyword(sql) {
            Some(kw) => Err(RelayError::permission_denied(format!(
                "Dangerous query blocked: contains {kw}"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for DangerFilter {
    fn default() -> Self {
        Self::new()
    }
}

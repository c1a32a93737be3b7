//! Statement kind classification.
//!
//! Looks only at how the trimmed statement begins. There is deliberately no
//! word-boundary check: `selectfoo` classifies as SELECT.

use super::StatementKind;

const PREFIXES: [(&str, StatementKind); 4] = [
    ("select", StatementKind::Select),
    ("insert", StatementKind::Insert),
    ("update", StatementKind::Update),
    ("delete", StatementKind::Delete),
];

/// Classifies a SQL string by its leading keyword, case-insensitively.
pub fn classify_statement(sql: &str) -> StatementKind {
    let lowered = sql.trim().to_lowercase();

    PREFIXES
        .iter()
        .find(|(prefix, _)| lowered.starts_with(prefix))
        .map(|(_, kind)| *kind)
        .unwrap_or(StatementKind::Unknown)
}

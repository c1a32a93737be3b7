//! The confirmation gate between a submitted statement and its execution.
//!
//! Every statement passes three checks in a fixed order: emptiness, the
//! keyword deny-list, then its kind. SELECTs run immediately; mutations run
//! only when the caller has confirmed them; everything else is refused. No
//! pending statement is remembered between calls.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::db::{DatabaseClient, ExecutionResult};
use crate::error::{RelayError, Result};
use crate::safety::{classify_statement, DangerFilter, StatementKind};

/// Response payload asking the caller to resubmit with `confirm: true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationRequest {
    pub needs_confirmation: bool,
    pub query_type: StatementKind,
    pub message: String,
}

impl ConfirmationRequest {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            needs_confirmation: true,
            query_type: kind,
            message: format!("This {kind} query will modify data. Do you want to proceed?"),
        }
    }
}

/// What the gate would do with a statement, before any database work.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// The statement may run now.
    Execute(StatementKind),
    /// The statement is a mutation the caller has not confirmed.
    NeedsConfirmation(ConfirmationRequest),
}

/// Terminal outcome of a successful gate call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GateOutcome {
    Completed(ExecutionResult),
    NeedsConfirmation(ConfirmationRequest),
}

/// The offline half of the gate: screening and the confirmation rule.
#[derive(Debug, Clone, Default)]
pub struct GatePolicy {
    filter: DangerFilter,
}

impl GatePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides what to do with `sql` without touching the database.
    ///
    /// Empty input is a validation error, a deny-list hit is a permission
    /// error, and an unrecognised statement kind is unsupported. Checks run
    /// in that order, so `DROP TABLE x` is blocked rather than unsupported.
    pub fn decide(&self, sql: &str, confirm: bool) -> Result<GateDecision> {
        if sql.trim().is_empty() {
            return Err(RelayError::validation("SQL is required"));
        }

        self.filter.check(sql)?;

        let kind = classify_statement(sql);
        match kind {
            StatementKind::Unknown => Err(RelayError::unsupported(
                "Unsupported SQL statement. Only SELECT, INSERT, UPDATE and DELETE are allowed.",
            )),
            k if k.requires_confirmation() && !confirm => {
                Ok(GateDecision::NeedsConfirmation(ConfirmationRequest::new(k)))
            }
            k => Ok(GateDecision::Execute(k)),
        }
    }
}

/// Classifies, screens, and executes submitted statements.
#[derive(Clone)]
pub struct QueryGate {
    db: Arc<dyn DatabaseClient>,
    policy: GatePolicy,
}

impl QueryGate {
    /// Creates a gate that executes accepted statements through `db`.
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self {
            db,
            policy: GatePolicy::new(),
        }
    }

    /// See [`GatePolicy::decide`].
    pub fn decide(&self, sql: &str, confirm: bool) -> Result<GateDecision> {
        self.policy.decide(sql, confirm)
    }

    /// Runs `sql` through the gate, executing it if the gate allows.
    pub async fn submit(&self, sql: &str, confirm: bool) -> Result<GateOutcome> {
        let decision = match self.decide(sql, confirm) {
            Ok(decision) => decision,
            Err(e) => {
                info!("Statement rejected ({}): {}", e.category(), e);
                return Err(e);
            }
        };

        let kind = match decision {
            GateDecision::NeedsConfirmation(request) => {
                info!("{} awaiting confirmation", request.query_type);
                return Ok(GateOutcome::NeedsConfirmation(request));
            }
            GateDecision::Execute(kind) => kind,
        };

        let start = Instant::now();
        debug!("Executing {} against {}", kind, self.db.database_name());

        match self.db.execute(sql, kind).await {
            Ok(result) => {
                info!(
                    "{} completed in {:?}, {} row(s)",
                    kind,
                    start.elapsed(),
                    result.row_count()
                );
                Ok(GateOutcome::Completed(result))
            }
            Err(e) => {
                info!("{} failed: {}", kind, e);
                Err(e)
            }
        }
    }
}

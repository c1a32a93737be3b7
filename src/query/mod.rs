//! Query screening and execution for TalkToDB.
//!
//! This module isolates the safety and confirmation decision from the HTTP
//! surface so it can be exercised offline and in tests.

mod gate;

pub use gate::{ConfirmationRequest, GateDecision, GateOutcome, GatePolicy, QueryGate};

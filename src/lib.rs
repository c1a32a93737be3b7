//! TalkToDB - a thin HTTP relay between natural-language questions, a
//! generative-language API and a MySQL database.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod query;
pub mod safety;
pub mod server;

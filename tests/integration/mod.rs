//! Integration tests for TalkToDB.

pub mod http_test;
pub mod mysql_test;

//! Prompt construction for SQL generation.
//!
//! The schema description is fixed; the backend is never shown the live
//! database.

use crate::llm::types::Message;

/// Instruction sent ahead of every question.
pub const SYSTEM_PROMPT: &str = "You are an expert SQL generator. Given a natural language question, \
generate a valid SQL SELECT statement for a MySQL database.\n\
Tables:\n  \
users(id, name, email, created_at)\n  \
transactions(id, user_id, amount, txn_date, status)\n\
Return ONLY the SQL query, nothing else.";

/// Formats the question part of the request.
pub fn build_question(prompt: &str) -> String {
    format!("Question: {prompt}\n\nSQL:")
}

/// Builds the complete message list for one generation request.
pub fn build_messages(prompt: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(build_question(prompt)),
    ]
}

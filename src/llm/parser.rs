//! Response cleanup for generated SQL.

/// Removes markdown code fences from a model reply and trims it.
///
/// Every `` ```sql `` and `` ``` `` marker is dropped wherever it appears,
/// so text around a fenced block is kept. The result is not validated.
pub fn strip_code_fences(response: &str) -> String {
    response
        .trim()
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}

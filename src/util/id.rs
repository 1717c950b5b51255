use ulid::Ulid;

/// Generate a fresh identifier for a task or subtask.
///
/// ULIDs are time-ordered with 80 random bits, so ids minted in the same
/// millisecond still differ.
pub fn new_id() -> String {
    Ulid::new().to_string()
}

/// Read an identifier out of untrusted input: non-empty strings are kept,
/// numbers become their decimal form, anything else yields `None`.
pub fn id_from_value(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

use uuid::Uuid;

/// `<prefix>_` followed by the first 8 hex digits of a random UUID,
/// e.g. `map_1f9c03ab`.
pub fn new_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..8])
}

//! Database row types. These map directly to SQLite rows.
//! Enums, timestamps and `style` stay in their stored text form; the API layer
//! owns their typed representation.

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapRow {
    pub map_id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub visibility: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementRow {
    pub element_id: String,
    pub map_id: String,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub content: String,
    /// JSON text
    pub style: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub report_id: String,
    pub map_id: String,
    pub author_id: String,
    pub reason: String,
    pub comment: String,
    pub status: String,
    pub created_at: String,
}

//! Database row types. These map directly to SQLite rows.
//! Timestamps are milliseconds since the Unix epoch.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRow {
    pub id: String,
    pub name: String,
    pub choice: String,
    pub submitted_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookRow {
    pub id: String,
    pub name: String,
    pub message: String,
    pub created_at: i64,
}

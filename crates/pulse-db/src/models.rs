/// Database row types — these map directly to SQLite rows.
/// Distinct from the pulse-types API models to keep the store layer
/// independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub pairing_code: String,
    pub partner_id: Option<String>,
    pub created_at: String,
    pub last_login: Option<String>,
}

/// A user row LEFT JOINed with its partner's display fields.
pub struct JoinedUserRow {
    pub id: String,
    pub name: String,
    pub pairing_code: String,
    pub partner_id: Option<String>,
    pub partner_name: Option<String>,
    pub partner_pairing_code: Option<String>,
}

pub struct EventRow {
    pub id: String,
    pub title: String,
    pub start_date: String,
    pub user_id: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub event_id: String,
    pub text: String,
    pub author: String,
    pub user_id: String,
    pub created_at: String,
}

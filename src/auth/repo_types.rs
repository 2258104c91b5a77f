use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Account record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,                      // assigned by the store, never reused
    pub email: String,                // lowercase
    pub display_name: String,         // trimmed
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, not exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,   // creation timestamp
}

/// Fields the service supplies when creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub display_name: &'a str,
    pub password_hash: &'a str,
    pub created_at: OffsetDateTime,
}

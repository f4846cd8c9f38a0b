//! Database schema and migrations.
//!
//! Migrations are applied in order when the database is opened; the
//! schema_version table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,                     -- Argon2 PHC string
    role            TEXT NOT NULL DEFAULT 'student',   -- 'student', 'teacher'
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: stored items (files and folders share one table)
    r#"
CREATE TABLE stored_items (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    filename        TEXT NOT NULL,
    size            INTEGER NOT NULL DEFAULT 0,
    content_type    TEXT NOT NULL,
    data            BLOB NOT NULL DEFAULT x'',
    is_folder       INTEGER NOT NULL DEFAULT 0,
    parent_id       INTEGER,                           -- NULL for root
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_stored_items_parent ON stored_items(parent_id);
CREATE INDEX idx_stored_items_parent_filename ON stored_items(parent_id, filename);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_migration_contains_users_table() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE users"));
        assert!(first.contains("email           TEXT NOT NULL UNIQUE"));
        assert!(first.contains("password_hash"));
    }

    #[test]
    fn test_stored_items_parent_is_nullable() {
        let items = MIGRATIONS[1];
        assert!(items.contains("CREATE TABLE stored_items"));
        assert!(items.contains("parent_id       INTEGER,"));
        assert!(items.contains("is_folder"));
    }
}

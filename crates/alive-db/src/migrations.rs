use rusqlite::Connection;
use tracing::info;

use crate::DbResult;

pub fn run(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                    TEXT PRIMARY KEY,
                email                 TEXT NOT NULL UNIQUE,
                phone                 TEXT,
                password              TEXT NOT NULL,
                username              TEXT NOT NULL,
                created_at            TEXT NOT NULL,
                last_checkin          TEXT,
                inactive_notified_at  TEXT
            );

            CREATE INDEX idx_users_last_checkin ON users(last_checkin);

            CREATE TABLE checkins (
                id            TEXT PRIMARY KEY,
                user_id       TEXT NOT NULL REFERENCES users(id),
                checkin_date  TEXT NOT NULL,
                status        TEXT NOT NULL,
                message       TEXT,
                created_at    TEXT NOT NULL,
                UNIQUE(user_id, checkin_date)
            );

            CREATE TABLE contacts (
                id             TEXT PRIMARY KEY,
                user_id        TEXT NOT NULL REFERENCES users(id),
                contact_email  TEXT,
                contact_phone  TEXT,
                contact_name   TEXT NOT NULL,
                created_at     TEXT NOT NULL,
                CHECK (contact_email IS NOT NULL OR contact_phone IS NOT NULL)
            );

            CREATE INDEX idx_contacts_user ON contacts(user_id, created_at);

            -- contact_id has no foreign key: history outlives deleted contacts
            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                contact_id  TEXT NOT NULL,
                type        TEXT NOT NULL,
                content     TEXT NOT NULL,
                sent_at     TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, sent_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

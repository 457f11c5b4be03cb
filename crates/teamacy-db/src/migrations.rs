use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            role            TEXT NOT NULL CHECK (role IN ('user', 'admin')),
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_users_role
            ON users(role);

        -- user_id is not a foreign key: admin rows are purged on
        -- every bootstrap while their messages stay.
        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            kind            TEXT CHECK (kind IS NULL OR kind IN ('enquiry', 'feedback')),
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            subject         TEXT NOT NULL,
            message         TEXT NOT NULL,
            message_html    TEXT NOT NULL,
            user_id         TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_created
            ON messages(created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_kind
            ON messages(kind, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

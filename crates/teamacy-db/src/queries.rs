use crate::Database;
use crate::models::{MessageRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at";
const MESSAGE_COLUMNS: &str =
    "id, kind, name, email, subject, message, message_html, user_id, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            insert_user(conn, user)?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn count_users_with_role(&self, role: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM users WHERE role = ?1", [role], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    /// Remove every admin account and insert `admin` in a single transaction.
    /// Returns how many admin rows were removed. On error nothing changes.
    pub fn replace_admins(&self, admin: &UserRow) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM users WHERE role = 'admin'", [])?;
            insert_user(&tx, admin)?;
            tx.commit()?;
            Ok(removed)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, msg: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                rusqlite::params![
                    msg.id,
                    msg.kind,
                    msg.name,
                    msg.email,
                    msg.subject,
                    msg.message,
                    msg.message_html,
                    msg.user_id,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Newest first. `kind = None` returns every kind, including untagged rows.
    pub fn get_messages(&self, kind: Option<&str>, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, kind, limit))
    }

    pub fn count_messages(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

fn insert_user(conn: &Connection, user: &UserRow) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        (
            &user.id,
            &user.name,
            &user.email,
            &user.role,
            &user.password_hash,
            &user.created_at,
        ),
    )?;
    Ok(())
}

/// `column` is always one of our own literals, never caller input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"))?;

    let row = stmt.query_row([value], user_from_row).optional()?;

    Ok(row)
}

fn query_messages(conn: &Connection, kind: Option<&str>, limit: u32) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS}
         FROM messages
         WHERE ?1 IS NULL OR kind = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![kind, limit], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        subject: row.get(4)?,
        message: row.get(5)?,
        message_html: row.get(6)?,
        user_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

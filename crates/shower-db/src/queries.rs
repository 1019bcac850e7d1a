use crate::Database;
use crate::models::{GuestbookRow, VoteRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Votes --

    pub fn insert_vote(&self, row: &VoteRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO votes (id, name, choice, submitted_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![row.id, row.name, row.choice, row.submitted_at],
            )?;
            Ok(())
        })
    }

    /// Every vote, newest first.
    pub fn get_votes(&self) -> Result<Vec<VoteRow>> {
        self.with_conn(query_votes)
    }

    // -- Guestbook --

    pub fn insert_guestbook_entry(&self, row: &GuestbookRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO guestbook (id, name, message, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![row.id, row.name, row.message, row.created_at],
            )?;
            Ok(())
        })
    }

    /// Every guestbook entry, newest first.
    pub fn get_guestbook(&self) -> Result<Vec<GuestbookRow>> {
        self.with_conn(query_guestbook)
    }
}

fn query_votes(conn: &Connection) -> Result<Vec<VoteRow>> {
    // rowid breaks ties between votes stored in the same millisecond
    let mut stmt = conn.prepare(
        "SELECT id, name, choice, submitted_at
         FROM votes
         ORDER BY submitted_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(VoteRow {
                id: row.get(0)?,
                name: row.get(1)?,
                choice: row.get(2)?,
                submitted_at: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_guestbook(conn: &Connection) -> Result<Vec<GuestbookRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, message, created_at
         FROM guestbook
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(GuestbookRow {
                id: row.get(0)?,
                name: row.get(1)?,
                message: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

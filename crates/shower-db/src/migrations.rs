use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (votes, guestbook)");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS votes (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                choice          TEXT NOT NULL CHECK (choice IN ('boy', 'girl')),
                submitted_at    INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_votes_submitted
                ON votes(submitted_at);

            CREATE TABLE IF NOT EXISTS guestbook (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                message     TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_guestbook_created
                ON guestbook(created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

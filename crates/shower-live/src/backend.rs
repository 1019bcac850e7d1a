use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use shower_db::Database;
use shower_db::models::{GuestbookRow, VoteRow};
use shower_types::models::Record;
use shower_types::{GuestbookEntry, Vote};

/// An append-only collection. Implementations are blocking; callers run
/// them on the blocking pool.
pub trait AppendLog<T>: Send + Sync + 'static {
    fn append(&self, record: &T) -> Result<()>;

    /// Every record, newest first.
    fn load_all(&self) -> Result<Vec<T>>;
}

// -- SQLite --

impl AppendLog<Vote> for Database {
    fn append(&self, vote: &Vote) -> Result<()> {
        self.insert_vote(&VoteRow {
            id: vote.id.to_string(),
            name: vote.name.clone(),
            choice: vote.choice.as_str().to_string(),
            submitted_at: vote.submitted_at.timestamp_millis(),
        })
    }

    fn load_all(&self) -> Result<Vec<Vote>> {
        Ok(self.get_votes()?.into_iter().filter_map(vote_from_row).collect())
    }
}

impl AppendLog<GuestbookEntry> for Database {
    fn append(&self, entry: &GuestbookEntry) -> Result<()> {
        self.insert_guestbook_entry(&GuestbookRow {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            message: entry.message.clone(),
            created_at: entry.created_at.timestamp_millis(),
        })
    }

    fn load_all(&self) -> Result<Vec<GuestbookEntry>> {
        Ok(self
            .get_guestbook()?
            .into_iter()
            .filter_map(entry_from_row)
            .collect())
    }
}

/// Corrupt rows are logged and left out of the feed.
fn vote_from_row(row: VoteRow) -> Option<Vote> {
    let parsed = (|| -> Result<Vote> {
        Ok(Vote {
            id: row.id.parse::<Uuid>()?,
            name: row.name.clone(),
            choice: row.choice.parse()?,
            submitted_at: from_millis(row.submitted_at)?,
        })
    })();

    parsed
        .map_err(|e| warn!("Corrupt vote row '{}': {}", row.id, e))
        .ok()
}

fn entry_from_row(row: GuestbookRow) -> Option<GuestbookEntry> {
    let parsed = (|| -> Result<GuestbookEntry> {
        Ok(GuestbookEntry {
            id: row.id.parse::<Uuid>()?,
            name: row.name.clone(),
            message: row.message.clone(),
            created_at: from_millis(row.created_at)?,
        })
    })();

    parsed
        .map_err(|e| warn!("Corrupt guestbook row '{}': {}", row.id, e))
        .ok()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {}", ms))
}

// -- In memory --

/// Process-local log. Can be switched offline to simulate a lost
/// connection to the backing store.
#[derive(Debug)]
pub struct MemoryLog<T> {
    records: Mutex<Vec<T>>,
    offline: AtomicBool,
}

impl<T> Default for MemoryLog<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }
}

impl<T> MemoryLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::Acquire) {
            bail!("backing store unreachable");
        }
        Ok(())
    }
}

impl<T> AppendLog<T> for MemoryLog<T>
where
    T: Record + Clone + Send + Sync + 'static,
{
    fn append(&self, record: &T) -> Result<()> {
        self.check_online()?;
        self.records
            .lock()
            .map_err(|e| anyhow!("memory log lock poisoned: {}", e))?
            .push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<T>> {
        self.check_online()?;
        let mut all: Vec<T> = self
            .records
            .lock()
            .map_err(|e| anyhow!("memory log lock poisoned: {}", e))?
            .iter()
            .rev()
            .cloned()
            .collect();
        // Stable sort on reversed insertion order: equal timestamps keep
        // the later insert first, same as the SQLite ordering.
        all.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shower_types::Choice;

    fn vote(name: &str, choice: Choice, ms: i64) -> Vote {
        Vote {
            id: Uuid::new_v4(),
            name: name.into(),
            choice,
            submitted_at: Utc.timestamp_millis_opt(ms).unwrap(),
        }
    }

    fn names(votes: &[Vote]) -> Vec<&str> {
        votes.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn sqlite_log_round_trips_votes() {
        let db = Database::open_in_memory().unwrap();
        let ann = vote("Ann", Choice::Boy, 1_000_123);
        AppendLog::<Vote>::append(&db, &ann).unwrap();
        AppendLog::<Vote>::append(&db, &vote("Bo", Choice::Girl, 2_000_000)).unwrap();

        let all = AppendLog::<Vote>::load_all(&db).unwrap();
        assert_eq!(names(&all), ["Bo", "Ann"]);
        assert_eq!(all[1], ann);
    }

    #[test]
    fn sqlite_log_skips_corrupt_rows() {
        let db = Database::open_in_memory().unwrap();
        db.insert_vote(&VoteRow {
            id: "not-a-uuid".into(),
            name: "Ghost".into(),
            choice: "boy".into(),
            submitted_at: 5,
        })
        .unwrap();
        AppendLog::<Vote>::append(&db, &vote("Ann", Choice::Boy, 1)).unwrap();

        let all = AppendLog::<Vote>::load_all(&db).unwrap();
        assert_eq!(names(&all), ["Ann"]);
    }

    #[test]
    fn memory_log_orders_like_sqlite() {
        let log: MemoryLog<Vote> = MemoryLog::new();
        log.append(&vote("a", Choice::Boy, 10)).unwrap();
        log.append(&vote("b", Choice::Girl, 30)).unwrap();
        log.append(&vote("c", Choice::Boy, 20)).unwrap();
        log.append(&vote("d", Choice::Girl, 30)).unwrap();

        assert_eq!(names(&log.load_all().unwrap()), ["d", "b", "c", "a"]);
    }

    #[test]
    fn offline_memory_log_fails_both_ways() {
        let log: MemoryLog<Vote> = MemoryLog::new();
        log.set_offline(true);
        assert!(log.append(&vote("a", Choice::Boy, 1)).is_err());
        assert!(log.load_all().is_err());

        log.set_offline(false);
        assert!(log.load_all().unwrap().is_empty());
    }
}

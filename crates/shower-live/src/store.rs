use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use shower_core::Clock;
use shower_core::clock::truncate_millis;
use shower_core::validate::{validate_entry, validate_vote};
use shower_types::api::{GuestbookRequest, VoteInput};
use shower_types::{GuestbookEntry, Vote};

use crate::backend::AppendLog;
use crate::error::StoreError;
use crate::feed::{Feed, Snapshot, Subscription};

/// The vote collection: validated appends plus a newest-first live feed.
#[derive(Clone)]
pub struct VoteStore {
    feed: Feed<Vote>,
    clock: Arc<dyn Clock>,
}

impl VoteStore {
    pub async fn open(log: Arc<dyn AppendLog<Vote>>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Ok(Self {
            feed: Feed::open("votes", log).await?,
            clock,
        })
    }

    /// Validates, stamps and stores one guess. Invalid input never reaches
    /// the backend. Each call gets a fresh random id, so concurrent callers
    /// cannot collide.
    pub async fn append(&self, input: VoteInput) -> Result<Vote, StoreError> {
        self.append_at(input, self.now()).await
    }

    /// Like [`append`](Self::append), with a submission time the caller
    /// already read from [`now`](Self::now).
    pub async fn append_at(
        &self,
        input: VoteInput,
        submitted_at: DateTime<Utc>,
    ) -> Result<Vote, StoreError> {
        let valid = validate_vote(&input.name, input.choice())?;
        let vote = Vote {
            id: Uuid::new_v4(),
            name: valid.name,
            choice: valid.choice,
            submitted_at: truncate_millis(submitted_at),
        };

        let vote = self.feed.append(vote).await?;
        info!("Vote {} recorded: {} guessed {}", vote.id, vote.name, vote.choice);
        Ok(vote)
    }

    /// See [`Feed::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&[Vote]) + Send + 'static,
    {
        self.feed.subscribe(callback)
    }

    pub fn snapshot(&self) -> Snapshot<Vote> {
        self.feed.snapshot()
    }

    /// Store time at the precision votes are stamped with.
    pub fn now(&self) -> DateTime<Utc> {
        truncate_millis(self.clock.now())
    }

    pub fn feed(&self) -> &Feed<Vote> {
        &self.feed
    }
}

#[derive(Clone)]
pub struct GuestbookStore {
    feed: Feed<GuestbookEntry>,
    clock: Arc<dyn Clock>,
}

impl GuestbookStore {
    pub async fn open(
        log: Arc<dyn AppendLog<GuestbookEntry>>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            feed: Feed::open("guestbook", log).await?,
            clock,
        })
    }

    pub async fn append(&self, req: GuestbookRequest) -> Result<GuestbookEntry, StoreError> {
        let valid = validate_entry(&req.name, &req.message)?;
        let entry = GuestbookEntry {
            id: Uuid::new_v4(),
            name: valid.name,
            message: valid.message,
            created_at: truncate_millis(self.clock.now()),
        };

        let entry = self.feed.append(entry).await?;
        info!("Guestbook entry {} added by {}", entry.id, entry.name);
        Ok(entry)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&[GuestbookEntry]) + Send + 'static,
    {
        self.feed.subscribe(callback)
    }

    pub fn snapshot(&self) -> Snapshot<GuestbookEntry> {
        self.feed.snapshot()
    }

    pub fn feed(&self) -> &Feed<GuestbookEntry> {
        &self.feed
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use shower_types::models::Record;

use crate::backend::AppendLog;
use crate::error::StoreError;

/// One complete view of a collection, newest first.
pub type Snapshot<T> = Arc<Vec<T>>;

/// Append-only collection with a live, full-snapshot feed.
///
/// Every change republishes the whole collection. Subscribers may miss
/// intermediate snapshots under load but always end up on the latest one.
pub struct Feed<T> {
    inner: Arc<FeedInner<T>>,
}

struct FeedInner<T> {
    name: &'static str,
    log: Arc<dyn AppendLog<T>>,
    tx: watch::Sender<Snapshot<T>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Feed<T>
where
    T: Record + Clone + Send + Sync + 'static,
{
    /// Loads the current collection from the log before anything can
    /// subscribe.
    pub async fn open(name: &'static str, log: Arc<dyn AppendLog<T>>) -> anyhow::Result<Self> {
        let loader = log.clone();
        let initial = tokio::task::spawn_blocking(move || loader.load_all()).await??;
        debug!("{} feed opened with {} records", name, initial.len());

        let (tx, _) = watch::channel(Arc::new(initial));
        Ok(Self {
            inner: Arc::new(FeedInner { name, log, tx }),
        })
    }

    /// Persists `record`, then republishes the collection. Not cancellable
    /// once started: the write finishes on the blocking pool even if the
    /// caller goes away.
    pub async fn append(&self, record: T) -> Result<T, StoreError> {
        let log = self.inner.log.clone();
        let to_write = record.clone();
        let name = self.inner.name;

        let reloaded = tokio::task::spawn_blocking(move || {
            log.append(&to_write)?;
            // The write is durable from here on; a failed reload must not
            // turn it into an error the caller would retry.
            Ok::<_, anyhow::Error>(log.load_all().map_err(|e| {
                warn!("{} feed reload failed after append: {}", name, e);
            }))
        })
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StoreError::Transient(e.into())
        })?
        .map_err(|e| {
            warn!("{} append failed: {}", name, e);
            StoreError::Transient(e)
        })?;

        // Without a reload, publish the new record on top of whatever is
        // current at publish time.
        let next = reloaded.unwrap_or_else(|()| vec![record.clone()]);
        self.publish(next);

        Ok(record)
    }

    /// Merges `next` into the published snapshot by id and republishes if
    /// that adds anything. Records already published but missing from
    /// `next` (a reload that lost a race with another append, or a partial
    /// snapshot) are kept, so the feed never loses a record.
    fn publish(&self, next: Vec<T>) {
        let name = self.inner.name;
        let published = self.inner.tx.send_if_modified(move |current| {
            let known: HashSet<_> = current.iter().map(Record::id).collect();
            if next.iter().all(|r| known.contains(&r.id())) {
                return false;
            }

            let incoming: HashSet<_> = next.iter().map(Record::id).collect();
            let carried: Vec<T> = current
                .iter()
                .filter(|r| !incoming.contains(&r.id()))
                .cloned()
                .collect();

            let mut merged = next;
            if !carried.is_empty() {
                debug!("{} feed: kept {} records missing from a reload", name, carried.len());
                merged.extend(carried);
                merged.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
            }
            *current = Arc::new(merged);
            true
        });
        if !published {
            debug!("{} feed: snapshot had nothing new", name);
        }
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.inner.tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Snapshot<T>> {
        self.inner.tx.subscribe()
    }

    /// Calls `callback` with the current snapshot, then again after every
    /// change. Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&[T]) + Send + 'static,
    {
        subscribe_watch(self.watch(), move |snapshot: &Snapshot<T>| {
            callback(snapshot.as_slice())
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

/// Registration handle for a feed listener.
///
/// Dropping it stops delivery as well, but only `unsubscribe` waits until
/// no callback can still be running.
#[must_use = "dropping a Subscription stops delivery immediately"]
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// No callback runs after this returns.
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Callbacks are synchronous, so once the task is reaped none
            // can be mid-flight.
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Drives `callback` from a watch channel: once with the current value,
/// then once per observed change.
pub fn subscribe_watch<V, F>(mut rx: watch::Receiver<V>, mut callback: F) -> Subscription
where
    V: Clone + Send + Sync + 'static,
    F: FnMut(&V) + Send + 'static,
{
    let task = tokio::spawn(async move {
        let first = rx.borrow_and_update().clone();
        callback(&first);

        while rx.changed().await.is_ok() {
            let value = rx.borrow_and_update().clone();
            callback(&value);
        }
    });

    Subscription { task: Some(task) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{TimeZone, Utc};
    use shower_types::{Choice, Vote};
    use uuid::Uuid;

    use crate::backend::MemoryLog;

    /// Accepts writes but can be told to fail every reload.
    #[derive(Default)]
    struct FlakyReloads {
        log: MemoryLog<Vote>,
        fail_reloads: AtomicBool,
    }

    impl AppendLog<Vote> for FlakyReloads {
        fn append(&self, record: &Vote) -> anyhow::Result<()> {
            self.log.append(record)
        }

        fn load_all(&self) -> anyhow::Result<Vec<Vote>> {
            if self.fail_reloads.load(Ordering::Acquire) {
                anyhow::bail!("reload timed out");
            }
            self.log.load_all()
        }
    }

    fn vote(name: &str, secs: i64) -> Vote {
        Vote {
            id: Uuid::new_v4(),
            name: name.into(),
            choice: Choice::Boy,
            submitted_at: Utc.timestamp_opt(1_751_000_000 + secs, 0).unwrap(),
        }
    }

    fn names(feed: &Feed<Vote>) -> Vec<String> {
        feed.snapshot().iter().map(|v| v.name.clone()).collect()
    }

    #[tokio::test]
    async fn failed_reload_still_publishes_the_record() {
        let log = Arc::new(FlakyReloads::default());
        log.append(&vote("Ann", 1)).unwrap();
        let feed = Feed::<Vote>::open("votes", log.clone()).await.unwrap();

        log.fail_reloads.store(true, Ordering::Release);
        feed.append(vote("Bo", 2)).await.unwrap();

        assert_eq!(names(&feed), ["Bo", "Ann"]);
    }

    #[tokio::test]
    async fn stale_reload_of_equal_length_is_merged_not_dropped() {
        let log = Arc::new(FlakyReloads::default());
        let ann = vote("Ann", 1);
        log.append(&ann).unwrap();
        let feed = Feed::<Vote>::open("votes", log.clone()).await.unwrap();

        // Bo's reload fails, so the feed shows Bo on top of Ann.
        log.fail_reloads.store(true, Ordering::Release);
        feed.append(vote("Bo", 3)).await.unwrap();

        // A concurrent append of Cy reloaded before Bo's write landed: same
        // length as the published snapshot, different records.
        let cy = vote("Cy", 2);
        feed.publish(vec![cy, ann]);

        assert_eq!(names(&feed), ["Bo", "Cy", "Ann"]);
    }

    #[tokio::test]
    async fn older_snapshot_changes_nothing() {
        let log = Arc::new(FlakyReloads::default());
        let feed = Feed::<Vote>::open("votes", log.clone()).await.unwrap();
        let ann = feed.append(vote("Ann", 1)).await.unwrap();
        feed.append(vote("Bo", 2)).await.unwrap();

        let rx = feed.watch();
        feed.publish(vec![ann]);
        feed.publish(Vec::new());

        assert!(!rx.has_changed().unwrap());
        assert_eq!(names(&feed), ["Bo", "Ann"]);
    }
}

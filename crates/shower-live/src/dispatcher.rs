use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use shower_core::tally::tally;
use shower_types::api::{RevealPhase, RevealStatus, Tally};
use shower_types::events::LiveEvent;
use shower_types::{Choice, GuestbookEntry, Vote};

use crate::feed::Snapshot;
use crate::reveal::RevealHandle;
use crate::store::{GuestbookStore, VoteStore};

/// Shared handle to every live collection, and the place connections get
/// their event streams from.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    votes: VoteStore,
    guestbook: GuestbookStore,
    reveal: RevealHandle,
}

impl Dispatcher {
    pub fn new(votes: VoteStore, guestbook: GuestbookStore, reveal: RevealHandle) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                votes,
                guestbook,
                reveal,
            }),
        }
    }

    pub fn votes(&self) -> &VoteStore {
        &self.inner.votes
    }

    pub fn guestbook(&self) -> &GuestbookStore {
        &self.inner.guestbook
    }

    pub fn reveal(&self) -> &RevealHandle {
        &self.inner.reveal
    }

    /// Statistics for the current vote snapshot. Winners appear only once
    /// the outcome is revealed.
    pub fn tally(&self) -> Tally {
        tally(&self.inner.votes.snapshot(), self.inner.reveal.outcome())
    }

    /// A fresh event stream for one live connection. It starts with the
    /// current state of every feed.
    pub fn live_stream(&self) -> LiveStream {
        LiveStream {
            votes: self.inner.votes.feed().watch(),
            guestbook: self.inner.guestbook.feed().watch(),
            reveal: self.inner.reveal.watch(),
            reveal_open: true,
            pending: Pending {
                votes: true,
                guestbook: true,
                reveal: true,
            },
            seen_revealed: false,
        }
    }
}

/// Latest-value view of the votes, guestbook and reveal feeds for one
/// consumer.
///
/// Nothing is queued: a consumer that stops reading holds at most one
/// pending event of each kind, built from the newest state when it is
/// finally taken.
pub struct LiveStream {
    votes: watch::Receiver<Snapshot<Vote>>,
    guestbook: watch::Receiver<Snapshot<GuestbookEntry>>,
    reveal: watch::Receiver<RevealStatus>,
    // The timer task ends after the reveal and closes its channel.
    reveal_open: bool,
    pending: Pending,
    seen_revealed: bool,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    votes: bool,
    guestbook: bool,
    reveal: bool,
}

enum Changed {
    Votes,
    Guestbook,
    Reveal,
    RevealClosed,
    FeedClosed,
}

impl LiveStream {
    /// Next event, waiting for a change if nothing is pending. `None` once
    /// the stores are gone.
    pub async fn next(&mut self) -> Option<LiveEvent> {
        loop {
            if let Some(event) = self.take_pending() {
                return Some(event);
            }

            let changed = tokio::select! {
                r = self.votes.changed() => match r {
                    Ok(()) => Changed::Votes,
                    Err(_) => Changed::FeedClosed,
                },
                r = self.guestbook.changed() => match r {
                    Ok(()) => Changed::Guestbook,
                    Err(_) => Changed::FeedClosed,
                },
                r = self.reveal.changed(), if self.reveal_open => match r {
                    Ok(()) => Changed::Reveal,
                    Err(_) => Changed::RevealClosed,
                },
            };

            match changed {
                Changed::Votes => self.pending.votes = true,
                Changed::Guestbook => self.pending.guestbook = true,
                Changed::Reveal => self.pending.reveal = true,
                Changed::RevealClosed => self.reveal_open = false,
                Changed::FeedClosed => return None,
            }
        }
    }

    /// Number of events that are ready without waiting, one per kind at
    /// most.
    pub fn pending(&mut self) -> usize {
        self.pending.votes |= self.votes.has_changed().unwrap_or(false);
        self.pending.guestbook |= self.guestbook.has_changed().unwrap_or(false);
        self.pending.reveal |= self.reveal.has_changed().unwrap_or(false);
        [self.pending.votes, self.pending.guestbook, self.pending.reveal]
            .into_iter()
            .filter(|p| *p)
            .count()
    }

    fn take_pending(&mut self) -> Option<LiveEvent> {
        if std::mem::take(&mut self.pending.votes) {
            let votes = self.votes.borrow_and_update().clone();
            return Some(votes_event(&votes, self.reveal.borrow().outcome));
        }
        if std::mem::take(&mut self.pending.guestbook) {
            let entries = self.guestbook.borrow_and_update().to_vec();
            return Some(LiveEvent::Guestbook { entries });
        }
        if std::mem::take(&mut self.pending.reveal) {
            let status = self.reveal.borrow_and_update().clone();
            // Winners only exist after the reveal, so the first revealed
            // status also refreshes the vote statistics.
            if status.phase == RevealPhase::Revealed && !self.seen_revealed {
                debug!("Reveal observed, refreshing winners");
                self.seen_revealed = true;
                self.pending.votes = true;
            }
            return Some(LiveEvent::Reveal { status });
        }
        None
    }
}

fn votes_event(votes: &[Vote], outcome: Option<Choice>) -> LiveEvent {
    LiveEvent::Votes {
        votes: votes.to_vec(),
        tally: tally(votes, outcome),
    }
}

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use shower_core::{Clock, LateSubmissions, RevealConfig, RevealMachine};
use shower_types::Choice;
use shower_types::api::{RevealPhase, RevealStatus};

use crate::feed::{Subscription, subscribe_watch};

/// Read side of the reveal timer.
#[derive(Clone)]
pub struct RevealHandle {
    config: RevealConfig,
    rx: watch::Receiver<RevealStatus>,
}

impl RevealHandle {
    pub fn status(&self) -> RevealStatus {
        self.rx.borrow().clone()
    }

    pub fn phase(&self) -> RevealPhase {
        self.rx.borrow().phase
    }

    pub fn outcome(&self) -> Option<Choice> {
        self.rx.borrow().outcome
    }

    pub fn accepting_votes(&self) -> bool {
        self.rx.borrow().accepting_votes
    }

    /// Whether a guess stamped `at` may still count. Unlike
    /// [`accepting_votes`](Self::accepting_votes) this does not wait for
    /// the next tick to notice the target has passed.
    pub fn accepts_at(&self, at: DateTime<Utc>) -> bool {
        match self.config.late_submissions {
            LateSubmissions::Allowed => true,
            LateSubmissions::Closed => self.accepting_votes() && at < self.config.target,
        }
    }

    pub fn watch(&self) -> watch::Receiver<RevealStatus> {
        self.rx.clone()
    }

    /// Resolves once the reveal has happened, immediately if it already has.
    pub async fn revealed(&self) -> RevealStatus {
        let mut rx = self.rx.clone();
        if let Ok(status) = rx.wait_for(|s| s.phase == RevealPhase::Revealed).await {
            return status.clone();
        }
        // Timer gone: report the last status it published.
        rx.borrow().clone()
    }

    /// Calls `callback` with the current status and after every tick.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&RevealStatus) + Send + 'static,
    {
        subscribe_watch(self.rx.clone(), callback)
    }
}

/// Starts the periodic time check. The state machine lives inside the task;
/// everything else sees it through the returned handle. The task ends after
/// publishing the revealed status.
pub fn spawn_reveal_timer(
    config: RevealConfig,
    clock: Arc<dyn Clock>,
    period: Duration,
) -> (RevealHandle, JoinHandle<()>) {
    let mut machine = RevealMachine::new(config, clock.now());
    let (tx, rx) = watch::channel(machine.status(clock.now()));

    if machine.is_revealed() {
        info!("Reveal time {} already passed, outcome is {}", config.target, config.outcome);
    } else {
        info!("Counting down to reveal at {}", config.target);
    }

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !machine.is_revealed() {
            interval.tick().await;

            let now = clock.now();
            if let Some(transition) = machine.tick(now) {
                info!("Revealed at {}: it's a {}!", transition.at, transition.outcome);
            }
            tx.send_replace(machine.status(now));
        }
    });

    (RevealHandle { config, rx }, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shower_core::{LateSubmissions, ManualClock};

    fn config() -> RevealConfig {
        RevealConfig {
            target: Utc.with_ymd_and_hms(2025, 7, 6, 3, 5, 0).unwrap(),
            outcome: Choice::Girl,
            late_submissions: LateSubmissions::Closed,
        }
    }

    #[tokio::test]
    async fn timer_reveals_when_clock_reaches_target() {
        let clock = Arc::new(ManualClock::new(config().target - chrono::Duration::seconds(10)));
        let (handle, task) = spawn_reveal_timer(config(), clock.clone(), Duration::from_millis(5));

        assert_eq!(handle.phase(), RevealPhase::CountingDown);
        assert_eq!(handle.outcome(), None);
        assert!(handle.accepting_votes());
        assert_eq!(handle.status().countdown.seconds, 10);

        clock.set(config().target);
        let status = tokio::time::timeout(Duration::from_secs(2), handle.revealed())
            .await
            .expect("reveal within timeout");

        assert_eq!(status.outcome, Some(Choice::Girl));
        assert!(status.countdown.is_zero());
        assert!(!status.accepting_votes);

        // Terminal: the task stops ticking after the reveal.
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("timer task finished")
            .unwrap();
    }

    #[tokio::test]
    async fn already_past_target_starts_revealed() {
        let clock = Arc::new(ManualClock::new(config().target + chrono::Duration::days(1)));
        let (handle, _task) = spawn_reveal_timer(config(), clock, Duration::from_millis(5));

        assert_eq!(handle.phase(), RevealPhase::Revealed);
        assert_eq!(handle.outcome(), Some(Choice::Girl));
    }
}
